//! AST node definitions for the Sailfin language.
//!
//! Four tagged roots ([`Expr`], [`Stmt`], [`Pattern`], [`TypeExpr`])
//! with named payload structs. Every payload carries the span of its
//! originating source so diagnostics and the code generator can point
//! back at lines. The tree is immutable after parsing; later passes keep
//! their annotations in side tables.

use sailc_util::{Span, Symbol};

/// AST root - a source file is a list of statements.
#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

/// Expression
#[derive(Debug, Clone)]
pub enum Expr {
    Number(NumberLit),
    Str(StrLit),
    Bool(BoolLit),
    Null(Span),
    Ident(Ident),
    Array(ArrayLit),
    Dict(DictLit),
    StructLit(StructLit),
    EnumVariant(EnumVariantLit),
    Member(MemberExpr),
    Index(IndexExpr),
    Call(CallExpr),
    TypeApply(TypeApplyExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Range(RangeExpr),
    Lambda(LambdaExpr),
    Await(AwaitExpr),
    AsyncBlock(AsyncBlockExpr),
    Routine(RoutineExpr),
    Parallel(ParallelExpr),
    Match(Box<MatchNode>),
    Is(IsExpr),
    Assign(AssignExpr),
}

impl Expr {
    /// The source span of the expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(n) => n.span,
            Expr::Str(s) => s.span,
            Expr::Bool(b) => b.span,
            Expr::Null(span) => *span,
            Expr::Ident(i) => i.span,
            Expr::Array(a) => a.span,
            Expr::Dict(d) => d.span,
            Expr::StructLit(s) => s.span,
            Expr::EnumVariant(e) => e.span,
            Expr::Member(m) => m.span,
            Expr::Index(i) => i.span,
            Expr::Call(c) => c.span,
            Expr::TypeApply(t) => t.span,
            Expr::Unary(u) => u.span,
            Expr::Binary(b) => b.span,
            Expr::Range(r) => r.span,
            Expr::Lambda(l) => l.span,
            Expr::Await(a) => a.span,
            Expr::AsyncBlock(a) => a.span,
            Expr::Routine(r) => r.span,
            Expr::Parallel(p) => p.span,
            Expr::Match(m) => m.span,
            Expr::Is(i) => i.span,
            Expr::Assign(a) => a.span,
        }
    }
}

/// Numeric value, preserving the integer/float distinction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int(i64),
    Float(f64),
}

impl std::fmt::Display for NumberValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberValue::Int(v) => write!(f, "{}", v),
            NumberValue::Float(v) => {
                // Keep a decimal point so the target sees a float too
                if v.fract() == 0.0 && v.is_finite() {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
        }
    }
}

/// Number literal
#[derive(Debug, Clone)]
pub struct NumberLit {
    pub value: NumberValue,
    pub span: Span,
}

/// String literal (cooked text; `{{ expr }}` placeholders intact)
#[derive(Debug, Clone)]
pub struct StrLit {
    pub value: Symbol,
    pub span: Span,
}

/// Boolean literal
#[derive(Debug, Clone)]
pub struct BoolLit {
    pub value: bool,
    pub span: Span,
}

/// Identifier reference
#[derive(Debug, Clone)]
pub struct Ident {
    pub name: Symbol,
    pub span: Span,
}

/// Array literal `[a, b, c]`
#[derive(Debug, Clone)]
pub struct ArrayLit {
    pub elements: Vec<Expr>,
    pub span: Span,
}

/// Dictionary literal `{ key: value, ... }`
#[derive(Debug, Clone)]
pub struct DictLit {
    pub entries: Vec<(Expr, Expr)>,
    pub span: Span,
}

/// Struct literal `Name { field: expr, ... }`
#[derive(Debug, Clone)]
pub struct StructLit {
    pub name: Ident,
    pub fields: Vec<FieldInit>,
    pub span: Span,
}

/// A `field: expr` initializer; shorthand `{ name }` binds the field to a
/// variable of the same name.
#[derive(Debug, Clone)]
pub struct FieldInit {
    pub name: Symbol,
    pub value: Expr,
    pub span: Span,
}

/// Enum variant construction `EnumName.Variant { field: expr, ... }`
#[derive(Debug, Clone)]
pub struct EnumVariantLit {
    pub enum_name: Ident,
    pub variant: Symbol,
    pub fields: Vec<FieldInit>,
    pub span: Span,
}

/// Member access `obj.member`
#[derive(Debug, Clone)]
pub struct MemberExpr {
    pub object: Box<Expr>,
    pub member: Symbol,
    pub span: Span,
}

/// Index `obj[index]`
#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub object: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

/// Call `callee(args...)`
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// Generic type application `Name<T, ...>(args...)`.
///
/// `args` is `None` for a bare generic reference without a value-argument
/// list.
#[derive(Debug, Clone)]
pub struct TypeApplyExpr {
    pub base: Ident,
    pub type_args: Vec<TypeExpr>,
    pub args: Option<Vec<Expr>>,
    pub span: Span,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Unary expression `-x`, `!x`
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// Source-level spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// Binary expression
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub span: Span,
}

/// Range `start..end`
#[derive(Debug, Clone)]
pub struct RangeExpr {
    pub start: Box<Expr>,
    pub end: Box<Expr>,
    pub span: Span,
}

/// Lambda / function expression
#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Await expression
#[derive(Debug, Clone)]
pub struct AwaitExpr {
    pub expr: Box<Expr>,
    pub span: Span,
}

/// Async block `async { ... }`
#[derive(Debug, Clone)]
pub struct AsyncBlockExpr {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Routine `routine [name] { ... }`, in statement or expression position
#[derive(Debug, Clone)]
pub struct RoutineExpr {
    pub name: Option<Symbol>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Parallel expression `parallel [thunk, ...]`
#[derive(Debug, Clone)]
pub struct ParallelExpr {
    pub tasks: Vec<Expr>,
    pub span: Span,
}

/// Match construct, shared by statement and expression positions
#[derive(Debug, Clone)]
pub struct MatchNode {
    pub scrutinee: Expr,
    pub arms: Vec<MatchArm>,
    pub span: Span,
}

/// A single match arm: `pattern [if guard] => body`
#[derive(Debug, Clone)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: MatchArmBody,
    pub span: Span,
}

/// Arm body: a block or a single expression
#[derive(Debug, Clone)]
pub enum MatchArmBody {
    Block(Vec<Stmt>),
    Expr(Expr),
}

/// Type check `expr is Type`
#[derive(Debug, Clone)]
pub struct IsExpr {
    pub expr: Box<Expr>,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    /// The arithmetic operator a compound assignment expands to.
    pub fn bin_op(&self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
        }
    }
}

/// Assignment `target = value`, also usable as a statement
#[derive(Debug, Clone)]
pub struct AssignExpr {
    pub target: Box<Expr>,
    pub op: AssignOp,
    pub value: Box<Expr>,
    pub span: Span,
}

// ============================================================================
// STATEMENTS
// ============================================================================

/// Statement
#[derive(Debug, Clone)]
pub enum Stmt {
    Import(ImportStmt),
    TypeAlias(TypeAliasDecl),
    Interface(InterfaceDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Function(FunctionDecl),
    Let(LetDecl),
    Const(ConstDecl),
    Return(ReturnStmt),
    If(IfStmt),
    Match(MatchNode),
    For(ForStmt),
    While(WhileStmt),
    Loop(LoopStmt),
    Break(Span),
    Continue(Span),
    Throw(ThrowStmt),
    Assert(AssertStmt),
    Try(TryStmt),
    Routine(RoutineExpr),
    Expr(ExprStmt),
    Test(TestDecl),
}

impl Stmt {
    /// The source span of the statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Import(s) => s.span,
            Stmt::TypeAlias(s) => s.span,
            Stmt::Interface(s) => s.span,
            Stmt::Struct(s) => s.span,
            Stmt::Enum(s) => s.span,
            Stmt::Function(s) => s.span,
            Stmt::Let(s) => s.span,
            Stmt::Const(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::Match(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::Loop(s) => s.span,
            Stmt::Break(span) | Stmt::Continue(span) => *span,
            Stmt::Throw(s) => s.span,
            Stmt::Assert(s) => s.span,
            Stmt::Try(s) => s.span,
            Stmt::Routine(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::Test(s) => s.span,
        }
    }
}

/// Import `import { a, b } from "source";`
#[derive(Debug, Clone)]
pub struct ImportStmt {
    pub items: Vec<Symbol>,
    pub source: Symbol,
    pub span: Span,
}

/// Type alias `type Name = T;`
#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Interface declaration
#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: Symbol,
    pub type_params: Vec<Symbol>,
    pub members: Vec<InterfaceMember>,
    pub span: Span,
}

/// Interface member
#[derive(Debug, Clone)]
pub enum InterfaceMember {
    Method(InterfaceMethod),
    Property(InterfaceProperty),
}

/// Interface method signature `fn name(params) -> T;`
#[derive(Debug, Clone)]
pub struct InterfaceMethod {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub span: Span,
}

/// Interface property `name: T;`
#[derive(Debug, Clone)]
pub struct InterfaceProperty {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Struct declaration
#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: Symbol,
    pub type_params: Vec<Symbol>,
    pub implements: Vec<Symbol>,
    pub members: Vec<StructMember>,
    pub span: Span,
}

/// Struct member
#[derive(Debug, Clone)]
pub enum StructMember {
    Field(FieldDecl),
    Method(FunctionDecl),
}

/// Field declaration `[mut] name: T;`
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub mutable: bool,
    pub span: Span,
}

/// Enum declaration
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: Symbol,
    pub variants: Vec<EnumVariant>,
    pub span: Span,
}

/// Enum variant: payload-less, or carrying an ordered set of named fields
#[derive(Debug, Clone)]
pub struct EnumVariant {
    pub name: Symbol,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

/// Function (or method) declaration
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Symbol,
    pub type_params: Vec<Symbol>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Symbol>,
    pub is_async: bool,
    pub span: Span,
}

/// Function parameter; `self` has no annotation, everything else does
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Symbol,
    pub ty: Option<TypeExpr>,
    pub default: Option<Expr>,
    pub span: Span,
}

/// Variable declaration `let [mut] name [: T] = expr;`
#[derive(Debug, Clone)]
pub struct LetDecl {
    pub name: Symbol,
    pub mutable: bool,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub span: Span,
}

/// Constant declaration `const name [: T] = expr;`
#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub name: Symbol,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
    pub span: Span,
}

/// Return statement
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

/// If statement; an `else if` chain nests as a single-element else branch
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Vec<Stmt>,
    pub else_branch: Option<Vec<Stmt>>,
    pub span: Span,
}

/// For loop `for pattern in iterable { ... }`
#[derive(Debug, Clone)]
pub struct ForStmt {
    pub pattern: Pattern,
    pub iterable: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// While loop
#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Infinite loop `loop { ... }`
#[derive(Debug, Clone)]
pub struct LoopStmt {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Throw statement
#[derive(Debug, Clone)]
pub struct ThrowStmt {
    pub value: Expr,
    pub span: Span,
}

/// Assert statement `assert cond [, message];`
#[derive(Debug, Clone)]
pub struct AssertStmt {
    pub condition: Expr,
    pub message: Option<Expr>,
    pub span: Span,
}

/// Try/catch/finally
#[derive(Debug, Clone)]
pub struct TryStmt {
    pub body: Vec<Stmt>,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Vec<Stmt>>,
    pub span: Span,
}

/// Catch clause `catch (err) { ... }`
#[derive(Debug, Clone)]
pub struct CatchClause {
    pub name: Symbol,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Expression statement
#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

/// Test declaration `test "description" { ... }`
#[derive(Debug, Clone)]
pub struct TestDecl {
    pub description: Symbol,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ============================================================================
// PATTERNS
// ============================================================================

/// Match pattern
#[derive(Debug, Clone)]
pub enum Pattern {
    Wildcard(Span),
    Binding(Ident),
    Number(NumberLit),
    Str(StrLit),
    Tagged(TaggedPattern),
}

impl Pattern {
    /// The source span of the pattern.
    pub fn span(&self) -> Span {
        match self {
            Pattern::Wildcard(span) => *span,
            Pattern::Binding(i) => i.span,
            Pattern::Number(n) => n.span,
            Pattern::Str(s) => s.span,
            Pattern::Tagged(t) => t.span,
        }
    }
}

/// Constructor pattern `Enum.Variant { field, field: sub, ... }`
///
/// `payload` records whether a brace list was written at all: a bare
/// `Enum.Variant` matches the tag constant of a payload-less variant,
/// while `Enum.Variant { ... }` (even empty) matches the tagged-dict
/// encoding.
#[derive(Debug, Clone)]
pub struct TaggedPattern {
    /// The enum name when written `Enum.Variant { ... }`
    pub enum_name: Option<Symbol>,
    pub variant: Symbol,
    pub fields: Vec<PatternField>,
    pub payload: bool,
    pub span: Span,
}

/// Field inside a constructor pattern: `name` alone binds, `name: sub`
/// destructures further
#[derive(Debug, Clone)]
pub struct PatternField {
    pub name: Symbol,
    pub pattern: Option<Pattern>,
    pub span: Span,
}

// ============================================================================
// TYPE ANNOTATIONS
// ============================================================================

/// Type annotation
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Name(TypeName),
    Array(ArrayType),
    Tuple(TupleType),
    Optional(OptionalType),
    Union(UnionType),
    Intersection(IntersectionType),
    Function(FunctionType),
}

impl TypeExpr {
    /// The source span of the annotation.
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Name(t) => t.span,
            TypeExpr::Array(t) => t.span,
            TypeExpr::Tuple(t) => t.span,
            TypeExpr::Optional(t) => t.span,
            TypeExpr::Union(t) => t.span,
            TypeExpr::Intersection(t) => t.span,
            TypeExpr::Function(t) => t.span,
        }
    }
}

/// Simple type: qualified name plus optional type arguments
#[derive(Debug, Clone)]
pub struct TypeName {
    pub segments: Vec<Symbol>,
    pub args: Vec<TypeExpr>,
    pub span: Span,
}

impl TypeName {
    /// The unqualified (last) name segment.
    pub fn name(&self) -> Symbol {
        *self.segments.last().expect("type name has a segment")
    }
}

/// Array type `T[]`
#[derive(Debug, Clone)]
pub struct ArrayType {
    pub element: Box<TypeExpr>,
    pub span: Span,
}

/// Tuple type `(A, B)`
#[derive(Debug, Clone)]
pub struct TupleType {
    pub elements: Vec<TypeExpr>,
    pub span: Span,
}

/// Optional type `T?`
#[derive(Debug, Clone)]
pub struct OptionalType {
    pub base: Box<TypeExpr>,
    pub span: Span,
}

/// Union type `A | B`
#[derive(Debug, Clone)]
pub struct UnionType {
    pub left: Box<TypeExpr>,
    pub right: Box<TypeExpr>,
    pub span: Span,
}

/// Intersection type `A & B`
#[derive(Debug, Clone)]
pub struct IntersectionType {
    pub left: Box<TypeExpr>,
    pub right: Box<TypeExpr>,
    pub span: Span,
}

/// Function type `(A, B) -> R`
#[derive(Debug, Clone)]
pub struct FunctionType {
    pub params: Vec<TypeExpr>,
    pub ret: Box<TypeExpr>,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_value_display() {
        assert_eq!(NumberValue::Int(42).to_string(), "42");
        assert_eq!(NumberValue::Float(3.14).to_string(), "3.14");
        // A whole-number float keeps its decimal point
        assert_eq!(NumberValue::Float(5.0).to_string(), "5.0");
    }

    #[test]
    fn test_bin_op_spelling() {
        assert_eq!(BinOp::And.as_str(), "&&");
        assert_eq!(BinOp::Le.as_str(), "<=");
        assert_eq!(BinOp::Add.as_str(), "+");
    }

    #[test]
    fn test_assign_op_expansion() {
        assert_eq!(AssignOp::Assign.bin_op(), None);
        assert_eq!(AssignOp::Add.bin_op(), Some(BinOp::Add));
        assert_eq!(AssignOp::Div.bin_op(), Some(BinOp::Div));
    }

    #[test]
    fn test_spans_flow_through() {
        let span = Span::new(3, 7, 2, 4);
        let expr = Expr::Ident(Ident {
            name: Symbol::intern("x"),
            span,
        });
        assert_eq!(expr.span(), span);

        let stmt = Stmt::Break(span);
        assert_eq!(stmt.span(), span);

        let pattern = Pattern::Wildcard(span);
        assert_eq!(pattern.span(), span);
    }

    #[test]
    fn test_type_name_last_segment() {
        let ty = TypeName {
            segments: vec![Symbol::intern("sailfin"), Symbol::intern("io")],
            args: vec![],
            span: Span::DUMMY,
        };
        assert_eq!(ty.name().as_str(), "io");
    }
}
