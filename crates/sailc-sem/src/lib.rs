//! sailc-sem - AST validator for the Sailfin language.
//!
//! Walks the parsed program and enforces name and type well-formedness
//! before code generation:
//!
//! 1. every declared name (functions, methods, parameters, variables,
//!    constants, fields, structs, enums, variants, interfaces, type
//!    aliases, type parameters, loop variables) is a valid identifier;
//! 2. type annotations follow the type grammar, and a type-argument list
//!    is only applied to a name declared with the same number of type
//!    parameters or to a built-in generic (`List`, `Optional`,
//!    `Channel`, `Dict`);
//! 3. generic type parameters are in scope inside their declaration and
//!    accepted anywhere a type name is;
//! 4. constructor patterns name valid identifiers throughout;
//! 5. `return` appears only inside a function, method, or lambda body;
//! 6. imports have a non-empty source and non-empty, well-formed items.
//!
//! Field existence on struct literals and enum constructions is left to
//! the target runtime, and the `async`/`await`/`routine` positional
//! rules are enforced by the code generator.
//!
//! The validator is a stateful visitor: a scope stack of type-parameter
//! sets is pushed on entry to each generic declaration and popped on
//! exit. Validation is fail-fast and returns the first offense.

mod edge_cases;

use rustc_hash::{FxHashMap, FxHashSet};
use sailc_par::ast::*;
use sailc_util::{CompileError, CompileResult, Span, Symbol};

/// Validate a parsed program.
pub fn validate(program: &Program) -> CompileResult<()> {
    Validator::new().validate(program)
}

/// Built-in generic type names that accept arguments without a local
/// declaration.
const BUILTIN_GENERICS: &[&str] = &["List", "Optional", "Channel", "Dict"];

/// Stateful AST validator.
pub struct Validator {
    /// Scope stack of in-scope generic type parameters.
    type_params: Vec<FxHashSet<Symbol>>,

    /// Type-parameter counts of locally declared generic types.
    declared_generics: FxHashMap<Symbol, usize>,

    /// Nesting depth of function/method/lambda bodies.
    fn_depth: usize,
}

impl Validator {
    /// Create a fresh validator.
    pub fn new() -> Self {
        Self {
            type_params: Vec::new(),
            declared_generics: FxHashMap::default(),
            fn_depth: 0,
        }
    }

    /// Run all checks over the program.
    pub fn validate(&mut self, program: &Program) -> CompileResult<()> {
        self.collect_declared_generics(&program.statements);
        for stmt in &program.statements {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    /// Pre-pass: record the arity of every locally declared generic type
    /// so applications can be checked against it.
    fn collect_declared_generics(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            match stmt {
                Stmt::Struct(decl) => {
                    self.declared_generics
                        .insert(decl.name, decl.type_params.len());
                }
                Stmt::Interface(decl) => {
                    self.declared_generics
                        .insert(decl.name, decl.type_params.len());
                }
                Stmt::Enum(decl) => {
                    self.declared_generics.insert(decl.name, 0);
                }
                Stmt::TypeAlias(decl) => {
                    self.declared_generics.insert(decl.name, 0);
                }
                _ => {}
            }
        }
    }

    fn check_name(&self, name: Symbol, what: &str, span: Span) -> CompileResult<()> {
        if is_valid_identifier(name.as_str()) {
            Ok(())
        } else {
            Err(CompileError::validation(
                format!("invalid {} name: '{}'", what, name),
                span,
            ))
        }
    }

    /// True when `name` is an in-scope type parameter.
    fn is_type_param(&self, name: Symbol) -> bool {
        self.type_params.iter().any(|scope| scope.contains(&name))
    }

    fn push_type_params(&mut self, params: &[Symbol], span: Span) -> CompileResult<()> {
        let mut scope = FxHashSet::default();
        for param in params {
            self.check_name(*param, "type parameter", span)?;
            scope.insert(*param);
        }
        self.type_params.push(scope);
        Ok(())
    }

    fn pop_type_params(&mut self) {
        self.type_params.pop();
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn visit_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match stmt {
            Stmt::Import(import) => self.visit_import(import),
            Stmt::TypeAlias(decl) => {
                self.check_name(decl.name, "type alias", decl.span)?;
                self.visit_type(&decl.ty)
            }
            Stmt::Interface(decl) => self.visit_interface(decl),
            Stmt::Struct(decl) => self.visit_struct(decl),
            Stmt::Enum(decl) => self.visit_enum(decl),
            Stmt::Function(decl) => self.visit_function(decl),
            Stmt::Let(decl) => {
                self.check_name(decl.name, "variable", decl.span)?;
                if let Some(ty) = &decl.ty {
                    self.visit_type(ty)?;
                }
                if let Some(init) = &decl.init {
                    self.visit_expr(init)?;
                }
                Ok(())
            }
            Stmt::Const(decl) => {
                self.check_name(decl.name, "constant", decl.span)?;
                if let Some(ty) = &decl.ty {
                    self.visit_type(ty)?;
                }
                self.visit_expr(&decl.value)
            }
            Stmt::Return(ret) => {
                if self.fn_depth == 0 {
                    return Err(CompileError::validation(
                        "'return' outside of a function body",
                        ret.span,
                    ));
                }
                if let Some(value) = &ret.value {
                    self.visit_expr(value)?;
                }
                Ok(())
            }
            Stmt::If(if_stmt) => {
                self.visit_expr(&if_stmt.condition)?;
                self.visit_block(&if_stmt.then_branch)?;
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.visit_block(else_branch)?;
                }
                Ok(())
            }
            Stmt::Match(node) => self.visit_match(node),
            Stmt::For(for_stmt) => {
                self.visit_pattern(&for_stmt.pattern)?;
                self.visit_expr(&for_stmt.iterable)?;
                self.visit_block(&for_stmt.body)
            }
            Stmt::While(while_stmt) => {
                self.visit_expr(&while_stmt.condition)?;
                self.visit_block(&while_stmt.body)
            }
            Stmt::Loop(loop_stmt) => self.visit_block(&loop_stmt.body),
            Stmt::Break(_) | Stmt::Continue(_) => Ok(()),
            Stmt::Throw(throw) => self.visit_expr(&throw.value),
            Stmt::Assert(assert) => {
                self.visit_expr(&assert.condition)?;
                if let Some(message) = &assert.message {
                    self.visit_expr(message)?;
                }
                Ok(())
            }
            Stmt::Try(try_stmt) => {
                self.visit_block(&try_stmt.body)?;
                for catch in &try_stmt.catches {
                    self.check_name(catch.name, "catch variable", catch.span)?;
                    self.visit_block(&catch.body)?;
                }
                if let Some(finally) = &try_stmt.finally {
                    self.visit_block(finally)?;
                }
                Ok(())
            }
            Stmt::Routine(routine) => self.visit_routine(routine),
            Stmt::Expr(stmt) => self.visit_expr(&stmt.expr),
            Stmt::Test(test) => self.visit_block(&test.body),
        }
    }

    fn visit_block(&mut self, statements: &[Stmt]) -> CompileResult<()> {
        for stmt in statements {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    fn visit_import(&mut self, import: &ImportStmt) -> CompileResult<()> {
        if import.source.as_str().is_empty() {
            return Err(CompileError::validation(
                "import source must be a non-empty string",
                import.span,
            ));
        }
        if import.items.is_empty() {
            return Err(CompileError::validation(
                "import must name at least one item",
                import.span,
            ));
        }
        for item in &import.items {
            self.check_name(*item, "import item", import.span)?;
        }
        Ok(())
    }

    fn visit_interface(&mut self, decl: &InterfaceDecl) -> CompileResult<()> {
        self.check_name(decl.name, "interface", decl.span)?;
        self.push_type_params(&decl.type_params, decl.span)?;
        let result = self.visit_interface_members(decl);
        self.pop_type_params();
        result
    }

    fn visit_interface_members(&mut self, decl: &InterfaceDecl) -> CompileResult<()> {
        for member in &decl.members {
            match member {
                InterfaceMember::Method(method) => {
                    self.check_name(method.name, "interface method", method.span)?;
                    self.visit_params(&method.params)?;
                    if let Some(ret) = &method.return_type {
                        self.visit_type(ret)?;
                    }
                }
                InterfaceMember::Property(property) => {
                    self.check_name(property.name, "interface property", property.span)?;
                    self.visit_type(&property.ty)?;
                }
            }
        }
        Ok(())
    }

    fn visit_struct(&mut self, decl: &StructDecl) -> CompileResult<()> {
        self.check_name(decl.name, "struct", decl.span)?;
        for interface in &decl.implements {
            self.check_name(*interface, "interface", decl.span)?;
        }
        self.push_type_params(&decl.type_params, decl.span)?;
        let result = self.visit_struct_members(decl);
        self.pop_type_params();
        result
    }

    fn visit_struct_members(&mut self, decl: &StructDecl) -> CompileResult<()> {
        for member in &decl.members {
            match member {
                StructMember::Field(field) => {
                    self.check_name(field.name, "field", field.span)?;
                    self.visit_type(&field.ty)?;
                }
                StructMember::Method(method) => self.visit_function(method)?,
            }
        }
        Ok(())
    }

    fn visit_enum(&mut self, decl: &EnumDecl) -> CompileResult<()> {
        self.check_name(decl.name, "enum", decl.span)?;
        for variant in &decl.variants {
            self.check_name(variant.name, "enum variant", variant.span)?;
            for field in &variant.fields {
                self.check_name(field.name, "variant field", field.span)?;
                self.visit_type(&field.ty)?;
            }
        }
        Ok(())
    }

    fn visit_function(&mut self, decl: &FunctionDecl) -> CompileResult<()> {
        self.check_name(decl.name, "function", decl.span)?;
        for decorator in &decl.decorators {
            self.check_name(*decorator, "decorator", decl.span)?;
        }
        self.push_type_params(&decl.type_params, decl.span)?;
        let result = (|| {
            self.visit_params(&decl.params)?;
            if let Some(ret) = &decl.return_type {
                self.visit_type(ret)?;
            }
            self.fn_depth += 1;
            let body_result = self.visit_block(&decl.body);
            self.fn_depth -= 1;
            body_result
        })();
        self.pop_type_params();
        result
    }

    fn visit_params(&mut self, params: &[Param]) -> CompileResult<()> {
        for param in params {
            self.check_name(param.name, "parameter", param.span)?;
            if let Some(ty) = &param.ty {
                self.visit_type(ty)?;
            }
            if let Some(default) = &param.default {
                self.visit_expr(default)?;
            }
        }
        Ok(())
    }

    fn visit_routine(&mut self, routine: &RoutineExpr) -> CompileResult<()> {
        if let Some(name) = routine.name {
            self.check_name(name, "routine", routine.span)?;
        }
        self.visit_block(&routine.body)
    }

    fn visit_match(&mut self, node: &MatchNode) -> CompileResult<()> {
        self.visit_expr(&node.scrutinee)?;
        for arm in &node.arms {
            self.visit_pattern(&arm.pattern)?;
            if let Some(guard) = &arm.guard {
                self.visit_expr(guard)?;
            }
            match &arm.body {
                MatchArmBody::Block(block) => self.visit_block(block)?,
                MatchArmBody::Expr(expr) => self.visit_expr(expr)?,
            }
        }
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn visit_expr(&mut self, expr: &Expr) -> CompileResult<()> {
        match expr {
            Expr::Number(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Null(_) => Ok(()),
            Expr::Ident(ident) => self.check_name(ident.name, "identifier", ident.span),
            Expr::Array(array) => {
                for element in &array.elements {
                    self.visit_expr(element)?;
                }
                Ok(())
            }
            Expr::Dict(dict) => {
                for (key, value) in &dict.entries {
                    self.visit_expr(key)?;
                    self.visit_expr(value)?;
                }
                Ok(())
            }
            Expr::StructLit(lit) => {
                self.check_name(lit.name.name, "struct", lit.name.span)?;
                self.visit_field_inits(&lit.fields)
            }
            Expr::EnumVariant(lit) => {
                self.check_name(lit.enum_name.name, "enum", lit.enum_name.span)?;
                self.check_name(lit.variant, "enum variant", lit.span)?;
                self.visit_field_inits(&lit.fields)
            }
            Expr::Member(member) => self.visit_expr(&member.object),
            Expr::Index(index) => {
                self.visit_expr(&index.object)?;
                self.visit_expr(&index.index)
            }
            Expr::Call(call) => {
                self.visit_expr(&call.callee)?;
                for arg in &call.args {
                    self.visit_expr(arg)?;
                }
                Ok(())
            }
            Expr::TypeApply(apply) => self.visit_type_apply(apply),
            Expr::Unary(unary) => self.visit_expr(&unary.operand),
            Expr::Binary(binary) => {
                self.visit_expr(&binary.left)?;
                self.visit_expr(&binary.right)
            }
            Expr::Range(range) => {
                self.visit_expr(&range.start)?;
                self.visit_expr(&range.end)
            }
            Expr::Lambda(lambda) => {
                self.visit_params(&lambda.params)?;
                if let Some(ret) = &lambda.return_type {
                    self.visit_type(ret)?;
                }
                self.fn_depth += 1;
                let result = self.visit_block(&lambda.body);
                self.fn_depth -= 1;
                result
            }
            Expr::Await(await_expr) => self.visit_expr(&await_expr.expr),
            Expr::AsyncBlock(block) => {
                self.fn_depth += 1;
                let result = self.visit_block(&block.body);
                self.fn_depth -= 1;
                result
            }
            Expr::Routine(routine) => self.visit_routine(routine),
            Expr::Parallel(parallel) => {
                for task in &parallel.tasks {
                    self.visit_expr(task)?;
                }
                Ok(())
            }
            Expr::Match(node) => self.visit_match(node),
            Expr::Is(is_expr) => {
                self.visit_expr(&is_expr.expr)?;
                self.visit_type(&is_expr.ty)
            }
            Expr::Assign(assign) => {
                self.visit_expr(&assign.target)?;
                self.visit_expr(&assign.value)
            }
        }
    }

    fn visit_field_inits(&mut self, fields: &[FieldInit]) -> CompileResult<()> {
        for field in fields {
            self.check_name(field.name, "field", field.span)?;
            self.visit_expr(&field.value)?;
        }
        Ok(())
    }

    /// Check a generic application against the declared arity or the
    /// built-in generics.
    fn visit_type_apply(&mut self, apply: &TypeApplyExpr) -> CompileResult<()> {
        self.check_name(apply.base.name, "type", apply.base.span)?;
        self.check_type_arity(apply.base.name, apply.type_args.len(), apply.span)?;
        for ty in &apply.type_args {
            self.visit_type(ty)?;
        }
        if let Some(args) = &apply.args {
            for arg in args {
                self.visit_expr(arg)?;
            }
        }
        Ok(())
    }

    fn check_type_arity(&self, name: Symbol, given: usize, span: Span) -> CompileResult<()> {
        if BUILTIN_GENERICS.contains(&name.as_str()) {
            return Ok(());
        }
        match self.declared_generics.get(&name) {
            Some(&arity) if arity == given => Ok(()),
            Some(&arity) => Err(CompileError::validation(
                format!(
                    "type '{}' takes {} type argument(s), {} given",
                    name, arity, given
                ),
                span,
            )),
            // Unknown names may come from other modules; only arity of
            // local declarations is enforced
            None => Ok(()),
        }
    }

    // ========================================================================
    // Patterns and types
    // ========================================================================

    fn visit_pattern(&mut self, pattern: &Pattern) -> CompileResult<()> {
        match pattern {
            Pattern::Wildcard(_) | Pattern::Number(_) | Pattern::Str(_) => Ok(()),
            Pattern::Binding(ident) => self.check_name(ident.name, "binding", ident.span),
            Pattern::Tagged(tagged) => {
                if let Some(enum_name) = tagged.enum_name {
                    self.check_name(enum_name, "pattern type", tagged.span)?;
                }
                self.check_name(tagged.variant, "pattern variant", tagged.span)?;
                for field in &tagged.fields {
                    self.check_name(field.name, "pattern field", field.span)?;
                    if let Some(sub) = &field.pattern {
                        self.visit_pattern(sub)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn visit_type(&mut self, ty: &TypeExpr) -> CompileResult<()> {
        match ty {
            TypeExpr::Name(name) => {
                for segment in &name.segments {
                    self.check_name(*segment, "type", name.span)?;
                }
                if !name.args.is_empty() {
                    if name.segments.len() == 1 && self.is_type_param(name.name()) {
                        return Err(CompileError::validation(
                            format!("type parameter '{}' does not take arguments", name.name()),
                            name.span,
                        ));
                    }
                    self.check_type_arity(name.name(), name.args.len(), name.span)?;
                    for arg in &name.args {
                        self.visit_type(arg)?;
                    }
                }
                Ok(())
            }
            TypeExpr::Array(array) => self.visit_type(&array.element),
            TypeExpr::Tuple(tuple) => {
                for element in &tuple.elements {
                    self.visit_type(element)?;
                }
                Ok(())
            }
            TypeExpr::Optional(optional) => self.visit_type(&optional.base),
            TypeExpr::Union(union) => {
                self.visit_type(&union.left)?;
                self.visit_type(&union.right)
            }
            TypeExpr::Intersection(intersection) => {
                self.visit_type(&intersection.left)?;
                self.visit_type(&intersection.right)
            }
            TypeExpr::Function(function) => {
                for param in &function.params {
                    self.visit_type(param)?;
                }
                self.visit_type(&function.ret)
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier validity: `[A-Za-z_][A-Za-z0-9_]*`.
fn is_valid_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_source(source: &str) -> CompileResult<()> {
        let tokens = sailc_lex::Lexer::tokenize(source)?;
        let program = sailc_par::parse(tokens)?;
        validate(&program)
    }

    #[test]
    fn test_valid_program_passes() {
        validate_source(
            "enum Shape { Circle { radius -> number; }, Rectangle { w -> number; h -> number; } }\n\
             fn area(s -> Shape) -> number {\n\
               match s {\n\
                 Shape.Circle { radius } => 3.14 * radius * radius,\n\
                 Shape.Rectangle { w, h } => w * h,\n\
               }\n\
             }\n\
             fn main() -> void { print.info(area(Shape.Circle { radius: 5 })); }",
        )
        .expect("valid program");
    }

    #[test]
    fn test_identifier_validity() {
        assert!(is_valid_identifier("x"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("camelCase9"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("9lives"));
        assert!(!is_valid_identifier("has-dash"));
    }

    #[test]
    fn test_return_outside_function_rejected() {
        let err = validate_source("return 1;").unwrap_err();
        assert!(err.to_string().contains("'return' outside"));
    }

    #[test]
    fn test_return_inside_lambda_allowed() {
        validate_source("let f = (x: number) -> number { return x; };").expect("lambda return");
    }

    #[test]
    fn test_return_inside_async_block_allowed() {
        validate_source("let t = async { return 1; };").expect("async block return");
    }

    #[test]
    fn test_import_checks() {
        validate_source("import { readFile } from \"sailfin/io\";").expect("good import");
        assert!(validate_source("import { } from \"sailfin/io\";").is_err());
    }

    #[test]
    fn test_generic_scope() {
        validate_source("fn id<T>(x -> T) -> T { return x; }").expect("generic fn");
        validate_source("struct Boxed<T> { value: T; fn get(self) -> T { return self.value; } }")
            .expect("generic struct");
    }

    #[test]
    fn test_type_param_takes_no_arguments() {
        let err = validate_source("fn f<T>(x: T<number>) -> void { }").unwrap_err();
        assert!(err.to_string().contains("does not take arguments"));
    }

    #[test]
    fn test_builtin_generics_accepted() {
        validate_source("fn f(c: Channel<number>, xs: List<string>) -> void { }")
            .expect("builtin generics");
    }

    #[test]
    fn test_local_generic_arity_enforced() {
        let err = validate_source(
            "struct Pair<A, B> { a: A; b: B; }\n\
             fn f(p: Pair<number>) -> void { }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("takes 2 type argument(s), 1 given"));
    }

    #[test]
    fn test_non_generic_type_with_args_rejected() {
        let err = validate_source(
            "struct Point { x: number; }\n\
             fn f(p: Point<number>) -> void { }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("takes 0 type argument(s), 1 given"));
    }

    #[test]
    fn test_type_application_expression_arity() {
        validate_source(
            "struct Boxed<T> { value: T; }\n\
             fn f() -> void { let b = Boxed<number>(1); }",
        )
        .expect("matching arity");

        let err = validate_source(
            "struct Boxed<T> { value: T; }\n\
             fn f() -> void { let b = Boxed<number, string>(1); }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("takes 1 type argument(s), 2 given"));
    }

    #[test]
    fn test_unknown_generic_name_tolerated() {
        // Names from other modules are not arity-checked locally
        validate_source("fn f(x: Remote<number>) -> void { }").expect("unknown generic");
    }

    #[test]
    fn test_pattern_names_checked() {
        validate_source(
            "fn f(s: Shape) -> void { match s { Shape.Circle { radius } => use_(radius), _ => skip(), } }",
        )
        .expect("pattern names");
    }

    #[test]
    fn test_validation_error_carries_line() {
        let err = validate_source("fn f() -> void { }\nreturn;").unwrap_err();
        match err {
            CompileError::Validation { span, .. } => assert_eq!(span.line, 2),
            other => panic!("expected validation error, got {other}"),
        }
    }
}
