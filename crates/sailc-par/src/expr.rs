//! Expression parsing using Pratt-style precedence climbing.
//!
//! # Operator precedence (loosest to tightest)
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 1 | `=`, `+=`, `-=`, `*=`, `/=` | Right |
//! | 2 | `..` | - |
//! | 3 | `\|\|` | Left |
//! | 4 | `&&` | Left |
//! | 5 | `==`, `!=` | Left |
//! | 6 | `is` | Left |
//! | 7 | `<`, `<=`, `>`, `>=` | Left |
//! | 8 | `+`, `-` | Left |
//! | 9 | `*`, `/` | Left |
//! | 10 | `-`, `!`, `await` (prefix) | - |
//! | 11 | `.`, `[]`, `(...)`, `{...}` (postfix) | Left |

use sailc_lex::TokenKind;
use sailc_util::{sym, CompileResult, Span};

use crate::ast::*;
use crate::Parser;

/// Binding power levels for Pratt parsing.
/// Higher numbers = tighter binding.
pub(crate) mod bp {
    /// Minimum binding power (start of expression)
    pub const MIN: u8 = 0;

    /// Logical OR: ||
    pub const LOGICAL_OR: u8 = 10;

    /// Logical AND: &&
    pub const LOGICAL_AND: u8 = 20;

    /// Equality: ==, !=
    pub const EQUALITY: u8 = 30;

    /// Type check: is
    pub const TYPE_CHECK: u8 = 40;

    /// Comparison: <, <=, >, >=
    pub const COMPARISON: u8 = 50;

    /// Additive: +, -
    pub const ADDITIVE: u8 = 60;

    /// Multiplicative: *, /
    pub const MULTIPLICATIVE: u8 = 70;
}

/// Binding powers and operator for an infix token.
///
/// Left-associative operators use `right_bp = left_bp + 1`.
fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8, BinOp)> {
    let entry = match kind {
        TokenKind::OrOr => (bp::LOGICAL_OR, bp::LOGICAL_OR + 1, BinOp::Or),
        TokenKind::AndAnd => (bp::LOGICAL_AND, bp::LOGICAL_AND + 1, BinOp::And),
        TokenKind::EqEq => (bp::EQUALITY, bp::EQUALITY + 1, BinOp::Eq),
        TokenKind::NotEq => (bp::EQUALITY, bp::EQUALITY + 1, BinOp::Ne),
        TokenKind::Lt => (bp::COMPARISON, bp::COMPARISON + 1, BinOp::Lt),
        TokenKind::Gt => (bp::COMPARISON, bp::COMPARISON + 1, BinOp::Gt),
        TokenKind::LtEq => (bp::COMPARISON, bp::COMPARISON + 1, BinOp::Le),
        TokenKind::GtEq => (bp::COMPARISON, bp::COMPARISON + 1, BinOp::Ge),
        TokenKind::Plus => (bp::ADDITIVE, bp::ADDITIVE + 1, BinOp::Add),
        TokenKind::Minus => (bp::ADDITIVE, bp::ADDITIVE + 1, BinOp::Sub),
        TokenKind::Star => (bp::MULTIPLICATIVE, bp::MULTIPLICATIVE + 1, BinOp::Mul),
        TokenKind::Slash => (bp::MULTIPLICATIVE, bp::MULTIPLICATIVE + 1, BinOp::Div),
        _ => return None,
    };
    Some(entry)
}

/// Head shapes that can take a brace literal.
enum LiteralHead {
    Struct(Ident),
    Variant(Ident, sailc_util::Symbol),
}

impl Parser {
    /// Main expression entry point: assignment level, right-associative.
    pub(crate) fn parse_expr(&mut self) -> CompileResult<Expr> {
        let lhs = self.parse_range()?;

        let op = match self.peek_kind() {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusAssign => AssignOp::Add,
            TokenKind::MinusAssign => AssignOp::Sub,
            TokenKind::StarAssign => AssignOp::Mul,
            TokenKind::SlashAssign => AssignOp::Div,
            _ => return Ok(lhs),
        };

        if !matches!(lhs, Expr::Ident(_) | Expr::Member(_) | Expr::Index(_)) {
            return Err(self.error_at("invalid assignment target"));
        }
        self.advance();
        let value = self.parse_expr()?;
        let span = lhs.span().merge(value.span());
        Ok(Expr::Assign(AssignExpr {
            target: Box::new(lhs),
            op,
            value: Box::new(value),
            span,
        }))
    }

    /// Range level: `start..end`.
    fn parse_range(&mut self) -> CompileResult<Expr> {
        let start = self.parse_bp(bp::MIN)?;
        if self.at(TokenKind::Dot) && self.peek_ahead(1).kind == TokenKind::Dot {
            self.advance();
            self.advance();
            let end = self.parse_bp(bp::MIN)?;
            let span = start.span().merge(end.span());
            return Ok(Expr::Range(RangeExpr {
                start: Box::new(start),
                end: Box::new(end),
                span,
            }));
        }
        Ok(start)
    }

    /// Pratt core: parse an expression whose operators all bind at least
    /// as tightly as `min_bp`.
    fn parse_bp(&mut self, min_bp: u8) -> CompileResult<Expr> {
        let mut lhs = self.parse_unary()?;

        loop {
            // `expr is Type` sits between equality and comparison
            if self.at(TokenKind::Is) && bp::TYPE_CHECK >= min_bp {
                self.advance();
                let ty = self.parse_type()?;
                let span = lhs.span().merge(ty.span());
                lhs = Expr::Is(IsExpr {
                    expr: Box::new(lhs),
                    ty,
                    span,
                });
                continue;
            }

            let Some((left_bp, right_bp, op)) = infix_binding_power(self.peek_kind()) else {
                break;
            };
            if left_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_bp(right_bp)?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(BinaryExpr {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
            });
        }

        Ok(lhs)
    }

    /// Prefix operators: `-`, `!`, `await`.
    fn parse_unary(&mut self) -> CompileResult<Expr> {
        match self.peek_kind() {
            TokenKind::Minus => {
                let token = self.advance();
                let operand = self.parse_unary()?;
                let span = token.span.merge(operand.span());
                Ok(Expr::Unary(UnaryExpr {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                    span,
                }))
            }
            TokenKind::Not => {
                let token = self.advance();
                let operand = self.parse_unary()?;
                let span = token.span.merge(operand.span());
                Ok(Expr::Unary(UnaryExpr {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    span,
                }))
            }
            TokenKind::Await => {
                let token = self.advance();
                let operand = self.parse_unary()?;
                let span = token.span.merge(operand.span());
                Ok(Expr::Await(AwaitExpr {
                    expr: Box::new(operand),
                    span,
                }))
            }
            _ => self.parse_postfix(),
        }
    }

    /// Postfix chain: calls, indexing, member access, generic
    /// application, struct/enum literals.
    fn parse_postfix(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    let span = expr.span().merge(self.prev_span());
                    expr = Expr::Call(CallExpr {
                        callee: Box::new(expr),
                        args,
                        span,
                    });
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.with_struct_literals(|p| p.parse_expr())?;
                    self.expect(TokenKind::RBracket)?;
                    let span = expr.span().merge(self.prev_span());
                    expr = Expr::Index(IndexExpr {
                        object: Box::new(expr),
                        index: Box::new(index),
                        span,
                    });
                }
                // A single dot is member access; `..` belongs to range
                TokenKind::Dot if self.peek_ahead(1).kind != TokenKind::Dot => {
                    self.advance();
                    let (member, member_span) = self.expect_member_name()?;
                    let span = expr.span().merge(member_span);
                    expr = Expr::Member(MemberExpr {
                        object: Box::new(expr),
                        member,
                        span,
                    });
                }
                // `Name<T, ...>(args)` generic application; falls back to
                // comparison when the try-parse fails
                TokenKind::Lt => {
                    let applied = match &expr {
                        Expr::Ident(base) => self.try_parse_type_application(base.clone())?,
                        _ => None,
                    };
                    match applied {
                        Some(applied) => expr = applied,
                        None => break,
                    }
                }
                // `Name { ... }` struct literal / `Enum.Variant { ... }`
                TokenKind::LBrace if !self.no_struct_literal && self.brace_starts_literal() => {
                    let head = match expr {
                        Expr::Ident(name) => LiteralHead::Struct(name),
                        Expr::Member(member) => match *member.object {
                            Expr::Ident(enum_name) => {
                                LiteralHead::Variant(enum_name, member.member)
                            }
                            object => {
                                // `a.b.c { ... }` is not a literal head
                                expr = Expr::Member(MemberExpr {
                                    object: Box::new(object),
                                    member: member.member,
                                    span: member.span,
                                });
                                break;
                            }
                        },
                        other => {
                            expr = other;
                            break;
                        }
                    };
                    let fields = self.parse_field_inits()?;
                    let end = self.prev_span();
                    expr = match head {
                        LiteralHead::Struct(name) => {
                            let span = name.span.merge(end);
                            Expr::StructLit(StructLit { name, fields, span })
                        }
                        LiteralHead::Variant(enum_name, variant) => {
                            let span = enum_name.span.merge(end);
                            Expr::EnumVariant(EnumVariantLit {
                                enum_name,
                                variant,
                                fields,
                                span,
                            })
                        }
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Primary expressions: literals, identifiers, grouping, lambdas,
    /// collection literals, match/async/routine/parallel forms.
    fn parse_primary(&mut self) -> CompileResult<Expr> {
        match self.peek_kind() {
            TokenKind::Number => {
                let token = self.advance();
                let value = self.number_value(token.text.as_str(), token.span)?;
                Ok(Expr::Number(NumberLit {
                    value,
                    span: token.span,
                }))
            }
            TokenKind::Str => {
                let token = self.advance();
                Ok(Expr::Str(StrLit {
                    value: token.text,
                    span: token.span,
                }))
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance();
                Ok(Expr::Bool(BoolLit {
                    value: token.kind == TokenKind::True,
                    span: token.span,
                }))
            }
            TokenKind::Null => {
                let token = self.advance();
                Ok(Expr::Null(token.span))
            }
            TokenKind::Identifier => {
                // Contextual keyword: `parallel [thunks]`
                if self.peek().text == sym::PARALLEL
                    && self.peek_ahead(1).kind == TokenKind::LBracket
                {
                    return self.parse_parallel();
                }
                let token = self.advance();
                Ok(Expr::Ident(Ident {
                    name: token.text,
                    span: token.span,
                }))
            }
            TokenKind::LParen => {
                if self.lparen_starts_lambda() {
                    self.parse_lambda(None)
                } else {
                    self.advance();
                    let expr = self.with_struct_literals(|p| p.parse_expr())?;
                    self.expect(TokenKind::RParen)?;
                    Ok(expr)
                }
            }
            TokenKind::Lambda => {
                let token = self.advance();
                self.parse_lambda(Some(token.span))
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_dict_literal(),
            TokenKind::Match => {
                let node = self.parse_match_node()?;
                Ok(Expr::Match(Box::new(node)))
            }
            TokenKind::Async => {
                let token = self.advance();
                let body = self.parse_block()?;
                let span = token.span.merge(self.prev_span());
                Ok(Expr::AsyncBlock(AsyncBlockExpr { body, span }))
            }
            TokenKind::Routine => {
                let routine = self.parse_routine()?;
                Ok(Expr::Routine(routine))
            }
            _ => Err(self.error_expected(&[
                TokenKind::Number,
                TokenKind::Str,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::LBracket,
                TokenKind::LBrace,
                TokenKind::Match,
                TokenKind::Async,
                TokenKind::Routine,
                TokenKind::Lambda,
            ])),
        }
    }

    /// Convert a number lexeme, preserving the int/float distinction.
    fn number_value(&self, text: &str, span: Span) -> CompileResult<NumberValue> {
        if text.contains('.') {
            text.parse::<f64>().map(NumberValue::Float).map_err(|_| {
                sailc_util::CompileError::Parser {
                    message: format!("malformed number literal '{}'", text),
                    found: "number literal".into(),
                    expected: Vec::new(),
                    span,
                }
            })
        } else {
            match text.parse::<i64>() {
                Ok(value) => Ok(NumberValue::Int(value)),
                // Out of i64 range: carry it as a float like the target does
                Err(_) => text.parse::<f64>().map(NumberValue::Float).map_err(|_| {
                    sailc_util::CompileError::Parser {
                        message: format!("malformed number literal '{}'", text),
                        found: "number literal".into(),
                        expected: Vec::new(),
                        span,
                    }
                }),
            }
        }
    }

    /// `parallel [thunk, thunk, ...]`
    fn parse_parallel(&mut self) -> CompileResult<Expr> {
        let start = self.advance().span; // `parallel`
        self.expect(TokenKind::LBracket)?;
        let mut tasks = Vec::new();
        self.with_struct_literals(|p| {
            while !p.at(TokenKind::RBracket) {
                tasks.push(p.parse_expr()?);
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
            Ok(())
        })?;
        self.expect(TokenKind::RBracket)?;
        let span = start.merge(self.prev_span());
        Ok(Expr::Parallel(ParallelExpr { tasks, span }))
    }

    /// `[a, b, c]`
    fn parse_array_literal(&mut self) -> CompileResult<Expr> {
        let start = self.expect(TokenKind::LBracket)?.span;
        let mut elements = Vec::new();
        self.with_struct_literals(|p| {
            while !p.at(TokenKind::RBracket) {
                elements.push(p.parse_expr()?);
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
            Ok(())
        })?;
        self.expect(TokenKind::RBracket)?;
        let span = start.merge(self.prev_span());
        Ok(Expr::Array(ArrayLit { elements, span }))
    }

    /// `{ key: value, ... }` in expression-prefix position.
    ///
    /// Keys are identifiers (taken as string keys), strings, or numbers.
    fn parse_dict_literal(&mut self) -> CompileResult<Expr> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut entries = Vec::new();
        self.with_struct_literals(|p| {
            while !p.at(TokenKind::RBrace) {
                let key = match p.peek_kind() {
                    TokenKind::Identifier => {
                        let token = p.advance();
                        Expr::Ident(Ident {
                            name: token.text,
                            span: token.span,
                        })
                    }
                    TokenKind::Str => {
                        let token = p.advance();
                        Expr::Str(StrLit {
                            value: token.text,
                            span: token.span,
                        })
                    }
                    TokenKind::Number => {
                        let token = p.advance();
                        let value = p.number_value(token.text.as_str(), token.span)?;
                        Expr::Number(NumberLit {
                            value,
                            span: token.span,
                        })
                    }
                    _ => {
                        return Err(p.error_expected(&[
                            TokenKind::Identifier,
                            TokenKind::Str,
                            TokenKind::Number,
                        ]))
                    }
                };
                p.expect(TokenKind::Colon)?;
                let value = p.parse_expr()?;
                entries.push((key, value));
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
            Ok(())
        })?;
        self.expect(TokenKind::RBrace)?;
        let span = start.merge(self.prev_span());
        Ok(Expr::Dict(DictLit { entries, span }))
    }

    /// `routine [name] { ... }` in expression or statement position.
    pub(crate) fn parse_routine(&mut self) -> CompileResult<RoutineExpr> {
        let start = self.expect(TokenKind::Routine)?.span;
        let name = if self.at(TokenKind::Identifier) {
            let (name, _) = self.expect_identifier()?;
            Some(name)
        } else {
            None
        };
        let body = self.parse_block()?;
        let span = start.merge(self.prev_span());
        Ok(RoutineExpr { name, body, span })
    }

    /// Arguments of a call, after the opening `(`; consumes the `)`.
    pub(crate) fn parse_call_args(&mut self) -> CompileResult<Vec<Expr>> {
        let mut args = Vec::new();
        self.with_struct_literals(|p| {
            while !p.at(TokenKind::RParen) {
                args.push(p.parse_expr()?);
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
            Ok(())
        })?;
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    /// Bounded try-parse for `Name<T, ...>(args)`.
    ///
    /// Commits only when the full shape `< Type {, Type} > (` is present;
    /// any failure rewinds and leaves the `<` for the comparison ladder.
    fn try_parse_type_application(&mut self, base: Ident) -> CompileResult<Option<Expr>> {
        let snap = self.snapshot();
        self.advance(); // `<`

        let mut type_args = Vec::new();
        loop {
            match self.parse_type() {
                Ok(ty) => type_args.push(ty),
                Err(_) => {
                    self.restore(snap);
                    return Ok(None);
                }
            }
            if self.eat(TokenKind::Comma) {
                continue;
            }
            break;
        }
        if !self.eat(TokenKind::Gt) || !self.at(TokenKind::LParen) {
            self.restore(snap);
            return Ok(None);
        }

        self.advance(); // `(`
        let args = self.parse_call_args()?;
        let span = base.span.merge(self.prev_span());
        Ok(Some(Expr::TypeApply(TypeApplyExpr {
            base,
            type_args,
            args: Some(args),
            span,
        })))
    }

    /// Struct-literal lookahead: the brace must be followed by
    /// `ident :`, `ident ,`, `ident }`, or an immediate `}`.
    fn brace_starts_literal(&self) -> bool {
        match self.peek_ahead(1).kind {
            TokenKind::RBrace => true,
            TokenKind::Identifier => matches!(
                self.peek_ahead(2).kind,
                TokenKind::Colon | TokenKind::Comma | TokenKind::RBrace
            ),
            _ => false,
        }
    }

    /// Field initializers `{ name: expr, shorthand, ... }`, consuming
    /// both braces.
    fn parse_field_inits(&mut self) -> CompileResult<Vec<FieldInit>> {
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        self.with_struct_literals(|p| {
            while !p.at(TokenKind::RBrace) {
                let (name, name_span) = p.expect_identifier()?;
                let value = if p.eat(TokenKind::Colon) {
                    p.parse_expr()?
                } else {
                    // Shorthand `{ name }` binds the same-named variable
                    Expr::Ident(Ident {
                        name,
                        span: name_span,
                    })
                };
                let span = name_span.merge(value.span());
                fields.push(FieldInit { name, value, span });
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
            Ok(())
        })?;
        self.expect(TokenKind::RBrace)?;
        Ok(fields)
    }

    /// Decide between a lambda and a parenthesized expression by
    /// scanning past the matching `)` for `->` or `{`.
    ///
    /// In condition position (`no_struct_literal`) a brace after the
    /// `)` opens the statement's block (`if (a > b) { ... }`), so only
    /// `->` commits to a lambda there.
    fn lparen_starts_lambda(&self) -> bool {
        let mut offset = 1;
        let mut depth = 1usize;
        loop {
            let kind = self.peek_ahead(offset).kind;
            match kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        let after = self.peek_ahead(offset + 1).kind;
                        return after == TokenKind::Arrow
                            || (after == TokenKind::LBrace && !self.no_struct_literal);
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            offset += 1;
        }
    }

    /// `(params) [-> Type] { body }`, optionally introduced by the
    /// `lambda` keyword whose span is passed in.
    fn parse_lambda(&mut self, keyword_span: Option<Span>) -> CompileResult<Expr> {
        let start = keyword_span.unwrap_or(self.peek().span);
        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        let return_type = if self.eat(TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        let span = start.merge(self.prev_span());
        Ok(Expr::Lambda(LambdaExpr {
            params,
            return_type,
            body,
            span,
        }))
    }
}
