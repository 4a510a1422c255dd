//! Statement parsing: control flow, blocks, and match arms.

use sailc_lex::TokenKind;
use sailc_util::CompileResult;

use crate::ast::*;
use crate::Parser;

impl Parser {
    /// `{ statements }`
    pub(crate) fn parse_block(&mut self) -> CompileResult<Vec<Stmt>> {
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(statements)
    }

    /// `if cond { ... } [else if ... | else { ... }]`
    pub(crate) fn parse_if(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::If)?.span;
        let condition = self.without_struct_literals(|p| p.parse_expr())?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.eat(TokenKind::Else) {
            if self.at(TokenKind::If) {
                // `else if` nests as a single-statement else branch
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        let span = start.merge(self.prev_span());
        Ok(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            span,
        }))
    }

    /// `while cond { ... }`
    pub(crate) fn parse_while(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::While)?.span;
        let condition = self.without_struct_literals(|p| p.parse_expr())?;
        let body = self.parse_block()?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::While(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    /// `for pattern in iterable { ... }`
    pub(crate) fn parse_for(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::For)?.span;
        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::In)?;
        let iterable = self.without_struct_literals(|p| p.parse_expr())?;
        let body = self.parse_block()?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::For(ForStmt {
            pattern,
            iterable,
            body,
            span,
        }))
    }

    /// `loop { ... }`
    pub(crate) fn parse_loop(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Loop)?.span;
        let body = self.parse_block()?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::Loop(LoopStmt { body, span }))
    }

    /// `return [expr];`
    pub(crate) fn parse_return(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Return)?.span;
        let value = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::Return(ReturnStmt { value, span }))
    }

    /// `throw expr;`
    pub(crate) fn parse_throw(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Throw)?.span;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::Throw(ThrowStmt { value, span }))
    }

    /// `assert cond [, message];`
    pub(crate) fn parse_assert(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Assert)?.span;
        let condition = self.parse_expr()?;
        let message = if self.eat(TokenKind::Comma) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::Assert(AssertStmt {
            condition,
            message,
            span,
        }))
    }

    /// `try { ... } [catch (err) { ... }]* [finally { ... }]`
    pub(crate) fn parse_try(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Try)?.span;
        let body = self.parse_block()?;

        let mut catches = Vec::new();
        while self.at(TokenKind::Catch) {
            let catch_start = self.advance().span;
            self.expect(TokenKind::LParen)?;
            let (name, _) = self.expect_identifier()?;
            self.expect(TokenKind::RParen)?;
            let catch_body = self.parse_block()?;
            let span = catch_start.merge(self.prev_span());
            catches.push(CatchClause {
                name,
                body: catch_body,
                span,
            });
        }

        let finally = if self.eat(TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if catches.is_empty() && finally.is_none() {
            return Err(self.error_expected(&[TokenKind::Catch, TokenKind::Finally]));
        }

        let span = start.merge(self.prev_span());
        Ok(Stmt::Try(TryStmt {
            body,
            catches,
            finally,
            span,
        }))
    }

    /// A match in statement position.
    pub(crate) fn parse_match_statement(&mut self) -> CompileResult<Stmt> {
        let node = self.parse_match_node()?;
        Ok(Stmt::Match(node))
    }

    /// `match scrutinee { arms }`, shared by statement and expression
    /// positions.
    pub(crate) fn parse_match_node(&mut self) -> CompileResult<MatchNode> {
        let start = self.expect(TokenKind::Match)?.span;
        let scrutinee = self.without_struct_literals(|p| p.parse_expr())?;
        self.expect(TokenKind::LBrace)?;

        let mut arms = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            arms.push(self.parse_match_arm()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;

        let span = start.merge(self.prev_span());
        Ok(MatchNode {
            scrutinee,
            arms,
            span,
        })
    }

    /// `pattern [if guard] => (block | expr)`
    fn parse_match_arm(&mut self) -> CompileResult<MatchArm> {
        let pattern = self.parse_pattern()?;
        let guard = if self.eat(TokenKind::If) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::FatArrow)?;
        let body = if self.at(TokenKind::LBrace) && !self.brace_starts_dict() {
            MatchArmBody::Block(self.parse_block()?)
        } else {
            MatchArmBody::Expr(self.parse_expr()?)
        };
        let span = pattern.span().merge(self.prev_span());
        Ok(MatchArm {
            pattern,
            guard,
            body,
            span,
        })
    }

    /// After `=>`, `{ ident :` or `{ string/number :` opens a dictionary
    /// literal body rather than a block.
    fn brace_starts_dict(&self) -> bool {
        match self.peek_ahead(1).kind {
            TokenKind::Identifier | TokenKind::Str | TokenKind::Number => {
                self.peek_ahead(2).kind == TokenKind::Colon
            }
            _ => false,
        }
    }

    /// `routine [name] { ... }` in statement position.
    pub(crate) fn parse_routine_statement(&mut self) -> CompileResult<Stmt> {
        let routine = self.parse_routine()?;
        Ok(Stmt::Routine(routine))
    }

    /// `expr;`
    pub(crate) fn parse_expr_statement(&mut self) -> CompileResult<Stmt> {
        let expr = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        let span = expr.span().merge(self.prev_span());
        Ok(Stmt::Expr(ExprStmt { expr, span }))
    }
}
