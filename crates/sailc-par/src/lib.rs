//! sailc-par - Parser for the Sailfin language.
//!
//! Recursive descent for declarations and statements, Pratt-style
//! precedence climbing for expressions. The grammar sketch (EBNF-ish):
//!
//! ```text
//! program     = { statement } ;
//! statement   = import | type_alias | interface | struct | enum
//!             | function | let | const | return | if | match | for
//!             | while | loop | break | continue | throw | assert
//!             | try | test | routine | expr ";" ;
//! function    = { "@" ident } [ "async" ] "fn" name [ "<" idents ">" ]
//!               "(" params ")" [ "->" type ] block ;
//! block       = "{" { statement } "}" ;
//! expr        = assignment ;
//! assignment  = range [ ("=" | "+=" | "-=" | "*=" | "/=") assignment ] ;
//! range       = or [ ".." or ] ;
//! ```
//!
//! The expression ladder, loosest first: assignment, `||`, `&&`,
//! equality, `is`, comparison, additive, multiplicative, unary
//! (`-`, `!`, `await`), postfix (`.`, `[]`, `(...)`, struct literal
//! braces), primary.
//!
//! Four constructs need contextual disambiguation, all handled here with
//! bounded lookahead or snapshot/restore try-parses; the code generator
//! never compensates for a mis-parse:
//!
//! 1. `Name<T>(args)` vs `(Name < T) > args`: commit to a
//!    `TypeApply` node only when the token shape `< Type {, Type} > (`
//!    parses, otherwise fall back to comparisons.
//! 2. `Name { ... }` struct literal vs a block: a literal only in
//!    expression context with the brace followed by `ident :`,
//!    `ident ,`, `ident }` or `}`; suppressed entirely in condition
//!    position (`if`/`while`/`match` heads, `for` iterables).
//! 3. `(params) -> T { ... }` lambda vs parenthesized expression:
//!    decided by scanning past the matching `)` for `->` or `{`.
//! 4. Match arm bodies: either a block or a single expression,
//!    terminated by `,` or `}`.
//!
//! The parser consumes the whole token stream to EOF and fails fast with
//! a `ParserError` listing the token kinds acceptable at the failure
//! point.

pub mod ast;
mod edge_cases;
mod expr;
mod items;
mod pattern;
mod stmt;
mod types;

pub use ast::Program;

use sailc_lex::{Token, TokenKind};
use sailc_util::{CompileError, CompileResult, Span, Symbol};

/// Parse a token stream (as produced by `sailc_lex::Lexer::tokenize`,
/// EOF-terminated) into a program.
pub fn parse(tokens: Vec<Token>) -> CompileResult<Program> {
    Parser::new(tokens).parse_program()
}

/// Token-stream parser.
pub struct Parser {
    /// Token stream, terminated by EOF
    tokens: Vec<Token>,

    /// Current position in the token stream
    position: usize,

    /// Set while parsing an expression whose block follows immediately
    /// (`if`/`while`/`match` heads, `for` iterables); suppresses the
    /// struct-literal interpretation of `Name {`.
    pub(crate) no_struct_literal: bool,
}

impl Parser {
    /// Create a parser over a token stream.
    ///
    /// The stream must be EOF-terminated; an EOF token is appended if the
    /// caller handed over a bare slice.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or(Span::DUMMY);
            tokens.push(Token::new(TokenKind::Eof, Symbol::intern(""), span));
        }
        Self {
            tokens,
            position: 0,
            no_struct_literal: false,
        }
    }

    /// Parse the whole program, consuming every token up to EOF.
    pub fn parse_program(&mut self) -> CompileResult<ast::Program> {
        let start = self.peek().span;
        let mut statements = Vec::new();
        while !self.at(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        let span = if statements.is_empty() {
            start
        } else {
            start.merge(self.peek().span)
        };
        Ok(ast::Program { statements, span })
    }

    /// Parse a single statement, dispatching on the leading token.
    pub(crate) fn parse_statement(&mut self) -> CompileResult<ast::Stmt> {
        match self.peek_kind() {
            TokenKind::Import => self.parse_import(),
            TokenKind::Type => self.parse_type_alias(),
            TokenKind::Interface => self.parse_interface(),
            TokenKind::Struct => self.parse_struct(),
            TokenKind::Enum => self.parse_enum(),
            TokenKind::At | TokenKind::Fn => self.parse_function(),
            // `async fn` declares a function; a bare `async { ... }` is an
            // expression statement
            TokenKind::Async if self.peek_ahead(1).kind == TokenKind::Fn => self.parse_function(),
            TokenKind::Let => self.parse_let(),
            TokenKind::Const => self.parse_const(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::Match => self.parse_match_statement(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Loop => self.parse_loop(),
            TokenKind::Break => {
                let token = self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(ast::Stmt::Break(token.span))
            }
            TokenKind::Continue => {
                let token = self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(ast::Stmt::Continue(token.span))
            }
            TokenKind::Throw => self.parse_throw(),
            TokenKind::Assert => self.parse_assert(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Test => self.parse_test(),
            TokenKind::Routine => self.parse_routine_statement(),
            _ => self.parse_expr_statement(),
        }
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    /// The current token. The EOF terminator guarantees this is valid.
    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    /// The kind of the current token.
    #[inline]
    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// The token `n` positions ahead, clamped to EOF.
    pub(crate) fn peek_ahead(&self, n: usize) -> &Token {
        let index = (self.position + n).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    /// True when the current token has the given kind.
    #[inline]
    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// Consume and return the current token. Never advances past EOF.
    pub(crate) fn advance(&mut self) -> Token {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    /// Consume the current token if it has the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail with the expected set.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(&[kind]))
        }
    }

    /// Consume an identifier, returning its interned text and span.
    pub(crate) fn expect_identifier(&mut self) -> CompileResult<(Symbol, Span)> {
        if self.at(TokenKind::Identifier) {
            let token = self.advance();
            Ok((token.text, token.span))
        } else {
            Err(self.error_expected(&[TokenKind::Identifier]))
        }
    }

    /// Consume a member name after `.`: an identifier or the `new`
    /// constructor name.
    pub(crate) fn expect_member_name(&mut self) -> CompileResult<(Symbol, Span)> {
        match self.peek_kind() {
            TokenKind::Identifier | TokenKind::New => {
                let token = self.advance();
                Ok((token.text, token.span))
            }
            _ => Err(self.error_expected(&[TokenKind::Identifier, TokenKind::New])),
        }
    }

    /// The span of the most recently consumed token.
    pub(crate) fn prev_span(&self) -> Span {
        if self.position == 0 {
            self.peek().span
        } else {
            self.tokens[self.position - 1].span
        }
    }

    /// Save the current stream position for a bounded try-parse.
    pub(crate) fn snapshot(&self) -> usize {
        self.position
    }

    /// Rewind to a saved position.
    pub(crate) fn restore(&mut self, position: usize) {
        self.position = position;
    }

    /// Run `f` with struct literals re-enabled (inside brackets the
    /// ambiguity with blocks disappears), restoring the flag afterwards.
    pub(crate) fn with_struct_literals<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        let saved = self.no_struct_literal;
        self.no_struct_literal = false;
        let result = f(self);
        self.no_struct_literal = saved;
        result
    }

    /// Run `f` with struct literals suppressed (condition position),
    /// restoring the flag afterwards.
    pub(crate) fn without_struct_literals<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        let saved = self.no_struct_literal;
        self.no_struct_literal = true;
        let result = f(self);
        self.no_struct_literal = saved;
        result
    }

    /// Build a `ParserError` at the current token, naming the token kinds
    /// the grammar would have accepted here.
    pub(crate) fn error_expected(&self, expected: &[TokenKind]) -> CompileError {
        let found = self.peek();
        let expected_names: Vec<String> =
            expected.iter().map(|k| k.describe().to_string()).collect();
        let message = if found.kind == TokenKind::Eof {
            "unexpected end of file".to_string()
        } else {
            format!("unexpected token {}", found.kind.describe())
        };
        CompileError::Parser {
            message,
            found: found.kind.describe().to_string(),
            expected: expected_names,
            span: found.span,
        }
    }

    /// Build a `ParserError` at the current token with a custom message.
    pub(crate) fn error_at(&self, message: impl Into<String>) -> CompileError {
        let found = self.peek();
        CompileError::Parser {
            message: message.into(),
            found: found.kind.describe().to_string(),
            expected: Vec::new(),
            span: found.span,
        }
    }
}
