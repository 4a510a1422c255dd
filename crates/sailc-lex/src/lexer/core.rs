//! Core lexer implementation: the `Lexer` struct and its dispatch loop.

use sailc_util::{CompileError, CompileResult, FileId, Span, Symbol};

use crate::cursor::Cursor;
use crate::lexer::identifier::is_ident_continue;
use crate::token::{Token, TokenKind};

/// Lexer for the Sailfin language.
///
/// Transforms source text into a stream of tokens. The scan is a single
/// pass with one character of lookahead (two for the compound operators),
/// failing fast on the first illegal character or unterminated literal.
pub struct Lexer<'a> {
    /// Character cursor for source traversal.
    pub(crate) cursor: Cursor<'a>,

    /// Starting byte offset of the current token.
    pub(crate) token_start: usize,

    /// Line where the current token starts (1-based).
    pub(crate) token_start_line: u32,

    /// Column where the current token starts (1-based).
    pub(crate) token_start_column: u32,

    /// Line of the most recently produced token, carried by the EOF token.
    last_token_line: u32,

    /// File the spans belong to.
    file_id: FileId,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self::with_file(source, FileId::DUMMY)
    }

    /// Creates a new lexer whose spans carry the given file id.
    pub fn with_file(source: &'a str, file_id: FileId) -> Self {
        Self {
            cursor: Cursor::new(source),
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
            last_token_line: 0,
            file_id,
        }
    }

    /// Tokenize an entire source string, including the terminating EOF
    /// token.
    pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
        Self::tokenize_file(source, FileId::DUMMY)
    }

    /// Tokenize a source string with spans bound to `file_id`.
    pub fn tokenize_file(source: &str, file_id: FileId) -> CompileResult<Vec<Token>> {
        let mut lexer = Lexer::with_file(source, file_id);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Returns the next token from the source code.
    ///
    /// Skips whitespace and comments, then dispatches on the current
    /// character. Returns the EOF token (carrying the line of the last
    /// real token) once the input is exhausted.
    pub fn next_token(&mut self) -> CompileResult<Token> {
        self.skip_whitespace_and_comments()?;

        self.token_start = self.cursor.pos();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_eof() {
            let line = if self.last_token_line == 0 {
                1
            } else {
                self.last_token_line
            };
            let pos = self.cursor.pos();
            return Ok(Token::new(
                TokenKind::Eof,
                Symbol::intern(""),
                Span::with_file(pos, pos, self.file_id, line, self.token_start_column),
            ));
        }

        let token = match self.cursor.first() {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            ',' => self.single(TokenKind::Comma),
            '.' => self.single(TokenKind::Dot),
            ':' => self.single(TokenKind::Colon),
            ';' => self.single(TokenKind::Semicolon),
            '@' => self.single(TokenKind::At),
            '?' => self.single(TokenKind::Question),
            '+' => self.lex_plus(),
            '-' => self.lex_minus(),
            '*' => self.lex_star(),
            '/' => self.lex_slash(),
            '=' => self.lex_equals(),
            '!' => self.lex_bang(),
            '<' => self.lex_less(),
            '>' => self.lex_greater(),
            '&' => self.lex_ampersand(),
            '|' => self.lex_pipe(),
            '"' => self.lex_string()?,
            '_' => {
                // `_` alone is the wildcard token; `_foo` is an identifier.
                if is_ident_continue(self.cursor.second()) {
                    self.lex_identifier()
                } else {
                    self.single(TokenKind::Underscore)
                }
            }
            c if c.is_ascii_digit() => self.lex_number(),
            c if c.is_ascii_alphabetic() => self.lex_identifier(),
            c => {
                self.cursor.bump();
                return Err(self.error_at_token(format!("illegal character '{}'", c)));
            }
        };

        self.last_token_line = token.span.line;
        Ok(token)
    }

    /// Consume one character and finish a token of the given kind.
    pub(crate) fn single(&mut self, kind: TokenKind) -> Token {
        self.cursor.bump();
        self.finish(kind)
    }

    /// Finish the current token, taking its text from the source slice.
    pub(crate) fn finish(&self, kind: TokenKind) -> Token {
        let text = self.cursor.slice_from(self.token_start);
        Token::new(kind, Symbol::intern(text), self.token_span())
    }

    /// Finish the current token with explicit (cooked) text.
    pub(crate) fn finish_with_text(&self, kind: TokenKind, text: &str) -> Token {
        Token::new(kind, Symbol::intern(text), self.token_span())
    }

    /// The span from the start of the current token to the cursor.
    pub(crate) fn token_span(&self) -> Span {
        Span::with_file(
            self.token_start,
            self.cursor.pos(),
            self.file_id,
            self.token_start_line,
            self.token_start_column,
        )
    }

    /// A lexer error located at the current token.
    pub(crate) fn error_at_token(&self, message: impl Into<String>) -> CompileError {
        CompileError::lexer(message, self.token_span())
    }
}
