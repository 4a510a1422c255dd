//! Whitespace and comment skipping.
//!
//! `//` comments run to end of line; `/* ... */` comments do not nest and
//! must be closed before end of input. Both advance line/column tracking
//! through the cursor, so spans after a comment stay accurate.

use sailc_util::{CompileError, CompileResult, Span};

use crate::lexer::Lexer;

impl<'a> Lexer<'a> {
    /// Skip all whitespace and comments before the next token.
    ///
    /// Fails on an unterminated block comment.
    pub(crate) fn skip_whitespace_and_comments(&mut self) -> CompileResult<()> {
        loop {
            match self.cursor.first() {
                ' ' | '\t' | '\r' | '\n' => self.cursor.bump(),
                '/' if self.cursor.second() == '/' => {
                    while !self.cursor.is_eof() && self.cursor.first() != '\n' {
                        self.cursor.bump();
                    }
                }
                '/' if self.cursor.second() == '*' => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// Skip a `/* ... */` comment, tracking embedded newlines.
    fn skip_block_comment(&mut self) -> CompileResult<()> {
        let start = self.cursor.pos();
        let line = self.cursor.line();
        let column = self.cursor.column();
        self.cursor.bump(); // '/'
        self.cursor.bump(); // '*'

        loop {
            if self.cursor.is_eof() {
                return Err(CompileError::lexer(
                    "unterminated block comment",
                    Span::new(start, self.cursor.pos(), line, column),
                ));
            }
            if self.cursor.first() == '*' && self.cursor.second() == '/' {
                self.cursor.bump();
                self.cursor.bump();
                return Ok(());
            }
            self.cursor.bump();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::token::TokenKind;

    #[test]
    fn test_line_comment() {
        let tokens = Lexer::tokenize("let x = 1; // trailing\nlet y = 2;").unwrap();
        let lets: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Let)
            .collect();
        assert_eq!(lets.len(), 2);
        assert_eq!(lets[1].line(), 2);
    }

    #[test]
    fn test_comment_only_source() {
        let tokens = Lexer::tokenize("// nothing here\n/* or here */").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_block_comment_updates_line() {
        let tokens = Lexer::tokenize("/* one\ntwo\nthree */ let").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Let);
        assert_eq!(tokens[0].line(), 3);
    }

    #[test]
    fn test_block_comment_does_not_nest() {
        // The first `*/` closes the comment; the rest is real input
        let tokens = Lexer::tokenize("/* outer /* inner */ x").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text.as_str(), "x");
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = Lexer::tokenize("let x = 1; /* runs off").unwrap_err();
        assert!(err.to_string().contains("unterminated block comment"));
    }

    #[test]
    fn test_division_still_works() {
        let tokens = Lexer::tokenize("a / b").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Slash);
    }
}
