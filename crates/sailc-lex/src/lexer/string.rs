//! String literal lexing.
//!
//! Strings are double-quoted, support the standard escapes
//! (`\n \t \r \\ \" \0`), and may not contain raw newlines. The token
//! carries the cooked value; interpolation placeholders (`{{ expr }}`)
//! pass through untouched for the code generator.

use sailc_util::CompileResult;

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Lex a string literal, including both quotes.
    pub(crate) fn lex_string(&mut self) -> CompileResult<Token> {
        self.cursor.bump(); // opening quote
        let mut value = String::new();

        loop {
            if self.cursor.is_eof() {
                return Err(self.error_at_token("unterminated string literal"));
            }
            match self.cursor.first() {
                '"' => {
                    self.cursor.bump();
                    break;
                }
                '\n' => {
                    return Err(self.error_at_token("newline in string literal"));
                }
                '\\' => {
                    self.cursor.bump();
                    let escaped = match self.cursor.first() {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '\\' => '\\',
                        '"' => '"',
                        '0' => '\0',
                        c => {
                            return Err(
                                self.error_at_token(format!("invalid escape sequence '\\{}'", c))
                            )
                        }
                    };
                    value.push(escaped);
                    self.cursor.bump();
                }
                c => {
                    value.push(c);
                    self.cursor.bump();
                }
            }
        }

        Ok(self.finish_with_text(TokenKind::Str, &value))
    }
}
