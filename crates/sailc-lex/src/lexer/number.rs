//! Number literal lexing.
//!
//! Sailfin numbers are `[0-9]+(\.[0-9]+)?`. The token keeps the raw text;
//! the parser preserves the integer/float distinction when it converts the
//! literal.

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Lex a number literal.
    ///
    /// The dot only belongs to the number when a digit follows, so `1..3`
    /// lexes as `1`, `.`, `.`, `3` and range syntax stays available.
    pub(crate) fn lex_number(&mut self) -> Token {
        while self.cursor.first().is_ascii_digit() {
            self.cursor.bump();
        }
        if self.cursor.first() == '.' && self.cursor.second().is_ascii_digit() {
            self.cursor.bump();
            while self.cursor.first().is_ascii_digit() {
                self.cursor.bump();
            }
        }
        self.finish(TokenKind::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer() {
        let tokens = Lexer::tokenize("42").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text.as_str(), "42");
    }

    #[test]
    fn test_float() {
        let tokens = Lexer::tokenize("3.14").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text.as_str(), "3.14");
    }

    #[test]
    fn test_range_is_not_a_float() {
        let tokens = Lexer::tokenize("1..3").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Number,
                TokenKind::Dot,
                TokenKind::Dot,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[0].text.as_str(), "1");
        assert_eq!(tokens[3].text.as_str(), "3");
    }

    #[test]
    fn test_member_access_on_number() {
        // `1.abs` style: the dot is not consumed without a following digit
        let tokens = Lexer::tokenize("1.x").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[1].kind, TokenKind::Dot);
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_leading_zero() {
        let tokens = Lexer::tokenize("0.5 007").unwrap();
        assert_eq!(tokens[0].text.as_str(), "0.5");
        assert_eq!(tokens[1].text.as_str(), "007");
    }
}
