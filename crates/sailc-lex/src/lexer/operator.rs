//! Operator and compound-assignment lexing.
//!
//! All multi-character operators need exactly one character of lookahead,
//! provided by `Cursor::eat`. `<` is always lexed as a comparison token;
//! telling generic brackets apart from comparisons is the parser's job.

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Lex `+` or `+=`.
    pub(crate) fn lex_plus(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('=') {
            self.finish(TokenKind::PlusAssign)
        } else {
            self.finish(TokenKind::Plus)
        }
    }

    /// Lex `-`, `-=`, or `->`.
    pub(crate) fn lex_minus(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('=') {
            self.finish(TokenKind::MinusAssign)
        } else if self.cursor.eat('>') {
            self.finish(TokenKind::Arrow)
        } else {
            self.finish(TokenKind::Minus)
        }
    }

    /// Lex `*` or `*=`.
    pub(crate) fn lex_star(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('=') {
            self.finish(TokenKind::StarAssign)
        } else {
            self.finish(TokenKind::Star)
        }
    }

    /// Lex `/` or `/=`.
    ///
    /// Comments were already consumed by the whitespace skipper, so a
    /// slash here is always an operator.
    pub(crate) fn lex_slash(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('=') {
            self.finish(TokenKind::SlashAssign)
        } else {
            self.finish(TokenKind::Slash)
        }
    }

    /// Lex `=`, `==`, or `=>`.
    pub(crate) fn lex_equals(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('=') {
            self.finish(TokenKind::EqEq)
        } else if self.cursor.eat('>') {
            self.finish(TokenKind::FatArrow)
        } else {
            self.finish(TokenKind::Assign)
        }
    }

    /// Lex `!` or `!=`.
    pub(crate) fn lex_bang(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('=') {
            self.finish(TokenKind::NotEq)
        } else {
            self.finish(TokenKind::Not)
        }
    }

    /// Lex `<` or `<=`.
    pub(crate) fn lex_less(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('=') {
            self.finish(TokenKind::LtEq)
        } else {
            self.finish(TokenKind::Lt)
        }
    }

    /// Lex `>` or `>=`.
    pub(crate) fn lex_greater(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('=') {
            self.finish(TokenKind::GtEq)
        } else {
            self.finish(TokenKind::Gt)
        }
    }

    /// Lex `&` or `&&`.
    pub(crate) fn lex_ampersand(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('&') {
            self.finish(TokenKind::AndAnd)
        } else {
            self.finish(TokenKind::Amp)
        }
    }

    /// Lex `|` or `||`.
    pub(crate) fn lex_pipe(&mut self) -> Token {
        self.cursor.bump();
        if self.cursor.eat('|') {
            self.finish(TokenKind::OrOr)
        } else {
            self.finish(TokenKind::Pipe)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_arithmetic_and_compound() {
        assert_eq!(
            kinds("+ - * / += -= *= /="),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::PlusAssign,
                TokenKind::MinusAssign,
                TokenKind::StarAssign,
                TokenKind::SlashAssign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comparison_lookahead() {
        assert_eq!(
            kinds("< <= > >= == != ="),
            vec![
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Assign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_logical_and_bitwise() {
        assert_eq!(
            kinds("&& & || | !"),
            vec![
                TokenKind::AndAnd,
                TokenKind::Amp,
                TokenKind::OrOr,
                TokenKind::Pipe,
                TokenKind::Not,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_arrows() {
        assert_eq!(
            kinds("-> => - ="),
            vec![
                TokenKind::Arrow,
                TokenKind::FatArrow,
                TokenKind::Minus,
                TokenKind::Assign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_adjacent_operators() {
        // `a<=b` without spaces
        assert_eq!(
            kinds("a<=b"),
            vec![
                TokenKind::Identifier,
                TokenKind::LtEq,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_generic_looking_sequence() {
        // The lexer never guesses about generics: `Channel<number>` is
        // ident, `<`, ident, `>`
        assert_eq!(
            kinds("Channel<number>(10)"),
            vec![
                TokenKind::Identifier,
                TokenKind::Lt,
                TokenKind::Identifier,
                TokenKind::Gt,
                TokenKind::LParen,
                TokenKind::Number,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }
}
