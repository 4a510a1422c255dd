//! Identifier and keyword lexing.

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// True for characters that may start an identifier.
#[inline]
pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// True for characters that may continue an identifier.
#[inline]
pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Lexer<'a> {
    /// Lex an identifier or reserved word.
    ///
    /// The first character has already been validated by the dispatcher;
    /// the text is matched against the reserved-word table once, here.
    pub(crate) fn lex_identifier(&mut self) -> Token {
        while is_ident_continue(self.cursor.first()) {
            self.cursor.bump();
        }
        let text = self.cursor.slice_from(self.token_start);
        match TokenKind::keyword(text) {
            Some(kind) => self.finish(kind),
            None => self.finish(TokenKind::Identifier),
        }
    }
}
