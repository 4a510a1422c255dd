//! sailc-lex - Lexical analyzer for the Sailfin language.
//!
//! Transforms `.sfn` source text into a stream of [`Token`]s in a single
//! left-to-right pass with one character of lookahead (two for the
//! compound operators `+= -= *= /= == != <= >= && || -> =>` and the
//! comment openers).
//!
//! Token categories:
//!
//! 1. **Reserved words** - `fn`, `let`, `mut`, `const`, `match`,
//!    `routine`, ... recognized by a fixed table lookup on identifier
//!    text; reserved words always win over identifiers.
//! 2. **Identifiers** - `[A-Za-z_][A-Za-z0-9_]*`; a lone `_` is the
//!    wildcard token, not an identifier.
//! 3. **Literals** - numbers `[0-9]+(\.[0-9]+)?` (integer/float
//!    distinction preserved through the raw text), double-quoted strings
//!    with standard escapes and no raw newlines.
//! 4. **Operators and punctuation** - see [`TokenKind`].
//! 5. **EOF** - always the final token, carrying the line number of the
//!    last real token.
//!
//! Whitespace and comments (`//` to end of line, non-nesting `/* */`)
//! are discarded but advance line/column tracking. The lexer fails fast:
//! the first illegal character or unterminated literal aborts the scan
//! with a `LexerError` carrying line and column.
//!
//! `<` is deliberately lexed as a plain comparison token even when it
//! opens a generic argument list; resolving `Channel<number>(10)` against
//! `a < b > c` takes grammar context the scanner does not have, and is the
//! parser's job.

pub mod cursor;
mod edge_cases;
pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};
