//! Stable codes for everything sailc can report.
//!
//! Compilation is fail-fast and every diagnostic is an error, so a code
//! is nothing more than a number. Numbering is grouped by the pipeline
//! stage that raises it: 1xxx lexer, 2xxx parser, 3xxx validator, 4xxx
//! module loading, 9xxx internal. The rendered form prefixes `E` and
//! zero-pads to four digits.

use std::fmt;

/// Identifies one kind of diagnostic, stable across releases.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode(pub u16);

impl DiagnosticCode {
    // Lexer
    pub const UNEXPECTED_CHAR: DiagnosticCode = DiagnosticCode(1001);
    pub const UNTERMINATED_STRING: DiagnosticCode = DiagnosticCode(1002);
    pub const UNTERMINATED_COMMENT: DiagnosticCode = DiagnosticCode(1003);
    pub const NEWLINE_IN_STRING: DiagnosticCode = DiagnosticCode(1004);
    pub const BAD_ESCAPE: DiagnosticCode = DiagnosticCode(1005);

    // Parser
    pub const UNEXPECTED_TOKEN: DiagnosticCode = DiagnosticCode(2001);
    pub const UNEXPECTED_EOF: DiagnosticCode = DiagnosticCode(2002);

    // Validator
    pub const INVALID_NAME: DiagnosticCode = DiagnosticCode(3001);
    pub const INVALID_TYPE: DiagnosticCode = DiagnosticCode(3002);
    pub const INVALID_PATTERN: DiagnosticCode = DiagnosticCode(3003);
    pub const RETURN_OUTSIDE_FN: DiagnosticCode = DiagnosticCode(3004);
    pub const INVALID_IMPORT: DiagnosticCode = DiagnosticCode(3005);
    pub const AWAIT_OUTSIDE_ASYNC: DiagnosticCode = DiagnosticCode(3006);

    // Module loading
    pub const MODULE_NOT_FOUND: DiagnosticCode = DiagnosticCode(4001);
    pub const IMPORT_CYCLE: DiagnosticCode = DiagnosticCode(4002);

    // Internal
    pub const INTERNAL: DiagnosticCode = DiagnosticCode(9001);

    /// The pipeline stage that owns this code (1 lexer .. 9 internal).
    pub fn stage(&self) -> u16 {
        self.0 / 1000
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.0)
    }
}

impl fmt::Debug for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DiagnosticCode(E{:04})", self.0)
    }
}
