//! Typed compile errors shared by every pipeline stage.
//!
//! Compilation is fail-fast: the first error a stage hits is returned as a
//! [`CompileError`] and ends the session. The driver turns the error into a
//! [`Diagnostic`] for terminal rendering.

use thiserror::Error;

use crate::diagnostic::{Diagnostic, DiagnosticCode, SourceLine};
use crate::span::{SourceMap, Span};

/// Result alias used by all pipeline stages.
pub type CompileResult<T> = std::result::Result<T, CompileError>;

/// The error taxonomy of the compiler.
///
/// Each variant carries the span of the offending construct; `Internal`
/// marks invariant violations inside the compiler itself and must never be
/// reachable from user input.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Illegal character, unterminated string, or unterminated comment.
    #[error("LexerError at line {}, column {}: {message}", .span.line, .span.column)]
    Lexer { message: String, span: Span },

    /// Unexpected token or unclosed construct.
    #[error("ParserError at line {}, column {}: {message}", .span.line, .span.column)]
    Parser {
        message: String,
        /// Display name of the token the parser was looking at
        found: String,
        /// Display names of the token kinds acceptable in this state
        expected: Vec<String>,
        span: Span,
    },

    /// Invalid name, malformed type annotation, or ill-formed pattern.
    #[error("ValidationError at line {}: {message}", .span.line)]
    Validation { message: String, span: Span },

    /// Module not found or circular import.
    #[error("ImportError: {message}")]
    Import { message: String, span: Span },

    /// A bug in the compiler.
    #[error("InternalError: {message}")]
    Internal { message: String },
}

impl CompileError {
    /// Shorthand for a lexer error.
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        CompileError::Lexer {
            message: message.into(),
            span,
        }
    }

    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>, span: Span) -> Self {
        CompileError::Validation {
            message: message.into(),
            span,
        }
    }

    /// Shorthand for an import error.
    pub fn import(message: impl Into<String>, span: Span) -> Self {
        CompileError::Import {
            message: message.into(),
            span,
        }
    }

    /// Shorthand for an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal {
            message: message.into(),
        }
    }

    /// The span the error points at (`Span::DUMMY` for internal errors).
    pub fn span(&self) -> Span {
        match self {
            CompileError::Lexer { span, .. }
            | CompileError::Parser { span, .. }
            | CompileError::Validation { span, .. }
            | CompileError::Import { span, .. } => *span,
            CompileError::Internal { .. } => Span::DUMMY,
        }
    }

    /// The diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            CompileError::Lexer { message, .. } => {
                if message.contains("unterminated string") {
                    DiagnosticCode::UNTERMINATED_STRING
                } else if message.contains("unterminated block comment") {
                    DiagnosticCode::UNTERMINATED_COMMENT
                } else if message.contains("newline in string") {
                    DiagnosticCode::NEWLINE_IN_STRING
                } else if message.contains("invalid escape") {
                    DiagnosticCode::BAD_ESCAPE
                } else {
                    DiagnosticCode::UNEXPECTED_CHAR
                }
            }
            CompileError::Parser { found, .. } => {
                if found == "end of file" {
                    DiagnosticCode::UNEXPECTED_EOF
                } else {
                    DiagnosticCode::UNEXPECTED_TOKEN
                }
            }
            CompileError::Validation { message, .. } => {
                if message.contains("'return'") {
                    DiagnosticCode::RETURN_OUTSIDE_FN
                } else if message.contains("'await'") {
                    DiagnosticCode::AWAIT_OUTSIDE_ASYNC
                } else if message.contains("pattern") {
                    DiagnosticCode::INVALID_PATTERN
                } else if message.contains("import") {
                    DiagnosticCode::INVALID_IMPORT
                } else if message.contains("type") {
                    DiagnosticCode::INVALID_TYPE
                } else {
                    DiagnosticCode::INVALID_NAME
                }
            }
            CompileError::Import { message, .. } => {
                if message.contains("circular") {
                    DiagnosticCode::IMPORT_CYCLE
                } else {
                    DiagnosticCode::MODULE_NOT_FOUND
                }
            }
            CompileError::Internal { .. } => DiagnosticCode::INTERNAL,
        }
    }

    /// Convert into a renderable diagnostic, attaching the offending
    /// source line (with caret) when the source map knows it.
    pub fn to_diagnostic(&self, source_map: &SourceMap) -> Diagnostic {
        let span = self.span();
        let message = match self {
            CompileError::Lexer { message, .. }
            | CompileError::Parser { message, .. }
            | CompileError::Validation { message, .. }
            | CompileError::Import { message, .. }
            | CompileError::Internal { message } => message.clone(),
        };

        let mut diagnostic = Diagnostic::new(self.code(), message, span);

        if let Some(text) = source_map.line_for_span(span) {
            diagnostic = diagnostic.with_line(SourceLine::new(
                text,
                span.line as usize,
                span.column as usize,
                span.byte_len(),
            ));
        }

        if let CompileError::Parser { expected, .. } = self {
            if !expected.is_empty() {
                diagnostic =
                    diagnostic.with_note(format!("expected one of: {}", expected.join(", ")));
            }
        }

        diagnostic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_error_display() {
        let err = CompileError::lexer("illegal character '@'", Span::new(8, 9, 2, 3));
        assert_eq!(
            err.to_string(),
            "LexerError at line 2, column 3: illegal character '@'"
        );
    }

    #[test]
    fn test_parser_error_display() {
        let err = CompileError::Parser {
            message: "unexpected token '}'".into(),
            found: "'}'".into(),
            expected: vec!["identifier".into(), "'('".into()],
            span: Span::new(0, 1, 4, 7),
        };
        assert_eq!(
            err.to_string(),
            "ParserError at line 4, column 7: unexpected token '}'"
        );
    }

    #[test]
    fn test_lexer_codes() {
        let cases = [
            ("illegal character '#'", DiagnosticCode::UNEXPECTED_CHAR),
            ("unterminated string literal", DiagnosticCode::UNTERMINATED_STRING),
            ("unterminated block comment", DiagnosticCode::UNTERMINATED_COMMENT),
            ("newline in string literal", DiagnosticCode::NEWLINE_IN_STRING),
            ("invalid escape sequence '\\q'", DiagnosticCode::BAD_ESCAPE),
        ];
        for (message, code) in cases {
            assert_eq!(CompileError::lexer(message, Span::DUMMY).code(), code);
        }
    }

    #[test]
    fn test_validation_codes() {
        let cases = [
            ("'return' outside of a function body", DiagnosticCode::RETURN_OUTSIDE_FN),
            (
                "'await' may only appear inside an async function or async block",
                DiagnosticCode::AWAIT_OUTSIDE_ASYNC,
            ),
            ("invalid pattern variant name: '9x'", DiagnosticCode::INVALID_PATTERN),
            ("import must name at least one item", DiagnosticCode::INVALID_IMPORT),
            ("type 'Pair' takes 2 type argument(s), 1 given", DiagnosticCode::INVALID_TYPE),
            ("invalid variable name: ''", DiagnosticCode::INVALID_NAME),
        ];
        for (message, code) in cases {
            assert_eq!(CompileError::validation(message, Span::DUMMY).code(), code);
        }
    }

    #[test]
    fn test_import_codes() {
        let err = CompileError::import("circular import detected: a.sfn <-> b.sfn", Span::DUMMY);
        assert_eq!(err.code(), DiagnosticCode::IMPORT_CYCLE);
        let err = CompileError::import("module not found: ./m.sfn", Span::DUMMY);
        assert_eq!(err.code(), DiagnosticCode::MODULE_NOT_FOUND);
    }

    #[test]
    fn test_to_diagnostic_attaches_line_and_expected() {
        let mut map = SourceMap::new();
        let file = map.add_file("t.sfn", "let = 1;");
        let err = CompileError::Parser {
            message: "unexpected token '='".into(),
            found: "'='".into(),
            expected: vec!["identifier".into()],
            span: Span::with_file(4, 5, file, 1, 5),
        };
        let diag = err.to_diagnostic(&map);
        let line = diag.source_line.as_ref().expect("source line");
        assert_eq!(line.text, "let = 1;");
        assert_eq!(line.column, 5);
        assert_eq!(diag.notes, vec!["expected one of: identifier"]);
        let rendered = diag.render();
        assert!(rendered.contains("E2001"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn test_internal_error_has_dummy_span() {
        let err = CompileError::internal("oops");
        assert_eq!(err.span(), Span::DUMMY);
        assert_eq!(err.to_string(), "InternalError: oops");
        assert_eq!(err.code(), DiagnosticCode::INTERNAL);
    }
}
