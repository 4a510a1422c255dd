//! Terminal diagnostics.
//!
//! sailc is fail-fast: the first [`crate::CompileError`] ends the
//! session, so there is no diagnostic collector and nothing to build up
//! incrementally. A [`Diagnostic`] is just the renderable form of that
//! one error: its code, message, the offending source line with a caret
//! under the span, and any follow-up notes. The driver prints it to
//! stderr:
//!
//! ```text
//! error[E2001]: unexpected token '='
//! 2 |   let = 1;
//!   |       ^
//! note: expected one of: identifier
//! ```

mod codes;

pub use codes::DiagnosticCode;

use crate::span::Span;

/// The source line a diagnostic points at, plus its caret geometry.
#[derive(Clone, Debug)]
pub struct SourceLine {
    /// Line text, without its newline
    pub text: String,
    /// 1-based line number, shown in the gutter
    pub number: usize,
    /// 1-based column the caret starts under
    pub column: usize,
    /// Caret count; degenerate spans still get one caret
    pub width: usize,
}

impl SourceLine {
    /// Describe a line; a zero `width` is widened to one caret.
    pub fn new(text: impl Into<String>, number: usize, column: usize, width: usize) -> Self {
        Self {
            text: text.into(),
            number,
            column,
            width: width.max(1),
        }
    }

    /// Append the gutter-aligned line and caret rows to `out`.
    fn render_into(&self, out: &mut String) {
        let gutter = self.number.to_string();
        out.push_str(&gutter);
        out.push_str(" | ");
        out.push_str(&self.text);
        out.push('\n');
        out.push_str(&" ".repeat(gutter.len()));
        out.push_str(" | ");
        out.push_str(&" ".repeat(self.column.saturating_sub(1)));
        out.push_str(&"^".repeat(self.width));
    }
}

/// A fully described, renderable compiler error.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Stable identifying code
    pub code: DiagnosticCode,
    /// Human message, single line
    pub message: String,
    /// Where the error points
    pub span: Span,
    /// The offending source line, when the session knows it
    pub source_line: Option<SourceLine>,
    /// Follow-up notes (e.g. the parser's expected-token set)
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// A diagnostic with no source line or notes attached yet.
    pub fn new(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            source_line: None,
            notes: Vec::new(),
        }
    }

    /// Attach the offending source line.
    pub fn with_line(mut self, line: SourceLine) -> Self {
        self.source_line = Some(line);
        self
    }

    /// Attach a follow-up note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Format for the terminal: one leading line, then the indented
    /// caret context and notes.
    pub fn render(&self) -> String {
        let mut out = format!("error[{}]: {}", self.code, self.message);
        if let Some(line) = &self.source_line {
            out.push('\n');
            line.render_into(&mut out);
        }
        for note in &self.notes {
            out.push_str("\nnote: ");
            out.push_str(note);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_message_only() {
        let rendered =
            Diagnostic::new(DiagnosticCode::INTERNAL, "token stack underflow", Span::DUMMY)
                .render();
        assert_eq!(rendered, "error[E9001]: token stack underflow");
    }

    #[test]
    fn test_caret_lands_under_the_span() {
        let rendered = Diagnostic::new(
            DiagnosticCode::UNEXPECTED_TOKEN,
            "unexpected token '='",
            Span::new(4, 5, 1, 5),
        )
        .with_line(SourceLine::new("let = 1;", 1, 5, 1))
        .render();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "error[E2001]: unexpected token '='");
        assert_eq!(lines[1], "1 | let = 1;");
        assert_eq!(lines[2], "  |     ^");
    }

    #[test]
    fn test_gutter_widens_with_line_number() {
        let rendered = Diagnostic::new(
            DiagnosticCode::INVALID_NAME,
            "invalid variable name",
            Span::DUMMY,
        )
        .with_line(SourceLine::new("let x = 1;", 120, 5, 1))
        .render();
        assert!(rendered.contains("120 | let x = 1;"));
        assert!(rendered.contains("\n    |     ^"));
    }

    #[test]
    fn test_underline_covers_span_width() {
        let rendered = Diagnostic::new(
            DiagnosticCode::UNTERMINATED_STRING,
            "unterminated string literal",
            Span::new(8, 14, 1, 9),
        )
        .with_line(SourceLine::new("let s = \"oops", 1, 9, 5))
        .render();
        assert!(rendered.contains("^^^^^"));
    }

    #[test]
    fn test_zero_width_span_still_gets_a_caret() {
        let line = SourceLine::new("x", 1, 1, 0);
        assert_eq!(line.width, 1);
    }

    #[test]
    fn test_notes_follow_the_snippet() {
        let rendered = Diagnostic::new(
            DiagnosticCode::UNEXPECTED_TOKEN,
            "unexpected token '}'",
            Span::DUMMY,
        )
        .with_note("expected one of: identifier, '('")
        .with_note("braces must balance")
        .render();
        assert!(rendered.ends_with(
            "note: expected one of: identifier, '('\nnote: braces must balance"
        ));
    }
}
