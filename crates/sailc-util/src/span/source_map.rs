//! The source files of one compilation session.
//!
//! The lexer computes line and column for every span while scanning, so
//! nothing here ever converts byte offsets back into positions. The
//! map's one real job is handing the diagnostic renderer the text of a
//! numbered line in a registered file.

use super::{FileId, Span};

/// One registered source file.
pub struct SourceFile {
    name: String,
    content: String,
}

impl SourceFile {
    /// The file's display name (usually its path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full source text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The 1-based line `number`, without its newline.
    ///
    /// Returns `None` when the file has no such line.
    ///
    /// # Examples
    ///
    /// ```
    /// use sailc_util::span::SourceMap;
    ///
    /// let mut map = SourceMap::new();
    /// let id = map.add_file("main.sfn", "fn main() -> void {\n}\n");
    /// let file = map.file(id).unwrap();
    /// assert_eq!(file.line(1), Some("fn main() -> void {"));
    /// assert_eq!(file.line(3), None);
    /// ```
    pub fn line(&self, number: usize) -> Option<&str> {
        if number == 0 {
            return None;
        }
        self.content.lines().nth(number - 1)
    }
}

/// Registry of every file the session has read, keyed by [`FileId`].
#[derive(Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    /// An empty map.
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Register a file; the returned id goes into that file's spans.
    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<String>) -> FileId {
        self.files.push(SourceFile {
            name: name.into(),
            content: content.into(),
        });
        FileId(self.files.len() - 1)
    }

    /// Look up a registered file.
    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// How many files the session has registered.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True before any file is registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The source line a span points at, for the caret snippet.
    pub fn line_for_span(&self, span: Span) -> Option<&str> {
        self.file(span.file_id)?.line(span.line as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_one_based() {
        let mut map = SourceMap::new();
        let id = map.add_file("t.sfn", "let a = 1;\nlet b = 2;");
        let file = map.file(id).unwrap();
        assert_eq!(file.line(0), None);
        assert_eq!(file.line(1), Some("let a = 1;"));
        assert_eq!(file.line(2), Some("let b = 2;"));
        assert_eq!(file.line(3), None);
    }

    #[test]
    fn test_crlf_lines_strip_carriage_return() {
        let mut map = SourceMap::new();
        let id = map.add_file("t.sfn", "fn main() -> void {\r\n}\r\n");
        assert_eq!(map.file(id).unwrap().line(1), Some("fn main() -> void {"));
        assert_eq!(map.file(id).unwrap().line(2), Some("}"));
    }

    #[test]
    fn test_files_keep_registration_order() {
        let mut map = SourceMap::new();
        assert!(map.is_empty());
        let a = map.add_file("a.sfn", "fn a() -> void { }");
        let b = map.add_file("b.sfn", "fn b() -> void { }");
        assert_eq!(map.len(), 2);
        assert_eq!(a, FileId(0));
        assert_eq!(b, FileId(1));
        assert_eq!(map.file(b).unwrap().name(), "b.sfn");
        assert!(map.file(FileId(9)).is_none());
    }

    #[test]
    fn test_line_for_span() {
        let mut map = SourceMap::new();
        let id = map.add_file("t.sfn", "enum Shape {\n  Circle,\n}");
        let span = Span::with_file(15, 21, id, 2, 3);
        assert_eq!(map.line_for_span(span), Some("  Circle,"));
    }

    #[test]
    fn test_line_for_dummy_span_of_empty_file() {
        let mut map = SourceMap::new();
        map.add_file("empty.sfn", "");
        assert_eq!(map.line_for_span(Span::DUMMY), None);
    }
}
