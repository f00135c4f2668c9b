//! An editable source document with an incrementally maintained tree.

use std::ops::Range;

use thiserror::Error;
use tree_sitter::{InputEdit, Node, Parser, Point, Tree};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to load the Rust grammar")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("parsing was cancelled")]
    ParseCancelled,

    #[error("invalid edit range {start}..{end} for a document of {len} bytes")]
    InvalidRange { start: usize, end: usize, len: usize },
}

/// The text of one open file, its parser and its current syntax tree.
///
/// Views over the document borrow it, so they cannot outlive an edit.
pub struct EditorDocument {
    parser: Parser,
    text: String,
    tree: Tree,
    revision: u64,
}

impl EditorDocument {
    pub fn open(text: impl Into<String>) -> Result<Self, DocumentError> {
        let text = text.into();
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_rust::language())?;
        let tree = parser
            .parse(&text, None)
            .ok_or(DocumentError::ParseCancelled)?;
        Ok(Self {
            parser,
            text,
            tree,
            revision: 0,
        })
    }

    pub fn source(&self) -> &str {
        &self.text
    }

    /// Number of edits applied since the document was opened.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Whether the current tree contains error or missing nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Source text of `node`.
    pub fn text_of(&self, node: Node<'_>) -> &str {
        self.text.get(node.byte_range()).unwrap_or("")
    }

    /// Replace the bytes in `range` with `replacement` and re-parse,
    /// reusing the unchanged parts of the old tree.
    pub fn edit(&mut self, range: Range<usize>, replacement: &str) -> Result<(), DocumentError> {
        let Range { start, end } = range;
        if start > end
            || end > self.text.len()
            || !self.text.is_char_boundary(start)
            || !self.text.is_char_boundary(end)
        {
            return Err(DocumentError::InvalidRange {
                start,
                end,
                len: self.text.len(),
            });
        }

        let start_position = point_at(&self.text, start);
        let old_end_position = point_at(&self.text, end);
        self.text.replace_range(start..end, replacement);
        let new_end_byte = start + replacement.len();
        let new_end_position = point_at(&self.text, new_end_byte);

        self.tree.edit(&InputEdit {
            start_byte: start,
            old_end_byte: end,
            new_end_byte,
            start_position,
            old_end_position,
            new_end_position,
        });
        self.tree = self
            .parser
            .parse(&self.text, Some(&self.tree))
            .ok_or(DocumentError::ParseCancelled)?;
        self.revision += 1;
        tracing::debug!(revision = self.revision, "re-parsed document");
        Ok(())
    }

    /// Replace the whole text.
    pub fn replace(&mut self, text: impl Into<String>) -> Result<(), DocumentError> {
        let text = text.into();
        self.tree = self
            .parser
            .parse(&text, None)
            .ok_or(DocumentError::ParseCancelled)?;
        self.text = text;
        self.revision += 1;
        Ok(())
    }
}

/// Row and byte column of `byte` in `text`.
fn point_at(text: &str, byte: usize) -> Point {
    let before = &text[..byte];
    let row = before.matches('\n').count();
    let column = byte - before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    Point::new(row, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_reparses() {
        let mut doc = EditorDocument::open("struct User { id: u64 }").unwrap();
        assert_eq!(doc.revision(), 0);
        assert!(!doc.has_errors());

        doc.edit(14..22, "id: u64, name: ").unwrap();
        assert_eq!(doc.source(), "struct User { id: u64, name: }");
        assert_eq!(doc.revision(), 1);
        assert!(doc.has_errors());

        doc.edit(29..29, "String").unwrap();
        assert_eq!(doc.source(), "struct User { id: u64, name: String}");
        assert!(!doc.has_errors());
    }

    #[test]
    fn test_invalid_range() {
        let mut doc = EditorDocument::open("struct A;").unwrap();
        assert!(matches!(
            doc.edit(4..100, ""),
            Err(DocumentError::InvalidRange { len: 9, .. })
        ));
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn test_point_at() {
        let text = "a\nbc\nd";
        assert_eq!(point_at(text, 0), Point::new(0, 0));
        assert_eq!(point_at(text, 3), Point::new(1, 1));
        assert_eq!(point_at(text, 5), Point::new(2, 0));
    }
}
