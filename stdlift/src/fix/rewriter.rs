//! Byte-range safe code rewriter.
//!
//! Edits are collected fix by fix. A fix is accepted only as a whole: if any of
//! its edits overlaps an edit already accepted, none of them are kept. Identical
//! edits coming from different fixes (the same import insertion, typically) are
//! kept once.
//!
//! # Usage
//!
//! ```
//! use stdlift::fix::{ByteRangeRewriter, TextEdit};
//! use stdlift::syntax::Span;
//!
//! let mut rewriter = ByteRangeRewriter::new("lo.Keys(m)");
//! rewriter
//!     .add_fix(&[TextEdit::replace(Span::new(0, 7), "maps.Keys")])
//!     .expect("should accept");
//! assert_eq!(rewriter.apply().expect("should apply"), "maps.Keys(m)");
//! ```

use crate::syntax::Span;
use serde::Serialize;
use thiserror::Error;

/// Replace the bytes in `span` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    /// Half-open byte range to replace. Zero-width for insertions.
    pub span: Span,
    /// Replacement text. Empty for deletions.
    pub new_text: String,
}

impl TextEdit {
    /// Create an edit.
    #[must_use]
    pub fn new(span: Span, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }

    /// Replace `span` with `new_text`.
    #[must_use]
    pub fn replace(span: Span, new_text: impl Into<String>) -> Self {
        Self::new(span, new_text)
    }

    /// Delete `span`.
    #[must_use]
    pub fn delete(span: Span) -> Self {
        Self::new(span, "")
    }

    /// Insert `content` before `offset`.
    #[must_use]
    pub fn insert(offset: usize, content: impl Into<String>) -> Self {
        Self::new(Span::empty_at(offset), content)
    }

    /// Check if this edit overlaps with another.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.span.overlaps(other.span)
    }
}

/// Error during rewriting
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// An edit overlaps one that was already accepted.
    #[error("edit {new:?} overlaps accepted edit {existing:?}")]
    OverlappingEdits {
        /// The accepted edit's span.
        existing: Span,
        /// The rejected edit's span.
        new: Span,
    },
    /// Edit range is out of bounds.
    #[error("edit {span:?} out of bounds: source length {source_len}")]
    OutOfBounds {
        /// The offending span.
        span: Span,
        /// Length of the source.
        source_len: usize,
    },
    /// Edit boundary falls inside a UTF-8 sequence.
    #[error("edit boundary {offset} is not a char boundary")]
    NotCharBoundary {
        /// The offending offset.
        offset: usize,
    },
}

/// Safe code rewriter using byte ranges
///
/// This rewriter applies edits in reverse order to preserve byte positions,
/// and validates that edits don't overlap.
#[derive(Debug, Clone)]
pub struct ByteRangeRewriter {
    /// Original source code
    source: String,
    /// Accepted edits
    edits: Vec<TextEdit>,
}

impl ByteRangeRewriter {
    /// Create a new rewriter for the given source
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            edits: Vec::new(),
        }
    }

    /// Accept all edits of one fix, or none of them.
    ///
    /// Returns the number of edits actually added after deduplication.
    pub fn add_fix(&mut self, edits: &[TextEdit]) -> Result<usize, RewriteError> {
        let mut fresh: Vec<&TextEdit> = Vec::with_capacity(edits.len());
        for edit in edits {
            self.check_bounds(edit)?;
            if self.edits.contains(edit) || fresh.contains(&edit) {
                continue;
            }
            if let Some(existing) = self
                .edits
                .iter()
                .chain(fresh.iter().copied())
                .find(|accepted| accepted.overlaps(edit))
            {
                return Err(RewriteError::OverlappingEdits {
                    existing: existing.span,
                    new: edit.span,
                });
            }
            fresh.push(edit);
        }
        let added = fresh.len();
        self.edits.extend(fresh.into_iter().cloned());
        Ok(added)
    }

    fn check_bounds(&self, edit: &TextEdit) -> Result<(), RewriteError> {
        if edit.span.end > self.source.len() || edit.span.start > edit.span.end {
            return Err(RewriteError::OutOfBounds {
                span: edit.span,
                source_len: self.source.len(),
            });
        }
        for offset in [edit.span.start, edit.span.end] {
            if !self.source.is_char_boundary(offset) {
                return Err(RewriteError::NotCharBoundary { offset });
            }
        }
        Ok(())
    }

    /// Get the number of accepted edits
    #[must_use]
    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    /// Check if there are any accepted edits
    #[must_use]
    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Apply all edits and return the modified source
    ///
    /// Edits are applied back to front. For equal starts the wider range goes
    /// first, and insertions at the same offset keep the order they were added in.
    pub fn apply(self) -> Result<String, RewriteError> {
        let mut result = self.source;
        let mut order: Vec<usize> = (0..self.edits.len()).collect();
        order.sort_by(|&a, &b| {
            let (ea, eb) = (&self.edits[a], &self.edits[b]);
            eb.span
                .start
                .cmp(&ea.span.start)
                .then(eb.span.end.cmp(&ea.span.end))
                .then(b.cmp(&a))
        });

        for index in order {
            let edit = &self.edits[index];
            if edit.span.end > result.len() {
                return Err(RewriteError::OutOfBounds {
                    span: edit.span,
                    source_len: result.len(),
                });
            }
            result.replace_range(edit.span.start..edit.span.end, &edit.new_text);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(start: usize, end: usize, text: &str) -> TextEdit {
        TextEdit::new(Span::new(start, end), text)
    }

    #[test]
    fn test_simple_replacement() {
        let mut rewriter = ByteRangeRewriter::new("hello world");
        rewriter.add_fix(&[edit(0, 5, "hi")]).expect("should accept");
        assert_eq!(rewriter.apply().expect("should apply"), "hi world");
    }

    #[test]
    fn test_overlapping_fix_is_rejected_whole() {
        let mut rewriter = ByteRangeRewriter::new("hello world");
        rewriter.add_fix(&[edit(0, 8, "hi")]).expect("should accept");
        let result = rewriter.add_fix(&[edit(9, 11, "LD"), edit(5, 10, "there")]);
        assert!(matches!(result, Err(RewriteError::OverlappingEdits { .. })));
        assert_eq!(rewriter.edit_count(), 1);
        assert_eq!(rewriter.apply().expect("should apply"), "hirld");
    }

    #[test]
    fn test_identical_edits_deduplicate() {
        let mut rewriter = ByteRangeRewriter::new("import (\n)\n");
        let insert = TextEdit::insert(9, "\t\"slices\"\n");
        assert_eq!(rewriter.add_fix(&[insert.clone()]).expect("accept"), 1);
        assert_eq!(rewriter.add_fix(&[insert]).expect("accept"), 0);
        assert_eq!(
            rewriter.apply().expect("should apply"),
            "import (\n\t\"slices\"\n)\n"
        );
    }

    #[test]
    fn test_out_of_bounds_error() {
        let mut rewriter = ByteRangeRewriter::new("short");
        let result = rewriter.add_fix(&[edit(0, 100, "long")]);
        assert!(matches!(result, Err(RewriteError::OutOfBounds { .. })));
        assert!(!rewriter.has_edits());
    }

    #[test]
    fn test_char_boundary_error() {
        let mut rewriter = ByteRangeRewriter::new("héllo");
        let result = rewriter.add_fix(&[edit(0, 2, "x")]);
        assert!(matches!(result, Err(RewriteError::NotCharBoundary { offset: 2 })));
    }

    #[test]
    fn test_insertions_keep_order() {
        let mut rewriter = ByteRangeRewriter::new("()");
        rewriter.add_fix(&[TextEdit::insert(1, "a")]).expect("accept");
        rewriter.add_fix(&[TextEdit::insert(1, "b")]).expect("accept");
        assert_eq!(rewriter.apply().expect("should apply"), "(ab)");
    }

    #[test]
    fn test_insert_next_to_deletion() {
        let mut rewriter = ByteRangeRewriter::new("abcdef");
        rewriter
            .add_fix(&[TextEdit::delete(Span::new(2, 4)), TextEdit::insert(2, "X")])
            .expect("accept");
        rewriter.add_fix(&[TextEdit::insert(4, "Y")]).expect("accept");
        assert_eq!(rewriter.apply().expect("should apply"), "abXYef");
    }

    #[test]
    fn test_adjacent_non_overlapping_edits() {
        let mut rewriter = ByteRangeRewriter::new("abcdef");
        rewriter
            .add_fix(&[edit(0, 3, "XXX"), edit(3, 6, "YYY")])
            .expect("accept");
        assert_eq!(rewriter.apply().expect("should apply"), "XXXYYY");
    }
}
