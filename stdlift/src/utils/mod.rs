//! Utilities shared across the analyzer.

mod paths;

pub use paths::{collect_go_files, is_excluded, normalize_display_path};

use crate::constants::{LINTER_NAME, SUPPRESSION_RE, TEST_FILE_RE};
use rustc_hash::{FxHashMap, FxHashSet};

/// Converts byte offsets to 1-indexed lines and columns.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte index of the start of each line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Creates a new `LineIndex` by scanning the source for newlines.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-indexed line containing `offset`.
    #[must_use]
    pub fn line_number(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }

    /// Byte offset where the line containing `offset` starts.
    #[must_use]
    pub fn line_start_of(&self, offset: usize) -> usize {
        let line = self.line_number(offset);
        self.line_starts.get(line - 1).copied().unwrap_or(0)
    }

    /// 1-indexed byte column of `offset`.
    #[must_use]
    pub fn column(&self, offset: usize) -> usize {
        offset - self.line_start_of(offset) + 1
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Suppression specification.
#[derive(Debug, Clone, PartialEq)]
pub enum Suppression {
    /// Suppress all findings.
    All,
    /// Suppress findings for specific rule IDs.
    Specific(FxHashSet<String>),
}

/// Detects the suppression carried by one source line.
///
/// Supported forms:
/// - `//nolint` suppresses everything
/// - `//nolint:stdlift` suppresses everything from this tool
/// - `//nolint:STD001,STD003` suppresses specific rules
///
/// A `//nolint:` naming only other linters suppresses nothing.
#[must_use]
pub fn get_line_suppression(line: &str) -> Option<Suppression> {
    let caps = SUPPRESSION_RE().captures(line)?;

    let Some(codes) = caps.get(1) else {
        return Some(Suppression::All);
    };

    let mut specific = FxHashSet::default();
    for code in codes.as_str().split(',').map(str::trim) {
        if code.eq_ignore_ascii_case(LINTER_NAME) {
            return Some(Suppression::All);
        }
        specific.insert(code.to_uppercase());
    }
    Some(Suppression::Specific(specific))
}

/// Map of 1-indexed line numbers to their suppression.
#[must_use]
pub fn get_ignored_lines(source: &str) -> FxHashMap<usize, Suppression> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, line)| get_line_suppression(line).map(|s| (i + 1, s)))
        .collect()
}

/// Checks if a specific line and rule are suppressed.
#[must_use]
#[allow(clippy::implicit_hasher)]
pub fn is_line_suppressed(
    ignored_lines: &FxHashMap<usize, Suppression>,
    line: usize,
    rule_id: &str,
) -> bool {
    match ignored_lines.get(&line) {
        Some(Suppression::All) => true,
        Some(Suppression::Specific(rules)) => rules.contains(rule_id),
        None => false,
    }
}

/// Checks if a path names a Go test file.
#[must_use]
pub fn is_test_path(p: &str) -> bool {
    TEST_FILE_RE().is_match(p)
}
