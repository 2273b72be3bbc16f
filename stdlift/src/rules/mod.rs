use crate::fix::TextEdit;
use crate::syntax::Span;
use crate::utils::LineIndex;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Module containing rule ID constants.
pub mod ids;

use ids::{RULE_ID_PACKAGE, RULE_ID_SYMBOL, RULE_ID_UNUSED_IMPORT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// Metadata associated with a rule.
pub struct RuleMetadata {
    /// Unique code/ID of the rule.
    pub id: &'static str,
    /// Category of the rule.
    pub category: &'static str,
}

/// What a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A call or type reference with a standard replacement.
    SymbolReplacement,
    /// A whole import with a standard successor.
    PackageReplacement,
    /// An import left without references after the rewrites.
    UnusedImport,
}

impl DiagnosticKind {
    /// Rule ID and category.
    #[must_use]
    pub const fn metadata(self) -> RuleMetadata {
        match self {
            Self::SymbolReplacement => RuleMetadata {
                id: RULE_ID_SYMBOL,
                category: "stdlib",
            },
            Self::PackageReplacement => RuleMetadata {
                id: RULE_ID_PACKAGE,
                category: "stdlib",
            },
            Self::UnusedImport => RuleMetadata {
                id: RULE_ID_UNUSED_IMPORT,
                category: "unused",
            },
        }
    }

    /// Unique code/ID of the rule.
    #[must_use]
    pub const fn rule_id(self) -> &'static str {
        self.metadata().id
    }
}

/// A fix was constructed from overlapping or no edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixError {
    /// Two edits of the fix overlap.
    #[error("fix edits overlap: {first:?} and {second:?}")]
    Overlap {
        /// Earlier edit span.
        first: Span,
        /// Later edit span.
        second: Span,
    },
    /// The fix has no edits.
    #[error("fix has no edits")]
    Empty,
}

/// An ordered, non-overlapping set of edits applied atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedFix {
    /// Short description of what the fix does.
    pub message: &'static str,
    /// Edits sorted by position.
    pub edits: Vec<TextEdit>,
}

impl SuggestedFix {
    /// Validate and build a fix. Identical edits are merged.
    pub fn new(message: &'static str, mut edits: Vec<TextEdit>) -> Result<Self, FixError> {
        edits.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then(a.span.end.cmp(&b.span.end))
        });
        edits.dedup();
        if edits.is_empty() {
            return Err(FixError::Empty);
        }
        for (i, edit) in edits.iter().enumerate() {
            if let Some(other) = edits[i + 1..].iter().find(|other| other.overlaps(edit)) {
                return Err(FixError::Overlap {
                    first: edit.span,
                    second: other.span,
                });
            }
        }
        Ok(Self { message, edits })
    }
}

/// One reported problem, anchored to a span of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What is reported.
    pub kind: DiagnosticKind,
    /// Where: the callee, qualified type, or import spec.
    pub span: Span,
    /// Human-readable message.
    pub message: String,
    /// Suggested fix, if the rewrite is known to be safe.
    pub fix: Option<SuggestedFix>,
}

impl Diagnostic {
    /// Unique code/ID of the rule.
    #[must_use]
    pub const fn rule_id(&self) -> &'static str {
        self.kind.rule_id()
    }
}

#[derive(Debug, Clone, Serialize)]
/// A diagnostic resolved to a file position, ready for output.
pub struct Finding {
    /// ID of the rule that triggered the finding.
    pub rule_id: String,
    /// Category of the rule.
    pub category: String,
    /// Description of the issue.
    pub message: String,
    /// File where the issue was found.
    pub file: PathBuf,
    /// Line number.
    pub line: usize,
    /// Column number.
    pub col: usize,
    /// Whether a fix is available.
    pub fixable: bool,
}

impl Finding {
    /// Position a diagnostic within `file`.
    #[must_use]
    pub fn from_diagnostic(diagnostic: &Diagnostic, file: PathBuf, index: &LineIndex) -> Self {
        let meta = diagnostic.kind.metadata();
        Self {
            rule_id: meta.id.to_owned(),
            category: meta.category.to_owned(),
            message: diagnostic.message.clone(),
            file,
            line: index.line_number(diagnostic.span.start),
            col: index.column(diagnostic.span.start),
            fixable: diagnostic.fix.is_some(),
        }
    }
}
