//! Applying suggested fixes.
//!
//! The core component is `ByteRangeRewriter`, which applies edits using byte
//! offsets. [`apply_fixes`] drives it over all diagnostics of one file.

mod rewriter;

pub use rewriter::{ByteRangeRewriter, RewriteError, TextEdit};

use crate::rules::{Diagnostic, DiagnosticKind};
use log::debug;

/// Result of applying one file's fixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    /// The rewritten source.
    pub text: String,
    /// Fixes that landed.
    pub applied: usize,
    /// Fixes that were dropped because they conflicted with earlier ones, plus
    /// import removals withdrawn as a consequence.
    pub skipped: usize,
}

impl FixOutcome {
    /// Whether the text differs from what was passed in.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// Apply every fix carried by `diagnostics` to `source`.
///
/// Fixes are accepted in order. A fix that conflicts with an accepted one is
/// skipped as a whole. Import removals go last and are withdrawn if anything
/// was skipped, because they are only safe once every rewrite has landed.
pub fn apply_fixes(source: &str, diagnostics: &[Diagnostic]) -> Result<FixOutcome, RewriteError> {
    let mut rewriter = ByteRangeRewriter::new(source);
    let mut applied = 0;
    let mut skipped = 0;

    let (removals, rewrites): (Vec<&Diagnostic>, Vec<&Diagnostic>) = diagnostics
        .iter()
        .filter(|d| d.fix.is_some())
        .partition(|d| d.kind == DiagnosticKind::UnusedImport);

    for diagnostic in rewrites {
        let Some(fix) = &diagnostic.fix else {
            continue;
        };
        match rewriter.add_fix(&fix.edits) {
            Ok(_) => applied += 1,
            Err(err @ RewriteError::OverlappingEdits { .. }) => {
                debug!("skipping fix for `{}`: {err}", diagnostic.message);
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    if skipped > 0 {
        skipped += removals.len();
    } else {
        for diagnostic in removals {
            let Some(fix) = &diagnostic.fix else {
                continue;
            };
            match rewriter.add_fix(&fix.edits) {
                Ok(_) => applied += 1,
                Err(err @ RewriteError::OverlappingEdits { .. }) => {
                    debug!("skipping import removal: {err}");
                    skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    Ok(FixOutcome {
        text: rewriter.apply()?,
        applied,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::SuggestedFix;
    use crate::syntax::Span;

    fn diagnostic(kind: DiagnosticKind, edits: Vec<TextEdit>) -> Diagnostic {
        Diagnostic {
            kind,
            span: edits[0].span,
            message: String::new(),
            fix: Some(SuggestedFix::new("fix", edits).unwrap()),
        }
    }

    #[test]
    fn test_removal_withdrawn_after_conflict() {
        let source = "abcdefghij";
        let diagnostics = vec![
            diagnostic(
                DiagnosticKind::SymbolReplacement,
                vec![TextEdit::replace(Span::new(2, 5), "X")],
            ),
            diagnostic(
                DiagnosticKind::SymbolReplacement,
                vec![TextEdit::replace(Span::new(4, 6), "Y")],
            ),
            diagnostic(
                DiagnosticKind::UnusedImport,
                vec![TextEdit::delete(Span::new(8, 10))],
            ),
        ];
        let outcome = apply_fixes(source, &diagnostics).unwrap();
        assert_eq!(outcome.text, "abXfghij");
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn test_removal_applied_when_clean() {
        let source = "abcdefghij";
        let diagnostics = vec![
            diagnostic(
                DiagnosticKind::UnusedImport,
                vec![TextEdit::delete(Span::new(0, 2))],
            ),
            diagnostic(
                DiagnosticKind::SymbolReplacement,
                vec![TextEdit::replace(Span::new(4, 6), "Y")],
            ),
        ];
        let outcome = apply_fixes(source, &diagnostics).unwrap();
        assert_eq!(outcome.text, "cdYghij");
        assert_eq!((outcome.applied, outcome.skipped), (2, 0));
        assert!(outcome.changed());
    }
}
