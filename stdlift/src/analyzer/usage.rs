//! Per-file import usage tally and safe import removal.

use super::edits::import_removal;
use super::FileCheck;
use crate::rules::ids::RULE_ID_UNUSED_IMPORT;
use crate::rules::{Diagnostic, DiagnosticKind, SuggestedFix};
use log::debug;
use rustc_hash::FxHashMap;

const FIX_MESSAGE: &str = "Remove unused import";

/// Reference counts for one local import name.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AliasUsage {
    /// References seen.
    pub total: usize,
    /// References whose rewrite is known to succeed.
    pub replaceable: usize,
}

impl AliasUsage {
    /// Whether every reference was rewritten, and there was at least one.
    #[must_use]
    pub const fn fully_replaced(&self) -> bool {
        self.replaceable > 0 && self.replaceable == self.total
    }
}

/// Usage counts keyed by local import name, `.` for dot imports.
#[derive(Debug, Default, Clone)]
pub struct FileUsageTally {
    aliases: FxHashMap<String, AliasUsage>,
}

impl FileUsageTally {
    /// Count one reference through `alias`.
    pub fn record(&mut self, alias: &str, replaceable: bool) {
        let usage = self.aliases.entry(alias.to_owned()).or_default();
        usage.total += 1;
        if replaceable {
            usage.replaceable += 1;
        }
    }

    /// Counts for `alias`, zero if never seen.
    #[must_use]
    pub fn get(&self, alias: &str) -> AliasUsage {
        self.aliases.get(alias).copied().unwrap_or_default()
    }
}

/// Flag registered imports whose every reference was rewritten.
pub(super) fn reconcile(check: &FileCheck<'_>, tally: &FileUsageTally) -> Vec<Diagnostic> {
    let file = check.file;
    let mut diagnostics = Vec::new();
    for (index, spec) in file.imports.iter().enumerate() {
        if spec.is_blank() || !check.registry().covers_package(&spec.path) {
            continue;
        }
        let alias = spec.local_name();
        let mut usage = tally.get(&alias);
        // References the scan never reached still keep the import alive.
        usage.total = usage
            .total
            .max(file.bindings.reference_count(index, spec.is_dot()));
        if !usage.fully_replaced() {
            if usage.replaceable > 0 {
                debug!(
                    "keeping {} in {}: {} of {} references rewritten",
                    spec.path,
                    file.path.display(),
                    usage.replaceable,
                    usage.total
                );
            }
            continue;
        }
        if check.ignores(&spec.path, None, RULE_ID_UNUSED_IMPORT)
            || check.suppressed(spec.span.start, RULE_ID_UNUSED_IMPORT)
        {
            continue;
        }
        let fix = SuggestedFix::new(FIX_MESSAGE, vec![import_removal(file, spec)]).ok();
        diagnostics.push(Diagnostic {
            kind: DiagnosticKind::UnusedImport,
            span: spec.span,
            message: format!("The {} import is no longer necessary", spec.path),
            fix,
        });
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts() {
        let mut tally = FileUsageTally::default();
        tally.record("lo", true);
        tally.record("lo", true);
        tally.record("hi", false);
        assert_eq!(
            tally.get("lo"),
            AliasUsage {
                total: 2,
                replaceable: 2
            }
        );
        assert!(tally.get("lo").fully_replaced());
        assert!(!tally.get("hi").fully_replaced());
        assert!(!tally.get("missing").fully_replaced());
    }

    #[test]
    fn test_partial_usage_is_not_fully_replaced() {
        let mut tally = FileUsageTally::default();
        tally.record("lo", true);
        tally.record("lo", false);
        let usage = tally.get("lo");
        assert!(usage.replaceable <= usage.total);
        assert!(!usage.fully_replaced());
    }
}
