//! Stdlift analyzer module.
//!
//! One file is checked in three fixed steps:
//! - `packages`: whole-package import renames
//! - `calls`: every reference into a registered package, with rewrites
//! - `usage`: import removal once every reference was rewritten

mod calls;
mod edits;
mod packages;
mod usage;

pub use usage::{AliasUsage, FileUsageTally};

use crate::registry::Registry;
use crate::rules::Diagnostic;
use crate::syntax::{GoParser, ParseError, SourceFile};
use crate::utils::{get_ignored_lines, is_line_suppressed, Suppression};
use crate::version::{EffectiveVersion, GoVersion};
use log::trace;
use rustc_hash::FxHashMap;
use std::path::Path;

/// The main analyzer.
///
/// Holds only read-only state, so one instance can check files from many
/// threads at once.
#[derive(Debug, Clone)]
pub struct Analyzer<'r> {
    registry: &'r Registry,
    /// Rule IDs, import paths or `path.Symbol` names to skip.
    ignore: Vec<String>,
    /// Overrides the module's `go` directive.
    go_version: Option<GoVersion>,
}

impl<'r> Analyzer<'r> {
    /// Create an analyzer over `registry`.
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            ignore: Vec::new(),
            go_version: None,
        }
    }

    /// Builder-style method to set the ignore list.
    #[must_use]
    pub fn with_ignore(mut self, ignore: Vec<String>) -> Self {
        self.ignore = ignore;
        self
    }

    /// Builder-style method to override the module version.
    #[must_use]
    pub fn with_go_version(mut self, go_version: Option<GoVersion>) -> Self {
        self.go_version = go_version;
        self
    }

    /// The version `file` is checked against.
    #[must_use]
    pub fn effective_version(&self, file: &SourceFile, module: Option<GoVersion>) -> EffectiveVersion {
        EffectiveVersion::resolve(file.build_version, self.go_version.or(module))
    }

    /// Check one parsed file. Diagnostics come back sorted by position.
    #[must_use]
    pub fn check(&self, file: &SourceFile, module: Option<GoVersion>) -> Vec<Diagnostic> {
        let check = FileCheck {
            analyzer: self,
            file,
            version: self.effective_version(file, module),
            suppressions: get_ignored_lines(&file.source),
        };
        trace!("checking {} at {}", file.path.display(), check.version);

        let mut diagnostics = packages::check_imports(&check);
        let mut tally = FileUsageTally::default();
        diagnostics.extend(calls::scan(&check, &mut tally));
        diagnostics.extend(usage::reconcile(&check, &tally));
        diagnostics.sort_by_key(|d| (d.span.start, d.span.end));
        diagnostics
    }

    /// Parse and check source text in one go.
    pub fn check_source(
        &self,
        path: &Path,
        source: &str,
        module: Option<GoVersion>,
    ) -> Result<Vec<Diagnostic>, ParseError> {
        let file = GoParser::new()?.parse(path, source.to_owned())?;
        Ok(self.check(&file, module))
    }

    /// Whether the ignore list names `rule_id`, `package`, or `package.symbol`.
    fn ignores(&self, package: &str, symbol: Option<&str>, rule_id: &str) -> bool {
        self.ignore.iter().any(|entry| {
            entry.eq_ignore_ascii_case(rule_id)
                || entry == package
                || symbol.is_some_and(|symbol| {
                    entry
                        .strip_prefix(package)
                        .and_then(|rest| rest.strip_prefix('.'))
                        == Some(symbol)
                })
        })
    }
}

/// Per-file state threaded through the three steps.
struct FileCheck<'a> {
    analyzer: &'a Analyzer<'a>,
    file: &'a SourceFile,
    version: EffectiveVersion,
    suppressions: FxHashMap<usize, Suppression>,
}

impl FileCheck<'_> {
    fn registry(&self) -> &Registry {
        self.analyzer.registry
    }

    fn ignores(&self, package: &str, symbol: Option<&str>, rule_id: &str) -> bool {
        self.analyzer.ignores(package, symbol, rule_id)
    }

    /// Whether a `//nolint` comment on the line of `offset` covers `rule_id`.
    fn suppressed(&self, offset: usize, rule_id: &str) -> bool {
        let line = self.file.line_index.line_number(offset);
        is_line_suppressed(&self.suppressions, line, rule_id)
    }
}
