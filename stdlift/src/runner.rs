//! Parallel analysis over many files.

use crate::analyzer::Analyzer;
use crate::module::ModuleResolver;
use crate::rules::{Diagnostic, Finding};
use crate::syntax::GoParser;
use crate::utils::LineIndex;
use indicatif::ProgressBar;
use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Number of files to process per chunk in parallel processing.
/// Sources of one chunk are held in memory until the chunk is done.
const CHUNK_SIZE: usize = 500;

/// A file that could not be read or parsed.
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    /// The file where the error occurred.
    pub file: PathBuf,
    /// The error message.
    pub error: String,
}

/// Diagnostics of one file, with what is needed to fix it.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// The analyzed file.
    pub path: PathBuf,
    /// Source text as analyzed.
    pub source: String,
    /// Offsets to lines for the same text.
    pub line_index: LineIndex,
    /// Sorted diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Counts for the end-of-run summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisSummary {
    /// Files parsed and checked.
    pub files_analyzed: usize,
    /// Files that could not be read or parsed.
    pub parse_errors: usize,
    /// All findings.
    pub total_findings: usize,
    /// Findings that carry a fix.
    pub fixable: usize,
    /// Findings per rule ID.
    pub by_rule: BTreeMap<String, usize>,
}

/// Everything one run found.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    /// Files with at least one diagnostic, in path order.
    pub files: Vec<FileReport>,
    /// Files that could not be analyzed.
    pub parse_errors: Vec<FileError>,
    /// Files parsed and checked.
    pub files_analyzed: usize,
}

impl AnalysisReport {
    /// Findings in file order, paths shown relative to `root` when possible.
    #[must_use]
    pub fn findings(&self, root: Option<&Path>) -> Vec<Finding> {
        self.files
            .iter()
            .flat_map(|report| {
                let shown = root
                    .and_then(|root| report.path.strip_prefix(root).ok())
                    .filter(|rel| !rel.as_os_str().is_empty())
                    .unwrap_or(&report.path)
                    .to_path_buf();
                report.diagnostics.iter().map(move |diagnostic| {
                    Finding::from_diagnostic(diagnostic, shown.clone(), &report.line_index)
                })
            })
            .collect()
    }

    /// Summary counts.
    #[must_use]
    pub fn summary(&self) -> AnalysisSummary {
        let mut summary = AnalysisSummary {
            files_analyzed: self.files_analyzed,
            parse_errors: self.parse_errors.len(),
            ..AnalysisSummary::default()
        };
        for diagnostic in self.files.iter().flat_map(|f| &f.diagnostics) {
            summary.total_findings += 1;
            if diagnostic.fix.is_some() {
                summary.fixable += 1;
            }
            *summary
                .by_rule
                .entry(diagnostic.rule_id().to_owned())
                .or_default() += 1;
        }
        summary
    }
}

enum Outcome {
    Checked(Option<FileReport>),
    Failed(FileError),
}

fn process_file(
    parser: &mut Option<GoParser>,
    analyzer: &Analyzer<'_>,
    modules: &ModuleResolver,
    path: &Path,
) -> Outcome {
    let failed = |error: String| {
        warn!("{}: {error}", path.display());
        Outcome::Failed(FileError {
            file: path.to_path_buf(),
            error,
        })
    };

    let Some(parser) = parser.as_mut() else {
        return failed("Go parser unavailable".to_owned());
    };
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => return failed(format!("cannot read file: {err}")),
    };
    let file = match parser.parse(path, source) {
        Ok(file) => file,
        Err(err) => return failed(err.to_string()),
    };

    let diagnostics = analyzer.check(&file, modules.module_version(path));
    debug!("{}: {} diagnostics", path.display(), diagnostics.len());
    if diagnostics.is_empty() {
        return Outcome::Checked(None);
    }
    Outcome::Checked(Some(FileReport {
        path: file.path,
        source: file.source,
        line_index: file.line_index,
        diagnostics,
    }))
}

/// Analyze `files` in parallel. Each worker owns its parser.
#[must_use]
pub fn analyze_files(
    analyzer: &Analyzer<'_>,
    files: &[PathBuf],
    progress: Option<&ProgressBar>,
) -> AnalysisReport {
    let modules = ModuleResolver::new();
    let mut report = AnalysisReport::default();

    for chunk in files.chunks(CHUNK_SIZE) {
        let outcomes: Vec<Outcome> = chunk
            .par_iter()
            .map_init(
                || match GoParser::new() {
                    Ok(parser) => Some(parser),
                    Err(err) => {
                        warn!("cannot create Go parser: {err}");
                        None
                    }
                },
                |parser, path| {
                    let outcome = process_file(parser, analyzer, &modules, path);
                    if let Some(progress) = progress {
                        progress.inc(1);
                    }
                    outcome
                },
            )
            .collect();

        for outcome in outcomes {
            match outcome {
                Outcome::Checked(file) => {
                    report.files_analyzed += 1;
                    report.files.extend(file);
                }
                Outcome::Failed(error) => report.parse_errors.push(error),
            }
        }
    }

    report
}
