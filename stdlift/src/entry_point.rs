use crate::analyzer::Analyzer;
use crate::cli::Cli;
use crate::config::Config;
use crate::constants::SPINNER_THRESHOLD;
use crate::fix::apply_fixes;
use crate::output::{
    create_spinner, print_exclusion_list, print_findings, print_json, print_parse_errors,
    print_report_quiet, print_summary, JsonReport,
};
use crate::registry::Registry;
use crate::runner::{analyze_files, AnalysisReport};
use crate::utils::{collect_go_files, normalize_display_path};
use crate::version::GoVersion;
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Exit code when nothing is left to report.
const EXIT_CLEAN: i32 = 0;
/// Exit code when findings remain.
const EXIT_FINDINGS: i32 = 1;
/// Exit code for usage and I/O errors.
const EXIT_ERROR: i32 = 2;

/// Runs the analyzer with the given arguments.
///
/// # Errors
///
/// Returns an error if writing output or rewriting a file fails.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Run stdlift with the given arguments, writing output to the specified writer.
///
/// This is the testable version of `run_with_args` that allows output capture.
///
/// # Errors
///
/// Returns an error if writing output or rewriting a file fails.
pub fn run_with_args_to<W: Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["stdlift".to_owned()];
    program_args.extend(args);
    let cli = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => {
            match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    write!(writer, "{e}")?;
                    writer.flush()?;
                    return Ok(EXIT_CLEAN);
                }
                _ => {
                    eprint!("{e}");
                    return Ok(EXIT_ERROR);
                }
            }
        }
    };

    init_logging(cli.output.verbose);

    let paths = if cli.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        cli.paths.clone()
    };
    for path in &paths {
        if !path.exists() {
            eprintln!(
                "Error: The file or directory '{}' does not exist.",
                path.display()
            );
            return Ok(EXIT_ERROR);
        }
    }

    // Load config from the first path
    let config = Config::load_from_path(&paths[0]);
    if let Some(file) = &config.config_file_path {
        debug!("using config {}", file.display());
    }

    let mut exclude_folders = config.stdlift.exclude_folders.clone().unwrap_or_default();
    exclude_folders.extend(cli.exclude_folders.iter().cloned());
    let include_tests = cli.include_tests || config.stdlift.include_tests.unwrap_or(false);
    let mut ignore = config.stdlift.ignore.clone().unwrap_or_default();
    ignore.extend(cli.ignore.iter().cloned());

    let go_version = match &cli.go_version {
        Some(raw) => match raw.parse::<GoVersion>() {
            Ok(version) => Some(version),
            Err(err) => {
                eprintln!("Error: invalid --go-version: {err}");
                return Ok(EXIT_ERROR);
            }
        },
        None => match config.stdlift.go_version() {
            Ok(version) => version,
            Err(err) => {
                eprintln!("Error: {err}");
                return Ok(EXIT_ERROR);
            }
        },
    };

    let text_mode = !cli.output.json && !cli.output.quiet;
    if cli.output.verbose && text_mode {
        eprintln!("[VERBOSE] stdlift v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("[VERBOSE] Using {} threads", rayon::current_num_threads());
        if let Some(version) = go_version {
            eprintln!("[VERBOSE] Go version override: {version}");
        }
        eprintln!();
    }
    if text_mode {
        print_exclusion_list(writer, &exclude_folders)?;
    }

    let mut files: Vec<PathBuf> = paths
        .iter()
        .flat_map(|path| collect_go_files(path, &exclude_folders, include_tests))
        .collect();
    files.sort();
    files.dedup();
    info!("analyzing {} files", files.len());

    let analyzer = Analyzer::new(Registry::builtin())
        .with_ignore(ignore)
        .with_go_version(go_version);

    let spinner = (text_mode && files.len() > SPINNER_THRESHOLD).then(create_spinner);
    let report = analyze_files(&analyzer, &files, spinner.as_ref());
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let cwd = std::env::current_dir().ok();
    let findings = report.findings(cwd.as_deref());
    let summary = report.summary();

    if cli.output.json {
        print_json(
            writer,
            &JsonReport {
                findings: &findings,
                parse_errors: &report.parse_errors,
                summary: &summary,
            },
        )?;
    } else if cli.output.quiet {
        print_report_quiet(writer, &summary)?;
    } else {
        print_findings(writer, &findings)?;
        print_parse_errors(writer, &report.parse_errors)?;
        print_summary(writer, &summary)?;
    }

    let remaining = if cli.fixes.fix {
        let outcome = fix_files(&report, writer, FixMode::Write)?;
        if text_mode {
            writeln!(
                writer,
                "{}",
                format!(
                    "Applied {} fixes in {} files ({} skipped)",
                    outcome.applied, outcome.files_changed, outcome.skipped
                )
                .green()
            )?;
        }
        summary.total_findings - summary.fixable + outcome.skipped
    } else {
        if cli.fixes.diff {
            fix_files(&report, writer, FixMode::Print)?;
        }
        summary.total_findings
    };

    writer.flush()?;
    if remaining > 0 || !report.parse_errors.is_empty() {
        Ok(EXIT_FINDINGS)
    } else {
        Ok(EXIT_CLEAN)
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    // A second initialization (e.g. repeated runs in one test process) is a no-op.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixMode {
    /// Write fixed files back to disk.
    Write,
    /// Print the fixed text of every changed file.
    Print,
}

#[derive(Debug, Default)]
struct FixTotals {
    applied: usize,
    skipped: usize,
    files_changed: usize,
}

fn fix_files<W: Write>(report: &AnalysisReport, writer: &mut W, mode: FixMode) -> Result<FixTotals> {
    let mut totals = FixTotals::default();
    for file in &report.files {
        let outcome = apply_fixes(&file.source, &file.diagnostics)
            .with_context(|| format!("cannot apply fixes to {}", file.path.display()))?;
        totals.applied += outcome.applied;
        totals.skipped += outcome.skipped;
        if !outcome.changed() {
            continue;
        }
        totals.files_changed += 1;
        match mode {
            FixMode::Write => write_file(&file.path, &outcome.text)?,
            FixMode::Print => {
                writeln!(
                    writer,
                    "{}",
                    format!("==> {} <==", normalize_display_path(&file.path)).cyan()
                )?;
                write!(writer, "{}", outcome.text)?;
            }
        }
    }
    Ok(totals)
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))?;
    debug!("rewrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LO_FILE: &str = "package a\n\nimport \"github.com/samber/lo\"\n\nfunc f(a []int, b int) bool {\n\treturn lo.Contains(a, b)\n}\n";

    fn project(source: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("go.mod"), "module m\n\ngo 1.22\n").unwrap();
        fs::write(dir.path().join("a.go"), source).unwrap();
        dir
    }

    fn run(args: &[&str]) -> (i32, String) {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        let code = run_with_args_to(args.iter().map(|&s| s.to_owned()).collect(), &mut buffer)
            .unwrap();
        (code, String::from_utf8(buffer).unwrap())
    }

    #[test]
    fn test_findings_exit_one() {
        let dir = project(LO_FILE);
        let root = dir.path().to_str().unwrap();
        let (code, out) = run(&[root]);
        assert_eq!(code, 1);
        assert!(out.contains("can be replaced with slices.Contains [STD001] (fixable)"), "{out}");
        assert!(out.contains("import is no longer necessary [STD003]"), "{out}");
    }

    #[test]
    fn test_fix_rewrites_and_exits_clean() {
        let dir = project(LO_FILE);
        let root = dir.path().to_str().unwrap();
        let (code, _) = run(&["--fix", root]);
        assert_eq!(code, 0);
        let fixed = fs::read_to_string(dir.path().join("a.go")).unwrap();
        assert_eq!(
            fixed,
            "package a\n\nimport \"slices\"\n\nfunc f(a []int, b int) bool {\n\treturn slices.Contains(a, b)\n}\n"
        );
    }

    #[test]
    fn test_diff_leaves_file_untouched() {
        let dir = project(LO_FILE);
        let root = dir.path().to_str().unwrap();
        let (code, out) = run(&["--diff", root]);
        assert_eq!(code, 1);
        assert!(out.contains("return slices.Contains(a, b)"), "{out}");
        assert_eq!(fs::read_to_string(dir.path().join("a.go")).unwrap(), LO_FILE);
    }

    #[test]
    fn test_clean_tree_exits_zero() {
        let dir = project("package a\n\nfunc f() {}\n");
        let root = dir.path().to_str().unwrap();
        assert_eq!(run(&[root]).0, 0);
    }

    #[test]
    fn test_usage_errors_exit_two() {
        assert_eq!(run(&["--fix", "--diff"]).0, 2);
        assert_eq!(run(&["/definitely/not/here"]).0, 2);
        let dir = project(LO_FILE);
        let root = dir.path().to_str().unwrap();
        assert_eq!(run(&["--go-version", "banana", root]).0, 2);
    }

    #[test]
    fn test_go_version_flag_gates() {
        let dir = project(LO_FILE);
        let root = dir.path().to_str().unwrap();
        let (code, _) = run(&["--go-version", "1.20", root]);
        assert_eq!(code, 0);
    }

    #[test]
    fn test_json_output() {
        let dir = project(LO_FILE);
        let root = dir.path().to_str().unwrap();
        let (code, out) = run(&["--json", root]);
        assert_eq!(code, 1);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["summary"]["total_findings"], 2);
        assert_eq!(value["summary"]["fixable"], 2);
    }
}
