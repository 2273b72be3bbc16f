use crate::rules::Finding;
use crate::runner::{AnalysisSummary, FileError};
use crate::utils::normalize_display_path;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// Print the exclusion list in styled format.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_exclusion_list(writer: &mut impl Write, folders: &[String]) -> std::io::Result<()> {
    if folders.is_empty() {
        return Ok(());
    }
    writeln!(
        writer,
        "{} {}",
        "Excluding:".yellow().bold(),
        folders.join(", ")
    )
}

/// Create and return a spinner for analysis.
///
/// In test mode, returns a hidden progress bar to avoid polluting test output.
#[must_use]
pub fn create_spinner() -> ProgressBar {
    if cfg!(test) {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("stdlift analyzing your code…");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Create a progress bar with file count.
///
/// In test mode, returns a hidden progress bar to avoid polluting test output.
#[must_use]
pub fn create_progress_bar(total_files: u64) -> ProgressBar {
    if cfg!(test) {
        return ProgressBar::hidden();
    }

    let pb =
        ProgressBar::with_draw_target(Some(total_files), ProgressDrawTarget::stderr_with_hz(20));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.set_message("analyzing...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print one line per finding: `path:line:col: message [RULE-ID]`.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_findings(writer: &mut impl Write, findings: &[Finding]) -> std::io::Result<()> {
    for f in findings {
        let location = format!("{}:{}:{}", normalize_display_path(&f.file), f.line, f.col);
        let marker = if f.fixable {
            format!(" {}", "(fixable)".green())
        } else {
            String::new()
        };
        writeln!(
            writer,
            "{}: {} {}{marker}",
            location.bold(),
            f.message,
            format!("[{}]", f.rule_id).dimmed()
        )?;
    }
    Ok(())
}

/// Helper to create a styled table
fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

/// Print a list of files that could not be analyzed.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_parse_errors(writer: &mut impl Write, errors: &[FileError]) -> std::io::Result<()> {
    if errors.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{}", "Parse Errors".bold().underline().red())?;

    let mut table = create_table(vec!["File", "Error"]);
    for e in errors {
        table.add_row(vec![
            Cell::new(normalize_display_path(&e.file)).add_attribute(Attribute::Bold),
            Cell::new(&e.error).fg(Color::Red),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print the per-rule count table and the totals.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_summary(writer: &mut impl Write, summary: &AnalysisSummary) -> std::io::Result<()> {
    if summary.total_findings == 0 {
        writeln!(
            writer,
            "{} {}",
            "✓ No replaceable helpers found.".green(),
            format!("({} files analyzed)", summary.files_analyzed).dimmed()
        )?;
        return Ok(());
    }

    writeln!(writer)?;
    let mut table = create_table(vec!["Rule ID", "Findings"]);
    for (rule_id, count) in &summary.by_rule {
        table.add_row(vec![
            Cell::new(rule_id).add_attribute(Attribute::Bold),
            Cell::new(count),
        ]);
    }
    table.add_row(vec![
        Cell::new("fixable").fg(Color::Green),
        Cell::new(summary.fixable).fg(Color::Green),
    ]);
    writeln!(writer, "{table}")?;

    writeln!(
        writer,
        "{}",
        format!(
            "Found {} issues in {} files analyzed ({} fixable with --fix)",
            summary.total_findings.to_string().bold(),
            summary.files_analyzed,
            summary.fixable
        )
        .dimmed()
    )?;
    Ok(())
}

/// Print a quiet report (summary line only) for CI/CD mode.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_report_quiet(
    writer: &mut impl Write,
    summary: &AnalysisSummary,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "[SUMMARY] {} findings ({} fixable), {} parse errors",
        summary.total_findings, summary.fixable, summary.parse_errors
    )
}

/// The `--json` document.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Every finding.
    pub findings: &'a [Finding],
    /// Files that could not be analyzed.
    pub parse_errors: &'a [FileError],
    /// Counts.
    pub summary: &'a AnalysisSummary,
}

/// Print the report as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn print_json(writer: &mut impl Write, report: &JsonReport<'_>) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn finding(fixable: bool) -> Finding {
        Finding {
            rule_id: "STD001".to_owned(),
            category: "stdlib".to_owned(),
            message: "github.com/samber/lo.Keys can be replaced with maps.Keys".to_owned(),
            file: PathBuf::from("./pkg/a.go"),
            line: 7,
            col: 6,
            fixable,
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_finding_line() {
        let out = render(|w| print_findings(w, &[finding(true), finding(false)]));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "pkg/a.go:7:6: github.com/samber/lo.Keys can be replaced with maps.Keys [STD001] (fixable)"
        );
        assert!(lines[1].ends_with("[STD001]"));
    }

    #[test]
    fn test_summary_table() {
        let summary = AnalysisSummary {
            files_analyzed: 3,
            parse_errors: 0,
            total_findings: 3,
            fixable: 2,
            by_rule: BTreeMap::from([("STD001".to_owned(), 2), ("STD003".to_owned(), 1)]),
        };
        let out = render(|w| print_summary(w, &summary));
        assert!(out.contains("STD001"));
        assert!(out.contains("STD003"));
        assert!(out.contains("fixable"));
        assert!(out.contains("Found 3 issues in 3 files analyzed (2 fixable with --fix)"));
    }

    #[test]
    fn test_clean_summary() {
        let out = render(|w| print_summary(w, &AnalysisSummary::default()));
        assert!(out.contains("No replaceable helpers found."));
    }

    #[test]
    fn test_parse_errors_table() {
        let errors = vec![FileError {
            file: PathBuf::from("bad.go"),
            error: "syntax error at line 3".to_owned(),
        }];
        let out = render(|w| print_parse_errors(w, &errors));
        assert!(out.contains("Parse Errors"));
        assert!(out.contains("bad.go"));
    }

    #[test]
    fn test_json_shape() {
        let findings = vec![finding(true)];
        let summary = AnalysisSummary::default();
        let mut buffer = Vec::new();
        print_json(
            &mut buffer,
            &JsonReport {
                findings: &findings,
                parse_errors: &[],
                summary: &summary,
            },
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["findings"][0]["rule_id"], "STD001");
        assert_eq!(value["findings"][0]["fixable"], true);
        assert!(value["parse_errors"].as_array().unwrap().is_empty());
        assert_eq!(value["summary"]["total_findings"], 0);
    }

    #[test]
    fn test_spinner_hidden_in_tests() {
        assert!(create_spinner().is_hidden());
        assert!(create_progress_bar(10).is_hidden());
    }
}
