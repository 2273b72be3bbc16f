//! Path normalization and Go file discovery.

use crate::constants::DEFAULT_EXCLUDE_FOLDERS;
use crate::utils::is_test_path;
use log::warn;
use std::path::{Path, PathBuf};

/// Normalizes a path for CLI display.
///
/// - Converts backslashes to forward slashes
/// - Strips a leading `./`
///
/// # Examples
/// ```
/// use std::path::Path;
/// use stdlift::utils::normalize_display_path;
///
/// assert_eq!(normalize_display_path(Path::new(".\\pkg\\util.go")), "pkg/util.go");
/// assert_eq!(normalize_display_path(Path::new("./cmd/main.go")), "cmd/main.go");
/// ```
#[must_use]
pub fn normalize_display_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    let clean = s.trim_start_matches(r"\\?\");
    let normalized = clean.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_owned()
}

/// Checks if a name matches any exclusion pattern.
/// Supports exact matching and wildcard patterns starting with `*.`.
#[must_use]
pub fn is_excluded(name: &str, excludes: &[String]) -> bool {
    excludes.iter().any(|exclude| match exclude.strip_prefix('*') {
        Some(suffix) if suffix.starts_with('.') => name.ends_with(suffix),
        _ => name == exclude,
    })
}

/// Collects Go files below `root` with gitignore support.
///
/// Uses the `ignore` crate to respect `.gitignore`, `.git/info/exclude` and the
/// global gitignore in addition to the default exclusions (`vendor`,
/// `testdata`, ...). A `root` that is itself a file is returned as-is, even when
/// it is a test file.
#[must_use]
pub fn collect_go_files(root: &Path, exclude: &[String], include_tests: bool) -> Vec<PathBuf> {
    use ignore::WalkBuilder;

    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let excludes: Vec<String> = exclude
        .iter()
        .cloned()
        .chain(DEFAULT_EXCLUDE_FOLDERS().iter().map(|&s| s.to_owned()))
        .collect();
    let root_for_filter = root.to_path_buf();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(move |entry| {
            if entry.path() == root_for_filter {
                return true;
            }
            if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                return true;
            }
            entry
                .file_name()
                .to_str()
                .is_none_or(|name| !is_excluded(name, &excludes))
        })
        .build();

    let mut files = Vec::new();
    for result in walker {
        match result {
            Ok(entry) => {
                let path = entry.path();
                if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                    continue;
                }
                if path.extension().is_none_or(|ext| ext != "go") {
                    continue;
                }
                if !include_tests && is_test_path(&path.to_string_lossy()) {
                    continue;
                }
                files.push(path.to_path_buf());
            }
            Err(err) => warn!("walk error: {err}"),
        }
    }

    files.sort();
    files
}
