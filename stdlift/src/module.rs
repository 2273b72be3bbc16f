//! Module-level Go version lookup.
//!
//! Every file belongs to the module of the nearest `go.mod` above it. The
//! module's `go` directive is the fallback version for files that carry no
//! `//go:build` constraint of their own.

use crate::constants::GO_MOD_FILENAME;
use crate::version::GoVersion;
use dashmap::DashMap;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Reads the `go` directive of a `go.mod` file.
#[must_use]
pub fn parse_go_directive(go_mod: &str) -> Option<GoVersion> {
    for line in go_mod.lines() {
        let line = line.split("//").next().unwrap_or_default().trim();
        let mut words = line.split_whitespace();
        if words.next() != Some("go") {
            continue;
        }
        let Some(value) = words.next() else {
            continue;
        };
        return match value.parse() {
            Ok(version) => Some(version),
            Err(err) => {
                warn!("ignoring go directive: {err}");
                None
            }
        };
    }
    None
}

/// Resolves and caches module versions per directory.
///
/// Safe to share between worker threads.
#[derive(Debug, Default)]
pub struct ModuleResolver {
    cache: DashMap<PathBuf, Option<GoVersion>>,
}

impl ModuleResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `go` version declared by the module owning `file`.
    #[must_use]
    pub fn module_version(&self, file: &Path) -> Option<GoVersion> {
        let file = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
        let dir = if file.is_dir() {
            file.as_path()
        } else {
            file.parent()?
        };
        self.dir_version(dir)
    }

    fn dir_version(&self, dir: &Path) -> Option<GoVersion> {
        if let Some(hit) = self.cache.get(dir).map(|entry| *entry.value()) {
            return hit;
        }

        let go_mod = dir.join(GO_MOD_FILENAME);
        let resolved = if go_mod.is_file() {
            match fs::read_to_string(&go_mod) {
                Ok(content) => {
                    let version = parse_go_directive(&content);
                    debug!("{}: module go version {version:?}", go_mod.display());
                    version
                }
                Err(err) => {
                    warn!("cannot read {}: {err}", go_mod.display());
                    None
                }
            }
        } else {
            dir.parent().and_then(|parent| self.dir_version(parent))
        };

        self.cache.insert(dir.to_path_buf(), resolved);
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_go_directive() {
        let go_mod = "module example.com/m\n\ngo 1.21.0 // toolchain pin\n\nrequire github.com/samber/lo v1.47.0\n";
        assert_eq!(
            parse_go_directive(go_mod),
            Some(GoVersion::with_patch(1, 21, 0))
        );
    }

    #[test]
    fn test_godebug_is_not_the_go_directive() {
        let go_mod = "module m\n\ngodebug default=go1.21\ngo 1.22\n";
        assert_eq!(parse_go_directive(go_mod), Some(GoVersion::new(1, 22)));
    }

    #[test]
    fn test_missing_directive() {
        assert_eq!(parse_go_directive("module m\n"), None);
    }

    #[test]
    fn test_resolver_walks_up_to_nearest_go_mod() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module m\n\ngo 1.20\n").unwrap();
        let nested = dir.path().join("internal").join("pkg");
        std::fs::create_dir_all(&nested).unwrap();
        let file = nested.join("a.go");
        std::fs::write(&file, "package pkg\n").unwrap();

        let resolver = ModuleResolver::new();
        assert_eq!(resolver.module_version(&file), Some(GoVersion::new(1, 20)));
        // Second lookup is served from the cache.
        assert_eq!(resolver.module_version(&file), Some(GoVersion::new(1, 20)));
    }

    #[test]
    fn test_nested_module_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module m\n\ngo 1.20\n").unwrap();
        let inner = dir.path().join("tools");
        std::fs::create_dir_all(&inner).unwrap();
        std::fs::write(inner.join("go.mod"), "module m/tools\n\ngo 1.23\n").unwrap();
        let file = inner.join("main.go");
        std::fs::write(&file, "package main\n").unwrap();

        let resolver = ModuleResolver::new();
        assert_eq!(resolver.module_version(&file), Some(GoVersion::new(1, 23)));
    }
}
