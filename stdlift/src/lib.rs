//! Core library for the `stdlift` analyzer.
//!
//! `stdlift` finds Go code that calls into third-party helper packages whose
//! functionality has since moved into the standard library (or into plain
//! language syntax), and proposes mechanical rewrites for it. When every use of
//! such an import has been rewritten, it also proposes dropping the import.

#![allow(
    clippy::similar_names,
    clippy::format_push_string,
    clippy::map_unwrap_or,
    clippy::items_after_statements
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Per-file analysis: package renames, call-site scanning and import usage tallies.
pub mod analyzer;

/// Command-line arguments.
pub mod cli;

/// Configuration loading (`.stdlift.toml`).
pub mod config;

/// Shared constants and regex patterns.
pub mod constants;

/// Command-line entry point shared by both binaries.
pub mod entry_point;

/// Applying suggested fixes to source text.
pub mod fix;

/// Locating `go.mod` files and reading their `go` directive.
pub mod module;

/// Rich CLI output formatting.
pub mod output;

/// The replacement registry: which symbols and packages have standard successors.
pub mod registry;

/// Rewrite strategies that turn a matched call into its replacement form.
pub mod rewrite;

/// Diagnostics, suggested fixes and reportable findings.
pub mod rules;

/// Parallel analysis of whole file sets.
pub mod runner;

/// Go frontend: tree-sitter parsing, lowering and name binding.
pub mod syntax;

/// Line indexing, suppression comments and file discovery.
pub mod utils;

/// Go versions, build constraints and the version gate.
pub mod version;
