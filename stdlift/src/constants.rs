use regex::Regex;
use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Name of the per-project configuration file.
pub const CONFIG_FILENAME: &str = ".stdlift.toml";

/// Alternative, non-hidden configuration file name.
pub const ALT_CONFIG_FILENAME: &str = "stdlift.toml";

/// Module manifest consulted for the module-wide Go version.
pub const GO_MOD_FILENAME: &str = "go.mod";

/// Linter name accepted in `//nolint:<name>` comments.
pub const LINTER_NAME: &str = "stdlift";

/// Number of files above which the CLI shows a progress spinner.
pub const SPINNER_THRESHOLD: usize = 50;

/// Regex for `//nolint` suppression comments.
///
/// Capture group 1 holds the comma-separated linter names or rule IDs, if any.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn get_suppression_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"//\s*nolint(?::([\w\-]+(?:\s*,\s*[\w\-]+)*))?")
            .expect("Invalid suppression regex pattern")
    })
}

/// Regex for Go test files.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn get_test_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"_test\.go$").expect("Invalid test file regex pattern"))
}

/// Set of folders to exclude by default.
pub fn get_default_exclude_folders() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = FxHashSet::default();
        s.insert(".git");
        s.insert("vendor");
        s.insert("testdata");
        s.insert("node_modules");
        s.insert(".idea");
        s.insert(".vscode");
        s
    })
}

/// Identifiers predeclared in Go's universe block.
pub fn get_universe_names() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        [
            // types
            "any", "bool", "byte", "comparable", "complex64", "complex128", "error", "float32",
            "float64", "int", "int8", "int16", "int32", "int64", "rune", "string", "uint",
            "uint8", "uint16", "uint32", "uint64", "uintptr",
            // constants and zero value
            "true", "false", "iota", "nil",
            // functions
            "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len",
            "make", "max", "min", "new", "panic", "print", "println", "real", "recover",
        ]
        .into_iter()
        .collect()
    })
}

/// Predeclared types that can appear as conversion targets, e.g. `int64(x)`.
pub fn get_basic_types() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        [
            "bool", "byte", "complex64", "complex128", "float32", "float64", "int", "int8",
            "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16", "uint32",
            "uint64", "uintptr",
        ]
        .into_iter()
        .collect()
    })
}

pub use get_basic_types as BASIC_TYPES;
pub use get_default_exclude_folders as DEFAULT_EXCLUDE_FOLDERS;
pub use get_suppression_re as SUPPRESSION_RE;
pub use get_test_file_re as TEST_FILE_RE;
pub use get_universe_names as UNIVERSE_NAMES;
