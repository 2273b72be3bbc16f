//! Built-in replacement tables.
//!
//! Two immutable tables drive the analyzer: symbol rules keyed by
//! `(package path, symbol)` and whole-package import rules keyed by path.
//! Both are built once per process and shared read-only between workers.

use crate::rewrite::Strategy;
use crate::syntax::default_package_name;
use crate::version::GoVersion;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::OnceLock;

/// A symbol in a standard package, e.g. `slices.MinFunc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolRef {
    /// Import path of the package.
    pub package: &'static str,
    /// Exported name.
    pub name: &'static str,
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", default_package_name(self.package), self.name)
    }
}

/// One symbol with a standard replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplacementRule {
    /// Import path of the package that defines the symbol.
    pub package: &'static str,
    /// Symbol name.
    pub symbol: &'static str,
    /// The standard symbol, or `None` when built-in syntax replaces the call.
    pub replacement: Option<SymbolRef>,
    /// First Go version that ships the replacement.
    pub min_version: GoVersion,
    /// Transformation beyond the rename.
    pub strategy: Option<Strategy>,
}

impl ReplacementRule {
    /// Replacement as shown in messages, `builtin` for syntax replacements.
    #[must_use]
    pub fn replacement_label(&self) -> String {
        self.replacement
            .map_or_else(|| "builtin".to_owned(), |repl| repl.to_string())
    }
}

/// A package whose whole import has a standard successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportRule {
    /// Import path being replaced.
    pub path: &'static str,
    /// Import path of the successor.
    pub replacement: &'static str,
    /// First Go version that ships the successor.
    pub min_version: GoVersion,
    /// Local name references should use after the rename, when it differs
    /// from the successor's default name.
    pub default_alias: Option<&'static str>,
}

impl ImportRule {
    /// Local name an unaliased import takes after the rename.
    #[must_use]
    pub fn alias(&self) -> &'static str {
        self.default_alias
            .unwrap_or_else(|| default_package_name(self.replacement))
    }
}

/// Lookup tables for symbol and import rules.
#[derive(Debug, Default)]
pub struct Registry {
    symbols: FxHashMap<&'static str, FxHashMap<&'static str, ReplacementRule>>,
    imports: FxHashMap<&'static str, ImportRule>,
}

const fn symbol(package: &'static str, name: &'static str) -> Option<SymbolRef> {
    Some(SymbolRef { package, name })
}

const LO: &str = "github.com/samber/lo";
const LO_MUTABLE: &str = "github.com/samber/lo/mutable";
const X_CONSTRAINTS: &str = "golang.org/x/exp/constraints";

#[allow(clippy::too_many_lines)]
fn builtin_symbol_rules() -> Vec<ReplacementRule> {
    let rule = |package, symbol, replacement, min_version, strategy| ReplacementRule {
        package,
        symbol,
        replacement,
        min_version,
        strategy,
    };
    let go121 = GoVersion::new(1, 21);
    let go122 = GoVersion::new(1, 22);
    let go123 = GoVersion::new(1, 23);
    let go1 = GoVersion::new(1, 0);

    vec![
        rule(LO, "Chunk", symbol("slices", "Chunk"), go123, None),
        rule(LO, "Drop", None, go1, Some(Strategy::Template("{0}[{1}:]"))),
        rule(
            LO,
            "DropRight",
            None,
            go1,
            Some(Strategy::Template("{0}[:len({0})-{1}]")),
        ),
        rule(LO, "Contains", symbol("slices", "Contains"), go121, None),
        rule(LO, "ContainsBy", symbol("slices", "ContainsFunc"), go121, None),
        rule(LO, "IndexOf", symbol("slices", "Index"), go121, None),
        rule(LO, "LastIndexOf", symbol("slices", "LastIndex"), go121, None),
        rule(LO, "Min", symbol("slices", "Min"), go121, None),
        rule(
            LO,
            "MinBy",
            symbol("slices", "MinFunc"),
            go121,
            Some(Strategy::LessToCompare {
                arg: 1,
                reverse: false,
            }),
        ),
        rule(LO, "Max", symbol("slices", "Max"), go121, None),
        rule(
            LO,
            "MaxBy",
            symbol("slices", "MaxFunc"),
            go121,
            Some(Strategy::LessToCompare {
                arg: 1,
                reverse: true,
            }),
        ),
        rule(LO, "IsSorted", symbol("slices", "IsSorted"), go121, None),
        rule(
            LO,
            "IsSortedByKey",
            symbol("slices", "IsSortedFunc"),
            go121,
            Some(Strategy::KeyToCompare { arg: 1 }),
        ),
        rule(
            LO,
            "Flatten",
            symbol("slices", "Concat"),
            go122,
            Some(Strategy::Spread),
        ),
        rule(
            LO,
            "Repeat",
            symbol("slices", "Repeat"),
            go123,
            Some(Strategy::ContainerizeReorder {
                wrap: 1,
                order: &[1, 0],
            }),
        ),
        rule(LO, "Keys", symbol("maps", "Keys"), go123, None),
        rule(LO, "Values", symbol("maps", "Values"), go123, None),
        rule(LO, "CoalesceOrEmpty", symbol("cmp", "Or"), go122, None),
        rule(
            LO,
            "RuneLength",
            symbol("unicode/utf8", "RuneCountInString"),
            go1,
            None,
        ),
        rule(LO_MUTABLE, "Reverse", symbol("slices", "Reverse"), go121, None),
        rule(X_CONSTRAINTS, "Ordered", symbol("cmp", "Ordered"), go121, None),
    ]
}

fn builtin_import_rules() -> Vec<ImportRule> {
    let rule = |path, replacement, min_version, default_alias| ImportRule {
        path,
        replacement,
        min_version,
        default_alias,
    };
    vec![
        rule("golang.org/x/exp/maps", "maps", GoVersion::new(1, 21), None),
        rule(
            "golang.org/x/exp/rand",
            "math/rand/v2",
            GoVersion::new(1, 22),
            Some("rand"),
        ),
        rule("golang.org/x/exp/slices", "slices", GoVersion::new(1, 21), None),
        rule("golang.org/x/exp/slog", "log/slog", GoVersion::new(1, 21), None),
        rule("golang.org/x/net/context", "context", GoVersion::new(1, 7), None),
        rule("golang.org/x/sync/syncmap", "sync", GoVersion::new(1, 7), None),
    ]
}

impl Registry {
    /// The process-wide built-in registry.
    pub fn builtin() -> &'static Self {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(|| Self::new(builtin_symbol_rules(), builtin_import_rules()))
    }

    /// Build a registry from explicit tables. Later duplicates win.
    #[must_use]
    pub fn new(symbols: Vec<ReplacementRule>, imports: Vec<ImportRule>) -> Self {
        let mut registry = Self::default();
        for rule in symbols {
            registry
                .symbols
                .entry(rule.package)
                .or_default()
                .insert(rule.symbol, rule);
        }
        for rule in imports {
            registry.imports.insert(rule.path, rule);
        }
        registry
    }

    /// The rule for `package.symbol`, if one is registered.
    #[must_use]
    pub fn lookup(&self, package: &str, symbol: &str) -> Option<&ReplacementRule> {
        self.symbols.get(package)?.get(symbol)
    }

    /// The import rule for `path`, if one is registered.
    #[must_use]
    pub fn import_rule(&self, path: &str) -> Option<&ImportRule> {
        self.imports.get(path)
    }

    /// Whether any rule concerns the package at `path`.
    #[must_use]
    pub fn covers_package(&self, path: &str) -> bool {
        self.symbols.contains_key(path) || self.imports.contains_key(path)
    }

    /// All symbol rules, sorted by package and symbol.
    #[must_use]
    pub fn rules(&self) -> Vec<&ReplacementRule> {
        let mut rules: Vec<_> = self.symbols.values().flat_map(FxHashMap::values).collect();
        rules.sort_by_key(|r| (r.package, r.symbol));
        rules
    }

    /// All import rules, sorted by path.
    #[must_use]
    pub fn import_rules(&self) -> Vec<&ImportRule> {
        let mut rules: Vec<_> = self.imports.values().collect();
        rules.sort_by_key(|r| r.path);
        rules
    }
}
