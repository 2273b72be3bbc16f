//! Whole-package import renames.

use super::FileCheck;
use crate::fix::TextEdit;
use crate::rules::ids::RULE_ID_PACKAGE;
use crate::rules::{Diagnostic, DiagnosticKind, SuggestedFix};
use crate::syntax::default_package_name;
use log::{debug, error};

const FIX_MESSAGE: &str = "Replace package import and update references";

/// Propose the successor for every import that has one.
///
/// An unaliased import whose local name changes with the new path gets every
/// qualifier in the file renamed too. Explicit aliases are kept as written.
pub(super) fn check_imports(check: &FileCheck<'_>) -> Vec<Diagnostic> {
    let file = check.file;
    let mut diagnostics = Vec::new();
    for (index, spec) in file.imports.iter().enumerate() {
        let Some(rule) = check.registry().import_rule(&spec.path) else {
            continue;
        };
        if check.ignores(&spec.path, None, RULE_ID_PACKAGE) {
            continue;
        }
        if !check.version.allows(rule.min_version) {
            debug!(
                "{}: {} needs go{}, file is at {}",
                file.path.display(),
                rule.replacement,
                rule.min_version,
                check.version
            );
            continue;
        }
        if check.suppressed(spec.span.start, RULE_ID_PACKAGE) {
            continue;
        }

        let mut edits = vec![TextEdit::replace(
            spec.path_span,
            format!("\"{}\"", rule.replacement),
        )];
        let alias = rule.alias();
        if spec.name.is_none() && default_package_name(&spec.path) != alias {
            edits.extend(
                file.bindings
                    .uses_of_import(index)
                    .into_iter()
                    .map(|span| TextEdit::replace(span, alias)),
            );
        }
        let fix = match SuggestedFix::new(FIX_MESSAGE, edits) {
            Ok(fix) => Some(fix),
            Err(err) => {
                error!("{}: rename of {} dropped: {err}", file.path.display(), spec.path);
                None
            }
        };

        diagnostics.push(Diagnostic {
            kind: DiagnosticKind::PackageReplacement,
            span: spec.span,
            message: format!(
                "Package {:?} can be replaced with {:?}",
                spec.path, rule.replacement
            ),
            fix,
        });
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::super::Analyzer;
    use crate::registry::{ImportRule, Registry};
    use crate::rewrite::test_support::splice;
    use crate::version::GoVersion;
    use std::path::Path;

    fn renamed_registry() -> Registry {
        Registry::new(
            Vec::new(),
            vec![ImportRule {
                path: "example.com/old/util",
                replacement: "strings",
                min_version: GoVersion::new(1, 0),
                default_alias: None,
            }],
        )
    }

    #[test]
    fn test_rename_updates_qualifiers() {
        let registry = renamed_registry();
        let source = "package a\n\nimport \"example.com/old/util\"\n\nfunc f() {\n\t_ = util.ToUpper(\"x\")\n\t_ = util.ToLower(\"y\")\n}\n";
        let diagnostics = Analyzer::new(&registry)
            .check_source(Path::new("a.go"), source, None)
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        let fix = diagnostics[0].fix.as_ref().unwrap();
        let out = splice(source, &fix.edits);
        assert!(out.contains("import \"strings\""), "{out}");
        assert!(out.contains("strings.ToUpper(\"x\")"), "{out}");
        assert!(out.contains("strings.ToLower(\"y\")"), "{out}");
    }

    #[test]
    fn test_rename_leaves_shadowed_names() {
        let registry = renamed_registry();
        let source = "package a\n\nimport \"example.com/old/util\"\n\nfunc f() {\n\t_ = util.ToUpper(\"x\")\n\tutil := 1\n\t_ = util\n}\n";
        let diagnostics = Analyzer::new(&registry)
            .check_source(Path::new("a.go"), source, None)
            .unwrap();
        let out = splice(source, &diagnostics[0].fix.as_ref().unwrap().edits);
        assert!(out.contains("strings.ToUpper"), "{out}");
        assert!(out.contains("\tutil := 1\n\t_ = util\n"), "{out}");
    }

    #[test]
    fn test_same_default_name_only_edits_path() {
        let source = "package a\n\nimport \"golang.org/x/exp/slices\"\n\nfunc f(a []int) { _ = slices.Clone(a) }\n";
        let diagnostics = Analyzer::new(Registry::builtin())
            .check_source(Path::new("a.go"), source, None)
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "Package \"golang.org/x/exp/slices\" can be replaced with \"slices\""
        );
        assert_eq!(diagnostics[0].fix.as_ref().unwrap().edits.len(), 1);
    }

    #[test]
    fn test_version_gate_and_suppression() {
        let source = "package a\n\nimport (\n\t\"golang.org/x/exp/maps\"\n\t\"golang.org/x/net/context\" //nolint:STD002\n)\n";
        let diagnostics = Analyzer::new(Registry::builtin())
            .check_source(Path::new("a.go"), source, Some(GoVersion::new(1, 20)))
            .unwrap();
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }
}
