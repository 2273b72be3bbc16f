//! Call-site scanner.
//!
//! Finds every reference into an imported package, whether written as
//! `alias.Name` or as a bare name from a dot import, and checks it against the
//! registry. Resolution goes through the file's bindings only; a local
//! variable that happens to be called `lo` is never mistaken for the package.

use super::edits::import_insertions;
use super::{FileCheck, FileUsageTally};
use crate::fix::TextEdit;
use crate::registry::ReplacementRule;
use crate::rewrite::CallContext;
use crate::rules::ids::RULE_ID_SYMBOL;
use crate::rules::{Diagnostic, DiagnosticKind, FixError, SuggestedFix};
use crate::syntax::{qualify, Bindings, Call, Node, Object, SelectorKind, Span, TypeInfo};
use log::{debug, error, trace};
use rustc_hash::FxHashSet;

const FIX_MESSAGE: &str = "Replace with stdlib";

/// Where a reference sits.
#[derive(Debug, Clone, Copy)]
enum Position<'a> {
    /// The called expression of a call.
    Callee(&'a Call),
    /// A type or constraint.
    Type,
    /// Any other expression, e.g. a function value.
    Value,
}

/// A resolved reference to a package member.
#[derive(Debug, Clone, Copy)]
struct Reference<'a> {
    /// The selector or bare identifier.
    span: Span,
    package: &'a str,
    name: &'a str,
    /// Qualifier as written; `None` for dot imports.
    qualifier: Option<&'a str>,
    position: Position<'a>,
}

impl Reference<'_> {
    fn alias(&self) -> &str {
        self.qualifier.unwrap_or(".")
    }
}

/// Package member referenced by `node`, if any.
fn member_of<'a>(node: &'a Node, bindings: &'a Bindings) -> Option<(Span, &'a str, &'a str, Option<&'a str>)> {
    let (ident, span, qualifier) = match node {
        Node::Selector(sel) => (
            &sel.field,
            sel.span,
            Some(sel.operand.as_ident()?.name.as_str()),
        ),
        Node::Ident(ident) | Node::TypeName(ident) => (ident, ident.span, None),
        _ => return None,
    };
    match bindings.object_of(ident)? {
        Object::External { package, name, .. } => Some((span, package, name, qualifier)),
        _ => None,
    }
}

fn collect_references<'a>(check: &'a FileCheck<'a>) -> Vec<Reference<'a>> {
    let file = check.file;
    let bindings = &file.bindings;
    let mut callees: FxHashSet<Span> = FxHashSet::default();
    let mut references = Vec::new();
    file.walk(&mut |node| {
        let (target, position) = match node {
            Node::Call(call) => match member_of(&call.callee, bindings) {
                Some(target) => {
                    callees.insert(target.0);
                    (target, Position::Callee(call))
                }
                None => return true,
            },
            _ => match member_of(node, bindings) {
                Some(target) if !callees.contains(&target.0) => {
                    let position = match node {
                        Node::Selector(sel) if sel.kind == SelectorKind::QualifiedType => {
                            Position::Type
                        }
                        Node::TypeName(_) => Position::Type,
                        _ => Position::Value,
                    };
                    (target, position)
                }
                _ => return true,
            },
        };
        let (span, package, name, qualifier) = target;
        references.push(Reference {
            span,
            package,
            name,
            qualifier,
            position,
        });
        true
    });
    references
}

/// Scan the file, filling `tally` with every reference.
pub(super) fn scan(check: &FileCheck<'_>, tally: &mut FileUsageTally) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for reference in collect_references(check) {
        trace!(
            "{}: reference {}.{} via {}",
            check.file.path.display(),
            reference.package,
            reference.name,
            reference.alias()
        );
        let diagnostic = diagnose(check, &reference);
        let replaceable = diagnostic.as_ref().is_some_and(|d| d.fix.is_some());
        tally.record(reference.alias(), replaceable);
        diagnostics.extend(diagnostic);
    }
    diagnostics
}

fn diagnose(check: &FileCheck<'_>, reference: &Reference<'_>) -> Option<Diagnostic> {
    let rule = check.registry().lookup(reference.package, reference.name)?;
    if check.ignores(reference.package, Some(reference.name), RULE_ID_SYMBOL) {
        debug!("{}.{} is ignored", reference.package, reference.name);
        return None;
    }
    if !check.version.allows(rule.min_version) {
        debug!(
            "{}: {}.{} needs go{}, file is at {}",
            check.file.path.display(),
            reference.package,
            reference.name,
            rule.min_version,
            check.version
        );
        return None;
    }
    if check.suppressed(reference.span.start, RULE_ID_SYMBOL) {
        return None;
    }

    Some(Diagnostic {
        kind: DiagnosticKind::SymbolReplacement,
        span: reference.span,
        message: format!(
            "{}.{} can be replaced with {}",
            reference.package,
            reference.name,
            rule.replacement_label()
        ),
        fix: build_fix(check, rule, reference),
    })
}

fn build_fix(
    check: &FileCheck<'_>,
    rule: &ReplacementRule,
    reference: &Reference<'_>,
) -> Option<SuggestedFix> {
    let file = check.file;
    let mut edits = Vec::new();
    let mut packages: Vec<&str> = Vec::new();
    if let Some(replacement) = rule.replacement {
        edits.push(TextEdit::replace(
            reference.span,
            qualify(&file.imports, replacement.package, replacement.name),
        ));
        packages.push(replacement.package);
    }

    match (reference.position, rule.strategy) {
        // The replacement's type parameters differ from the helper's.
        (Position::Callee(call), _) if !call.type_args.is_empty() => return None,
        (Position::Callee(call), Some(strategy)) => {
            let ctx = CallContext {
                source: &file.source,
                call,
                types: &file.bindings,
                qualifier: reference.qualifier,
                symbol: reference.name,
                imports: &file.imports,
            };
            match strategy.apply(&ctx) {
                Ok(rewrite) => {
                    edits.extend(rewrite.edits);
                    packages.extend(rewrite.imports);
                }
                Err(err) => {
                    debug!(
                        "{}:{}: {} rewrite of {} failed: {err}",
                        file.path.display(),
                        file.line_index.line_number(call.span.start),
                        strategy.name(),
                        reference.name
                    );
                    return None;
                }
            }
        }
        (Position::Callee(_) | Position::Type, None) => {}
        (Position::Type, Some(_)) | (Position::Value, _) => return None,
    }

    edits.extend(import_insertions(file, &packages));
    match SuggestedFix::new(FIX_MESSAGE, edits) {
        Ok(fix) => Some(fix),
        Err(FixError::Empty) => None,
        Err(err) => {
            error!("{}: dropping fix for {}: {err}", file.path.display(), reference.name);
            debug_assert!(
                !matches!(err, FixError::Overlap { .. }),
                "overlapping edits in one fix: {err}"
            );
            None
        }
    }
}
