//! Import insertion and removal edits.

use crate::fix::TextEdit;
use crate::syntax::{find_import, ImportSpec, SourceFile, Span};

/// The full line containing `span`, including its newline.
fn line_span(source: &str, span: Span) -> Span {
    let start = source
        .get(..span.start)
        .and_then(|head| head.rfind('\n'))
        .map_or(0, |i| i + 1);
    let end = source
        .get(span.end..)
        .and_then(|tail| tail.find('\n'))
        .map_or(source.len(), |i| span.end + i + 1);
    Span::new(start, end)
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// One insertion per package in `packages` the file does not import yet.
pub(super) fn import_insertions(file: &SourceFile, packages: &[&str]) -> Vec<TextEdit> {
    let mut missing: Vec<&str> = Vec::new();
    for &package in packages {
        if find_import(&file.imports, package).is_none() && !missing.contains(&package) {
            missing.push(package);
        }
    }
    missing
        .into_iter()
        .map(|package| import_insertion(file, package))
        .collect()
}

fn import_insertion(file: &SourceFile, path: &str) -> TextEdit {
    let source = file.source.as_str();
    let grouped = file
        .import_decls
        .iter()
        .find_map(|decl| decl.close_paren.map(|close| (decl, close)));
    if let Some((decl, close)) = grouped {
        let line_start = file.line_index.line_start_of(close);
        if is_blank(Span::new(line_start, close).text(source)) {
            return TextEdit::insert(line_start, format!("\t\"{path}\"\n"));
        }
        if let Some(open) = Span::new(decl.span.start, close).text(source).find('(') {
            return TextEdit::insert(decl.span.start + open + 1, format!("\"{path}\"; "));
        }
    }
    if let Some(last) = file.import_decls.last() {
        return TextEdit::insert(last.span.end, format!("\nimport \"{path}\""));
    }
    let after = file.package_clause.map_or(0, |clause| clause.end);
    TextEdit::insert(after, format!("\n\nimport \"{path}\""))
}

/// Deletes an import spec, together with its declaration when it is not grouped.
pub(super) fn import_removal(file: &SourceFile, spec: &ImportSpec) -> TextEdit {
    let source = file.source.as_str();
    if let Some(decl) = file.import_decls.get(spec.decl).filter(|decl| !decl.grouped) {
        let start = source
            .get(..decl.span.start)
            .and_then(|head| head.rfind('\n'))
            .unwrap_or(decl.span.start);
        return TextEdit::delete(Span::new(start, decl.span.end));
    }

    let line = line_span(source, spec.span);
    let before = Span::new(line.start, spec.span.start).text(source);
    let after = Span::new(spec.span.end, line.end).text(source);
    let rest = after.trim();
    if is_blank(before) && (rest.is_empty() || rest.starts_with("//")) {
        return TextEdit::delete(line);
    }

    // Inline spec: take the separator along.
    let tail = after
        .trim_start_matches([' ', '\t'])
        .trim_start_matches(';')
        .trim_start_matches([' ', '\t']);
    TextEdit::delete(Span::new(spec.span.start, spec.span.end + after.len() - tail.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::test_support::{parse, splice};

    fn insert(source: &str, packages: &[&str]) -> String {
        let file = parse(source);
        splice(source, &import_insertions(&file, packages))
    }

    fn remove(source: &str, index: usize) -> String {
        let file = parse(source);
        splice(source, &[import_removal(&file, &file.imports[index])])
    }

    #[test]
    fn test_insert_into_group() {
        let out = insert("package a\n\nimport (\n\t\"fmt\"\n)\n", &["slices", "cmp"]);
        assert_eq!(out, "package a\n\nimport (\n\t\"fmt\"\n\t\"slices\"\n\t\"cmp\"\n)\n");
    }

    #[test]
    fn test_insert_skips_existing_and_duplicates() {
        let out = insert("package a\n\nimport (\n\t\"fmt\"\n\t\"cmp\"\n)\n", &["cmp", "maps", "maps"]);
        assert_eq!(out, "package a\n\nimport (\n\t\"fmt\"\n\t\"cmp\"\n\t\"maps\"\n)\n");
    }

    #[test]
    fn test_insert_into_inline_group() {
        let out = insert("package a\n\nimport (\"fmt\")\n", &["slices"]);
        assert_eq!(out, "package a\n\nimport (\"slices\"; \"fmt\")\n");
    }

    #[test]
    fn test_inline_group_survives_removal_of_its_only_spec() {
        let source = "package a\n\nimport (\"github.com/samber/lo\")\n";
        let file = parse(source);
        let mut edits = import_insertions(&file, &["maps"]);
        edits.push(import_removal(&file, &file.imports[0]));
        assert_eq!(splice(source, &edits), "package a\n\nimport (\"maps\"; )\n");
    }

    #[test]
    fn test_insert_after_single_import() {
        let out = insert("package a\n\nimport \"fmt\"\n\nfunc f() {}\n", &["slices"]);
        assert_eq!(out, "package a\n\nimport \"fmt\"\nimport \"slices\"\n\nfunc f() {}\n");
    }

    #[test]
    fn test_insert_without_imports() {
        let out = insert("package a\n\nfunc f() {}\n", &["slices"]);
        assert_eq!(out, "package a\n\nimport \"slices\"\n\nfunc f() {}\n");
    }

    #[test]
    fn test_remove_grouped_line() {
        let out = remove(
            "package a\n\nimport (\n\t\"fmt\"\n\tx \"github.com/samber/lo\" // keep?\n)\n",
            1,
        );
        assert_eq!(out, "package a\n\nimport (\n\t\"fmt\"\n)\n");
    }

    #[test]
    fn test_remove_single_import() {
        let out = remove(
            "package a\n\nimport \"fmt\"\nimport \"github.com/samber/lo\"\n\nfunc f() {}\n",
            1,
        );
        assert_eq!(out, "package a\n\nimport \"fmt\"\n\nfunc f() {}\n");
    }

    #[test]
    fn test_remove_inline_spec() {
        let out = remove("package a\n\nimport (\"github.com/samber/lo\"; \"fmt\")\n", 0);
        assert_eq!(out, "package a\n\nimport (\"fmt\")\n");
    }

    #[test]
    fn test_removal_and_insertion_compose() {
        let source = "package a\n\nimport (\n\t\"github.com/samber/lo\"\n)\n";
        let file = parse(source);
        let mut edits = import_insertions(&file, &["maps"]);
        edits.push(import_removal(&file, &file.imports[0]));
        assert_eq!(splice(source, &edits), "package a\n\nimport (\n\t\"maps\"\n)\n");
    }
}
