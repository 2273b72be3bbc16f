use super::ast::{Ident, ImportDecl, ImportName, ImportSpec};
use super::lower::{span_of, Lowerer};
use super::SourceFile;
use crate::utils::LineIndex;
use crate::version::file_build_version;
use std::path::Path;
use thiserror::Error;
use tree_sitter::{Node as TsNode, Parser};

/// Why a file could not be turned into a [`SourceFile`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// The Go grammar could not be loaded.
    #[error("failed to load the Go grammar: {0}")]
    Language(String),
    /// tree-sitter produced no tree.
    #[error("parser produced no syntax tree")]
    Failed,
    /// The source contains a syntax error.
    #[error("syntax error at {line}:{column}")]
    Syntax {
        /// 1-indexed line.
        line: usize,
        /// 1-indexed column.
        column: usize,
    },
}

/// A reusable Go parser.
///
/// Not `Sync`: parallel callers keep one instance per worker.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Create a parser with the Go grammar loaded.
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|err| ParseError::Language(err.to_string()))?;
        Ok(Self { parser })
    }

    /// Parse `source`, collect its imports and resolve every identifier.
    pub fn parse(&mut self, path: &Path, source: String) -> Result<SourceFile, ParseError> {
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or(ParseError::Failed)?;
        let root = tree.root_node();
        if let Some(error) = first_error(root) {
            let position = error.start_position();
            return Err(ParseError::Syntax {
                line: position.row + 1,
                column: position.column + 1,
            });
        }

        let mut cursor = root.walk();
        let top: Vec<TsNode<'_>> = root.named_children(&mut cursor).collect();

        let mut package = None;
        let mut package_clause = None;
        let mut imports = Vec::new();
        let mut import_decls = Vec::new();
        let mut decls = Vec::new();
        for node in top {
            match node.kind() {
                "package_clause" => {
                    package_clause = Some(span_of(node));
                    package = first_named(node).map(|name| span_of(name).text(&source).to_owned());
                }
                "import_declaration" => {
                    collect_import_decl(node, &source, &mut import_decls, &mut imports);
                }
                "comment" => {}
                _ => decls.push(node),
            }
        }

        let mut lowerer = Lowerer::new(&source, &imports, &decls);
        let nodes = decls.iter().map(|decl| lowerer.lower(*decl)).collect();
        let bindings = lowerer.finish();

        Ok(SourceFile {
            path: path.to_path_buf(),
            build_version: file_build_version(&source),
            line_index: LineIndex::new(&source),
            package,
            package_clause,
            imports,
            import_decls,
            nodes,
            bindings,
            source,
        })
    }
}

fn first_named(node: TsNode<'_>) -> Option<TsNode<'_>> {
    let mut cursor = node.walk();
    let first = node.named_children(&mut cursor).next();
    first
}

fn first_error(node: TsNode<'_>) -> Option<TsNode<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<TsNode<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn collect_import_decl(
    node: TsNode<'_>,
    source: &str,
    decls: &mut Vec<ImportDecl>,
    imports: &mut Vec<ImportSpec>,
) {
    let decl_index = decls.len();
    let mut grouped = false;
    let mut close_paren = None;
    let mut specs = Vec::new();

    let mut cursor = node.walk();
    let children: Vec<TsNode<'_>> = node.named_children(&mut cursor).collect();
    for child in children {
        match child.kind() {
            "import_spec" => specs.push(child),
            "import_spec_list" => {
                grouped = true;
                let mut list_cursor = child.walk();
                let entries: Vec<TsNode<'_>> = child.children(&mut list_cursor).collect();
                for entry in entries {
                    if entry.kind() == "import_spec" {
                        specs.push(entry);
                    } else if !entry.is_named() && entry.kind() == ")" {
                        close_paren = Some(entry.start_byte());
                    }
                }
            }
            _ => {}
        }
    }

    decls.push(ImportDecl {
        span: span_of(node),
        grouped,
        close_paren,
        spec_count: specs.len(),
    });

    for spec in specs {
        let Some(path_node) = spec.child_by_field_name("path") else {
            continue;
        };
        let path_span = span_of(path_node);
        let quoted = path_span.text(source);
        let path = quoted
            .get(1..quoted.len().saturating_sub(1))
            .unwrap_or_default()
            .to_owned();
        let name = spec.child_by_field_name("name").map(|name| {
            let span = span_of(name);
            match name.kind() {
                "dot" => ImportName::Dot(span),
                "blank_identifier" => ImportName::Blank(span),
                _ => ImportName::Alias(Ident {
                    name: span.text(source).to_owned(),
                    span,
                }),
            }
        });
        imports.push(ImportSpec {
            span: span_of(spec),
            name,
            path,
            path_span,
            decl: decl_index,
        });
    }
}
