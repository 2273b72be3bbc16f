//! Go frontend.
//!
//! [`GoParser`] parses a file with tree-sitter, lowers it into the small AST in
//! [`ast`] and resolves identifiers into [`Bindings`]. The analyzer only ever
//! sees a [`SourceFile`].

mod ast;
mod lower;
mod parser;
mod scope;

pub use ast::{
    default_package_name, find_import, qualify, Binary, BinaryOp, Block, Call, FuncLit,
    FuncResult, Ident, ImportDecl, ImportName, ImportSpec, Node, Other, Param, ParamList, Return,
    Selector, SelectorKind, Span,
};
pub use parser::{GoParser, ParseError};
pub use scope::{Bindings, Object, TypeInfo};

use crate::utils::LineIndex;
use crate::version::GoVersion;
use std::path::PathBuf;

/// A parsed and resolved Go file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Where the file was read from.
    pub path: PathBuf,
    /// Full source text.
    pub source: String,
    /// Package name from the package clause.
    pub package: Option<String>,
    /// Span of the package clause.
    pub package_clause: Option<Span>,
    /// Import specs in source order.
    pub imports: Vec<ImportSpec>,
    /// Import declarations in source order.
    pub import_decls: Vec<ImportDecl>,
    /// Lowered top-level declarations, imports excluded.
    pub nodes: Vec<Node>,
    /// Name resolution and static types.
    pub bindings: Bindings,
    /// Version implied by the file's `//go:build` line.
    pub build_version: Option<GoVersion>,
    /// Offset to line/column conversion.
    pub line_index: LineIndex,
}

impl SourceFile {
    /// Pre-order walk over every lowered node in the file.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node) -> bool) {
        for node in &self.nodes {
            node.walk(visit);
        }
    }
}
