//! Name resolution results.

use super::ast::{Ident, Node, Span};
use rustc_hash::FxHashMap;

/// What an identifier occurrence refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    /// The package name introduced by `imports[import]`.
    PkgName {
        /// Index into the file's imports.
        import: usize,
    },
    /// A member of an imported package, reached through a qualifier or a dot import.
    External {
        /// Index into the file's imports.
        import: usize,
        /// Import path of the package.
        package: String,
        /// Member name.
        name: String,
    },
    /// A function-local declaration.
    Local {
        /// Span of the declaring identifier.
        decl: Span,
    },
    /// A declaration at package level.
    PackageLevel,
    /// A predeclared identifier such as `len` or `string`.
    Universe,
}

/// Resolved objects and static types for one file.
#[derive(Debug, Default, Clone)]
pub struct Bindings {
    pub(crate) objects: FxHashMap<Span, Object>,
    pub(crate) decl_types: FxHashMap<Span, String>,
    pub(crate) expr_types: FxHashMap<Span, String>,
}

impl Bindings {
    /// Spans of every identifier bound to the package name of `imports[import]`, sorted.
    #[must_use]
    pub fn uses_of_import(&self, import: usize) -> Vec<Span> {
        let mut spans: Vec<Span> = self
            .objects
            .iter()
            .filter(|(_, obj)| matches!(obj, Object::PkgName { import: i } if *i == import))
            .map(|(span, _)| *span)
            .collect();
        spans.sort_unstable();
        spans
    }

    /// Number of references that go through `imports[import]`.
    ///
    /// Qualified references count their qualifier; dot-import references
    /// count the bare member name.
    #[must_use]
    pub fn reference_count(&self, import: usize, dot: bool) -> usize {
        self.objects
            .values()
            .filter(|obj| match obj {
                Object::PkgName { import: i } => !dot && *i == import,
                Object::External { import: i, .. } => dot && *i == import,
                _ => false,
            })
            .count()
    }

    /// Static type of an expression node, if known.
    #[must_use]
    pub fn static_type(&self, node: &Node) -> Option<&str> {
        match node {
            Node::Ident(ident) => match self.objects.get(&ident.span)? {
                Object::Local { decl } => self.decl_types.get(decl).map(String::as_str),
                _ => None,
            },
            _ => self.expr_types.get(&node.span()).map(String::as_str),
        }
    }
}

/// The type context handed to rewrite strategies.
pub trait TypeInfo {
    /// The object an identifier occurrence refers to.
    fn object_of(&self, ident: &Ident) -> Option<&Object>;

    /// The static type of an expression, rendered as Go source.
    fn type_of(&self, node: &Node) -> Option<String>;
}

impl TypeInfo for Bindings {
    fn object_of(&self, ident: &Ident) -> Option<&Object> {
        self.objects.get(&ident.span)
    }

    fn type_of(&self, node: &Node) -> Option<String> {
        self.static_type(node).map(str::to_owned)
    }
}
