//! A small typed AST over Go source.
//!
//! Only the shapes the rewrite engine inspects get their own variants; every
//! other construct is kept as [`Node::Other`] with its children, so a full walk
//! still reaches every identifier in the file.

use serde::Serialize;
use std::borrow::Cow;

/// Half-open byte range `[start, end)` within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`.
    #[must_use]
    pub const fn empty_at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no bytes.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// Whether `other` lies entirely within `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two ranges share at least one byte, or a zero-width span
    /// sits strictly inside the other.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The source text covered by the span. Out-of-range spans yield `""`.
    #[must_use]
    pub fn text(self, source: &str) -> &str {
        source.get(self.start..self.end).unwrap_or_default()
    }
}

/// An identifier occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    /// The identifier text.
    pub name: String,
    /// Where it appears.
    pub span: Span,
}

/// Whether a selector is an expression or a package-qualified type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    /// `x.f` in expression position.
    Value,
    /// `pkg.T` in type position.
    QualifiedType,
}

/// `operand.field`
#[derive(Debug, Clone)]
pub struct Selector {
    /// Whole selector span.
    pub span: Span,
    /// Left-hand side; an identifier for package-qualified references.
    pub operand: Box<Node>,
    /// Selected name.
    pub field: Ident,
    /// Expression or type position.
    pub kind: SelectorKind,
}

/// A call expression.
#[derive(Debug, Clone)]
pub struct Call {
    /// Whole call span, callee through closing parenthesis.
    pub span: Span,
    /// The called expression.
    pub callee: Box<Node>,
    /// Explicit type arguments, `f[int](x)`.
    pub type_args: Vec<Node>,
    /// Arguments in order. A spread argument is stored without its `...`.
    pub args: Vec<Node>,
    /// Whether the last argument is spread with `...`.
    pub ellipsis: bool,
}

/// One parameter group, e.g. `x, y string`.
#[derive(Debug, Clone)]
pub struct Param {
    /// Span of the whole group.
    pub span: Span,
    /// Declared names; empty for unnamed parameters.
    pub names: Vec<Ident>,
    /// The parameter type.
    pub ty: Box<Node>,
    /// `...T`
    pub variadic: bool,
}

/// A parenthesized parameter list.
#[derive(Debug, Clone)]
pub struct ParamList {
    /// Span including both parentheses.
    pub span: Span,
    /// Parameter groups in order.
    pub params: Vec<Param>,
}

impl ParamList {
    /// All declared names, in order.
    pub fn names(&self) -> impl Iterator<Item = &Ident> {
        self.params.iter().flat_map(|p| p.names.iter())
    }
}

/// Result clause of a function literal.
#[derive(Debug, Clone)]
pub enum FuncResult {
    /// A bare type, `func() bool`.
    Type(Box<Node>),
    /// A parenthesized list, `func() (ok bool)`.
    List(ParamList),
}

/// A `{ ... }` block.
#[derive(Debug, Clone)]
pub struct Block {
    /// Span including both braces.
    pub span: Span,
    /// Statements and nested constructs.
    pub stmts: Vec<Node>,
}

/// `func(params) result { body }`
#[derive(Debug, Clone)]
pub struct FuncLit {
    /// Whole literal span.
    pub span: Span,
    /// Parameters.
    pub params: ParamList,
    /// Result clause, if any.
    pub result: Option<FuncResult>,
    /// Function body.
    pub body: Block,
}

/// Binary operators the rewrite engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// Any other operator, by token text.
    Other(&'static str),
}

impl BinaryOp {
    /// Map a tree-sitter operator token.
    #[must_use]
    pub fn from_token(token: &'static str) -> Self {
        match token {
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            other => Self::Other(other),
        }
    }
}

/// `left op right`
#[derive(Debug, Clone)]
pub struct Binary {
    /// Whole expression span.
    pub span: Span,
    /// Left operand.
    pub left: Box<Node>,
    /// Operator.
    pub op: BinaryOp,
    /// Right operand.
    pub right: Box<Node>,
}

/// `return a, b`
#[derive(Debug, Clone)]
pub struct Return {
    /// Whole statement span.
    pub span: Span,
    /// Returned expressions.
    pub results: Vec<Node>,
}

/// Any construct without a dedicated variant.
#[derive(Debug, Clone)]
pub struct Other {
    /// tree-sitter node kind.
    pub kind: &'static str,
    /// Node span.
    pub span: Span,
    /// Lowered named children.
    pub children: Vec<Node>,
}

/// A lowered syntax node.
#[derive(Debug, Clone)]
pub enum Node {
    /// Identifier in expression position (also package qualifiers).
    Ident(Ident),
    /// Identifier in type position.
    TypeName(Ident),
    /// Selector or qualified type.
    Selector(Selector),
    /// Call expression.
    Call(Call),
    /// Function literal.
    FuncLit(FuncLit),
    /// Binary expression.
    Binary(Binary),
    /// Return statement.
    Return(Return),
    /// Everything else.
    Other(Other),
}

impl Node {
    /// Source range of the node.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Ident(ident) | Self::TypeName(ident) => ident.span,
            Self::Selector(sel) => sel.span,
            Self::Call(call) => call.span,
            Self::FuncLit(lit) => lit.span,
            Self::Binary(bin) => bin.span,
            Self::Return(ret) => ret.span,
            Self::Other(other) => other.span,
        }
    }

    /// Direct children, in source order.
    #[must_use]
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Self::Ident(_) | Self::TypeName(_) => Vec::new(),
            Self::Selector(sel) => vec![&*sel.operand],
            Self::Call(call) => std::iter::once(&*call.callee)
                .chain(call.type_args.iter())
                .chain(call.args.iter())
                .collect(),
            Self::FuncLit(lit) => {
                let mut out: Vec<&Node> = lit.params.params.iter().map(|p| &*p.ty).collect();
                match &lit.result {
                    Some(FuncResult::Type(ty)) => out.push(ty),
                    Some(FuncResult::List(list)) => out.extend(list.params.iter().map(|p| &*p.ty)),
                    None => {}
                }
                out.extend(lit.body.stmts.iter());
                out
            }
            Self::Binary(bin) => vec![&*bin.left, &*bin.right],
            Self::Return(ret) => ret.results.iter().collect(),
            Self::Other(other) => other.children.iter().collect(),
        }
    }

    /// The identifier, if this is a bare identifier in expression position.
    #[must_use]
    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Self::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// tree-sitter kind for [`Node::Other`], `None` for typed variants.
    #[must_use]
    pub fn other_kind(&self) -> Option<&'static str> {
        match self {
            Self::Other(other) => Some(other.kind),
            _ => None,
        }
    }

    /// Whether the expression contains a call anywhere inside it.
    #[must_use]
    pub fn contains_call(&self) -> bool {
        matches!(self, Self::Call(_)) || self.children().into_iter().any(Self::contains_call)
    }

    /// Pre-order walk over this node and its descendants.
    ///
    /// Returning `false` from `visit` skips the node's children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node) -> bool) {
        if visit(self) {
            for child in self.children() {
                child.walk(visit);
            }
        }
    }
}

/// How an import names its package locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// `import x "path"`
    Alias(Ident),
    /// `import . "path"`
    Dot(Span),
    /// `import _ "path"`
    Blank(Span),
}

/// One import spec.
#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// Span of the spec, alias through path.
    pub span: Span,
    /// Explicit local name, if written.
    pub name: Option<ImportName>,
    /// Unquoted import path.
    pub path: String,
    /// Span of the quoted path literal.
    pub path_span: Span,
    /// Index into [`super::SourceFile::import_decls`].
    pub decl: usize,
}

impl ImportSpec {
    /// Local name as written: the alias, `.`, `_`, or the default package name.
    #[must_use]
    pub fn local_name(&self) -> Cow<'_, str> {
        match &self.name {
            Some(ImportName::Alias(ident)) => Cow::Borrowed(ident.name.as_str()),
            Some(ImportName::Dot(_)) => Cow::Borrowed("."),
            Some(ImportName::Blank(_)) => Cow::Borrowed("_"),
            None => Cow::Borrowed(default_package_name(&self.path)),
        }
    }

    /// `import . "path"`
    #[must_use]
    pub fn is_dot(&self) -> bool {
        matches!(self.name, Some(ImportName::Dot(_)))
    }

    /// `import _ "path"`
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self.name, Some(ImportName::Blank(_)))
    }
}

/// An `import` declaration, single or grouped.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    /// Whole declaration span.
    pub span: Span,
    /// Whether the specs are wrapped in `( ... )`.
    pub grouped: bool,
    /// Offset of the closing parenthesis for grouped declarations.
    pub close_paren: Option<usize>,
    /// Number of specs in the declaration.
    pub spec_count: usize,
}

/// Default local name of an import path.
///
/// The last path element, skipping a trailing major-version element such as
/// `/v2`, and dropping a `gopkg.in` style `.vN` suffix.
#[must_use]
pub fn default_package_name(path: &str) -> &str {
    let mut elements = path.rsplit('/');
    let last = elements.next().unwrap_or(path);
    let name = if is_major_version(last) {
        elements.next().unwrap_or(last)
    } else {
        last
    };
    if path.starts_with("gopkg.in/") {
        if let Some((base, version)) = name.rsplit_once('.') {
            if is_major_version(version) {
                return base;
            }
        }
    }
    name
}

fn is_major_version(element: &str) -> bool {
    element
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Renders `name` from package `path` the way the importing file can refer to it.
///
/// Uses the existing local name when the package is already imported, the
/// bare name for dot imports, and the default package name otherwise.
#[must_use]
pub fn qualify(imports: &[ImportSpec], path: &str, name: &str) -> String {
    match find_import(imports, path) {
        Some(spec) if spec.is_dot() => name.to_owned(),
        Some(spec) => format!("{}.{name}", spec.local_name()),
        None => format!("{}.{name}", default_package_name(path)),
    }
}

/// The usable (non-blank) import of `path`, if any.
#[must_use]
pub fn find_import<'a>(imports: &'a [ImportSpec], path: &str) -> Option<&'a ImportSpec> {
    imports.iter().find(|spec| spec.path == path && !spec.is_blank())
}
