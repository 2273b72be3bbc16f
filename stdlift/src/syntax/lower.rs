//! Lowering of the tree-sitter concrete tree into [`Node`]s, with name binding.
//!
//! Binding runs in the same pass: every identifier use is resolved against the
//! enclosing scopes, then package-level names, then the file's imports, then the
//! universe block. A bare exported name that resolves nowhere is bound through
//! the file's dot import when there is exactly one.

use super::ast::{
    Binary, BinaryOp, Block, Call, FuncLit, FuncResult, Ident, ImportSpec, Node, Other, Param,
    ParamList, Return, Selector, SelectorKind, Span,
};
use super::scope::{Bindings, Object};
use crate::constants::{BASIC_TYPES, UNIVERSE_NAMES};
use rustc_hash::{FxHashMap, FxHashSet};
use tree_sitter::Node as TsNode;

/// Kinds that open a new lexical block.
const SCOPED_KINDS: &[&str] = &[
    "block",
    "for_statement",
    "if_statement",
    "expression_switch_statement",
    "select_statement",
    "expression_case",
    "default_case",
    "type_case",
    "communication_case",
    "function_declaration",
    "method_declaration",
    "function_type",
    "method_elem",
    "method_spec",
];

pub(super) fn span_of(node: TsNode<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

fn named_children<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children
}

fn field_children<'t>(node: TsNode<'t>, field: &str) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    let children = node.children_by_field_name(field, &mut cursor).collect();
    children
}

fn has_token(node: TsNode<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

pub(super) struct Lowerer<'a> {
    source: &'a str,
    imports: &'a [ImportSpec],
    package_names: FxHashSet<String>,
    scopes: Vec<FxHashMap<String, Span>>,
    bindings: Bindings,
}

impl<'a> Lowerer<'a> {
    /// Prepare a lowerer for a file whose top-level declarations are `decls`.
    pub(super) fn new(source: &'a str, imports: &'a [ImportSpec], decls: &[TsNode<'_>]) -> Self {
        let mut lowerer = Self {
            source,
            imports,
            package_names: FxHashSet::default(),
            scopes: Vec::new(),
            bindings: Bindings::default(),
        };
        for decl in decls {
            lowerer.collect_package_names(*decl);
        }
        lowerer
    }

    pub(super) fn finish(self) -> Bindings {
        self.bindings
    }

    fn collect_package_names(&mut self, node: TsNode<'_>) {
        match node.kind() {
            "function_declaration" | "type_spec" | "type_alias" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.package_names.insert(self.text(name).to_owned());
                }
            }
            "var_spec" | "const_spec" => {
                for name in field_children(node, "name") {
                    let name = self.text(name);
                    if name != "_" {
                        self.package_names.insert(name.to_owned());
                    }
                }
            }
            "type_declaration" | "var_declaration" | "const_declaration" | "var_spec_list"
            | "const_spec_list" => {
                for child in named_children(node) {
                    self.collect_package_names(child);
                }
            }
            _ => {}
        }
    }

    fn text(&self, node: TsNode<'_>) -> &'a str {
        span_of(node).text(self.source)
    }

    fn ident(&self, node: TsNode<'_>) -> Ident {
        Ident {
            name: self.text(node).to_owned(),
            span: span_of(node),
        }
    }

    fn resolve(&self, name: &str) -> Option<Object> {
        if name == "_" {
            return None;
        }
        for scope in self.scopes.iter().rev() {
            if let Some(decl) = scope.get(name) {
                return Some(Object::Local { decl: *decl });
            }
        }
        if self.package_names.contains(name) {
            return Some(Object::PackageLevel);
        }
        if let Some(import) = self
            .imports
            .iter()
            .position(|spec| !spec.is_dot() && !spec.is_blank() && spec.local_name() == name)
        {
            return Some(Object::PkgName { import });
        }
        if UNIVERSE_NAMES().contains(name) {
            return Some(Object::Universe);
        }
        if name.starts_with(char::is_uppercase) {
            let mut dots = self.imports.iter().enumerate().filter(|(_, s)| s.is_dot());
            if let (Some((import, spec)), None) = (dots.next(), dots.next()) {
                return Some(Object::External {
                    import,
                    package: spec.path.clone(),
                    name: name.to_owned(),
                });
            }
        }
        None
    }

    fn use_ident(&mut self, node: TsNode<'_>) -> Ident {
        let ident = self.ident(node);
        if let Some(object) = self.resolve(&ident.name) {
            self.bindings.objects.insert(ident.span, object);
        }
        ident
    }

    fn declare(&mut self, ident: &Ident, ty: Option<String>) {
        if ident.name == "_" {
            return;
        }
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.insert(ident.name.clone(), ident.span);
                self.bindings
                    .objects
                    .insert(ident.span, Object::Local { decl: ident.span });
                if let Some(ty) = ty {
                    self.bindings.decl_types.insert(ident.span, ty);
                }
            }
            None => {
                self.bindings.objects.insert(ident.span, Object::PackageLevel);
            }
        }
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.push(FxHashMap::default());
        let out = f(self);
        self.scopes.pop();
        out
    }

    fn record_type(&mut self, span: Span, ty: impl Into<String>) {
        self.bindings.expr_types.insert(span, ty.into());
    }

    /// Lower one concrete node.
    pub(super) fn lower(&mut self, node: TsNode<'_>) -> Node {
        match node.kind() {
            "identifier" => Node::Ident(self.use_ident(node)),
            "type_identifier" => Node::TypeName(self.use_ident(node)),
            "selector_expression" => self.lower_selector(node),
            "qualified_type" => self.lower_qualified_type(node),
            "call_expression" => self.lower_call(node),
            "func_literal" => self.lower_func_lit(node),
            "binary_expression" => self.lower_binary(node),
            "return_statement" => self.lower_return(node),
            "parameter_declaration" | "variadic_parameter_declaration" => {
                let param = self.lower_param(node);
                param_node(node.kind(), param)
            }
            "type_parameter_list" => self.lower_type_params(node),
            "short_var_declaration" => self.lower_short_var(node),
            "var_spec" | "const_spec" => self.lower_value_spec(node),
            "range_clause" | "receive_statement" => self.lower_assignment_clause(node),
            "type_switch_statement" => self.scoped(|this| this.lower_type_switch(node)),
            "type_spec" | "type_alias" => self.lower_type_spec(node),
            "keyed_element" => self.lower_keyed_element(node),
            "interpreted_string_literal" | "raw_string_literal" => self.typed_leaf(node, "string"),
            "int_literal" => self.typed_leaf(node, "int"),
            "float_literal" => self.typed_leaf(node, "float64"),
            "imaginary_literal" => self.typed_leaf(node, "complex128"),
            "rune_literal" => self.typed_leaf(node, "rune"),
            "true" | "false" => self.typed_leaf(node, "bool"),
            kind if SCOPED_KINDS.contains(&kind) => self.scoped(|this| this.lower_other(node)),
            _ => self.lower_other(node),
        }
    }

    fn lower_all(&mut self, nodes: Vec<TsNode<'_>>) -> Vec<Node> {
        nodes.into_iter().map(|child| self.lower(child)).collect()
    }

    /// Lower an expression list, or a single expression, into its elements.
    fn lower_exprs(&mut self, node: TsNode<'_>) -> Vec<Node> {
        if node.kind() == "expression_list" {
            self.lower_all(named_children(node))
        } else {
            vec![self.lower(node)]
        }
    }

    fn lower_other(&mut self, node: TsNode<'_>) -> Node {
        let children = self.lower_all(named_children(node));
        let lowered = Node::Other(Other {
            kind: node.kind(),
            span: span_of(node),
            children,
        });
        self.record_expr_type(node, &lowered);
        lowered
    }

    fn typed_leaf(&mut self, node: TsNode<'_>, ty: &str) -> Node {
        let span = span_of(node);
        self.record_type(span, ty);
        Node::Other(Other {
            kind: node.kind(),
            span,
            children: Vec::new(),
        })
    }

    fn record_expr_type(&mut self, node: TsNode<'_>, lowered: &Node) {
        let ty = match node.kind() {
            "composite_literal" | "type_conversion_expression" => node
                .child_by_field_name("type")
                .map(|ty| self.text(ty).to_owned()),
            "unary_expression" => {
                let is_address = node
                    .child_by_field_name("operator")
                    .is_some_and(|op| op.kind() == "&");
                node.child_by_field_name("operand")
                    .filter(|operand| is_address && operand.kind() == "composite_literal")
                    .and_then(|operand| operand.child_by_field_name("type"))
                    .map(|ty| format!("*{}", self.text(ty)))
            }
            "parenthesized_expression" => match lowered.children().as_slice() {
                [inner] => self.bindings.static_type(inner).map(str::to_owned),
                _ => None,
            },
            _ => None,
        };
        if let Some(ty) = ty {
            self.record_type(span_of(node), ty);
        }
    }

    fn lower_selector(&mut self, node: TsNode<'_>) -> Node {
        let (Some(operand), Some(field)) = (
            node.child_by_field_name("operand"),
            node.child_by_field_name("field"),
        ) else {
            return self.lower_other(node);
        };
        let operand = self.lower(operand);
        let field = self.ident(field);
        self.bind_member(&operand, &field);
        Node::Selector(Selector {
            span: span_of(node),
            operand: Box::new(operand),
            field,
            kind: SelectorKind::Value,
        })
    }

    fn lower_qualified_type(&mut self, node: TsNode<'_>) -> Node {
        let (Some(package), Some(name)) = (
            node.child_by_field_name("package"),
            node.child_by_field_name("name"),
        ) else {
            return self.lower_other(node);
        };
        let operand = Node::Ident(self.use_ident(package));
        let field = self.ident(name);
        self.bind_member(&operand, &field);
        Node::Selector(Selector {
            span: span_of(node),
            operand: Box::new(operand),
            field,
            kind: SelectorKind::QualifiedType,
        })
    }

    /// Bind `field` as a package member when `operand` names an import.
    fn bind_member(&mut self, operand: &Node, field: &Ident) {
        let Some(Object::PkgName { import }) = operand
            .as_ident()
            .and_then(|ident| self.bindings.objects.get(&ident.span))
        else {
            return;
        };
        let import = *import;
        let Some(spec) = self.imports.get(import) else {
            return;
        };
        let object = Object::External {
            import,
            package: spec.path.clone(),
            name: field.name.clone(),
        };
        self.bindings.objects.insert(field.span, object);
    }

    fn lower_call(&mut self, node: TsNode<'_>) -> Node {
        let Some(function) = node.child_by_field_name("function") else {
            return self.lower_other(node);
        };
        let callee = self.lower(function);
        let type_args = node
            .child_by_field_name("type_arguments")
            .map(|targs| self.lower_all(named_children(targs)))
            .unwrap_or_default();

        let mut args = Vec::new();
        let mut ellipsis = false;
        if let Some(list) = node.child_by_field_name("arguments") {
            let mut cursor = list.walk();
            let children: Vec<TsNode<'_>> = list.children(&mut cursor).collect();
            for child in children {
                match child.kind() {
                    "variadic_argument" => {
                        ellipsis = true;
                        args.extend(named_children(child).into_iter().map(|c| self.lower(c)));
                    }
                    "..." if !child.is_named() => ellipsis = true,
                    "comment" => {}
                    _ if child.is_named() => args.push(self.lower(child)),
                    _ => {}
                }
            }
        }

        let span = span_of(node);
        if let Some(callee_ident) = callee.as_ident() {
            if matches!(
                self.bindings.objects.get(&callee_ident.span),
                Some(Object::Universe)
            ) && args.len() == 1
                && !ellipsis
            {
                let name = callee_ident.name.as_str();
                if BASIC_TYPES().contains(name) {
                    self.record_type(span, name);
                } else if matches!(name, "len" | "cap") {
                    self.record_type(span, "int");
                }
            }
        }

        Node::Call(Call {
            span,
            callee: Box::new(callee),
            type_args,
            args,
            ellipsis,
        })
    }

    fn lower_param_list(&mut self, node: TsNode<'_>) -> ParamList {
        let params = named_children(node)
            .into_iter()
            .filter(|child| {
                matches!(
                    child.kind(),
                    "parameter_declaration" | "variadic_parameter_declaration"
                )
            })
            .map(|child| self.lower_param(child))
            .collect();
        ParamList {
            span: span_of(node),
            params,
        }
    }

    fn lower_param(&mut self, node: TsNode<'_>) -> Param {
        let ty = match node.child_by_field_name("type") {
            Some(ty) => self.lower(ty),
            None => Node::Other(Other {
                kind: "missing_type",
                span: Span::empty_at(node.end_byte()),
                children: Vec::new(),
            }),
        };
        let ty_text = ty.span().text(self.source).to_owned();
        let variadic = node.kind() == "variadic_parameter_declaration";
        let names: Vec<Ident> = field_children(node, "name")
            .into_iter()
            .map(|name| self.ident(name))
            .collect();
        let declared_ty = if variadic {
            format!("[]{ty_text}")
        } else {
            ty_text
        };
        for name in &names {
            self.declare(name, Some(declared_ty.clone()));
        }
        Param {
            span: span_of(node),
            names,
            ty: Box::new(ty),
            variadic,
        }
    }

    fn lower_func_lit(&mut self, node: TsNode<'_>) -> Node {
        let (Some(params), Some(body)) = (
            node.child_by_field_name("parameters"),
            node.child_by_field_name("body"),
        ) else {
            return self.scoped(|this| this.lower_other(node));
        };
        let result = node.child_by_field_name("result");

        self.scoped(|this| {
            let params = this.lower_param_list(params);
            let result = result.map(|result| {
                if result.kind() == "parameter_list" {
                    FuncResult::List(this.lower_param_list(result))
                } else {
                    FuncResult::Type(Box::new(this.lower(result)))
                }
            });
            let body = this.scoped(|this| Block {
                span: span_of(body),
                stmts: this.lower_all(named_children(body)),
            });
            Node::FuncLit(FuncLit {
                span: span_of(node),
                params,
                result,
                body,
            })
        })
    }

    fn lower_binary(&mut self, node: TsNode<'_>) -> Node {
        let (Some(left), Some(op), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("operator"),
            node.child_by_field_name("right"),
        ) else {
            return self.lower_other(node);
        };
        let left = self.lower(left);
        let right = self.lower(right);
        Node::Binary(Binary {
            span: span_of(node),
            left: Box::new(left),
            op: BinaryOp::from_token(op.kind()),
            right: Box::new(right),
        })
    }

    fn lower_return(&mut self, node: TsNode<'_>) -> Node {
        let mut results = Vec::new();
        for child in named_children(node) {
            results.extend(self.lower_exprs(child));
        }
        Node::Return(Return {
            span: span_of(node),
            results,
        })
    }

    fn lower_type_params(&mut self, node: TsNode<'_>) -> Node {
        let decls = named_children(node);
        let names: Vec<Vec<Ident>> = decls
            .iter()
            .map(|decl| {
                field_children(*decl, "name")
                    .into_iter()
                    .map(|name| self.ident(name))
                    .collect()
            })
            .collect();
        for ident in names.iter().flatten() {
            self.declare(ident, None);
        }

        let mut children = Vec::new();
        for (decl, names) in decls.into_iter().zip(names) {
            if decl.kind() != "type_parameter_declaration" {
                children.push(self.lower(decl));
                continue;
            }
            let mut decl_children: Vec<Node> = names.into_iter().map(Node::Ident).collect();
            if let Some(constraint) = decl.child_by_field_name("type") {
                decl_children.push(self.lower(constraint));
            }
            children.push(Node::Other(Other {
                kind: decl.kind(),
                span: span_of(decl),
                children: decl_children,
            }));
        }
        Node::Other(Other {
            kind: node.kind(),
            span: span_of(node),
            children,
        })
    }

    fn lower_short_var(&mut self, node: TsNode<'_>) -> Node {
        let right = node
            .child_by_field_name("right")
            .map(|right| self.lower_exprs(right))
            .unwrap_or_default();
        let left = node
            .child_by_field_name("left")
            .map(|left| {
                if left.kind() == "expression_list" {
                    named_children(left)
                } else {
                    vec![left]
                }
            })
            .unwrap_or_default();

        let mut children = Vec::with_capacity(left.len() + right.len());
        let pairwise = left.len() == right.len();
        for (i, target) in left.iter().enumerate() {
            if target.kind() != "identifier" {
                children.push(self.lower(*target));
                continue;
            }
            let ident = self.ident(*target);
            let redeclared = self
                .scopes
                .last()
                .is_some_and(|scope| scope.contains_key(&ident.name));
            if redeclared {
                children.push(Node::Ident(self.use_ident(*target)));
                continue;
            }
            let ty = if pairwise {
                right
                    .get(i)
                    .and_then(|value| self.bindings.static_type(value))
                    .map(str::to_owned)
            } else {
                None
            };
            self.declare(&ident, ty);
            children.push(Node::Ident(ident));
        }
        children.extend(right);

        Node::Other(Other {
            kind: node.kind(),
            span: span_of(node),
            children,
        })
    }

    fn lower_value_spec(&mut self, node: TsNode<'_>) -> Node {
        let ty_node = node.child_by_field_name("type");
        let ty_text = ty_node.map(|ty| self.text(ty).to_owned());
        let ty = ty_node.map(|ty| self.lower(ty));
        let values = node
            .child_by_field_name("value")
            .map(|value| self.lower_exprs(value))
            .unwrap_or_default();
        let names: Vec<Ident> = field_children(node, "name")
            .into_iter()
            .map(|name| self.ident(name))
            .collect();

        let pairwise = names.len() == values.len();
        for (i, name) in names.iter().enumerate() {
            let declared = ty_text.clone().or_else(|| {
                if pairwise {
                    values
                        .get(i)
                        .and_then(|value| self.bindings.static_type(value))
                        .map(str::to_owned)
                } else {
                    None
                }
            });
            self.declare(name, declared);
        }

        let mut children: Vec<Node> = names.into_iter().map(Node::Ident).collect();
        children.extend(ty);
        children.extend(values);
        Node::Other(Other {
            kind: node.kind(),
            span: span_of(node),
            children,
        })
    }

    /// `range` clauses and `case v := <-ch`, which declare their left side only with `:=`.
    fn lower_assignment_clause(&mut self, node: TsNode<'_>) -> Node {
        let defines = has_token(node, ":=");
        let mut children = node
            .child_by_field_name("right")
            .map(|right| self.lower_exprs(right))
            .unwrap_or_default();
        if let Some(left) = node.child_by_field_name("left") {
            if defines {
                let targets = if left.kind() == "expression_list" {
                    named_children(left)
                } else {
                    vec![left]
                };
                for target in targets {
                    let ident = self.ident(target);
                    self.declare(&ident, None);
                    children.push(Node::Ident(ident));
                }
            } else {
                children.extend(self.lower_exprs(left));
            }
        }
        Node::Other(Other {
            kind: node.kind(),
            span: span_of(node),
            children,
        })
    }

    fn lower_type_switch(&mut self, node: TsNode<'_>) -> Node {
        let initializer = node.child_by_field_name("initializer");
        let alias = node.child_by_field_name("alias");
        let value = node.child_by_field_name("value");

        let mut children = Vec::new();
        if let Some(init) = initializer {
            children.push(self.lower(init));
        }
        if let Some(value) = value {
            children.push(self.lower(value));
        }
        if let Some(alias) = alias {
            let targets = if alias.kind() == "expression_list" {
                named_children(alias)
            } else {
                vec![alias]
            };
            for target in targets {
                let ident = self.ident(target);
                self.declare(&ident, None);
                children.push(Node::Ident(ident));
            }
        }
        let header: Vec<usize> = [initializer, alias, value]
            .into_iter()
            .flatten()
            .map(|n| n.id())
            .collect();
        for clause in named_children(node) {
            if !header.contains(&clause.id()) {
                children.push(self.lower(clause));
            }
        }
        Node::Other(Other {
            kind: node.kind(),
            span: span_of(node),
            children,
        })
    }

    fn lower_type_spec(&mut self, node: TsNode<'_>) -> Node {
        let name = node.child_by_field_name("name");
        let mut children = Vec::new();
        if let Some(name) = name {
            let ident = self.ident(name);
            self.declare(&ident, None);
            children.push(Node::TypeName(ident));
        }
        let name_id = name.map(|n| n.id());
        let rest: Vec<TsNode<'_>> = named_children(node)
            .into_iter()
            .filter(|child| Some(child.id()) != name_id)
            .collect();
        children.extend(self.scoped(|this| this.lower_all(rest)));
        Node::Other(Other {
            kind: node.kind(),
            span: span_of(node),
            children,
        })
    }

    /// Keys naming struct fields are left unresolved.
    fn lower_keyed_element(&mut self, node: TsNode<'_>) -> Node {
        let parts = named_children(node);
        let [key, value] = parts.as_slice() else {
            return self.lower_other(node);
        };
        let key_node = if is_field_name(*key) {
            Node::Other(Other {
                kind: "field_name",
                span: span_of(*key),
                children: Vec::new(),
            })
        } else {
            self.lower(*key)
        };
        let value_node = self.lower(*value);
        Node::Other(Other {
            kind: node.kind(),
            span: span_of(node),
            children: vec![key_node, value_node],
        })
    }
}

fn is_field_name(key: TsNode<'_>) -> bool {
    match key.kind() {
        "identifier" | "field_identifier" => true,
        "literal_element" => matches!(
            named_children(key).as_slice(),
            [inner] if matches!(inner.kind(), "identifier" | "field_identifier")
        ),
        _ => false,
    }
}

fn param_node(kind: &'static str, param: Param) -> Node {
    let mut children: Vec<Node> = param.names.into_iter().map(Node::Ident).collect();
    children.push(*param.ty);
    Node::Other(Other {
        kind,
        span: param.span,
        children,
    })
}
