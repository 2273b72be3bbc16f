//! Predicate and key-extractor to three-way comparator rewrites.

use super::{CallContext, Rewrite, StrategyError};
use crate::fix::TextEdit;
use crate::syntax::{qualify, BinaryOp, Call, FuncLit, FuncResult, Ident, Node, Object, Return, Span};

const CMP_PACKAGE: &str = "cmp";

fn func_lit_arg<'a>(ctx: &CallContext<'a>, arg: usize) -> Result<&'a FuncLit, StrategyError> {
    match ctx.call.args.get(arg) {
        Some(Node::FuncLit(lit)) => Ok(lit),
        Some(_) => Err(StrategyError::NotFuncLit(arg)),
        None => Err(StrategyError::MissingArgument {
            index: arg,
            len: ctx.call.args.len(),
        }),
    }
}

/// Span of the single result type.
fn result_type(lit: &FuncLit) -> Result<Span, StrategyError> {
    match &lit.result {
        Some(FuncResult::Type(ty)) => Ok(ty.span()),
        Some(FuncResult::List(list)) => match list.params.as_slice() {
            [param] if param.names.len() <= 1 => Ok(param.ty.span()),
            _ => Err(StrategyError::ResultShape),
        },
        None => Err(StrategyError::ResultShape),
    }
}

/// Return statements of the literal's own body; nested literals are skipped.
fn returns(lit: &FuncLit) -> Vec<&Return> {
    let mut out = Vec::new();
    for stmt in &lit.body.stmts {
        stmt.walk(&mut |node| match node {
            Node::FuncLit(_) => false,
            Node::Return(ret) => {
                out.push(ret);
                false
            }
            _ => true,
        });
    }
    out
}

fn single_result(ret: &Return) -> Result<&Node, StrategyError> {
    match ret.results.as_slice() {
        [expr] => Ok(expr),
        other => Err(StrategyError::ReturnArity(other.len())),
    }
}

fn line_indent(source: &str, offset: usize) -> &str {
    let start = source
        .get(..offset)
        .and_then(|head| head.rfind('\n'))
        .map_or(0, |i| i + 1);
    let line = source.get(start..offset).unwrap_or_default();
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

/// `return f(p, q)` where `p` and `q` are exactly the literal's two parameters.
fn delegation<'a>(ctx: &CallContext<'_>, expr: &'a Node, params: &[&Ident]) -> Option<&'a Call> {
    let Node::Call(inner) = expr else {
        return None;
    };
    if inner.ellipsis || matches!(*inner.callee, Node::FuncLit(_)) {
        return None;
    }
    let [first, second] = inner.args.as_slice() else {
        return None;
    };
    let [p, q] = params else {
        return None;
    };
    let decl_of = |node: &Node| match node.as_ident().and_then(|i| ctx.types.object_of(i)) {
        Some(Object::Local { decl }) => Some(*decl),
        _ => None,
    };
    let (a, b) = (decl_of(first)?, decl_of(second)?);
    let same = (a == p.span && b == q.span) || (a == q.span && b == p.span);
    same.then_some(inner)
}

/// Rewrite a boolean `less(a, b)` literal into `cmp(a, b) int`.
///
/// With `reverse`, the comparator orders for a "maximum" operation, which
/// swaps the operands of every comparison.
pub(super) fn less_to_compare(
    ctx: &CallContext<'_>,
    arg: usize,
    reverse: bool,
) -> Result<Rewrite, StrategyError> {
    let lit = func_lit_arg(ctx, arg)?;
    let result = result_type(lit)?;
    let params: Vec<&Ident> = lit.params.names().collect();
    let rets = returns(lit);
    if rets.is_empty() {
        return Err(StrategyError::NoReturn);
    }

    let compare = qualify(ctx.imports, CMP_PACKAGE, "Compare");
    let mut uses_cmp = false;
    let mut edits = vec![TextEdit::replace(result, "int")];
    for ret in rets {
        let expr = single_result(ret)?;
        match expr {
            Node::Binary(bin) => {
                let left = bin.left.span().text(ctx.source);
                let right = bin.right.span().text(ctx.source);
                let (a, b) = match bin.op {
                    BinaryOp::Lt | BinaryOp::Le if reverse => (right, left),
                    BinaryOp::Lt | BinaryOp::Le => (left, right),
                    BinaryOp::Gt | BinaryOp::Ge if reverse => (left, right),
                    BinaryOp::Gt | BinaryOp::Ge => (right, left),
                    BinaryOp::Eq | BinaryOp::Ne => return Err(StrategyError::Equality),
                    BinaryOp::Other(_) => {
                        return Err(StrategyError::UnsupportedReturn(
                            expr.span().text(ctx.source).to_owned(),
                        ))
                    }
                };
                edits.push(TextEdit::replace(expr.span(), format!("{compare}({a}, {b})")));
                uses_cmp = true;
            }
            _ => {
                let inner = delegation(ctx, expr, &params).ok_or_else(|| {
                    StrategyError::UnsupportedReturn(expr.span().text(ctx.source).to_owned())
                })?;
                let callee = inner.callee.span().text(ctx.source);
                let (mut a, mut b) = (
                    inner.args[0].span().text(ctx.source),
                    inner.args[1].span().text(ctx.source),
                );
                if reverse {
                    std::mem::swap(&mut a, &mut b);
                }
                let indent = line_indent(ctx.source, ret.span.start);
                let body = format!(
                    "if {callee}({a}, {b}) {{\n{indent}\treturn -1\n{indent}}}\n\
                     {indent}if {callee}({b}, {a}) {{\n{indent}\treturn 1\n{indent}}}\n\
                     {indent}return 0"
                );
                edits.push(TextEdit::replace(ret.span, body));
            }
        }
    }

    Ok(Rewrite {
        edits,
        imports: if uses_cmp { vec![CMP_PACKAGE] } else { Vec::new() },
    })
}

/// A name not used anywhere inside the literal.
fn fresh_name(lit: &FuncLit, source: &str) -> String {
    let text = lit.span.text(source);
    let is_free = |name: &str| {
        !text
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .any(|word| word == name)
    };
    std::iter::once("next".to_owned())
        .chain((2..).map(|n| format!("next{n}")))
        .find(|candidate| is_free(candidate))
        .unwrap_or_else(|| "next".to_owned())
}

/// Rewrite a key extractor `func(x T) K` into `func(x, next T) int`.
pub(super) fn key_to_compare(ctx: &CallContext<'_>, arg: usize) -> Result<Rewrite, StrategyError> {
    let lit = func_lit_arg(ctx, arg)?;
    let result = result_type(lit)?;
    let [param] = lit.params.params.as_slice() else {
        return Err(StrategyError::ParamShape);
    };
    let [name] = param.names.as_slice() else {
        return Err(StrategyError::ParamShape);
    };
    if param.variadic || name.name == "_" {
        return Err(StrategyError::ParamShape);
    }
    let rets = returns(lit);
    if rets.is_empty() {
        return Err(StrategyError::NoReturn);
    }

    let fresh = fresh_name(lit, ctx.source);
    let ty = param.ty.span().text(ctx.source);
    let inner = Span::new(lit.params.span.start + 1, lit.params.span.end - 1);
    let compare = qualify(ctx.imports, CMP_PACKAGE, "Compare");

    let mut edits = vec![
        TextEdit::replace(result, "int"),
        TextEdit::replace(inner, format!("{}, {fresh} {ty}", name.name)),
    ];
    for ret in rets {
        let expr = single_result(ret)?;
        let span = expr.span();
        let mut hits: Vec<Span> = Vec::new();
        expr.walk(&mut |node| {
            if let Some(ident) = node.as_ident() {
                if ctx.types.object_of(ident) == Some(&Object::Local { decl: name.span }) {
                    hits.push(ident.span);
                }
            }
            true
        });
        if hits.is_empty() {
            return Err(StrategyError::UnreferencedParam(name.name.clone()));
        }

        let original = span.text(ctx.source);
        let mut next = original.to_owned();
        hits.sort_unstable();
        for hit in hits.iter().rev() {
            next.replace_range(hit.start - span.start..hit.end - span.start, &fresh);
        }
        edits.push(TextEdit::replace(span, format!("{compare}({original}, {next})")));
    }

    Ok(Rewrite {
        edits,
        imports: vec![CMP_PACKAGE],
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{find_call, parse, splice};
    use super::super::{CallContext, Rewrite, Strategy, StrategyError};

    fn run(source: &str, callee: &str, strategy: Strategy) -> Result<(String, Rewrite), StrategyError> {
        let file = parse(source);
        let call = find_call(&file, callee);
        let ctx = CallContext {
            source: &file.source,
            call,
            types: &file.bindings,
            qualifier: Some("lo"),
            symbol: "MinBy",
            imports: &file.imports,
        };
        let rewrite = strategy.apply(&ctx)?;
        Ok((splice(&file.source, &rewrite.edits), rewrite))
    }

    const MIN: Strategy = Strategy::LessToCompare {
        arg: 1,
        reverse: false,
    };
    const MAX: Strategy = Strategy::LessToCompare {
        arg: 1,
        reverse: true,
    };

    #[test]
    fn test_less_for_minimum_keeps_operands() {
        let src = "package a\n\nfunc f(a []string) {\n\tlo.MinBy(a, func(x, y string) bool {\n\t\treturn len(x) < len(y)\n\t})\n}\n";
        let (out, rewrite) = run(src, "lo.MinBy", MIN).unwrap();
        assert!(out.contains("func(x, y string) int {"), "{out}");
        assert!(out.contains("return cmp.Compare(len(x), len(y))"), "{out}");
        assert_eq!(rewrite.imports, vec!["cmp"]);
    }

    #[test]
    fn test_less_for_maximum_swaps_operands() {
        let src = "package a\n\nfunc f(a []string) {\n\tlo.MaxBy(a, func(x, y string) bool {\n\t\treturn x < y\n\t})\n}\n";
        let (out, _) = run(src, "lo.MaxBy", MAX).unwrap();
        assert!(out.contains("return cmp.Compare(y, x)"), "{out}");
    }

    #[test]
    fn test_greater_is_symmetric() {
        let src = "package a\n\nfunc f(a []string) {\n\tlo.MinBy(a, func(x, y string) bool {\n\t\treturn x > y\n\t})\n\tlo.MaxBy(a, func(x, y string) bool {\n\t\treturn x >= y\n\t})\n}\n";
        let (min, _) = run(src, "lo.MinBy", MIN).unwrap();
        assert!(min.contains("return cmp.Compare(y, x)"), "{min}");
        let (max, _) = run(src, "lo.MaxBy", MAX).unwrap();
        assert!(max.contains("return cmp.Compare(x, y)"), "{max}");
    }

    #[test]
    fn test_every_return_is_rewritten() {
        let src = "package a\n\nfunc f(a []string, b string) {\n\tlo.MaxBy(a, func(x, y string) bool {\n\t\tif b == \"\" {\n\t\t\treturn x > y\n\t\t}\n\t\treturn x < y\n\t})\n}\n";
        let (out, _) = run(src, "lo.MaxBy", MAX).unwrap();
        assert!(out.contains("if b == \"\" {\n\t\t\treturn cmp.Compare(x, y)\n\t\t}"), "{out}");
        assert!(out.contains("return cmp.Compare(y, x)"), "{out}");
    }

    #[test]
    fn test_existing_cmp_alias_is_used() {
        let src = "package a\n\nimport c \"cmp\"\n\nfunc f(a []int) {\n\tlo.MinBy(a, func(x, y int) bool {\n\t\treturn x < y\n\t})\n}\n";
        let (out, _) = run(src, "lo.MinBy", MIN).unwrap();
        assert!(out.contains("return c.Compare(x, y)"), "{out}");
    }

    #[test]
    fn test_delegation() {
        let src = "package a\n\nfunc less(a, b string) bool { return a < b }\n\nfunc f(a []string) {\n\tlo.MinBy(a, func(x, y string) bool {\n\t\treturn less(x, y)\n\t})\n}\n";
        let (out, rewrite) = run(src, "lo.MinBy", MIN).unwrap();
        assert!(
            out.contains("\t\tif less(x, y) {\n\t\t\treturn -1\n\t\t}\n\t\tif less(y, x) {\n\t\t\treturn 1\n\t\t}\n\t\treturn 0\n"),
            "{out}"
        );
        assert!(rewrite.imports.is_empty());

        let (max, _) = run(src, "lo.MinBy", MAX).unwrap();
        assert!(max.contains("if less(y, x) {\n\t\t\treturn -1"), "{max}");
    }

    #[test]
    fn test_delegation_requires_both_params() {
        let src = "package a\n\nfunc less(a, b string) bool { return a < b }\n\nfunc f(a []string, z string) {\n\tlo.MinBy(a, func(x, y string) bool {\n\t\treturn less(x, z)\n\t})\n}\n";
        let err = run(src, "lo.MinBy", MIN).unwrap_err();
        assert!(matches!(err, StrategyError::UnsupportedReturn(_)));
    }

    #[test]
    fn test_equality_fails_closed() {
        let src = "package a\n\nfunc f(a []string) {\n\tlo.MaxBy(a, func(x, y string) bool {\n\t\treturn x == y\n\t})\n}\n";
        assert_eq!(run(src, "lo.MaxBy", MAX).unwrap_err(), StrategyError::Equality);
    }

    #[test]
    fn test_function_value_fails() {
        let src = "package a\n\nfunc f(a []string) {\n\tlo.MinBy(a, less)\n}\n";
        assert_eq!(run(src, "lo.MinBy", MIN).unwrap_err(), StrategyError::NotFuncLit(1));
    }

    #[test]
    fn test_bare_return_fails() {
        let src = "package a\n\nfunc f(a []string) {\n\tlo.MinBy(a, func(x, y string) (ok bool) {\n\t\treturn\n\t})\n}\n";
        assert_eq!(run(src, "lo.MinBy", MIN).unwrap_err(), StrategyError::ReturnArity(0));
    }

    #[test]
    fn test_nested_literal_returns_are_ignored() {
        let src = "package a\n\nfunc f(a []string) {\n\tlo.MinBy(a, func(x, y string) bool {\n\t\tg := func() int { return 1 }\n\t\t_ = g\n\t\treturn x < y\n\t})\n}\n";
        let (out, _) = run(src, "lo.MinBy", MIN).unwrap();
        assert!(out.contains("func() int { return 1 }"), "{out}");
        assert!(out.contains("return cmp.Compare(x, y)"), "{out}");
    }

    const KEY: Strategy = Strategy::KeyToCompare { arg: 1 };

    #[test]
    fn test_key_to_compare() {
        let src = "package a\n\ntype T struct{ N int }\n\nfunc f(a []T) {\n\tlo.IsSortedByKey(a, func(t T) int {\n\t\treturn t.N * 2\n\t})\n}\n";
        let (out, _) = run(src, "lo.IsSortedByKey", KEY).unwrap();
        assert!(out.contains("func(t, next T) int {"), "{out}");
        assert!(out.contains("return cmp.Compare(t.N * 2, next.N * 2)"), "{out}");
    }

    #[test]
    fn test_key_fresh_name_avoids_collision() {
        let src = "package a\n\nfunc f(a []string, next int) {\n\tlo.IsSortedByKey(a, func(s string) int {\n\t\treturn len(s) + next\n\t})\n}\n";
        let (out, _) = run(src, "lo.IsSortedByKey", KEY).unwrap();
        assert!(out.contains("func(s, next2 string) int {"), "{out}");
        assert!(out.contains("cmp.Compare(len(s) + next, len(next2) + next)"), "{out}");
    }

    #[test]
    fn test_key_every_return_must_reference_param() {
        let src = "package a\n\nfunc f(a []string) {\n\tlo.IsSortedByKey(a, func(s string) int {\n\t\tif n := len(s); n > 0 {\n\t\t\treturn n\n\t\t}\n\t\treturn len(s)\n\t})\n}\n";
        let err = run(src, "lo.IsSortedByKey", KEY).unwrap_err();
        assert_eq!(err, StrategyError::UnreferencedParam("s".to_owned()));
    }

    #[test]
    fn test_key_without_param_reference_fails() {
        let src = "package a\n\nfunc f(a []string, b string) {\n\tlo.IsSortedByKey(a, func(x string) string {\n\t\treturn b\n\t})\n}\n";
        assert_eq!(
            run(src, "lo.IsSortedByKey", KEY).unwrap_err(),
            StrategyError::UnreferencedParam("x".to_owned())
        );
    }

    #[test]
    fn test_key_unnamed_param_fails() {
        let src = "package a\n\nfunc f(a []string) {\n\tlo.IsSortedByKey(a, func(string) int {\n\t\treturn 1\n\t})\n}\n";
        assert_eq!(run(src, "lo.IsSortedByKey", KEY).unwrap_err(), StrategyError::ParamShape);
    }
}
