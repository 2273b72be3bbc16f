use super::{CallContext, Rewrite, StrategyError};
use crate::fix::TextEdit;
use crate::syntax::Node;

/// Whether an argument must be parenthesized where it is spliced.
///
/// `before` is the template text up to the placeholder, `after` the text past it.
fn needs_parens(arg: &Node, before: &str, after: &str) -> bool {
    let opens = before.trim_end().ends_with(['(', ',']);
    let closes = after.trim_start().starts_with([')', ',']);
    if opens && closes {
        return false;
    }
    match arg {
        Node::Binary(_) => true,
        _ if arg.other_kind() == Some("unary_expression") => {
            after.starts_with(['[', '.', '('])
                || before.ends_with(['+', '-', '*', '/', '%', '&', '|', '^', '<', '>', '!'])
        }
        _ => false,
    }
}

fn has_side_effects(arg: &Node, text: &str) -> bool {
    arg.contains_call() || text.contains("<-")
}

pub(super) fn render(template: &str, ctx: &CallContext<'_>) -> Result<Rewrite, StrategyError> {
    if ctx.call.ellipsis {
        return Err(StrategyError::Spread);
    }

    let mut out = String::with_capacity(template.len() + ctx.call.span.len());
    let mut uses = vec![0usize; ctx.call.args.len()];
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| StrategyError::Placeholder(after.to_owned()))?;
        let key = &after[..close];
        match key {
            "pkg" => out.push_str(ctx.qualifier.ok_or(StrategyError::NoQualifier)?),
            "fn" => out.push_str(ctx.symbol),
            _ => {
                let index: usize = key
                    .parse()
                    .map_err(|_| StrategyError::Placeholder(key.to_owned()))?;
                let text = ctx.arg_text(index)?;
                let arg = &ctx.call.args[index];
                if needs_parens(arg, &out, &after[close + 1..]) {
                    out.push('(');
                    out.push_str(text);
                    out.push(')');
                } else {
                    out.push_str(text);
                }
                uses[index] += 1;
                if uses[index] > 1 && has_side_effects(arg, text) {
                    return Err(StrategyError::DuplicatedSideEffect(index));
                }
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    Ok(Rewrite {
        edits: vec![TextEdit::replace(ctx.call.span, out)],
        imports: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{find_call, parse, splice};
    use super::super::{CallContext, Strategy, StrategyError};

    fn run(source: &str, template: &'static str) -> Result<String, StrategyError> {
        let file = parse(source);
        let call = find_call(&file, "lo.DropRight");
        let ctx = CallContext {
            source: &file.source,
            call,
            types: &file.bindings,
            qualifier: Some("lo"),
            symbol: "DropRight",
            imports: &file.imports,
        };
        let rewrite = Strategy::Template(template).apply(&ctx)?;
        Ok(splice(&file.source, &rewrite.edits))
    }

    #[test]
    fn test_drop_right() {
        let out = run(
            "package a\n\nfunc f(a []string) { _ = lo.DropRight(a, 2) }\n",
            "{0}[:len({0})-{1}]",
        )
        .unwrap();
        assert!(out.contains("_ = a[:len(a)-2]"), "{out}");
    }

    #[test]
    fn test_binary_argument_is_parenthesized() {
        let out = run(
            "package a\n\nfunc f(a []string, n int) { _ = lo.DropRight(a, n+1) }\n",
            "{0}[:len({0})-{1}]",
        )
        .unwrap();
        assert!(out.contains("_ = a[:len(a)-(n+1)]"), "{out}");
    }

    #[test]
    fn test_unary_argument_is_parenthesized_by_context() {
        let out = run(
            "package a\n\nfunc f(p *[]string, n int) { _ = lo.DropRight(*p, -n) }\n",
            "{0}[:len({0})-{1}]",
        )
        .unwrap();
        assert!(out.contains("_ = (*p)[:len(*p)-(-n)]"), "{out}");
    }

    #[test]
    fn test_binary_call_argument_is_left_bare() {
        let out = run(
            "package a\n\nfunc f(a []string, n int) { _ = lo.DropRight(a, n+1) }\n",
            "{pkg}.{fn}({1}, {0})",
        )
        .unwrap();
        assert!(out.contains("_ = lo.DropRight(n+1, a)"), "{out}");
    }

    #[test]
    fn test_pkg_and_fn_placeholders() {
        let out = run(
            "package a\n\nfunc f(a []string) { _ = lo.DropRight(a, 2) }\n",
            "{pkg}x.{fn}({1}, {0})",
        )
        .unwrap();
        assert!(out.contains("_ = lox.DropRight(2, a)"), "{out}");
    }

    #[test]
    fn test_duplicated_call_fails() {
        let err = run(
            "package a\n\nfunc f() { _ = lo.DropRight(load(), 2) }\n",
            "{0}[:len({0})-{1}]",
        )
        .unwrap_err();
        assert_eq!(err, StrategyError::DuplicatedSideEffect(0));
    }

    #[test]
    fn test_out_of_range_placeholder_fails() {
        let err = run(
            "package a\n\nfunc f(a []string) { _ = lo.DropRight(a, 2) }\n",
            "{0}[{2}:]",
        )
        .unwrap_err();
        assert!(matches!(err, StrategyError::MissingArgument { index: 2, .. }));
    }

    #[test]
    fn test_spread_call_fails() {
        let err = run(
            "package a\n\nfunc f(a [][]string) { _ = lo.DropRight(a...) }\n",
            "{0}[1:]",
        )
        .unwrap_err();
        assert_eq!(err, StrategyError::Spread);
    }
}
