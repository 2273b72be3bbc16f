use super::{CallContext, Rewrite, StrategyError};
use crate::fix::TextEdit;

/// Reorder arguments, optionally wrapping one of them in a slice literal first.
pub(super) fn reorder(
    ctx: &CallContext<'_>,
    wrap: Option<usize>,
    order: &[usize],
) -> Result<Rewrite, StrategyError> {
    let args = &ctx.call.args;
    if ctx.call.ellipsis {
        return Err(StrategyError::Spread);
    }
    if order.len() != args.len() {
        return Err(StrategyError::Arity {
            expected: order.len(),
            found: args.len(),
        });
    }
    let mut seen = vec![false; args.len()];
    for &from in order {
        match seen.get_mut(from) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(StrategyError::NotPermutation),
        }
    }

    let originals: Vec<&str> = (0..args.len())
        .map(|i| ctx.arg_text(i))
        .collect::<Result<_, _>>()?;
    let mut texts: Vec<String> = originals.iter().map(|t| (*t).to_owned()).collect();

    if let Some(wrap) = wrap {
        let arg = args.get(wrap).ok_or(StrategyError::MissingArgument {
            index: wrap,
            len: args.len(),
        })?;
        let ty = ctx
            .types
            .type_of(arg)
            .ok_or(StrategyError::UnknownType(wrap))?;
        texts[wrap] = format!("[]{ty}{{{}}}", originals[wrap]);
    }

    let edits = order
        .iter()
        .enumerate()
        .filter(|&(slot, &from)| texts[from] != originals[slot])
        .map(|(slot, &from)| TextEdit::replace(args[slot].span(), texts[from].clone()))
        .collect();

    Ok(Rewrite {
        edits,
        imports: Vec::new(),
    })
}

/// Append `...` to the last argument.
pub(super) fn spread(ctx: &CallContext<'_>) -> Result<Rewrite, StrategyError> {
    if ctx.call.ellipsis {
        return Err(StrategyError::Spread);
    }
    let last = ctx.call.args.last().ok_or(StrategyError::NoArguments)?;
    Ok(Rewrite {
        edits: vec![TextEdit::insert(last.span().end, "...")],
        imports: Vec::new(),
    })
}
