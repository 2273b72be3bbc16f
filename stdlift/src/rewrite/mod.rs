//! Rewrite strategies.
//!
//! A strategy turns a matched call into the non-mechanical part of its
//! replacement: everything beyond renaming `pkg.Symbol`. Strategies are pure.
//! They either produce a complete set of edits or fail, never anything in
//! between.

mod arguments;
mod comparator;
mod template;

use crate::fix::TextEdit;
use crate::syntax::{Call, ImportSpec, TypeInfo};
use thiserror::Error;

/// Why a strategy declined to rewrite a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    /// The call has fewer arguments than the strategy addresses.
    #[error("argument {index} is missing (call has {len})")]
    MissingArgument {
        /// Requested argument.
        index: usize,
        /// Arguments present.
        len: usize,
    },
    /// The call spreads its last argument with `...`.
    #[error("call spreads its last argument")]
    Spread,
    /// The call has no argument to spread.
    #[error("call has no arguments")]
    NoArguments,
    /// The permutation does not match the call's arity.
    #[error("argument order expects {expected} arguments, call has {found}")]
    Arity {
        /// Length of the permutation.
        expected: usize,
        /// Arguments present.
        found: usize,
    },
    /// The permutation repeats or skips an index.
    #[error("argument order is not a permutation")]
    NotPermutation,
    /// The static type needed to build a container literal is unknown.
    #[error("type of argument {0} is unknown")]
    UnknownType(usize),
    /// A template placeholder is malformed or unknown.
    #[error("bad template placeholder `{0}`")]
    Placeholder(String),
    /// `{pkg}` was used but the symbol was not reached through a qualifier.
    #[error("call has no package qualifier")]
    NoQualifier,
    /// An argument with side effects would be evaluated more than once.
    #[error("argument {0} has side effects and would be duplicated")]
    DuplicatedSideEffect(usize),
    /// The argument is not a function literal.
    #[error("argument {0} is not a function literal")]
    NotFuncLit(usize),
    /// The function literal's result is not a single type.
    #[error("function literal does not return exactly one value")]
    ResultShape,
    /// The function literal's parameters do not fit the strategy.
    #[error("function literal parameters do not match")]
    ParamShape,
    /// The function literal contains no return statement.
    #[error("function literal has no return statement")]
    NoReturn,
    /// A return statement does not return exactly one value.
    #[error("return statement has {0} results")]
    ReturnArity(usize),
    /// An equality test carries no ordering.
    #[error("equality test cannot become a comparator")]
    Equality,
    /// The returned expression is not an ordering comparison.
    #[error("unsupported return expression `{0}`")]
    UnsupportedReturn(String),
    /// The key expression does not mention the element.
    #[error("return expression does not reference `{0}`")]
    UnreferencedParam(String),
}

/// The transformation attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Replace the whole call with interpolated text. Placeholders are `{pkg}`,
    /// `{fn}` and `{N}` for the N-th argument.
    Template(&'static str),
    /// New argument `i` is old argument `order[i]`.
    Reorder(&'static [usize]),
    /// Wrap argument `wrap` in a slice literal of its own type, then reorder.
    ContainerizeReorder {
        /// Argument to wrap.
        wrap: usize,
        /// New argument `i` is old argument `order[i]`.
        order: &'static [usize],
    },
    /// Append `...` to the last argument.
    Spread,
    /// Turn a boolean "less" predicate into a three-way comparator.
    LessToCompare {
        /// Index of the predicate argument.
        arg: usize,
        /// Whether the replacement picks the maximum.
        reverse: bool,
    },
    /// Turn a key extractor into a three-way comparator over keys.
    KeyToCompare {
        /// Index of the extractor argument.
        arg: usize,
    },
}

/// Everything a strategy may look at.
pub struct CallContext<'a> {
    /// File source.
    pub source: &'a str,
    /// The matched call.
    pub call: &'a Call,
    /// Resolved objects and static types.
    pub types: &'a dyn TypeInfo,
    /// Qualifier as written, `None` for dot-imported symbols.
    pub qualifier: Option<&'a str>,
    /// Symbol name.
    pub symbol: &'a str,
    /// The file's imports, for rendering qualified names.
    pub imports: &'a [ImportSpec],
}

impl CallContext<'_> {
    fn arg_text(&self, index: usize) -> Result<&str, StrategyError> {
        self.call
            .args
            .get(index)
            .map(|arg| arg.span().text(self.source))
            .ok_or(StrategyError::MissingArgument {
                index,
                len: self.call.args.len(),
            })
    }
}

/// Edits produced by a successful strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rewrite {
    /// Text edits.
    pub edits: Vec<TextEdit>,
    /// Standard packages the edits refer to.
    pub imports: Vec<&'static str>,
}

impl Strategy {
    /// Run the strategy on one call.
    pub fn apply(&self, ctx: &CallContext<'_>) -> Result<Rewrite, StrategyError> {
        match *self {
            Self::Template(template) => template::render(template, ctx),
            Self::Reorder(order) => arguments::reorder(ctx, None, order),
            Self::ContainerizeReorder { wrap, order } => arguments::reorder(ctx, Some(wrap), order),
            Self::Spread => arguments::spread(ctx),
            Self::LessToCompare { arg, reverse } => comparator::less_to_compare(ctx, arg, reverse),
            Self::KeyToCompare { arg } => comparator::key_to_compare(ctx, arg),
        }
    }

    /// Whether the strategy's edits cover the entire call, callee included.
    #[must_use]
    pub const fn replaces_call(&self) -> bool {
        matches!(self, Self::Template(_))
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Template(_) => "template",
            Self::Reorder(_) => "reorder",
            Self::ContainerizeReorder { .. } => "containerize",
            Self::Spread => "spread",
            Self::LessToCompare { .. } => "less-to-compare",
            Self::KeyToCompare { .. } => "key-to-compare",
        }
    }
}
