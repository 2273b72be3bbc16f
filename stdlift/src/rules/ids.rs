//! Centralized rule IDs.

/// A symbol with a standard-library (or builtin) replacement.
pub const RULE_ID_SYMBOL: &str = "STD001";
/// A package with a standard-library successor.
pub const RULE_ID_PACKAGE: &str = "STD002";
/// An import made unnecessary by the other rewrites.
pub const RULE_ID_UNUSED_IMPORT: &str = "STD003";

/// Every rule ID, in order.
pub const ALL_RULE_IDS: &[&str] = &[RULE_ID_SYMBOL, RULE_ID_PACKAGE, RULE_ID_UNUSED_IMPORT];

/// Whether `id` names one of this tool's rules (case-insensitive).
#[must_use]
pub fn is_rule_id(id: &str) -> bool {
    ALL_RULE_IDS.iter().any(|known| known.eq_ignore_ascii_case(id))
}
