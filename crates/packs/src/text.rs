//! Text conditions over a configurable input property.
//!
//! Every kind compares the property's string value against the condition's
//! argument; a missing or non-string value never matches. `equals`,
//! `starts_with`, and `contains` are case-sensitive; `matches_glob` is a
//! case-insensitive match where `*` spans any run of characters.

use {
    serde_json::Value,
    weir_core::{Condition, ConditionPack, Input},
};

/// Pack id.
pub const PACK: &str = "text";

/// The `text` pack bound to the conventional `"text"` input property.
pub fn text_pack() -> ConditionPack {
    text_pack_on("text")
}

/// The `text` pack reading from `property` instead of `"text"`, for
/// interfaces that expose the message body under another name.
pub fn text_pack_on(property: &str) -> ConditionPack {
    ConditionPack::new(PACK)
        .kind("equals", bound(property, |value, arg| value == arg))
        .kind("starts_with", bound(property, |value, arg| value.starts_with(arg)))
        .kind("contains", bound(property, |value, arg| value.contains(arg)))
        .kind("matches_glob", bound(property, glob_match))
}

/// `text/equals` — exact match.
pub fn equals(value: impl Into<String>) -> Condition {
    Condition::new(PACK, "equals").arg(value.into())
}

/// `text/starts_with` — prefix match.
pub fn starts_with(prefix: impl Into<String>) -> Condition {
    Condition::new(PACK, "starts_with").arg(prefix.into())
}

/// `text/contains` — substring match.
pub fn contains(needle: impl Into<String>) -> Condition {
    Condition::new(PACK, "contains").arg(needle.into())
}

/// `text/matches_glob` — case-insensitive glob match.
pub fn matches_glob(pattern: impl Into<String>) -> Condition {
    Condition::new(PACK, "matches_glob").arg(pattern.into())
}

/// Lift a `(value, arg)` comparison into an evaluator reading `property`.
fn bound(
    property: &str,
    compare: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
) -> impl Fn(&Input, &Value) -> bool + Send + Sync + 'static {
    let property = property.to_string();
    move |input, args| match (input.str(&property), args.as_str()) {
        (Some(value), Some(arg)) => compare(value, arg),
        _ => false,
    }
}

/// Case-insensitive glob where `*` matches any run of characters.
fn glob_match(text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    if !pattern.contains('*') {
        return text == pattern;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return true,
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return text == pattern,
    };

    if !text.starts_with(first) {
        return false;
    }
    let mut pos = first.len();
    for part in middle {
        if part.is_empty() {
            continue;
        }
        match text[pos..].find(part) {
            Some(idx) => pos += idx + part.len(),
            None => return false,
        }
    }
    // The tail segment must sit at the very end of the remaining text.
    text.len() >= pos + last.len() && text[pos..].ends_with(last)
}
