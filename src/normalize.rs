//! Input normalization for raw field names and values
//!
//! Field names are folded for matching only:
//! - Unicode NFKC fold
//! - Lowercase conversion
//! - `_` and `-` treated as word separators
//! - Trailing label colons dropped
//! - Whitespace collapsing
//!
//! Values keep their case; only NFKC folding and whitespace collapsing apply.

use unicode_normalization::UnicodeNormalization;

/// A normalized field name/value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedField {
    pub name: String,
    pub value: String,
}

/// Normalize a raw (name, value) pair.
///
/// Pure and idempotent: normalizing the output again returns it unchanged.
///
/// # Examples
///
/// ```
/// use vessel_canon::normalize::normalize;
///
/// let field = normalize("Name_o_fShip", "  STARK \n");
/// assert_eq!(field.name, "name o fship");
/// assert_eq!(field.value, "STARK");
/// ```
pub fn normalize(field_name: &str, field_value: &str) -> NormalizedField {
    NormalizedField {
        name: normalize_name(field_name),
        value: normalize_value(field_value),
    }
}

/// Fold a field name for rule matching
pub fn normalize_name(s: &str) -> String {
    let folded: String = s.nfkc().collect::<String>().to_lowercase();

    let separated: String = folded
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();

    // "Call Sign :" and "Call Sign:" are the same label
    let trimmed = separated.trim_end_matches(|c: char| c == ':' || c.is_whitespace());

    collapse_whitespace(trimmed)
}

/// Collapse whitespace in a value without touching its case
pub fn normalize_value(s: &str) -> String {
    let folded: String = s.nfkc().collect();
    collapse_whitespace(&folded)
}

/// Trim each line of a value and drop blank ones, keeping line structure
pub fn value_lines(s: &str) -> Vec<String> {
    let folded: String = s.nfkc().collect();
    folded
        .lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Split a raw field name into its original-case tokens
pub fn name_tokens(s: &str) -> Vec<String> {
    let folded: String = s.nfkc().collect();
    folded
        .split(|c: char| c == '_' || c == '-' || c == ':' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
