//! Shared text utilities used by every stage.
//!
//! - [`is_blank`] - the single definition of "no value"
//! - [`normalize_token`] - lowercase, underscore, `[a-z0-9_]` only

use once_cell::sync::Lazy;
use regex::Regex;

/// Not-a-number markers left behind by spreadsheet tools when a cell is empty.
const NAN_MARKERS: [&str; 2] = ["nan", "NaN"];

static INVALID_TOKEN_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_]").expect("static regex"));

/// True for absent cells, empty strings and not-a-number markers.
///
/// Whitespace-only cells are *not* blank.
pub fn is_blank(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(s) => s.is_empty() || NAN_MARKERS.contains(&s),
    }
}

/// Normalize free text into a machine name.
///
/// Lowercases, turns spaces into underscores and strips every character
/// outside `[a-z0-9_]`. Blank input gives an empty string.
///
/// # Example
/// ```
/// use formbridge::text::normalize_token;
///
/// assert_eq!(normalize_token(Some("Household Size!")), "household_size");
/// assert_eq!(normalize_token(None), "");
/// ```
pub fn normalize_token(value: Option<&str>) -> String {
    if is_blank(value) {
        return String::new();
    }
    let lowered = value.unwrap_or_default().to_lowercase().replace(' ', "_");
    INVALID_TOKEN_CHARS.replace_all(&lowered, "").into_owned()
}
