//! List-valued CSV cells.
//!
//! Lists are written as JSON arrays (`["a","b"]`). Older exports stored the
//! Python repr (`['a', 'b']`), which the readers below still accept.

use regex::Regex;
use std::sync::OnceLock;

/// Which column a list cell came from; the legacy formats differ per column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListColumn {
    Mentions,
    Hashtags,
}

pub fn encode_list(items: &[String]) -> String {
    // Serializing a slice of strings cannot fail.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Cell for an optional list: `None` is written like an empty list.
pub fn encode_opt_list(items: Option<&[String]>) -> String {
    encode_list(items.unwrap_or(&[]))
}

/// Parse a stored list cell. Empty cells and empty lists both become `None`.
pub fn parse_list(cell: &str, column: ListColumn) -> Option<Vec<String>> {
    let cell = cell.trim();
    if cell.is_empty() || cell == "[]" {
        return None;
    }
    let items = match serde_json::from_str::<Vec<String>>(cell) {
        Ok(v) => v,
        Err(_) => match column {
            ListColumn::Mentions => parse_legacy_split(cell),
            ListColumn::Hashtags => parse_legacy_quoted_words(cell),
        },
    };
    if items.is_empty() { None } else { Some(items) }
}

/// `['alice', 'bob']` → strip brackets, split on commas, trim quotes and spaces.
fn parse_legacy_split(cell: &str) -> Vec<String> {
    cell.trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|s| s.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `['rust', 'etl']` → every single-quoted word token, in order.
fn parse_legacy_quoted_words(cell: &str) -> Vec<String> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = RE.get_or_init(|| Regex::new(r"'(\w+)'").ok()) else {
        return Vec::new();
    };
    re.captures_iter(cell).map(|c| c[1].to_string()).collect()
}
