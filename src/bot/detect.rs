//! Dice token detection in free chat text

use std::sync::LazyLock;

use regex::Regex;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([0-9]+d[0-9]+[+-]?[0-9]*)\]").expect("valid regex"));

/// Find every bracketed dice token in `text`, brackets removed, in order
pub fn scan(text: &str) -> Vec<&str> {
    if !text.contains('[') {
        return Vec::new();
    }

    TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}
