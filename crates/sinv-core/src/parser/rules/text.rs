//! Line splitting and identifier cleanup.

use super::patterns::WHITESPACE;

/// Split text on any line ending, trim each line and drop empty ones.
pub fn extract_lines(text: &str) -> Vec<&str> {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Normalize a product code: upper-case ASCII alphanumerics only.
pub fn clean_sku(sku: &str) -> String {
    sku.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Collapse internal whitespace and strip stray separators from a product name.
pub fn clean_name(name: &str) -> String {
    let collapsed = WHITESPACE.replace_all(name.trim(), " ");
    collapsed
        .trim_matches(|c: char| matches!(c, '-' | '|' | ',' | ';' | ':' | '*') || c.is_whitespace())
        .to_string()
}

/// A heading line: letters only, all upper-case, e.g. `RED WINE`.
pub fn is_heading(line: &str) -> bool {
    let mut has_letter = false;
    for c in line.chars() {
        if c.is_ascii_digit() || c.is_lowercase() {
            return false;
        }
        has_letter |= c.is_alphabetic();
    }
    has_letter
}
