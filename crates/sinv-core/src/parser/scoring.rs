//! Weighted keyword scoring used by parser detection.

use crate::models::supplier::Detection;

/// A keyword and the points it contributes when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordRule {
    pub keyword: &'static str,
    pub weight: u32,
}

impl KeywordRule {
    pub const fn new(keyword: &'static str, weight: u32) -> Self {
        Self { keyword, weight }
    }
}

/// Outcome of scoring a document against a rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordScore {
    /// Sum of matched weights, capped at 100.
    pub score: u8,
    pub matched: Vec<&'static str>,
}

impl KeywordScore {
    /// Turn the score into a detection; `is_match` when `score >= match_threshold`.
    pub fn into_detection(self, supplier: &str, match_threshold: u8) -> Detection {
        if self.matched.is_empty() {
            return Detection::no_match();
        }

        let notes = format!(
            "{} keyword(s) for {}: {}",
            self.matched.len(),
            supplier,
            self.matched.join(", ")
        );
        Detection::new(self.score >= match_threshold, self.score, notes)
    }
}

/// Case-insensitive substring scoring. Pure: same text, same score.
pub fn score_keywords(text: &str, rules: &[KeywordRule]) -> KeywordScore {
    let haystack = text.to_lowercase();
    let mut total = 0u32;
    let mut matched = Vec::new();

    for rule in rules {
        if haystack.contains(&rule.keyword.to_lowercase()) {
            total = total.saturating_add(rule.weight);
            matched.push(rule.keyword);
        }
    }

    KeywordScore {
        score: total.min(100) as u8,
        matched,
    }
}
