//! Amount extraction for supplier invoices.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::FieldExtractor;
use super::patterns::AMOUNT_PATTERN;

/// Currency amount extractor.
///
/// Accepts thousands separators (`1,234.56`) and a leading currency marker
/// (`£`, `€`, `$`, `GBP`, `EUR`, `USD`).
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = Decimal;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        AMOUNT_PATTERN
            .captures_iter(text)
            .filter_map(|caps| {
                let digits = caps[2].replace(',', "");
                let amount = Decimal::from_str(&digits).ok()?;
                Some(if &caps[1] == "-" { -amount } else { amount })
            })
            .collect()
    }
}

/// Extract the first amount found in `text`.
pub fn extract_amount(text: &str) -> Option<Decimal> {
    AmountExtractor::new().extract(text)
}

/// Parse a single amount token, e.g. `£1,234.56` or `43.68`.
///
/// Unlike [`extract_amount`], the whole token must be numeric once currency
/// markers and separators are removed.
pub fn parse_amount(token: &str) -> Option<Decimal> {
    let cleaned: String = token
        .trim()
        .trim_start_matches(['£', '€', '$'])
        .chars()
        .filter(|c| *c != ',')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Round half away from zero to `dp` places.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a money value to pennies.
pub fn round_money(value: Decimal) -> Decimal {
    round_half_up(value, 2)
}
