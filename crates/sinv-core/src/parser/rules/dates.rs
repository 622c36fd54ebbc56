//! Date extraction for supplier invoices.

use chrono::NaiveDate;

use super::FieldExtractor;
use super::patterns::{DATE_DMY, DATE_YMD};

/// Date field extractor for `DD/MM/YYYY` and `YYYY-MM-DD` layouts.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = NaiveDate;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// All valid dates in order of appearance.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut found: Vec<(usize, NaiveDate)> = Vec::new();

        // DD/MM/YYYY, DD.MM.YYYY or DD-MM-YYYY
        for caps in DATE_DMY.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year = parse_year(&caps[3]);

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                found.push((caps.get(0).map_or(0, |m| m.start()), date));
            }
        }

        // YYYY-MM-DD
        for caps in DATE_YMD.captures_iter(text) {
            let year: i32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let day: u32 = caps[3].parse().unwrap_or(0);

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                found.push((caps.get(0).map_or(0, |m| m.start()), date));
            }
        }

        found.sort_by_key(|(position, _)| *position);
        found.into_iter().map(|(_, date)| date).collect()
    }
}

/// Extract the first date in `text`.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    DateExtractor::new().extract(text)
}

/// Extract the first date in `text` formatted as ISO `YYYY-MM-DD`.
pub fn extract_iso_date(text: &str) -> Option<String> {
    extract_date(text).map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}
