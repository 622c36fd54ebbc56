//! Parsers registered before their line extraction exists.
//!
//! A pending parser scores documents like any other parser, so it can win
//! candidate selection, but returns no line items.

use crate::error::ExtractionError;
use crate::models::result::ParseResult;
use crate::models::supplier::Detection;
use crate::parser::rules::patterns::INVOICE_TOTAL;
use crate::parser::rules::{extract_iso_date, extract_lines, parse_amount};
use crate::parser::{build_result, score_keywords, KeywordRule, ResultData, SupplierParser};

/// Detection-only parser for a supplier awaiting line extraction.
#[derive(Debug, Clone)]
pub struct PendingParser {
    key: &'static str,
    supplier_name: &'static str,
    keywords: &'static [KeywordRule],
    match_threshold: u8,
}

impl PendingParser {
    pub const fn new(
        key: &'static str,
        supplier_name: &'static str,
        keywords: &'static [KeywordRule],
        match_threshold: u8,
    ) -> Self {
        Self {
            key,
            supplier_name,
            keywords,
            match_threshold,
        }
    }
}

impl SupplierParser for PendingParser {
    fn key(&self) -> &str {
        self.key
    }

    fn supplier_name(&self) -> &str {
        self.supplier_name
    }

    fn detect_supplier(&self, text: &str) -> Detection {
        score_keywords(text, self.keywords).into_detection(self.supplier_name, self.match_threshold)
    }

    fn extract(&self, text: &str) -> crate::parser::Result<ParseResult> {
        let lines = extract_lines(text);
        if lines.is_empty() {
            return Err(ExtractionError::EmptyText);
        }

        let invoice_date = lines.iter().take(50).find_map(|l| extract_iso_date(l));
        let total_amount = lines
            .iter()
            .rev()
            .find_map(|l| INVOICE_TOTAL.captures(l).and_then(|c| parse_amount(&c[1])));

        Ok(build_result(
            true,
            ResultData {
                supplier_name: Some(self.supplier_name.to_string()),
                confidence: Some(self.detect_supplier(text).confidence),
                invoice_date,
                total_amount,
                raw_text: Some(text.to_string()),
                parser_used: Some(self.key.to_string()),
                notes: Some(format!(
                    "{} detected; line item extraction for this supplier is pending",
                    self.supplier_name
                )),
                ..Default::default()
            },
        ))
    }
}

const BOOKER_KEYWORDS: &[KeywordRule] = &[
    KeywordRule::new("booker wholesale", 40),
    KeywordRule::new("booker limited", 30),
    KeywordRule::new("booker", 30),
    KeywordRule::new("booker.co.uk", 20),
];

const BRAKES_KEYWORDS: &[KeywordRule] = &[
    KeywordRule::new("brakes", 40),
    KeywordRule::new("brake bros", 30),
    KeywordRule::new("brakes.co.uk", 20),
    KeywordRule::new("sysco", 10),
];

/// Booker Wholesale cash & carry invoices.
pub fn booker() -> PendingParser {
    PendingParser::new("booker", "Booker Wholesale", BOOKER_KEYWORDS, 40)
}

/// Brakes foodservice invoices.
pub fn brakes() -> PendingParser {
    PendingParser::new("brakes", "Brakes", BRAKES_KEYWORDS, 40)
}
