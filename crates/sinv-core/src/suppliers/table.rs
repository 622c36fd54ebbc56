//! Parser for table-structured supplier invoices.
//!
//! Item rows look like
//!
//! ```text
//! EX0200RB 2.00 6 Rye Mill Shiraz 43.68 87.36 1
//! <sku>    <qty> <case size> <description...> <case price> <line total> <vat code>
//! ```
//!
//! Which quantity encoding, size fallbacks and sentinels apply is described
//! per supplier by a [`TableLayout`].

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{ExtractionError, RowError};
use crate::models::result::{ParseResult, ParsedItem};
use crate::models::supplier::Detection;
use crate::parser::rules::patterns::{
    DATE_LABEL, INVOICE_TOTAL, SKU_PATTERN, TOTAL_NETT, TOTAL_VAT, UNIT_SIZE, VAT_SUMMARY_ROW,
};
use crate::parser::rules::{
    clean_name, clean_sku, extract_iso_date, extract_lines, is_heading, parse_amount,
    round_half_up, round_money,
};
use crate::parser::{build_result, score_keywords, KeywordRule, ResultData, SupplierParser};

/// Unit size assumed for descriptions containing any of `keywords`.
#[derive(Debug, Clone, Copy)]
pub struct SizeFallback {
    pub keywords: &'static [&'static str],
    pub unit_size: &'static str,
}

/// Supplier-specific description of a table invoice.
#[derive(Debug, Clone)]
pub struct TableLayout {
    /// Registration key.
    pub key: &'static str,
    pub supplier_name: &'static str,
    /// Detection keywords and weights.
    pub keywords: &'static [KeywordRule],
    /// Minimum detection score for `is_match`.
    pub match_threshold: u8,
    /// Invoice numbers are this prefix followed by digits.
    pub invoice_prefix: &'static str,
    /// Lines searched for invoice number and date.
    pub header_lines: usize,
    /// Trailing lines searched for totals.
    pub footer_lines: usize,
    /// Minimum whitespace tokens in an item row.
    pub min_tokens: usize,
    /// Lines that precede the item table.
    pub start_sentinels: &'static [&'static str],
    /// Lines that follow the item table.
    pub end_sentinels: &'static [&'static str],
    /// Quantities are written `cases.units`, e.g. `2.03` is 2 cases and 3 units.
    pub cases_units_quantity: bool,
    pub size_fallbacks: &'static [SizeFallback],
    pub default_unit_size: &'static str,
    /// VAT code to percentage.
    pub vat_codes: &'static [(&'static str, u32)],
}

/// Table invoice parser driven by a [`TableLayout`].
pub struct TableInvoiceParser {
    layout: TableLayout,
}

impl TableInvoiceParser {
    pub fn new(layout: TableLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    fn extract_invoice_number(&self, header: &[&str]) -> Option<String> {
        let prefix = self.layout.invoice_prefix;

        header.iter().flat_map(|l| l.split_whitespace()).find_map(|token| {
            let token = token.trim_matches(|c: char| !c.is_ascii_alphanumeric());
            let digits = token.strip_prefix(prefix)?;
            (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
                .then(|| token.to_string())
        })
    }

    fn extract_invoice_date(&self, header: &[&str]) -> Option<String> {
        // Prefer a labeled date, then any date in the header
        header
            .iter()
            .filter(|l| DATE_LABEL.is_match(l))
            .find_map(|l| extract_iso_date(l))
            .or_else(|| header.iter().find_map(|l| extract_iso_date(l)))
    }

    fn extract_invoice_total(&self, footer: &[&str]) -> Option<Decimal> {
        for (i, line) in footer.iter().enumerate() {
            if let Some(caps) = INVOICE_TOTAL.captures(line) {
                if let Some(amount) = parse_amount(&caps[1]) {
                    return Some(amount);
                }
            }

            // Label and amount on separate lines
            if line.to_lowercase().contains("invoice total") {
                if let Some(amount) = footer.get(i + 1).and_then(|next| parse_amount(next)) {
                    return Some(amount);
                }
            }
        }

        None
    }

    /// `(subtotal, vat_total)` from a summary row or labeled total lines.
    fn extract_vat_totals(&self, footer: &[&str]) -> (Decimal, Decimal) {
        for line in footer {
            if let Some(caps) = VAT_SUMMARY_ROW.captures(line) {
                let subtotal = parse_amount(&caps[2]);
                let vat = parse_amount(&caps[4]);
                if let (Some(subtotal), Some(vat)) = (subtotal, vat) {
                    debug!("VAT summary row: subtotal {} vat {}", subtotal, vat);
                    return (subtotal, vat);
                }
            }
        }

        let labeled = |pattern: &regex::Regex| {
            footer
                .iter()
                .find_map(|l| pattern.captures(l).and_then(|c| parse_amount(&c[1])))
        };

        (
            labeled(&*TOTAL_NETT).unwrap_or(Decimal::ZERO),
            labeled(&*TOTAL_VAT).unwrap_or(Decimal::ZERO),
        )
    }

    /// Index of the first table line: the line after the first start sentinel.
    fn table_start(&self, lines: &[&str]) -> usize {
        lines
            .iter()
            .position(|l| contains_any(l, self.layout.start_sentinels))
            .map_or(0, |i| i + 1)
    }

    fn is_table_end(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.layout
            .end_sentinels
            .iter()
            .any(|s| lower.starts_with(&s.to_lowercase()))
    }

    /// Decode a raw quantity into individual units.
    ///
    /// With the `cases.units` encoding, `2.03` at case size 6 is `2 * 6 + 3 = 15`.
    /// `None` when the result is out of range.
    pub fn decode_quantity(&self, raw: Decimal, case_size: Decimal) -> Option<Decimal> {
        if !self.layout.cases_units_quantity {
            return Some(raw.normalize());
        }

        let cases = raw.trunc();
        let units = round_half_up(raw.fract().checked_mul(Decimal::ONE_HUNDRED)?, 0);
        Some(cases.checked_mul(case_size)?.checked_add(units)?.normalize())
    }

    /// Explicit size token first, then keyword fallbacks, then the default.
    pub fn infer_unit_size(&self, description: &str) -> String {
        let words: Vec<String> = description
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '.'))
            .map(str::to_lowercase)
            .collect();

        if let Some(caps) = words.iter().find_map(|w| UNIT_SIZE.captures(w)) {
            return format!("{}{}", &caps[1], caps[2].to_lowercase());
        }

        self.layout
            .size_fallbacks
            .iter()
            .find(|fallback| {
                words.iter().any(|w| {
                    let w = w.trim_end_matches('.');
                    fallback.keywords.iter().any(|k| *k == w)
                })
            })
            .map_or(self.layout.default_unit_size, |fallback| fallback.unit_size)
            .to_string()
    }

    fn vat_rate(&self, code: &str) -> Option<Decimal> {
        self.layout
            .vat_codes
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, rate)| Decimal::from(*rate))
    }

    /// Parse one table row.
    pub fn parse_row(
        &self,
        line: &str,
        category: Option<&str>,
    ) -> std::result::Result<ParsedItem, RowError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let n = tokens.len();
        let expected = self.layout.min_tokens.max(6);
        if n < expected {
            return Err(RowError::TooFewTokens { expected, found: n });
        }

        let sku = tokens[0];
        if !SKU_PATTERN.is_match(sku) {
            return Err(RowError::NotAnItem(sku.to_string()));
        }

        let raw_quantity = positive(tokens[1], "quantity")?;
        let case_size = positive(tokens[2], "case size")?;

        let description = clean_name(&tokens[3..n - 3].join(" "));
        if description.is_empty() {
            return Err(RowError::EmptyDescription);
        }

        let case_price = non_negative(tokens[n - 3], "case price")?;
        let line_total = non_negative(tokens[n - 2], "line total")?;
        let vat_code = tokens[n - 1];

        let quantity = self
            .decode_quantity(raw_quantity, case_size)
            .filter(|q| *q > Decimal::ZERO)
            .ok_or_else(|| invalid("quantity", tokens[1]))?;

        let unit_price = case_price
            .checked_div(case_size)
            .map(round_money)
            .ok_or_else(|| invalid("case price", tokens[n - 3]))?;
        let unit_size = self.infer_unit_size(&description);
        let vat_rate = self.vat_rate(vat_code);
        let vat_amount = vat_rate
            .map(|rate| {
                line_total
                    .checked_mul(rate)
                    .map(|v| round_money(v / Decimal::ONE_HUNDRED))
                    .ok_or_else(|| invalid("line total", tokens[n - 2]))
            })
            .transpose()?;

        Ok(ParsedItem {
            supplier_sku: clean_sku(sku),
            supplier_name: description.clone(),
            description: Some(description),
            pack_size: Some(format!("{}x{}", quantity, unit_size)),
            unit_size: Some(unit_size),
            quantity,
            unit_price,
            nett_price: line_total,
            vat_code: Some(vat_code.to_string()),
            vat_rate,
            vat_amount,
            line_total,
            category_header: category.map(str::to_string),
        })
    }

    /// Walk the item table. Returns the items and the number of rejected rows.
    fn extract_items(&self, lines: &[&str]) -> (Vec<ParsedItem>, usize) {
        let mut items = Vec::new();
        let mut skipped = 0;
        let mut category: Option<String> = None;

        for line in &lines[self.table_start(lines)..] {
            if !items.is_empty() && self.is_table_end(line) {
                break;
            }

            if is_heading(line) {
                category = Some(clean_name(line));
                continue;
            }

            match self.parse_row(line, category.as_deref()) {
                Ok(item) => items.push(item),
                Err(e @ (RowError::TooFewTokens { .. } | RowError::NotAnItem(_))) => {
                    debug!("Not an item row {:?}: {}", line, e);
                }
                Err(e) => {
                    debug!("Skipping row {:?}: {}", line, e);
                    skipped += 1;
                }
            }
        }

        (items, skipped)
    }
}

impl SupplierParser for TableInvoiceParser {
    fn key(&self) -> &str {
        self.layout.key
    }

    fn supplier_name(&self) -> &str {
        self.layout.supplier_name
    }

    fn detect_supplier(&self, text: &str) -> Detection {
        score_keywords(text, self.layout.keywords)
            .into_detection(self.layout.supplier_name, self.layout.match_threshold)
    }

    fn extract(&self, text: &str) -> crate::parser::Result<ParseResult> {
        let lines = extract_lines(text);
        if lines.is_empty() {
            return Err(ExtractionError::EmptyText);
        }

        info!("Parsing {} invoice from {} lines", self.layout.supplier_name, lines.len());

        let header = &lines[..lines.len().min(self.layout.header_lines)];
        let footer = &lines[lines.len().saturating_sub(self.layout.footer_lines)..];

        let invoice_number = self.extract_invoice_number(header);
        let invoice_date = self.extract_invoice_date(header);
        let (subtotal, vat_total) = self.extract_vat_totals(footer);
        let total_amount = match self.extract_invoice_total(footer) {
            Some(total) => total,
            None => computed_total(subtotal, vat_total)?,
        };

        let (items, skipped) = self.extract_items(&lines);
        if items.is_empty() {
            return Err(ExtractionError::NoData);
        }

        let mut notes = format!("Parsed {} line items", items.len());
        if skipped > 0 {
            notes.push_str(&format!(" ({} rows skipped)", skipped));
        }
        if invoice_number.is_none() {
            notes.push_str("; invoice number not found");
        }

        debug!(
            "Extracted {} items, subtotal {}, vat {}, total {}",
            items.len(),
            subtotal,
            vat_total,
            total_amount
        );

        Ok(build_result(
            true,
            ResultData {
                supplier_name: Some(self.layout.supplier_name.to_string()),
                confidence: Some(self.detect_supplier(text).confidence),
                items: Some(items),
                invoice_number,
                invoice_date,
                total_amount: Some(total_amount),
                subtotal: Some(subtotal),
                vat_total: Some(vat_total),
                raw_text: Some(text.to_string()),
                parser_used: Some(self.layout.key.to_string()),
                notes: Some(notes),
                ..Default::default()
            },
        ))
    }
}

fn contains_any(line: &str, needles: &[&str]) -> bool {
    let lower = line.to_lowercase();
    needles.iter().any(|n| lower.contains(&n.to_lowercase()))
}

/// `subtotal + vat_total` for invoices without a printed total.
fn computed_total(subtotal: Decimal, vat_total: Decimal) -> crate::parser::Result<Decimal> {
    subtotal
        .checked_add(vat_total)
        .ok_or_else(|| ExtractionError::Parse {
            field: "invoice total".to_string(),
            value: format!("{} + {}", subtotal, vat_total),
        })
}

fn invalid(field: &'static str, token: &str) -> RowError {
    RowError::InvalidNumber {
        field,
        value: token.to_string(),
    }
}

fn positive(token: &str, field: &'static str) -> std::result::Result<Decimal, RowError> {
    parse_amount(token)
        .filter(|v| *v > Decimal::ZERO)
        .ok_or_else(|| invalid(field, token))
}

fn non_negative(token: &str, field: &'static str) -> std::result::Result<Decimal, RowError> {
    parse_amount(token)
        .filter(|v| *v >= Decimal::ZERO)
        .ok_or_else(|| invalid(field, token))
}
