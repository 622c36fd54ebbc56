//! Common regex patterns for supplier invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Amounts (UK format: 1,234.56 with optional currency marker)
    pub static ref AMOUNT_PATTERN: Regex = Regex::new(
        r"(?i)(?:£|€|\$|GBP|EUR|USD)?\s*(-?)\b((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?)\b"
    ).unwrap();

    // DD/MM/YYYY, DD.MM.YYYY, DD-MM-YYYY and two-digit years
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    // YYYY-MM-DD
    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"
    ).unwrap();

    // Labeled date lines
    pub static ref DATE_LABEL: Regex = Regex::new(
        r"(?i)\b(?:invoice\s+date|tax\s+point|date\s+of\s+supply|date)\b"
    ).unwrap();

    // Totals
    pub static ref INVOICE_TOTAL: Regex = Regex::new(
        r"(?i)invoice\s+total\b[\s:]*(?:£|GBP)?\s*(-?[\d,]+\.\d{2})"
    ).unwrap();

    pub static ref TOTAL_NETT: Regex = Regex::new(
        r"(?i)total\s+nett?\b[\s:]*(?:£|GBP)?\s*(-?[\d,]+\.\d{2})"
    ).unwrap();

    pub static ref TOTAL_VAT: Regex = Regex::new(
        r"(?i)total\s+vat\b[\s:]*(?:£|GBP)?\s*(-?[\d,]+\.\d{2})"
    ).unwrap();

    // VAT summary row: count, subtotal, rate, vat amount
    pub static ref VAT_SUMMARY_ROW: Regex = Regex::new(
        r"^(\d+)\s+£?([\d,]+\.\d{2})\s+(\d+(?:\.\d+)?)%?\s+£?([\d,]+\.\d{2})$"
    ).unwrap();

    // Product codes: alphanumeric, at least four characters
    pub static ref SKU_PATTERN: Regex = Regex::new(
        r"(?i)^[A-Z0-9]{4,}$"
    ).unwrap();

    // Explicit unit size token, e.g. 75cl, 1.5L, 500ml
    pub static ref UNIT_SIZE: Regex = Regex::new(
        r"(?i)^(\d+(?:\.\d+)?)(cl|ml|ltr|lt|l|kg|g)$"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}
