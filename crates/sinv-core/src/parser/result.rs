//! Result assembly with guaranteed defaults.

use rust_decimal::Decimal;

use crate::models::result::{InvoiceMetadata, ParseResult, ParsedItem, SupplierInfo};

/// Partially known parse output.
///
/// Anything left as `None` is filled with `0`, `""` or `[]` by [`build_result`].
#[derive(Debug, Clone, Default)]
pub struct ResultData {
    pub supplier_id: Option<String>,
    pub supplier_name: Option<String>,
    pub confidence: Option<u8>,
    pub items: Option<Vec<ParsedItem>>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<String>,
    pub total_amount: Option<Decimal>,
    pub subtotal: Option<Decimal>,
    pub vat_total: Option<Decimal>,
    pub raw_text: Option<String>,
    pub parser_used: Option<String>,
    pub notes: Option<String>,
}

/// Assemble a [`ParseResult`] with every field populated.
pub fn build_result(success: bool, data: ResultData) -> ParseResult {
    ParseResult {
        success,
        supplier: SupplierInfo {
            id: data.supplier_id.unwrap_or_default(),
            name: data.supplier_name.unwrap_or_default(),
            confidence: data.confidence.unwrap_or(0).min(100),
        },
        parsed_items: data.items.unwrap_or_default(),
        metadata: InvoiceMetadata {
            invoice_number: data.invoice_number.unwrap_or_default(),
            invoice_date: data.invoice_date.unwrap_or_default(),
            total_amount: data.total_amount.unwrap_or(Decimal::ZERO),
            subtotal: data.subtotal.unwrap_or(Decimal::ZERO),
            vat_total: data.vat_total.unwrap_or(Decimal::ZERO),
        },
        raw_text: data.raw_text.unwrap_or_default(),
        parser_used: data.parser_used.unwrap_or_default(),
        notes: data.notes.unwrap_or_default(),
        detection_trail: None,
    }
}

/// A `success: false` result carrying the failure reason in `notes`.
pub fn failure_result(parser_used: &str, raw_text: &str, reason: impl Into<String>) -> ParseResult {
    build_result(
        false,
        ResultData {
            raw_text: Some(raw_text.to_string()),
            parser_used: Some(parser_used.to_string()),
            notes: Some(reason.into()),
            ..Default::default()
        },
    )
}
