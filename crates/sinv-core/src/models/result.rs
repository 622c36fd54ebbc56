//! Standardized parse output shared by every supplier parser.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::supplier::Candidate;

/// A complete parse result.
///
/// The shape is identical whichever parser produced it; missing values are
/// carried as `0`, `""` or `[]` rather than being omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub success: bool,

    /// Supplier the invoice was attributed to.
    pub supplier: SupplierInfo,

    /// Priced line items.
    pub parsed_items: Vec<ParsedItem>,

    /// Invoice header and totals.
    pub metadata: InvoiceMetadata,

    /// The text the parser was given.
    pub raw_text: String,

    /// Registration key of the parser that produced this result.
    pub parser_used: String,

    /// Human readable notes or the failure reason.
    pub notes: String,

    /// Candidate and refinement trail from the two-layer pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_trail: Option<DetectionTrail>,
}

/// Supplier attribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierInfo {
    pub id: String,
    pub name: String,
    /// 0 - 100.
    pub confidence: u8,
}

/// Header fields and totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceMetadata {
    pub invoice_number: String,
    /// ISO `YYYY-MM-DD`, or empty.
    pub invoice_date: String,
    pub total_amount: Decimal,
    pub subtotal: Decimal,
    pub vat_total: Decimal,
}

/// One product row from the invoice table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedItem {
    /// Supplier product code.
    pub supplier_sku: String,

    /// Product name as printed by the supplier.
    pub supplier_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// e.g. `12x75cl`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pack_size: Option<String>,

    /// e.g. `75cl`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_size: Option<String>,

    /// Individual units delivered.
    pub quantity: Decimal,

    /// Price per individual unit.
    pub unit_price: Decimal,

    /// Net price of the line before VAT.
    pub nett_price: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_code: Option<String>,

    /// Percentage, e.g. `20`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_rate: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_amount: Option<Decimal>,

    pub line_total: Decimal,

    /// Section heading the row was printed under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_header: Option<String>,
}

/// Decision trail of a two-layer detection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionTrail {
    /// Coarse candidates in rank order.
    pub candidates: Vec<Candidate>,
    /// Refined scores for candidates that resolved to a parser.
    pub refined: Vec<RefinedScore>,
    /// Names of candidates that had no registered parser.
    pub skipped: Vec<String>,
    /// Key of the parser that was invoked.
    pub selected: String,
}

/// A candidate re-scored by its own parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinedScore {
    pub supplier_id: String,
    pub supplier_name: String,
    pub parser_key: String,
    pub coarse_confidence: u8,
    pub confidence: u8,
    pub is_match: bool,
    pub notes: String,
}

/// Failure shape returned to callers when the pipeline stops early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<Candidate>>,
}

impl ParseResult {
    /// Sum of line totals, `None` when out of range.
    pub fn items_total(&self) -> Option<Decimal> {
        self.parsed_items
            .iter()
            .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.line_total))
    }

    /// Check the result for internal inconsistencies.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.metadata.invoice_number.is_empty() {
            issues.push("Missing invoice number".to_string());
        }

        if self.metadata.invoice_date.is_empty() {
            issues.push("Missing invoice date".to_string());
        }

        if self.parsed_items.is_empty() {
            issues.push("No line items".to_string());
        }

        for item in &self.parsed_items {
            if item.quantity <= Decimal::ZERO {
                issues.push(format!("Item {} has non-positive quantity", item.supplier_sku));
            }
            if item.unit_price < Decimal::ZERO || item.line_total < Decimal::ZERO {
                issues.push(format!("Item {} has a negative price", item.supplier_sku));
            }
        }

        let subtotal = self.metadata.subtotal;
        if !subtotal.is_zero() && !self.parsed_items.is_empty() {
            match self.items_total() {
                Some(calculated) => {
                    let differs = calculated
                        .checked_sub(subtotal)
                        .is_none_or(|d| d.abs() > Decimal::new(1, 2));
                    if differs {
                        issues.push(format!(
                            "Line item total ({}) differs from subtotal ({})",
                            calculated, subtotal
                        ));
                    }
                }
                None => issues.push("Line item total is out of range".to_string()),
            }
        }

        issues
    }
}
