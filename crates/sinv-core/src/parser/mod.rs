//! Supplier parser contract and shared extraction helpers.

mod result;
pub mod rules;
mod scoring;

pub use result::{build_result, failure_result, ResultData};
pub use scoring::{score_keywords, KeywordRule, KeywordScore};

use tracing::warn;

use crate::error::ExtractionError;
use crate::models::result::ParseResult;
use crate::models::supplier::Detection;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Capability set every supplier parser implements.
///
/// Implementations hold only immutable configuration so a single instance can
/// serve concurrent invocations.
pub trait SupplierParser: Send + Sync {
    /// Registration key, e.g. `matthew_clark`.
    fn key(&self) -> &str;

    /// Supplier display name.
    fn supplier_name(&self) -> &str;

    /// Classify `text` by weighted keyword hits.
    ///
    /// Must be pure: no I/O, and the same text always yields the same detection.
    fn detect_supplier(&self, text: &str) -> Detection;

    /// Extract a result, reporting unrecoverable problems as errors.
    fn extract(&self, text: &str) -> Result<ParseResult>;

    /// Parse an invoice. Never fails: extraction errors become `success: false`.
    fn parse(&self, text: &str) -> ParseResult {
        match self.extract(text) {
            Ok(result) => result,
            Err(e) => {
                warn!("{} parser failed: {}", self.key(), e);
                failure_result(self.key(), text, e.to_string())
            }
        }
    }
}
