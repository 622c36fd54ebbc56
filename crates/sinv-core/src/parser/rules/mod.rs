//! Rule-based field extractors shared by every supplier parser.

pub mod amounts;
pub mod dates;
pub mod patterns;
pub mod text;

pub use amounts::{extract_amount, parse_amount, round_half_up, round_money, AmountExtractor};
pub use dates::{extract_date, extract_iso_date, DateExtractor};
pub use text::{clean_name, clean_sku, extract_lines, is_heading};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}
