//! Data models shared by the parsers, matcher and registry.

pub mod config;
pub mod result;
pub mod supplier;

pub use config::{DetectionConfig, MatcherConfig, ProfilesConfig, SinvConfig};
pub use result::{
    DetectionTrail, FailureReport, InvoiceMetadata, ParseResult, ParsedItem, RefinedScore,
    SupplierInfo,
};
pub use supplier::{Candidate, Detection, SupplierProfile};
