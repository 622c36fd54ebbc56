//! Core library for supplier invoice parsing.
//!
//! This crate provides:
//! - A parser contract shared by every supplier strategy, with pure text helpers
//! - Supplier parsers (table-structured invoices and pending stubs)
//! - Coarse supplier candidate ranking from keyword profiles
//! - A parser registry running two-layer detection and dispatch

pub mod error;
pub mod matcher;
pub mod models;
pub mod parser;
pub mod registry;
pub mod store;
pub mod suppliers;

pub use error::{ExtractionError, PipelineError, Result, RowError, SinvError, StoreError};
pub use matcher::{rank_candidates, MainSupplierMatcher};
pub use models::{
    Candidate, Detection, FailureReport, InvoiceMetadata, ParseResult, ParsedItem, SinvConfig,
    SupplierInfo, SupplierProfile,
};
pub use parser::{build_result, ResultData, SupplierParser};
pub use registry::{ParserRegistry, ParserRegistryBuilder, SupplierDetection};
pub use store::{InMemoryProfileStore, JsonProfileStore, ProfileStore};
pub use suppliers::{default_parsers, default_registry, default_registry_builder};
