//! Supplier-specific parsers.

pub mod matthew_clark;
pub mod pending;
pub mod table;

use std::sync::Arc;

pub use pending::PendingParser;
pub use table::{SizeFallback, TableInvoiceParser, TableLayout};

use crate::parser::SupplierParser;
use crate::registry::{ParserRegistry, ParserRegistryBuilder};

/// Every parser shipped with the library.
pub fn default_parsers() -> Vec<Arc<dyn SupplierParser>> {
    vec![
        Arc::new(matthew_clark::parser()),
        Arc::new(pending::booker()),
        Arc::new(pending::brakes()),
    ]
}

/// Registry with the shipped parsers and the supplier names they answer to.
pub fn default_registry() -> ParserRegistry {
    default_registry_builder().build()
}

/// Builder preloaded like [`default_registry`], for callers that adjust the
/// detection settings before building.
pub fn default_registry_builder() -> ParserRegistryBuilder {
    let mut builder = ParserRegistry::builder();
    for parser in default_parsers() {
        builder = builder.register(parser);
    }

    builder
        .alias("Matthew Clark Bibendum", "matthew_clark")
        .alias("Booker", "booker")
        .alias("Booker Limited", "booker")
        .alias("Brake Bros", "brakes")
}
