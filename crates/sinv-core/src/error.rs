//! Error types for the sinv-core library.

use thiserror::Error;

use crate::models::result::FailureReport;
use crate::models::supplier::Candidate;

/// Main error type for the sinv library.
#[derive(Error, Debug)]
pub enum SinvError {
    /// Detection/dispatch pipeline error.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Supplier profile store error.
    #[error("profile store error: {0}")]
    Store(#[from] StoreError),

    /// Invoice field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by a supplier parser while extracting an invoice.
///
/// These never escape [`SupplierParser::parse`](crate::parser::SupplierParser::parse);
/// they are folded into a `success: false` result.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The input text is empty or whitespace only.
    #[error("invoice text is empty")]
    EmptyText,

    /// A value could not be parsed or computed.
    #[error("failed to parse {field}: {value}")]
    Parse { field: String, value: String },

    /// No invoice data could be extracted.
    #[error("no invoice data found")]
    NoData,
}

/// Reasons a single table row is skipped.
///
/// Row errors are absorbed by the parser that produced them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("expected at least {expected} tokens, found {found}")]
    TooFewTokens { expected: usize, found: usize },

    #[error("first token {0:?} is not a product code")]
    NotAnItem(String),

    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("row has no description")]
    EmptyDescription,
}

/// Errors from the supplier profile store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading the backing source failed.
    #[error("failed to read profiles: {0}")]
    Io(#[from] std::io::Error),

    /// The backing source is malformed.
    #[error("malformed profile data: {0}")]
    Format(#[from] serde_json::Error),

    /// The store could not be reached.
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

/// Terminal outcomes of the two-layer detection pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Empty or unreadable input text.
    #[error("invoice text is empty or unreadable")]
    Input,

    /// The coarse scan matched no supplier profile.
    #[error("no supplier matched the invoice text")]
    NoCandidate,

    /// Candidates exist but none maps to a registered parser.
    #[error("no registered parser for candidate suppliers: {}", candidate_names(.candidates))]
    NoParser { candidates: Vec<Candidate> },

    /// The profile store failed.
    #[error(transparent)]
    Upstream(#[from] StoreError),

    /// The selected parser reported a failure.
    #[error("parser {parser} failed: {notes}")]
    ParseFailure {
        parser: String,
        notes: String,
        candidates: Vec<Candidate>,
    },
}

impl PipelineError {
    /// Ranked candidates relevant to the failure, if any.
    pub fn candidates(&self) -> Option<&[Candidate]> {
        match self {
            Self::NoParser { candidates } | Self::ParseFailure { candidates, .. } => {
                Some(candidates)
            }
            _ => None,
        }
    }

    /// What an operator can do about the failure.
    pub fn suggestion(&self) -> Option<String> {
        let suggestion = match self {
            Self::Input => "Check that text was extracted from the PDF before parsing".to_string(),
            Self::NoCandidate => {
                "Add keywords for this supplier to its profile, or create a profile".to_string()
            }
            Self::NoParser { .. } => {
                "Register a parser for one of the candidates or alias its name to an existing parser"
                    .to_string()
            }
            Self::Upstream(_) => "Check the supplier profile store and resubmit".to_string(),
            Self::ParseFailure { parser, .. } => {
                format!("Check that the invoice layout matches the {} parser", parser)
            }
        };
        Some(suggestion)
    }

    /// Caller-facing failure shape.
    pub fn to_failure(&self) -> FailureReport {
        FailureReport {
            success: false,
            error: self.to_string(),
            suggestion: self.suggestion(),
            candidates: self.candidates().map(<[Candidate]>::to_vec),
        }
    }
}

fn candidate_names(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(|c| c.supplier_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for the sinv library.
pub type Result<T> = std::result::Result<T, SinvError>;
