//! Error types for the selection engine.

use thiserror::Error;

/// Errors surfaced by the selection engine.
///
/// Nothing is recovered locally: every failure carries enough context
/// (cut name, sample name, field name) to diagnose at the call site.
#[derive(Error, Debug)]
pub enum Error {
    /// Pipeline or sample-set setup is incomplete or inconsistent
    /// (no target exposure, duplicate cut names, bad parameters).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An operation required an open sample but its backing table is unbound.
    #[error("sample '{sample}' has not been opened")]
    NotOpen { sample: String },

    /// A predicate or classifier referenced a column the batch does not carry.
    #[error("missing field '{field}'{context}")]
    MissingField { field: String, context: String },

    /// A column exists but does not have the expected Arrow type.
    #[error("field '{field}' has type {actual}, expected {expected}")]
    SchemaMismatch {
        field: String,
        expected: &'static str,
        actual: String,
    },

    /// A ratio was requested before its denominator accumulated anything.
    #[error("{what} is undefined: denominator is zero")]
    DivisionUndefined { what: &'static str },

    /// The backing file for a sample could not be resolved.
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// The resolved resource lacks the expected event-record structure.
    #[error("format error: {0}")]
    Format(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow compute/layout error
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet decode error
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl Error {
    /// Build a [`Error::MissingField`] without extra context.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Error::MissingField {
            field: field.into(),
            context: String::new(),
        }
    }

    /// Attach cut/sample context to a [`Error::MissingField`]; other
    /// variants pass through untouched.
    pub fn with_context(self, cut: &str, sample: &str) -> Self {
        match self {
            Error::MissingField { field, .. } => Error::MissingField {
                field,
                context: format!(" (cut '{cut}', sample '{sample}')"),
            },
            other => other,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
