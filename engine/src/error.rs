//! Error types for the Tally engine.

use crate::{FieldName, RecordId};
use thiserror::Error;

/// All possible errors from the Tally engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Config errors
    #[error("schema mismatch: {context} references unknown field '{field}'")]
    SchemaMismatch { field: FieldName, context: String },

    #[error("invalid sort field: {0}")]
    InvalidSortField(FieldName),

    #[error("field is not searchable: {0}")]
    FieldNotSearchable(FieldName),

    #[error("field is not filterable: {0}")]
    FieldNotFilterable(FieldName),

    #[error("invalid filter value for field '{field}': {value}")]
    InvalidFilterValue { field: FieldName, value: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    // Record validation errors
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("missing required field: {0}")]
    MissingRequiredField(FieldName),

    #[error("type mismatch for field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: FieldName,
        expected: String,
        got: String,
    },

    // Collection errors
    #[error("record already exists: {0}")]
    RecordAlreadyExists(RecordId),

    #[error("record not found: {0}")]
    RecordNotFound(RecordId),
}

impl Error {
    pub(crate) fn mismatch(field: impl Into<FieldName>, context: impl Into<String>) -> Self {
        Error::SchemaMismatch {
            field: field.into(),
            context: context.into(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
