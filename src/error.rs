//! Error types.
//!
//! Two classes with very different lifetimes:
//! - [`ConstructionError`]: fatal, raised while a record type is being
//!   defined. A record that fails construction never becomes callable.
//! - [`ParseError`]: returned (never panicked) from `parse`/`parse_list`;
//!   carries a data-shaped error value plus the offending input verbatim.

use serde_json::Value;
use thiserror::Error;

/// Fatal errors raised during record-type definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("duplicate field `{field}` in record `{record}`")]
    DuplicateField { record: String, field: String },

    #[error("invalid field name `{name}` in record `{record}`")]
    InvalidFieldName { record: String, name: String },

    #[error("unrecognized type descriptor: {descriptor}")]
    UnknownType { descriptor: String },

    #[error("record handle `{name}` is already bound")]
    HandleAlreadyBound { name: String },
}

/// A failed parse.
///
/// `errors` mirrors the structure of the input: an object when the input is
/// an object (per-key messages or nested error objects), an array with
/// `null` at passing positions for sequences, a bare message string for a
/// scalar mismatch. `input` echoes the original data unchanged, for
/// diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("parse failed: {errors}")]
pub struct ParseError {
    pub errors: Value,
    pub input: Value,
}
