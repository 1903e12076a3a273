//! Error types.
//!
//! Comparing values never fails.  The only errors are a host record that
//! does not honor its own field declarations and malformed decimal input.
use thiserror::Error;

/// Errors produced while materializing records or parsing values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The record declared a field but returned no value for it.
    #[error("record declares field `{field}` but has no value for it")]
    MissingFieldValue { field: String },

    /// A decimal literal could not be parsed.
    #[error("invalid decimal literal: {0:?}")]
    InvalidDecimal(String),
}
