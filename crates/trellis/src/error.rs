//! Crate error types.

use std::result::Result as StdResult;

use thiserror::Error;

/// Result type for trellis operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type.
///
/// Absence of a result is never an error in this crate: navigation that finds
/// no destination and dispatch that matches no binding return `None`/`false`.
/// Errors are reserved for programmer mistakes (invalid arguments, elements
/// from another view) and malformed declarative input (gesture strings).
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    #[error("invalid: {0}")]
    /// Invalid argument passed to an operation. Surfaced to catch bugs
    /// during development; not recoverable by the calling operation.
    Invalid(String),

    #[error("parse error: {0}")]
    /// Malformed gesture or command-reference string.
    Parse(String),
}
