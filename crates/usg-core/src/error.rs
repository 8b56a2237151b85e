//! # Error Types
//!
//! Errors raised by the foundational types. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Error constructing a core primitive.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A timestamp string was not valid RFC 3339, or not UTC where UTC is required.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A Unix epoch value was out of the representable range.
    #[error("invalid unix timestamp: {0}")]
    InvalidEpoch(i64),
}
