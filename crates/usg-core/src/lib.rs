//! # usg-core — Foundational Types for the USG Registry
//!
//! The leaf of the workspace DAG. Defines the primitives every other crate
//! shares:
//!
//! - [`sha256_hex`]: the content hash recorded for
//!   every accepted record file. Used for change detection, not
//!   authentication.
//! - [`Timestamp`]: UTC-only, seconds-precision timestamps used for the
//!   `generated_at` field of index documents.
//! - [`CoreError`]: errors raised while constructing the above.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `usg-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod temporal;

pub use digest::sha256_hex;
pub use error::CoreError;
pub use temporal::Timestamp;
