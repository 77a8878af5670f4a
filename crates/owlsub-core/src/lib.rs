//! owlsub core: transport-agnostic EventSub protocol primitives and error types.
//!
//! This crate defines the wire envelope, the typed event set, and the decoder
//! that applies freshness and de-duplication policy. It carries no transport or
//! runtime dependencies so the decoder can be driven from tests or any client.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `DecodeError`/`OwlSubError` so a malformed frame never crashes
//! the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{DecodeError, ErrorKind, OwlSubError, Result};
