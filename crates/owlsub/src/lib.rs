//! Top-level facade crate for owlsub.
//!
//! Re-exports the core event types and the client library so users can depend on a single crate.

pub mod core {
    pub use owlsub_core::*;
}

pub mod client {
    pub use owlsub_client::*;
}
