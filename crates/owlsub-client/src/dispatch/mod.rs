//! Handler registry exports.
//!
//! Re-exports the registry and dispatch report so downstream consumers can
//! depend on this module directly.

pub mod registry;

pub use registry::{DispatchReport, HandlerRegistry};
