//! Lightweight in-process counters.
//!
//! Counters are stored as atomics and can be rendered in Prometheus text
//! format for logging or an external scrape endpoint.

pub mod metrics;

pub use metrics::{ClientMetrics, CounterVec};
