//! owlsub client library entry.
//!
//! This crate wires the credential provider, Helix client, handler registry,
//! and EventSub connection supervisor into a single client. It is consumed by
//! the `owlsub` binary (`main.rs`) and by integration tests.

pub mod client;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod helix;
pub mod obs;
pub mod transport;

pub use client::EventSubClient;
pub use credentials::{CredentialProvider, TokenSource};
pub use dispatch::{DispatchReport, HandlerRegistry};
pub use helix::HelixClient;
pub use transport::{Backoff, ConnectionState, SessionHandle};
