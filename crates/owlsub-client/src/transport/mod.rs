//! Transport layer (EventSub websocket).
//!
//! Exposes the connection supervisor, the frame codec that separates protocol
//! control frames from application frames, and the published connection state.

pub mod backoff;
pub mod codec;
pub mod state;
pub mod ws;

pub use backoff::Backoff;
pub use state::{ConnectionState, SessionHandle};
