//! EventSub protocol modules.
//!
//! - `envelope`: the wire frame (metadata + raw payload).
//! - `event`: the closed set of typed events a frame decodes into.
//! - `window`: bounded recent-message history used for de-duplication.
//! - `decoder`: freshness, de-duplication, and type selection for raw frames.
//!
//! All parsers are panic-free: malformed input is reported as `DecodeError`
//! so a hostile or buggy upstream cannot take down the read loop.

pub mod decoder;
pub mod envelope;
pub mod event;
pub mod window;

pub use decoder::EnvelopeDecoder;
pub use envelope::{Envelope, Metadata};
pub use event::{
    Event, EventKind, KeepaliveEvent, NotificationEvent, ReconnectEvent, RevocationEvent,
    SessionInfo, StreamOfflineEvent, StreamOnlineEvent, Subscription, SubscriptionTransport,
    SubscriptionType, WelcomeEvent,
};
pub use window::RecentMessageWindow;
