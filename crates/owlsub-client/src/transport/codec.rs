//! Frame classification for the EventSub socket.
//!
//! - Text frames => handed to the envelope decoder
//! - Ping => answered with Pong at the transport level, never decoded
//! - Close => ends the session
//! - Anything else is dropped

use tokio_tungstenite::tungstenite::Message;

#[derive(Debug)]
pub enum Inbound {
    Text(String),
    Ping(Vec<u8>),
    Pong,
    Close(Option<String>),
    /// Frame kind the feed never sends (binary, raw frames).
    Other(&'static str),
}

pub fn classify(msg: Message) -> Inbound {
    match msg {
        Message::Text(s) => Inbound::Text(s),
        Message::Ping(v) => Inbound::Ping(v),
        Message::Pong(_) => Inbound::Pong,
        Message::Close(frame) => Inbound::Close(frame.map(|f| format!("{} {}", u16::from(f.code), f.reason))),
        Message::Binary(_) => Inbound::Other("binary"),
        Message::Frame(_) => Inbound::Other("frame"),
    }
}
