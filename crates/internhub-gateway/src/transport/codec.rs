//! Decode-once codec for the transport layer.
//!
//! - Text frames => `EventFrame` (lazy `RawValue` for data)
//! - Binary frames are not part of the protocol and surface as `Binary`
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use internhub_core::{error::Result, protocol::EventFrame};

#[derive(Debug)]
pub enum Inbound {
    Event { frame: EventFrame, bytes_len: usize },
    Binary { bytes_len: usize },
    Ping,
    Pong,
    Close,
}

/// Cheap frame length, computed before any parsing.
pub fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) => v.len(),
        Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => {
            let frame = EventFrame::decode(&s)?;
            Ok(Inbound::Event { frame, bytes_len: s.len() })
        }
        Message::Binary(b) => Ok(Inbound::Binary { bytes_len: b.len() }),
        Message::Ping(_) => Ok(Inbound::Ping),
        Message::Pong(_) => Ok(Inbound::Pong),
        Message::Close(_) => Ok(Inbound::Close),
    }
}
