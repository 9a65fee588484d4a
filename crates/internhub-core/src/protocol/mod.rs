//! Wire protocol for the presence & relay socket.
//!
//! Every application frame is a JSON text frame `{ "event": ..., "data": ... }`.
//! - `event`: inbound frame envelope with lazily-parsed `data`, plus the
//!   outbound encoder and the event name table.
//! - `payload`: typed views over `data` for the events the gateway understands.
//!
//! Parsers are panic-free: malformed input is reported as `HubError`.

pub mod event;
pub mod payload;

pub use event::{names, EventFrame, OutboundEvent};
pub use payload::{MessageHeader, StatusQuery, UserStatus};
