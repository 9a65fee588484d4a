//! Realtime runtime for the presence & relay gateway.
//!
//! Presence hub (registry + online set + sessions), status fan-out and
//! direct message relay.

pub mod core;
pub mod types;

pub use self::core::{
    ConnectionRegistry, Departure, HubStats, OnlineSet, PresenceHub, RealtimeCore, RealtimeCtx,
    SessionTable,
};
pub use types::{ConnId, Connection, Delivery, RelayOutcome};
