//! Realtime core components for the gateway runtime.
//!
//! Connection registry, online set, live-session table, the hub that guards
//! them, and the egress runtime/context shared across services.

mod online;
mod presence;
mod realtime;
mod registry;
mod sessions;

pub use online::OnlineSet;
pub use presence::{Departure, HubStats, PresenceHub};
pub use realtime::{RealtimeCore, RealtimeCtx};
pub use registry::ConnectionRegistry;
pub use sessions::SessionTable;
