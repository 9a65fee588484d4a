//! Session context types shared across layers.
//!
//! Holds the per-connection lifecycle so transport and realtime layers agree
//! on what a session has bound without sharing transport specifics.

pub mod session;

pub use session::{Lifecycle, SessionMeta};
