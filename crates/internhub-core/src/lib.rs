//! InternHub core: transport-agnostic wire protocol and error types.
//!
//! This crate defines the event frames exchanged with browser clients and the
//! error surface shared by the gateway and its services. It carries no
//! transport or runtime dependencies so it can be reused by test clients and
//! tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `HubError`/`Result` so a malformed frame
//! never takes the gateway down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{HubError, Result};
