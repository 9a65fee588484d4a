//! InternHub gateway library entry.
//!
//! Wires the transport, origin/frame policy, dispatcher, realtime presence
//! core and built-in event services into the presence & relay gateway. Used
//! by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod realtime;
pub mod router;
pub mod services;
pub mod transport;
