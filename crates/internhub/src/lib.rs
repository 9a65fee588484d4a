//! Top-level facade crate for InternHub realtime.
//!
//! Re-exports the wire protocol and the gateway library so users can depend on a single crate.

pub mod core {
    pub use internhub_core::*;
}

pub mod gateway {
    pub use internhub_gateway::*;
}
