//! Policy layer (handshake origin check, per-frame limits).

pub mod frame;
pub mod origin;

pub use frame::{FramePolicy, PolicyDecision};
pub use origin::OriginPolicy;
