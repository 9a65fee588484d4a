//! Built-in event services.

pub mod presence;
pub mod relay;

pub use presence::PresenceService;
pub use relay::RelayService;
