//! Handshake origin check (pre-upgrade).

use internhub_core::error::{HubError, Result};

/// Allow-list of browser origins permitted to open a socket.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new(allowed: &[String]) -> Self {
        Self {
            allowed: allowed
                .iter()
                .map(|o| o.trim_end_matches('/').to_string())
                .collect(),
        }
    }

    /// A missing `Origin` header (non-browser client) passes.
    pub fn check(&self, origin: Option<&str>) -> Result<()> {
        let Some(origin) = origin else {
            return Ok(());
        };
        if self.allowed.iter().any(|a| a == origin) {
            Ok(())
        } else {
            Err(HubError::OriginRejected(origin.to_string()))
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }
}
