use crate::realtime::types::ConnId;

/// Connection lifecycle.
///
/// `Unidentified -> Identified -> Terminated`, or `Unidentified -> Terminated`.
/// Identity is bound once, at connect time; there is no re-handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    /// Connected, no identity bound.
    Unidentified,
    /// Identity bound, registered and marked online.
    Identified(String),
    /// Disconnected.
    Terminated,
}

impl Lifecycle {
    pub fn identity(&self) -> Option<&str> {
        match self {
            Lifecycle::Identified(user) => Some(user),
            _ => None,
        }
    }
}

/// Immutable metadata for a connected session.
#[derive(Debug, Clone)]
pub struct SessionMeta {
    /// Gateway-assigned connection id.
    pub conn_id: ConnId,
    /// `Origin` header presented at handshake, if any.
    pub origin: Option<String>,
    /// `userId` handshake parameter, if any.
    pub user_id: Option<String>,
}
