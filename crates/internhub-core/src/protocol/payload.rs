//! Typed views over event payloads.

use serde::{Deserialize, Serialize};

/// `user:status` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    pub user_id: String,
    pub is_online: bool,
}

impl UserStatus {
    pub fn new(user_id: impl Into<String>, is_online: bool) -> Self {
        Self {
            user_id: user_id.into(),
            is_online,
        }
    }
}

/// `get:onlineStatus` payload: a bare array of identities.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct StatusQuery {
    pub user_ids: Vec<String>,
}

/// The only part of a `message:new` payload the relay reads.
/// Everything else stays opaque and is forwarded unchanged.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    #[serde(default)]
    pub receiver_id: Option<String>,
}
