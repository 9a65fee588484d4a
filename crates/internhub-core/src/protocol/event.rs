//! Event envelope (JSON text frames).
//!
//! `data` is stored as `RawValue` so services parse it lazily and relayed
//! payloads can be forwarded without re-encoding.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{HubError, Result};

/// Event names understood or emitted by the gateway.
pub mod names {
    /// Client marks an identity online. Data: `"<userId>"`.
    pub const USER_ONLINE: &str = "user:online";
    /// Client marks an identity offline. Data: `"<userId>"`.
    pub const USER_OFFLINE: &str = "user:offline";
    /// Point-in-time status query. Data: `["<userId>", ...]`.
    pub const GET_ONLINE_STATUS: &str = "get:onlineStatus";
    /// Direct message, inbound and forwarded outbound.
    pub const MESSAGE_NEW: &str = "message:new";
    /// Outbound status delta or query reply.
    pub const USER_STATUS: &str = "user:status";
    /// Outbound gateway error notice.
    pub const SYS_ERROR: &str = "sys:error";
}

/// Inbound frame.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventFrame {
    /// Event name (e.g. `message:new`).
    pub event: String,
    /// Optional payload, stored as raw JSON (lazy parsing).
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

impl EventFrame {
    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| HubError::BadRequest(format!("invalid event json: {e}")))
    }

    /// Raw payload, if any.
    pub fn raw_data(&self) -> Option<&RawValue> {
        self.data.as_deref()
    }

    /// Parse the payload into a typed view. Missing payload is a `BadRequest`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = self
            .raw_data()
            .ok_or_else(|| HubError::BadRequest(format!("{} requires data", self.event)))?;
        serde_json::from_str(raw.get())
            .map_err(|e| HubError::BadRequest(format!("{} invalid data: {e}", self.event)))
    }
}

#[derive(Serialize)]
struct Wire<'a, T: Serialize + ?Sized> {
    event: &'a str,
    data: &'a T,
}

/// Encoded outbound frame (serialize once, send N times).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEvent {
    text: String,
}

impl OutboundEvent {
    /// Encode `data` under `event`.
    pub fn new<T: Serialize + ?Sized>(event: &str, data: &T) -> Result<Self> {
        let text = serde_json::to_string(&Wire { event, data })
            .map_err(|e| HubError::Internal(format!("json encode failed: {e}")))?;
        Ok(Self { text })
    }

    /// Re-emit a raw payload verbatim under `event`.
    pub fn forward(event: &str, raw: &RawValue) -> Result<Self> {
        Self::new(event, raw)
    }

    /// `sys:error` notice for a single session.
    pub fn sys_error(code: &str, msg: &str) -> Result<Self> {
        Self::new(
            names::SYS_ERROR,
            &serde_json::json!({ "code": code, "msg": msg }),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
