//! Shared error type across InternHub crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed frame.
    BadRequest,
    /// Handshake origin is not on the allow-list.
    OriginRejected,
    /// Frame too large.
    PayloadTooLarge,
    /// Unsupported config or protocol version.
    UnsupportedVersion,
    /// Session closed for inactivity.
    Timeout,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in `sys:error` frames and JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::OriginRejected => "ORIGIN_REJECTED",
            ClientCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, HubError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("origin not allowed: {0}")]
    OriginRejected(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl HubError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            HubError::BadRequest(_) => ClientCode::BadRequest,
            HubError::OriginRejected(_) => ClientCode::OriginRejected,
            HubError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            HubError::Internal(_) => ClientCode::Internal,
        }
    }
}
