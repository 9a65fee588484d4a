use serde::Deserialize;
use internhub_core::error::{HubError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub cors: CorsSection,

    #[serde(default)]
    pub limits: LimitsSection,

    #[serde(default)]
    pub presence: PresenceSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            cors: CorsSection::default(),
            limits: LimitsSection::default(),
            presence: PresenceSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(HubError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.limits.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Bounded outbound queue per session.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(HubError::BadRequest(format!(
                "gateway.listen must be a valid socket address: {}",
                self.listen
            )));
        }
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(HubError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(HubError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(HubError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(HubError::BadRequest(
                "gateway.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_outbound_queue() -> usize {
    256
}

/// Origins allowed to open a socket. Requests without an `Origin` header
/// (non-browser clients) are always allowed.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsSection {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSection {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "https://jobinternhub.vercel.app".into(),
        "http://localhost:5173".into(),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default = "default_rate_limit_rps")]
    pub rate_limit_rps: u32,

    #[serde(default = "default_rate_limit_burst")]
    pub rate_limit_burst: u32,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_frame_bytes: default_max_frame_bytes(),
            rate_limit_rps: default_rate_limit_rps(),
            rate_limit_burst: default_rate_limit_burst(),
        }
    }
}

impl LimitsSection {
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_bytes < 64 {
            return Err(HubError::BadRequest(
                "limits.max_frame_bytes must be at least 64".into(),
            ));
        }
        if self.rate_limit_rps == 0 || self.rate_limit_burst == 0 {
            return Err(HubError::BadRequest(
                "limits.rate_limit_rps and rate_limit_burst must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_frame_bytes() -> usize {
    16384
}
fn default_rate_limit_rps() -> u32 {
    50
}
fn default_rate_limit_burst() -> u32 {
    100
}

/// Switches for the two known looseness points of the presence model.
/// Both default to the permissive behavior.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresenceSection {
    /// Only evict an identity on disconnect if the registry entry still
    /// belongs to the disconnecting connection.
    #[serde(default)]
    pub guard_stale_disconnect: bool,

    /// Ignore `user:online` / `user:offline` for identities other than the
    /// session's own.
    #[serde(default)]
    pub enforce_signal_identity: bool,
}
