//! Gateway config loader (strict parsing + env overrides).

pub mod schema;

use std::fs;
use std::path::Path;

use internhub_core::error::{HubError, Result};

pub use schema::{CorsSection, GatewayConfig, GatewaySection, LimitsSection, PresenceSection};

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "INTERNHUB_CONFIG";
/// Default config file name.
pub const DEFAULT_CONFIG_PATH: &str = "internhub.yaml";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| HubError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| HubError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the config for this process: file if present, defaults otherwise,
/// then `PORT` / `FRONTEND_URL` overrides from the environment.
pub fn load() -> Result<GatewayConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut cfg = if Path::new(&path).exists() {
        tracing::info!(%path, "loading config");
        load_from_file(&path)?
    } else {
        tracing::info!(%path, "config file not found, using defaults");
        GatewayConfig::default()
    };

    apply_overrides(
        &mut cfg,
        std::env::var("PORT").ok().as_deref(),
        std::env::var("FRONTEND_URL").ok().as_deref(),
    )?;
    Ok(cfg)
}

/// Apply deployment overrides. Kept separate from `load` so it can be tested
/// without touching process env.
pub fn apply_overrides(
    cfg: &mut GatewayConfig,
    port: Option<&str>,
    frontend_url: Option<&str>,
) -> Result<()> {
    if let Some(port) = port.filter(|p| !p.is_empty()) {
        let port: u16 = port
            .parse()
            .map_err(|_| HubError::BadRequest(format!("PORT must be a valid port: {port}")))?;
        let host = cfg
            .gateway
            .listen
            .rsplit_once(':')
            .map(|(h, _)| h.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        cfg.gateway.listen = format!("{host}:{port}");
    }

    if let Some(url) = frontend_url.filter(|u| !u.is_empty()) {
        if !cfg.cors.allowed_origins.iter().any(|o| o == url) {
            cfg.cors.allowed_origins.push(url.to_string());
        }
    }

    cfg.validate()
}
