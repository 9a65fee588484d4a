//! Shared application state for the InternHub gateway.
//!
//! Owns the realtime core (presence hub), the dispatcher with built-in
//! services registered, the origin policy and the shutdown signal. Built once
//! per process; cloned cheaply into every handler.

use std::sync::Arc;

use tokio::sync::watch;

use internhub_core::error::Result;
use internhub_core::protocol::names;

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::obs::metrics::GatewayMetrics;
use crate::policy::OriginPolicy;
use crate::realtime::RealtimeCore;
use crate::services::{PresenceService, RelayService};

/// Inbound events the protocol defines; each must have a handler.
const INBOUND_EVENTS: [&str; 4] = [
    names::USER_ONLINE,
    names::USER_OFFLINE,
    names::GET_ONLINE_STATUS,
    names::MESSAGE_NEW,
];

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    realtime: Arc<RealtimeCore>,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<GatewayMetrics>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    origins: OriginPolicy,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(GatewayMetrics::default());
        let realtime = Arc::new(RealtimeCore::new(cfg.presence, Arc::clone(&metrics)));

        let dispatcher = Dispatcher::new();
        dispatcher.register(Arc::new(PresenceService::new()));
        dispatcher.register(Arc::new(RelayService::new()));

        let registered = dispatcher.registered_events();
        for event in INBOUND_EVENTS {
            if !registered.contains(&event) {
                tracing::warn!(%event, "no handler registered for inbound event");
            }
        }

        if cfg.presence.guard_stale_disconnect {
            tracing::info!("stale-disconnect guard enabled");
        }
        if cfg.presence.enforce_signal_identity {
            tracing::info!("status signals restricted to the session's own identity");
        }

        let origins = OriginPolicy::new(&cfg.cors.allowed_origins);
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, origins, shutdown }),
            realtime,
            dispatcher: Arc::new(dispatcher),
            metrics,
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn origin_policy(&self) -> &OriginPolicy {
        &self.inner.origins
    }

    pub fn realtime(&self) -> Arc<RealtimeCore> {
        Arc::clone(&self.realtime)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    /// Stop accepting sockets and ask live sessions to close.
    pub fn begin_drain(&self) {
        self.metrics.set_draining();
        self.inner.shutdown.send_replace(true);
    }

    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.inner.shutdown.subscribe()
    }

    /// Hub sizes rendered alongside the registry metrics.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        let s = self.realtime.hub().stats();
        vec![
            ("internhub_hub_sessions", s.sessions as u64),
            ("internhub_hub_registered_identities", s.registered as u64),
            ("internhub_hub_online_identities", s.online as u64),
        ]
    }
}
