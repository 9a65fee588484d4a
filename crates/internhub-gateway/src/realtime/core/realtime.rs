use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::value::RawValue;

use internhub_core::error::Result;
use internhub_core::protocol::{names, MessageHeader, OutboundEvent};

use crate::config::PresenceSection;
use crate::context::Lifecycle;
use crate::obs::metrics::GatewayMetrics;
use crate::realtime::core::{Departure, PresenceHub};
use crate::realtime::types::{ConnId, Connection, Delivery, RelayOutcome};

/// RealtimeCore: presence state plus the egress paths built on it
/// (status fan-out, status replies, direct relay).
pub struct RealtimeCore {
    hub: PresenceHub,
    presence_cfg: PresenceSection,
    metrics: Arc<GatewayMetrics>,
    next_conn: AtomicU64,
}

impl RealtimeCore {
    pub fn new(presence_cfg: PresenceSection, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            hub: PresenceHub::new(),
            presence_cfg,
            metrics,
            next_conn: AtomicU64::new(1),
        }
    }

    pub fn hub(&self) -> &PresenceHub {
        &self.hub
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    pub fn presence_cfg(&self) -> PresenceSection {
        self.presence_cfg
    }

    pub fn next_conn_id(&self) -> ConnId {
        ConnId(self.next_conn.fetch_add(1, Ordering::Relaxed))
    }

    /// Attach a new session and, if the handshake carried an identity, bind it.
    /// An empty identity counts as absent.
    pub fn connect(&self, conn: Connection, identity: Option<&str>) -> Result<Lifecycle> {
        let conn_id = conn.id();
        self.hub.attach(conn);
        self.metrics.ws_active_sessions.inc(&[]);

        let Some(user) = identity.filter(|u| !u.is_empty()) else {
            tracing::debug!(%conn_id, "session connected without identity");
            return Ok(Lifecycle::Unidentified);
        };

        let d = self.hub.identify(conn_id, user)?;
        self.record_broadcast("connect", true, d);
        tracing::info!(user_id = %user, %conn_id, "user connected");
        Ok(Lifecycle::Identified(user.to_string()))
    }

    /// Tear down a session. Presence side effects only for identified sessions.
    pub fn disconnect(&self, conn_id: ConnId, lifecycle: &Lifecycle) -> Result<Lifecycle> {
        let guard = self.presence_cfg.guard_stale_disconnect;
        let departure = self.hub.detach(conn_id, lifecycle.identity(), guard)?;
        self.metrics.ws_active_sessions.dec(&[]);

        match departure {
            Departure::Anonymous => {
                tracing::debug!(%conn_id, "anonymous session closed");
            }
            Departure::Evicted(d) => {
                self.record_broadcast("disconnect", false, d);
                tracing::info!(user_id = lifecycle.identity().unwrap_or_default(), %conn_id, "user disconnected");
            }
            Departure::Superseded => {
                tracing::info!(
                    user_id = lifecycle.identity().unwrap_or_default(),
                    %conn_id,
                    "stale session closed, newer connection keeps presence"
                );
            }
        }
        Ok(Lifecycle::Terminated)
    }

    /// Explicit `user:online` / `user:offline` from any session.
    pub fn signal_status(&self, user: &str, is_online: bool) -> Result<Delivery> {
        let d = self.hub.set_status(user, is_online)?;
        self.record_broadcast("signal", is_online, d);
        Ok(d)
    }

    /// `get:onlineStatus` reply to the requester only.
    pub fn report_statuses(&self, requester: ConnId, users: &[String]) -> Result<Delivery> {
        let d = self.hub.report_statuses(requester, users)?;
        if d.dropped > 0 {
            self.metrics.broadcast_drops.add(&[("kind", "status_reply")], d.dropped as u64);
        }
        Ok(d)
    }

    /// Forward a `message:new` payload to its receiver's connection, verbatim.
    /// Anything short of a registered receiver with queue room is a silent
    /// drop. Never waits on the receiver.
    pub fn relay(&self, payload: Option<&RawValue>) -> Result<RelayOutcome> {
        let outcome = self.relay_inner(payload)?;
        self.metrics.relay_outcomes.inc(&[("outcome", outcome.as_str())]);
        Ok(outcome)
    }

    fn relay_inner(&self, payload: Option<&RawValue>) -> Result<RelayOutcome> {
        let Some(raw) = payload else {
            return Ok(RelayOutcome::NoReceiver);
        };
        let receiver = serde_json::from_str::<MessageHeader>(raw.get())
            .ok()
            .and_then(|h| h.receiver_id)
            .filter(|r| !r.is_empty());
        let Some(receiver) = receiver else {
            tracing::debug!("message without receiverId dropped");
            return Ok(RelayOutcome::NoReceiver);
        };

        let Some(conn) = self.hub.route(&receiver) else {
            tracing::debug!(receiver_id = %receiver, "receiver not connected, message dropped");
            return Ok(RelayOutcome::NotConnected);
        };

        let out = OutboundEvent::forward(names::MESSAGE_NEW, raw)?;
        if conn.try_push(&out) {
            Ok(RelayOutcome::Forwarded)
        } else {
            tracing::debug!(receiver_id = %receiver, conn_id = %conn.id(), "receiver queue rejected message");
            Ok(RelayOutcome::QueueRejected)
        }
    }

    fn record_broadcast(&self, trigger: &str, is_online: bool, d: Delivery) {
        let status = if is_online { "online" } else { "offline" };
        self.metrics
            .status_broadcasts
            .inc(&[("trigger", trigger), ("status", status)]);
        if d.dropped > 0 {
            self.metrics.broadcast_drops.add(&[("kind", "status")], d.dropped as u64);
        }
    }
}

/// Per-event context passed to services (borrow tools instead of owning).
#[derive(Clone)]
pub struct RealtimeCtx {
    conn_id: ConnId,
    identity: Option<Arc<str>>,
    core: Arc<RealtimeCore>,
}

impl RealtimeCtx {
    pub fn new(conn_id: ConnId, identity: Option<&str>, core: Arc<RealtimeCore>) -> Self {
        Self {
            conn_id,
            identity: identity.map(Arc::<str>::from),
            core,
        }
    }

    pub fn conn_id(&self) -> ConnId { self.conn_id }
    pub fn identity(&self) -> Option<&str> { self.identity.as_deref() }
    pub fn core(&self) -> &RealtimeCore { &self.core }
}
