//! Shared helpers: sessions simulated with bounded channels standing in for sockets.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::Arc;

use axum::extract::ws::Message;
use serde_json::Value;
use tokio::sync::mpsc;

use internhub_gateway::config::PresenceSection;
use internhub_gateway::context::Lifecycle;
use internhub_gateway::obs::metrics::GatewayMetrics;
use internhub_gateway::realtime::{ConnId, Connection, RealtimeCore};

pub fn core() -> Arc<RealtimeCore> {
    core_with(PresenceSection::default())
}

pub fn core_with(presence: PresenceSection) -> Arc<RealtimeCore> {
    Arc::new(RealtimeCore::new(presence, Arc::new(GatewayMetrics::default())))
}

pub struct Client {
    pub id: ConnId,
    pub rx: mpsc::Receiver<Message>,
    pub lifecycle: Lifecycle,
}

impl Client {
    /// Every text frame queued so far, parsed as JSON.
    pub fn drain(&mut self) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(m) = self.rx.try_recv() {
            match m {
                Message::Text(s) => out.push(serde_json::from_str(&s).unwrap()),
                other => panic!("unexpected frame: {other:?}"),
            }
        }
        out
    }

    pub fn disconnect(&mut self, core: &RealtimeCore) {
        self.lifecycle = core.disconnect(self.id, &self.lifecycle).unwrap();
    }
}

pub fn connect(core: &RealtimeCore, user: Option<&str>) -> Client {
    connect_with_queue(core, user, 64)
}

pub fn connect_with_queue(core: &RealtimeCore, user: Option<&str>, queue: usize) -> Client {
    let (tx, rx) = mpsc::channel(queue);
    let id = core.next_conn_id();
    let lifecycle = core.connect(Connection::new(id, tx), user).unwrap();
    Client { id, rx, lifecycle }
}

pub fn status(user: &str, is_online: bool) -> Value {
    serde_json::json!({
        "event": "user:status",
        "data": { "userId": user, "isOnline": is_online }
    })
}
