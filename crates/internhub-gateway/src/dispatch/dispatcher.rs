use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use internhub_core::error::{HubError, Result};
use internhub_core::protocol::EventFrame;

use crate::realtime::RealtimeCtx;

/// Handler for one or more inbound event names.
#[async_trait]
pub trait EventService: Send + Sync {
    fn events(&self) -> &'static [&'static str];
    async fn handle(&self, ctx: RealtimeCtx, frame: EventFrame) -> Result<()>;
}

/// Event name -> service.
#[derive(Default)]
pub struct Dispatcher {
    services: DashMap<&'static str, Arc<dyn EventService>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Register a service under every event it declares. Later registrations
    /// replace earlier ones for the same event.
    pub fn register(&self, svc: Arc<dyn EventService>) {
        for &event in svc.events() {
            if self.services.insert(event, Arc::clone(&svc)).is_some() {
                tracing::warn!(%event, "event handler replaced");
            }
        }
    }

    pub fn registered_events(&self) -> Vec<&'static str> {
        let mut v: Vec<_> = self.services.iter().map(|e| *e.key()).collect();
        v.sort_unstable();
        v
    }

    pub fn handles(&self, event: &str) -> bool {
        self.services.contains_key(event)
    }

    pub async fn dispatch(&self, ctx: RealtimeCtx, frame: EventFrame) -> Result<()> {
        let handler = self
            .services
            .get(frame.event.as_str())
            .ok_or_else(|| HubError::BadRequest(format!("unknown event: {}", frame.event)))?
            .value()
            .clone();
        handler.handle(ctx, frame).await
    }
}
