use async_trait::async_trait;

use internhub_core::error::{HubError, Result};
use internhub_core::protocol::{names, EventFrame, StatusQuery};

use crate::dispatch::EventService;
use crate::realtime::RealtimeCtx;

/// `user:online`, `user:offline` and `get:onlineStatus`.
#[derive(Default)]
pub struct PresenceService;

impl PresenceService {
    pub fn new() -> Self {
        Self
    }

    fn signal(&self, ctx: &RealtimeCtx, frame: &EventFrame, is_online: bool) -> Result<()> {
        // opaque identity: any string, including "", is signalled as given
        let user: String = frame.data_as()?;

        if ctx.core().presence_cfg().enforce_signal_identity && ctx.identity() != Some(user.as_str()) {
            tracing::warn!(
                conn_id = %ctx.conn_id(),
                bound = ctx.identity().unwrap_or_default(),
                user_id = %user,
                event = %frame.event,
                "status signal for foreign identity ignored"
            );
            return Ok(());
        }

        ctx.core().signal_status(&user, is_online)?;
        Ok(())
    }
}

#[async_trait]
impl EventService for PresenceService {
    fn events(&self) -> &'static [&'static str] {
        &[names::USER_ONLINE, names::USER_OFFLINE, names::GET_ONLINE_STATUS]
    }

    async fn handle(&self, ctx: RealtimeCtx, frame: EventFrame) -> Result<()> {
        match frame.event.as_str() {
            names::USER_ONLINE => self.signal(&ctx, &frame, true),
            names::USER_OFFLINE => self.signal(&ctx, &frame, false),
            names::GET_ONLINE_STATUS => {
                let q: StatusQuery = frame.data_as()?;
                ctx.core().report_statuses(ctx.conn_id(), &q.user_ids)?;
                Ok(())
            }
            other => Err(HubError::BadRequest(format!("presence cannot handle {other}"))),
        }
    }
}
