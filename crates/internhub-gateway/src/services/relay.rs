use async_trait::async_trait;

use internhub_core::error::Result;
use internhub_core::protocol::{names, EventFrame};

use crate::dispatch::EventService;
use crate::realtime::RealtimeCtx;

/// `message:new`: forward to the receiver's live connection or drop.
/// The sender never learns which happened.
#[derive(Default)]
pub struct RelayService;

impl RelayService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventService for RelayService {
    fn events(&self) -> &'static [&'static str] {
        &[names::MESSAGE_NEW]
    }

    async fn handle(&self, ctx: RealtimeCtx, frame: EventFrame) -> Result<()> {
        let outcome = ctx.core().relay(frame.raw_data())?;
        tracing::trace!(conn_id = %ctx.conn_id(), outcome = outcome.as_str(), "message relay");
        Ok(())
    }
}
