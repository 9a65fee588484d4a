use std::fmt;

use axum::extract::ws::Message;
use tokio::sync::mpsc;

use internhub_core::protocol::OutboundEvent;

/// Gateway-assigned connection identifier (monotonic per process).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(pub u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// One session's outbound queue sender.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnId,
    tx: mpsc::Sender<Message>,
}

impl Connection {
    pub fn new(id: ConnId, tx: mpsc::Sender<Message>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Non-blocking enqueue. Returns false if the queue is full or closed.
    /// Used for fan-out and relay alike; callers never wait on a peer.
    pub fn try_push(&self, out: &OutboundEvent) -> bool {
        self.tx
            .try_send(Message::Text(out.as_str().to_owned()))
            .is_ok()
    }
}

/// Fan-out result of a single broadcast or reply batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Frames queued.
    pub queued: usize,
    /// Frames dropped on full/closed queues.
    pub dropped: usize,
}

impl Delivery {
    pub(crate) fn record(&mut self, ok: bool) {
        if ok {
            self.queued += 1;
        } else {
            self.dropped += 1;
        }
    }
}

/// Result of a `message:new` relay attempt. Never reported to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Queued on the receiver's connection.
    Forwarded,
    /// Payload had no usable `receiverId`.
    NoReceiver,
    /// Receiver has no registry entry.
    NotConnected,
    /// Receiver is registered but its queue did not accept the frame.
    QueueRejected,
}

impl RelayOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RelayOutcome::Forwarded => "forwarded",
            RelayOutcome::NoReceiver => "no_receiver",
            RelayOutcome::NotConnected => "not_connected",
            RelayOutcome::QueueRejected => "queue_rejected",
        }
    }
}
