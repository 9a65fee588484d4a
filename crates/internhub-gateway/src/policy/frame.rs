//! Per-frame inbound policy: size limit + per-connection rate limit.

use std::time::{Duration, Instant};

use internhub_core::error::ClientCode;

use crate::config::LimitsSection;

/// Decision from policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Pass,
    Drop,
    Close { code: ClientCode, msg: &'static str },
}

impl PolicyDecision {
    pub fn label(&self) -> &'static str {
        match self {
            PolicyDecision::Pass => "pass",
            PolicyDecision::Drop => "drop",
            PolicyDecision::Close { .. } => "close",
        }
    }
}

/// Per-connection frame policy. Owned by the session task, so no locking.
#[derive(Debug)]
pub struct FramePolicy {
    max_frame_bytes: usize,
    bucket: TokenBucket,
}

impl FramePolicy {
    pub fn new(limits: &LimitsSection) -> Self {
        Self {
            max_frame_bytes: limits.max_frame_bytes,
            bucket: TokenBucket::new(limits.rate_limit_rps, limits.rate_limit_burst),
        }
    }

    pub fn check(&mut self, bytes_len: usize) -> PolicyDecision {
        self.check_at(bytes_len, Instant::now())
    }

    /// `check` against an explicit clock reading.
    pub fn check_at(&mut self, bytes_len: usize, now: Instant) -> PolicyDecision {
        if bytes_len > self.max_frame_bytes {
            return PolicyDecision::Close {
                code: ClientCode::PayloadTooLarge,
                msg: "frame too large",
            };
        }
        if !self.bucket.allow(now) {
            return PolicyDecision::Drop;
        }
        PolicyDecision::Pass
    }
}

#[derive(Debug)]
struct TokenBucket {
    rps: u32,
    capacity: u32,
    tokens: u32,
    last: Instant,
}

impl TokenBucket {
    fn new(rps: u32, burst: u32) -> Self {
        let capacity = burst.max(1);
        Self {
            rps: rps.max(1),
            capacity,
            tokens: capacity,
            last: Instant::now(),
        }
    }

    fn allow(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens == 0 {
            return false;
        }
        self.tokens -= 1;
        true
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last);
        if elapsed < Duration::from_millis(50) {
            return;
        }

        let rps = u64::from(self.rps);
        let add = (elapsed.as_micros() as u64).saturating_mul(rps) / 1_000_000;
        if add == 0 {
            return;
        }

        let tokens = u64::from(self.tokens) + add;
        if tokens >= u64::from(self.capacity) {
            self.tokens = self.capacity;
            self.last = now;
        } else {
            self.tokens = tokens as u32;
            // only the time that became whole tokens is consumed
            self.last += Duration::from_micros((add * 1_000_000).div_ceil(rps));
        }
    }
}
