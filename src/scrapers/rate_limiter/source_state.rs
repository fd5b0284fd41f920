//! Per-source rate limiting state.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct SourceState {
    /// Current spacing; never below the configured base delay.
    pub current_delay: Duration,
    /// Start time of the most recently reserved request slot.
    pub last_slot: Option<Instant>,
    pub consecutive_successes: u32,
    pub in_backoff: bool,
    pub total_requests: u64,
    pub rate_limit_hits: u64,
}

impl SourceState {
    pub fn new(base_delay: Duration) -> Self {
        Self {
            current_delay: base_delay,
            last_slot: None,
            consecutive_successes: 0,
            in_backoff: false,
            total_requests: 0,
            rate_limit_hits: 0,
        }
    }

    /// Claim the next request slot and return how long the caller must wait
    /// before using it.
    ///
    /// Slots are handed out in call order, each at least `current_delay`
    /// after the previous one, so concurrent callers never share a slot.
    pub fn reserve(&mut self, now: Instant) -> Duration {
        let start = match self.last_slot {
            Some(last) => (last + self.current_delay).max(now),
            None => now,
        };
        self.last_slot = Some(start);
        self.total_requests += 1;
        start.saturating_duration_since(now)
    }

    /// Time until a new request could start.
    pub fn time_until_ready(&self, now: Instant) -> Duration {
        match self.last_slot {
            Some(last) => (last + self.current_delay).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }
}
