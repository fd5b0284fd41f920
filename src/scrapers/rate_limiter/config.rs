//! Rate limiter tuning and reporting types.

use std::time::Duration;

/// Adaptive delay settings for one limiter.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Configured minimum spacing between requests to a source.
    pub base_delay: Duration,
    /// Upper bound when backing off.
    pub max_delay: Duration,
    /// Applied on 429/503.
    pub backoff_multiplier: f64,
    /// Applied on other 5xx responses.
    pub server_error_multiplier: f64,
    /// Applied after `recovery_threshold` consecutive successes while backed off.
    pub recovery_multiplier: f64,
    pub recovery_threshold: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(2000),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            server_error_multiplier: 1.5,
            recovery_multiplier: 0.8,
            recovery_threshold: 5,
        }
    }
}

impl RateLimitConfig {
    /// Config with the given minimum spacing and default backoff behaviour.
    pub fn from_delay_ms(delay_ms: u64) -> Self {
        let base_delay = Duration::from_millis(delay_ms);
        let defaults = Self::default();
        Self {
            base_delay,
            max_delay: defaults.max_delay.max(base_delay),
            ..defaults
        }
    }
}

/// Snapshot of one source's limiter state.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStats {
    pub current_delay: Duration,
    pub in_backoff: bool,
    pub total_requests: u64,
    pub rate_limit_hits: u64,
}
