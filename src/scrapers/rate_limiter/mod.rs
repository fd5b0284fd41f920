//! Adaptive per-source rate limiter.
//!
//! Spaces requests to each forum source by at least the configured delay.
//! Backs off on 429/503 and mildly on other 5xx, then recovers towards the
//! configured delay after a run of successes.

mod config;
mod source_state;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use config::{RateLimitConfig, SourceStats};
use source_state::SourceState;

/// Shared limiter keyed by forum source id. Clones share state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    sources: Arc<RwLock<HashMap<String, SourceState>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            sources: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Wait for this source's next request slot.
    ///
    /// Returns `false` if `cancel` fired while waiting; the request must not
    /// be sent in that case.
    pub async fn acquire(&self, key: &str, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        let wait = {
            let mut sources = self.sources.write().await;
            sources
                .entry(key.to_string())
                .or_insert_with(|| SourceState::new(self.config.base_delay))
                .reserve(Instant::now())
        };

        if wait > Duration::ZERO {
            debug!("Rate limiting {}: waiting {:?}", key, wait);
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(wait) => {}
            }
        }
        true
    }

    /// Check if a status code means the server wants us to slow down.
    pub fn is_rate_limit_status(status_code: u16) -> bool {
        matches!(status_code, 429 | 503)
    }

    /// Report a successful response; may step the delay back down.
    pub async fn report_success(&self, key: &str) {
        let mut sources = self.sources.write().await;
        let Some(state) = sources.get_mut(key) else {
            return;
        };
        state.consecutive_successes += 1;

        if state.in_backoff && state.consecutive_successes >= self.config.recovery_threshold {
            let reduced = state.current_delay.mul_f64(self.config.recovery_multiplier);
            state.current_delay = reduced.max(self.config.base_delay);
            state.consecutive_successes = 0;

            if state.current_delay == self.config.base_delay {
                state.in_backoff = false;
                info!("Source {} recovered from rate limit backoff", key);
            } else {
                debug!("Source {} delay reduced to {:?}", key, state.current_delay);
            }
        }
    }

    /// Report a 429/503 response.
    pub async fn report_rate_limit(&self, key: &str, status_code: u16) {
        let mut sources = self.sources.write().await;
        let Some(state) = sources.get_mut(key) else {
            return;
        };
        state.rate_limit_hits += 1;
        state.consecutive_successes = 0;
        state.in_backoff = true;
        state.current_delay = state
            .current_delay
            .mul_f64(self.config.backoff_multiplier)
            .min(self.config.max_delay);

        warn!(
            "Rate limited by {} (HTTP {}), backing off to {:?}",
            key, status_code, state.current_delay
        );
    }

    /// Report a 5xx other than 503.
    pub async fn report_server_error(&self, key: &str) {
        let mut sources = self.sources.write().await;
        let Some(state) = sources.get_mut(key) else {
            return;
        };
        state.consecutive_successes = 0;
        state.in_backoff = true;
        state.current_delay = state
            .current_delay
            .mul_f64(self.config.server_error_multiplier)
            .min(self.config.max_delay);
        debug!(
            "Server error for {}, delay increased to {:?}",
            key, state.current_delay
        );
    }

    /// Time until a request to this source could start.
    pub async fn time_until_ready(&self, key: &str) -> Duration {
        let sources = self.sources.read().await;
        sources
            .get(key)
            .map(|s| s.time_until_ready(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    pub async fn get_stats(&self) -> HashMap<String, SourceStats> {
        let sources = self.sources.read().await;
        sources
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    SourceStats {
                        current_delay: v.current_delay,
                        in_backoff: v.in_backoff,
                        total_requests: v.total_requests,
                        rate_limit_hits: v.rate_limit_hits,
                    },
                )
            })
            .collect()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
