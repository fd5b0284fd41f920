//! Rate-limited page fetcher for forum sources.

mod user_agent;

pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::time::{Duration, Instant};

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::config::ForumScrapeConfig;
use super::error::{Result, ScrapeError};
use super::rate_limiter::{RateLimitConfig, RateLimiter};

/// HTTP client bound to one forum source.
///
/// Every request waits on the source's rate limiter first and reports the
/// response status back to it.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    source_id: String,
    rate_limiter: RateLimiter,
    cancel: CancellationToken,
}

impl HttpClient {
    /// Create a client with its own limiter spaced by `request_delay`.
    pub fn new(
        source_id: &str,
        timeout: Duration,
        request_delay: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self> {
        let limiter = RateLimiter::with_config(RateLimitConfig::from_delay_ms(
            request_delay.as_millis() as u64,
        ));
        Self::with_rate_limiter(source_id, timeout, limiter, user_agent_config)
    }

    /// Create a client that shares an existing limiter.
    pub fn with_rate_limiter(
        source_id: &str,
        timeout: Duration,
        rate_limiter: RateLimiter,
        user_agent_config: Option<&str>,
    ) -> Result<Self> {
        let user_agent = resolve_user_agent(user_agent_config, source_id);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| {
                ScrapeError::Configuration(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            source_id: source_id.to_string(),
            rate_limiter,
            cancel: CancellationToken::new(),
        })
    }

    /// Build a client from a source's scrape config.
    pub fn for_source(source_id: &str, config: &ForumScrapeConfig) -> Result<Self> {
        Self::new(
            source_id,
            config.timeout(),
            Duration::from_millis(config.rate_limit_ms),
            config.user_agent.as_deref(),
        )
    }

    /// Abort waits and in-flight requests when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Fetch a page body as text.
    ///
    /// Non-2xx responses become [`ScrapeError::Http`]; transport failures
    /// and timeouts become [`ScrapeError::Network`].
    pub async fn get_text(&self, url: &str) -> Result<String> {
        if !self.rate_limiter.acquire(&self.source_id, &self.cancel).await {
            return Err(ScrapeError::Cancelled);
        }

        debug!("GET {}", url);
        let start = Instant::now();
        let response = tokio::select! {
            _ = self.cancel.cancelled() => return Err(ScrapeError::Cancelled),
            response = self.client.get(url).send() => {
                response.map_err(|e| ScrapeError::network(url, e))?
            }
        };

        let status = response.status();
        let status_code = status.as_u16();
        if RateLimiter::is_rate_limit_status(status_code) {
            self.rate_limiter
                .report_rate_limit(&self.source_id, status_code)
                .await;
        } else if status.is_server_error() {
            self.rate_limiter.report_server_error(&self.source_id).await;
        } else if status.is_success() {
            self.rate_limiter.report_success(&self.source_id).await;
        }

        if !status.is_success() {
            debug!("GET {} -> HTTP {}", url, status_code);
            return Err(ScrapeError::Http {
                url: url.to_string(),
                status: status_code,
            });
        }

        let body = tokio::select! {
            _ = self.cancel.cancelled() => return Err(ScrapeError::Cancelled),
            body = response.text() => body.map_err(|e| ScrapeError::network(url, e))?,
        };
        debug!(
            "GET {} -> {} bytes in {:?}",
            url,
            body.len(),
            start.elapsed()
        );
        Ok(body)
    }
}
