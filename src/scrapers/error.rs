//! Scraper error types.

use thiserror::Error;

/// Result type for scraping operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Transport failure (connect error, timeout, body read).
    #[error("Request to {url} failed: {message}")]
    Network { url: String, message: String },
    /// Server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Scrape cancelled")]
    Cancelled,
}

impl ScrapeError {
    pub(crate) fn network(url: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("timed out ({})", err)
        } else {
            err.to_string()
        };
        ScrapeError::Network {
            url: url.to_string(),
            message,
        }
    }

    /// Request-level failures that only cost the current page or thread.
    pub fn is_network(&self) -> bool {
        matches!(self, ScrapeError::Network { .. } | ScrapeError::Http { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScrapeError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_classification() {
        let http = ScrapeError::Http {
            url: "https://example.com/".to_string(),
            status: 503,
        };
        assert!(http.is_network());
        assert!(!ScrapeError::Configuration("bad".into()).is_network());
        assert!(!ScrapeError::Cancelled.is_network());
        assert!(ScrapeError::Cancelled.is_cancelled());
    }

    #[test]
    fn test_http_error_message() {
        let err = ScrapeError::Http {
            url: "https://example.com/t/1".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 from https://example.com/t/1");
    }
}
