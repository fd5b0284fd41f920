//! Forum crawling and extraction.
//!
//! [`adapter`] drives the crawl; everything else is a reusable piece it
//! composes: fetching with per-source rate limiting, list URL construction,
//! HTML extraction, relevance scoring and vehicle tagging.

pub mod adapter;
pub mod config;
pub mod error;
pub mod extract;
mod http_client;
pub mod pagination;
pub mod platform;
pub mod rate_limiter;
pub mod relevance;
pub mod vehicles;

pub use adapter::{adapter_for, ForumAdapter, ForumCrawler, PlatformAdapter, ScrapeOptions};
pub use config::{
    ForumScrapeConfig, KeywordMatch, KeywordRule, PaginationConfig, PaginationMode,
    QualificationConfig, RelevanceConfig, SelectorConfig,
};
pub use error::{Result, ScrapeError};
pub use extract::{Extractor, ThreadContext};
pub use http_client::{resolve_user_agent, HttpClient, USER_AGENT};
pub use pagination::build_list_url;
pub use platform::ForumPlatform;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use relevance::RelevanceScorer;
pub use vehicles::VehicleTagger;
