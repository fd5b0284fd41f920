//! Scrape run bookkeeping.

use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate counts from one adapter invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// Every non-pinned list entry seen.
    pub threads_found: u64,
    /// Threads fetched, non-empty and saved.
    pub threads_scraped: u64,
    /// Posts in the saved threads.
    pub posts_scraped: u64,
}

impl AddAssign for ScrapeResult {
    fn add_assign(&mut self, other: Self) {
        self.threads_found += other.threads_found;
        self.threads_scraped += other.threads_scraped;
        self.posts_scraped += other.posts_scraped;
    }
}

/// A run created by the coordinator before invoking adapters.
///
/// Counters are appended to after each invocation by the task that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRun {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub threads_found: u64,
    pub threads_scraped: u64,
    pub posts_scraped: u64,
}

impl ScrapeRun {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            started_at: Utc::now(),
            threads_found: 0,
            threads_scraped: 0,
            posts_scraped: 0,
        }
    }

    /// Append one invocation's counts.
    pub fn record(&mut self, result: &ScrapeResult) {
        self.threads_found += result.threads_found;
        self.threads_scraped += result.threads_scraped;
        self.posts_scraped += result.posts_scraped;
    }

    pub fn totals(&self) -> ScrapeResult {
        ScrapeResult {
            threads_found: self.threads_found,
            threads_scraped: self.threads_scraped,
            posts_scraped: self.posts_scraped,
        }
    }
}
