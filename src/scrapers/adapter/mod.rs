//! Forum adapters.
//!
//! One [`ForumAdapter`] per forum software family. Every family runs the
//! same [`crawler`] state machine; only its [`ForumPlatform`] differs.

mod crawler;
mod vbulletin;
mod xenforo;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use crawler::{should_scrape_thread, ForumCrawler};
pub use vbulletin::VBulletin;
pub use xenforo::XenForo;

use super::error::Result;
use super::platform::ForumPlatform;
use crate::models::{ForumSoftware, ForumSource, ScrapeResult, ScrapeRun};
use crate::storage::ThreadStore;

/// Per-invocation options.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    /// Run-wide cap on threads fully scraped in this invocation.
    pub max_threads: Option<usize>,
    /// Subforum paths to process instead of every configured one.
    pub subforums: Option<Vec<String>>,
    /// Stops the crawl between (or during) requests.
    pub cancel: CancellationToken,
}

impl ScrapeOptions {
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = Some(max_threads);
        self
    }

    pub fn with_subforums(mut self, subforums: Vec<String>) -> Self {
        self.subforums = Some(subforums);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Scrapes one forum source for one run.
#[async_trait]
pub trait ForumAdapter: Send + Sync {
    fn software(&self) -> ForumSoftware;

    /// Crawl the source's subforums and hand each scraped thread to `store`.
    ///
    /// Returns partial counts under page, thread and storage failures and on
    /// cancellation. Only configuration errors are returned as `Err`.
    async fn scrape(
        &self,
        source: &ForumSource,
        run: &ScrapeRun,
        options: &ScrapeOptions,
        store: &dyn ThreadStore,
    ) -> Result<ScrapeResult>;
}

/// Adapter for a forum family described by a [`ForumPlatform`].
pub struct PlatformAdapter {
    platform: Arc<dyn ForumPlatform>,
}

impl PlatformAdapter {
    pub fn new(platform: Arc<dyn ForumPlatform>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl ForumAdapter for PlatformAdapter {
    fn software(&self) -> ForumSoftware {
        self.platform.software()
    }

    async fn scrape(
        &self,
        source: &ForumSource,
        run: &ScrapeRun,
        options: &ScrapeOptions,
        store: &dyn ThreadStore,
    ) -> Result<ScrapeResult> {
        let crawler = ForumCrawler::new(self.platform.clone(), source, options)?;
        Ok(crawler.run(run, store).await)
    }
}

/// Adapter for a software family.
pub fn adapter_for(software: ForumSoftware) -> Box<dyn ForumAdapter> {
    let platform: Arc<dyn ForumPlatform> = match software {
        ForumSoftware::VBulletin => Arc::new(VBulletin),
        ForumSoftware::XenForo => Arc::new(XenForo),
    };
    Box::new(PlatformAdapter::new(platform))
}
