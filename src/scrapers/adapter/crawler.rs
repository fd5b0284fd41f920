//! Crawl loop shared by every forum family.
//!
//! Per subforum, per page: fetch the list page, parse listings, qualify each
//! one, fetch and parse qualifying threads, save non-empty ones. Requests run
//! strictly one after another through the source's rate limiter.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ScrapeOptions;
use crate::models::{ForumSource, ScrapeResult, ScrapeRun, Thread, ThreadListing};
use crate::scrapers::config::{PaginationConfig, QualificationConfig};
use crate::scrapers::error::{Result, ScrapeError};
use crate::scrapers::extract::{Extractor, ThreadContext};
use crate::scrapers::http_client::HttpClient;
use crate::scrapers::pagination::build_list_url;
use crate::scrapers::platform::ForumPlatform;
use crate::storage::ThreadStore;

/// Whether a listing clears the qualification bar for a full fetch.
///
/// An unknown last-reply date never disqualifies a thread.
pub fn should_scrape_thread(
    listing: &ThreadListing,
    qualification: &QualificationConfig,
    now: DateTime<Utc>,
) -> bool {
    if listing.relevance_score < qualification.min_relevance {
        return false;
    }
    if listing.reply_count < qualification.min_replies {
        return false;
    }
    match (qualification.max_age_days, listing.last_reply_at) {
        (Some(days), Some(last)) => match TimeDelta::try_days(i64::from(days))
            .and_then(|age| now.checked_sub_signed(age))
        {
            Some(cutoff) => last >= cutoff,
            None => true,
        },
        _ => true,
    }
}

/// Whether the crawl should go on after a subforum or page.
enum Flow {
    Continue,
    Stop,
}

/// One adapter invocation against one forum source.
pub struct ForumCrawler {
    source_id: String,
    base_url: String,
    /// Subforum path with its candidate vehicle ids, in crawl order.
    subforums: Vec<(String, Vec<String>)>,
    pagination: PaginationConfig,
    max_pages: u32,
    max_threads: Option<usize>,
    qualification: QualificationConfig,
    extractor: Extractor,
    client: HttpClient,
    cancel: CancellationToken,
}

impl ForumCrawler {
    /// Validate the source and prepare selectors, scoring and the client.
    ///
    /// Every configuration problem surfaces here, before any request.
    pub fn new(
        platform: Arc<dyn ForumPlatform>,
        source: &ForumSource,
        options: &ScrapeOptions,
    ) -> Result<Self> {
        source.validate()?;
        let config = &source.scrape_config;

        let pagination = config.pagination_or(&platform.default_pagination());
        pagination.validate()?;
        let max_pages = config.effective_max_pages(&pagination);

        let subforums = match options.subforums {
            Some(ref paths) => paths
                .iter()
                .map(|path| match config.subforums.get(path) {
                    Some(vehicles) => Ok((path.clone(), vehicles.clone())),
                    None => Err(ScrapeError::Configuration(format!(
                        "source {}: subforum '{}' is not configured",
                        source.id, path
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            None => config
                .subforums
                .iter()
                .map(|(path, vehicles)| (path.clone(), vehicles.clone()))
                .collect(),
        };

        let extractor = Extractor::new(platform, config)?;
        let client =
            HttpClient::for_source(&source.id, config)?.with_cancellation(options.cancel.clone());

        Ok(Self {
            source_id: source.id.clone(),
            base_url: source.base_url.clone(),
            subforums,
            pagination,
            max_pages,
            max_threads: options.max_threads,
            qualification: config.qualification.clone(),
            extractor,
            client,
            cancel: options.cancel.clone(),
        })
    }

    fn cap_reached(&self, result: &ScrapeResult) -> bool {
        self.max_threads
            .is_some_and(|max| result.threads_scraped >= max as u64)
    }

    /// Crawl every selected subforum and return the counts.
    pub async fn run(&self, run: &ScrapeRun, store: &dyn ThreadStore) -> ScrapeResult {
        let mut result = ScrapeResult::default();
        let mut seen: HashSet<String> = HashSet::new();

        for (subforum, vehicles) in &self.subforums {
            if self.cancel.is_cancelled() || self.cap_reached(&result) {
                break;
            }

            let before = result;
            let flow = self
                .crawl_subforum(subforum, vehicles, run, store, &mut result, &mut seen)
                .await;
            info!(
                "{} {}: {} found, {} scraped, {} posts",
                self.source_id,
                subforum,
                result.threads_found - before.threads_found,
                result.threads_scraped - before.threads_scraped,
                result.posts_scraped - before.posts_scraped
            );
            if matches!(flow, Flow::Stop) {
                break;
            }
        }

        if self.cancel.is_cancelled() {
            warn!("{}: scrape cancelled, returning partial result", self.source_id);
        }
        info!(
            "{} run {}: {} threads found, {} scraped, {} posts",
            self.source_id,
            run.id,
            result.threads_found,
            result.threads_scraped,
            result.posts_scraped
        );
        result
    }

    async fn crawl_subforum(
        &self,
        subforum: &str,
        vehicles: &[String],
        run: &ScrapeRun,
        store: &dyn ThreadStore,
        result: &mut ScrapeResult,
        seen: &mut HashSet<String>,
    ) -> Flow {
        for page in 1..=self.max_pages {
            if self.cancel.is_cancelled() {
                return Flow::Stop;
            }

            let page_url = build_list_url(&self.base_url, subforum, page, &self.pagination);
            let html = match self.client.get_text(&page_url).await {
                Ok(html) => html,
                Err(ScrapeError::Cancelled) => return Flow::Stop,
                Err(e) => {
                    warn!(
                        "{} {}: list page {} failed, stopping subforum: {}",
                        self.source_id, subforum, page, e
                    );
                    return Flow::Continue;
                }
            };

            let listings = self.extractor.parse_thread_list(&html, &page_url, vehicles);
            if listings.is_empty() {
                debug!(
                    "{} {}: no threads on page {}, done",
                    self.source_id, subforum, page
                );
                return Flow::Continue;
            }
            result.threads_found += listings.len() as u64;

            for listing in &listings {
                if self.cap_reached(result) {
                    return Flow::Stop;
                }
                if !seen.insert(listing.url.clone()) {
                    continue;
                }
                if !should_scrape_thread(listing, &self.qualification, self.extractor.now()) {
                    debug!(
                        "Skipping {} (score {:.2}, {} replies)",
                        listing.url, listing.relevance_score, listing.reply_count
                    );
                    continue;
                }

                let thread = match self.scrape_thread(listing, subforum, vehicles).await {
                    Ok(thread) => thread,
                    Err(ScrapeError::Cancelled) => return Flow::Stop,
                    Err(e) => {
                        warn!(
                            "{}: skipping thread {}: {}",
                            self.source_id, listing.url, e
                        );
                        continue;
                    }
                };
                if thread.is_empty() {
                    debug!("No substantial posts in {}, dropping", thread.url);
                    continue;
                }

                match store
                    .save_scraped_thread(&run.id, &self.source_id, &thread)
                    .await
                {
                    Ok(()) => {
                        result.threads_scraped += 1;
                        result.posts_scraped += thread.posts.len() as u64;
                    }
                    Err(e) => warn!(
                        "{}: failed to save thread {}: {}",
                        self.source_id, thread.url, e
                    ),
                }
            }
        }
        Flow::Continue
    }

    async fn scrape_thread(
        &self,
        listing: &ThreadListing,
        subforum: &str,
        vehicles: &[String],
    ) -> Result<Thread> {
        let html = self.client.get_text(&listing.url).await?;
        let ctx = ThreadContext {
            url: &listing.url,
            subforum,
            vehicle_ids: vehicles,
            listing: Some(listing),
        };
        self.extractor.parse_thread(&html, &ctx)
    }
}
