//! HTML extraction for thread-list and thread pages.
//!
//! Selector overrides from the source config are layered over the platform
//! defaults and compiled once per adapter invocation. Field-level failures
//! (missing element, unparseable number or date) degrade to empty, zero or
//! `None`; only a thread page with no post containers at all is an error.

pub mod dates;
pub mod text;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

pub use dates::parse_forum_date;
pub use text::{clean_text, inline_text, normalize_whitespace, parse_count, strip_title_suffix};

use super::config::{compile_selector, ForumScrapeConfig};
use super::error::{Result, ScrapeError};
use super::platform::ForumPlatform;
use super::relevance::RelevanceScorer;
use super::vehicles::VehicleTagger;
use crate::models::{Post, Thread, ThreadListing};

/// Characters of post text scored and tagged after a full scrape.
pub const EXCERPT_CHARS: usize = 2000;

/// Always stripped from post content, in addition to quote blocks.
const NOISE_SELECTOR: &str = "script, style, noscript";

struct ListSelectors {
    row: Selector,
    title: Selector,
    link: Option<Selector>,
    snippet: Option<Selector>,
    replies: Option<Selector>,
    views: Option<Selector>,
    last_post: Option<Selector>,
    pinned: Option<Selector>,
}

struct ThreadSelectors {
    post: Selector,
    author: Option<Selector>,
    date: Option<Selector>,
    content: Option<Selector>,
    post_number: Option<Selector>,
    heading: Option<Selector>,
    thread_title: Option<Selector>,
    skip: Selector,
}

/// Where a thread page came from.
#[derive(Debug, Clone, Copy)]
pub struct ThreadContext<'a> {
    pub url: &'a str,
    pub subforum: &'a str,
    /// Vehicle ids valid for `subforum`.
    pub vehicle_ids: &'a [String],
    /// Listing the thread was found through, if any.
    pub listing: Option<&'a ThreadListing>,
}

/// Parses list and thread pages for one forum source.
pub struct Extractor {
    platform: Arc<dyn ForumPlatform>,
    list: ListSelectors,
    thread: ThreadSelectors,
    scorer: RelevanceScorer,
    tagger: VehicleTagger,
    now: DateTime<Utc>,
}

fn pick(field: &str, configured: &Option<String>, default: &Option<String>) -> Result<Option<Selector>> {
    match configured.as_ref().or(default.as_ref()) {
        Some(css) if !css.trim().is_empty() => compile_selector(field, css).map(Some),
        _ => Ok(None),
    }
}

fn require(field: &str, selector: Option<Selector>) -> Result<Selector> {
    selector.ok_or_else(|| ScrapeError::Configuration(format!("missing selector for {}", field)))
}

fn first<'a>(scope: ElementRef<'a>, selector: Option<&Selector>) -> Option<ElementRef<'a>> {
    selector.and_then(|s| scope.select(s).next())
}

impl Extractor {
    /// Compile selectors and scoring for a source on `platform`.
    pub fn new(platform: Arc<dyn ForumPlatform>, config: &ForumScrapeConfig) -> Result<Self> {
        let defaults = platform.default_selectors();
        let (l, dl) = (&config.selectors.list, &defaults.list);
        let (t, dt) = (&config.selectors.thread, &defaults.thread);

        let list = ListSelectors {
            row: require("list.row", pick("list.row", &l.row, &dl.row)?)?,
            title: require("list.title", pick("list.title", &l.title, &dl.title)?)?,
            link: pick("list.link", &l.link, &dl.link)?,
            snippet: pick("list.snippet", &l.snippet, &dl.snippet)?,
            replies: pick("list.replies", &l.replies, &dl.replies)?,
            views: pick("list.views", &l.views, &dl.views)?,
            last_post: pick("list.last_post", &l.last_post, &dl.last_post)?,
            pinned: pick("list.pinned", &l.pinned, &dl.pinned)?,
        };

        let skip_css = match t.quote.as_ref().or(dt.quote.as_ref()) {
            Some(quote) if !quote.trim().is_empty() => format!("{}, {}", NOISE_SELECTOR, quote),
            _ => NOISE_SELECTOR.to_string(),
        };
        let thread = ThreadSelectors {
            post: require("thread.post", pick("thread.post", &t.post, &dt.post)?)?,
            author: pick("thread.author", &t.author, &dt.author)?,
            date: pick("thread.date", &t.date, &dt.date)?,
            content: pick("thread.content", &t.content, &dt.content)?,
            post_number: pick("thread.post_number", &t.post_number, &dt.post_number)?,
            heading: pick("thread.heading", &t.heading, &dt.heading)?,
            thread_title: pick("thread.thread_title", &t.thread_title, &dt.thread_title)?,
            skip: compile_selector("thread.quote", &skip_css)?,
        };

        Ok(Self {
            platform,
            list,
            thread,
            scorer: RelevanceScorer::new(&config.relevance),
            tagger: VehicleTagger::new(&config.vehicle_aliases),
            now: Utc::now(),
        })
    }

    /// Reference time for relative dates ("Today", "3 hours ago").
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    pub fn tagger(&self) -> &VehicleTagger {
        &self.tagger
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn is_pinned(&self, row: ElementRef<'_>) -> bool {
        let Some(ref pinned) = self.list.pinned else {
            return false;
        };
        pinned.matches(&row)
            || row.select(pinned).next().is_some()
            || row
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|el| pinned.matches(&el))
    }

    /// Parse thread rows from a list page, skipping sticky and announcement
    /// rows. `page_url` resolves relative thread links.
    pub fn parse_thread_list(
        &self,
        html: &str,
        page_url: &str,
        vehicle_ids: &[String],
    ) -> Vec<ThreadListing> {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();
        let mut listings = Vec::new();

        for row in document.select(&self.list.row) {
            if self.is_pinned(row) {
                continue;
            }

            let Some(title_el) = row.select(&self.list.title).next() else {
                continue;
            };
            let title = self.platform.title_text(title_el);
            if title.is_empty() {
                continue;
            }

            let link_el = first(row, self.list.link.as_ref()).unwrap_or(title_el);
            let Some(url) = link_el
                .value()
                .attr("href")
                .and_then(|href| resolve_link(base.as_ref(), href))
            else {
                debug!("No thread link in row '{}' on {}", title, page_url);
                continue;
            };

            let snippet = first(row, self.list.snippet.as_ref())
                .and_then(|el| self.platform.snippet_text(el));
            let reply_count = first(row, self.list.replies.as_ref())
                .map(|el| parse_count(&inline_text(el)))
                .unwrap_or(0);
            let view_count = first(row, self.list.views.as_ref())
                .map(|el| parse_count(&inline_text(el)))
                .unwrap_or(0);
            let last_reply_at = first(row, self.list.last_post.as_ref())
                .and_then(|el| parse_forum_date(&self.platform.timestamp_text(el), self.now));

            let mut listing = ThreadListing {
                title,
                url,
                snippet,
                reply_count,
                view_count,
                last_reply_at,
                relevance_score: 0.0,
                vehicle_ids: Vec::new(),
            };
            let text = listing.listing_text();
            listing.relevance_score = self.scorer.score(&text, reply_count, view_count);
            listing.vehicle_ids = self.tagger.detect(&text, vehicle_ids);
            listings.push(listing);
        }

        listings
    }

    fn post_date(&self, post: ElementRef<'_>) -> Option<DateTime<Utc>> {
        first(post, self.thread.date.as_ref())
            .and_then(|el| parse_forum_date(&self.platform.timestamp_text(el), self.now))
    }

    /// Extract posts in document order, dropping those too short to keep.
    pub fn parse_posts(&self, document: &Html) -> Vec<Post> {
        let mut posts = Vec::new();
        for (index, element) in document.select(&self.thread.post).enumerate() {
            let content_el = first(element, self.thread.content.as_ref()).unwrap_or(element);
            let content = clean_text(content_el, &self.thread.skip);
            let author = first(element, self.thread.author.as_ref())
                .map(inline_text)
                .unwrap_or_default();
            let position = first(element, self.thread.post_number.as_ref())
                .and_then(|el| self.platform.post_number(el))
                .unwrap_or(index as u32 + 1);

            let post = Post {
                position,
                author,
                posted_at: self.post_date(element),
                content,
                is_opening_post: index == 0,
            };
            if !post.has_substance() {
                debug!("Dropping post {} ({} chars)", position, post.content.chars().count());
                continue;
            }
            posts.push(post);
        }
        posts
    }

    fn resolve_title(&self, document: &Html, listing: Option<&ThreadListing>) -> String {
        let root = document.root_element();
        let from_elements = [self.thread.heading.as_ref(), self.thread.thread_title.as_ref()]
            .into_iter()
            .filter_map(|selector| first(root, selector))
            .map(|el| self.platform.title_text(el))
            .find(|title| !title.is_empty());
        if let Some(title) = from_elements {
            return title;
        }

        let page_title = Selector::parse("title")
            .ok()
            .and_then(|s| document.select(&s).next())
            .map(|el| strip_title_suffix(&inline_text(el)))
            .filter(|t| !t.is_empty());
        page_title
            .or_else(|| listing.map(|l| l.title.clone()))
            .unwrap_or_default()
    }

    /// Parse a full thread page.
    ///
    /// The score and vehicle tags are recomputed from the title and the
    /// leading post text; they replace whatever the listing carried.
    pub fn parse_thread(&self, html: &str, ctx: &ThreadContext<'_>) -> Result<Thread> {
        let document = Html::parse_document(html);
        if document.select(&self.thread.post).next().is_none() {
            return Err(ScrapeError::Parse(format!(
                "no post containers found at {}",
                ctx.url
            )));
        }

        let posts = self.parse_posts(&document);
        let title = self.resolve_title(&document, ctx.listing);
        // The opening post dates the thread even when its text is dropped.
        let posted_at = document
            .select(&self.thread.post)
            .next()
            .and_then(|op| self.post_date(op));

        let mut thread = Thread::new(
            title,
            ctx.url.to_string(),
            ctx.subforum.to_string(),
            posts,
        );
        thread.posted_at = posted_at;
        if thread.last_reply_at.is_none() {
            thread.last_reply_at = ctx.listing.and_then(|l| l.last_reply_at);
        }

        let body = thread
            .posts
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let text = format!("{}\n{}", thread.title, text::truncate_chars(&body, EXCERPT_CHARS));
        let view_count = ctx.listing.map(|l| l.view_count).unwrap_or(0);
        thread.relevance_score = self.scorer.score(&text, thread.reply_count, view_count);
        thread.vehicle_ids = self.tagger.detect(&text, ctx.vehicle_ids);

        Ok(thread)
    }
}

/// Resolve a thread href against the page it appeared on, dropping fragments.
fn resolve_link(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    let mut url = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForumSoftware;
    use crate::scrapers::config::{
        ListSelectorConfig, PaginationConfig, SelectorConfig, ThreadSelectorConfig,
    };
    use chrono::TimeZone;

    struct SimplePlatform;

    impl ForumPlatform for SimplePlatform {
        fn software(&self) -> ForumSoftware {
            ForumSoftware::VBulletin
        }

        fn default_selectors(&self) -> SelectorConfig {
            SelectorConfig {
                list: ListSelectorConfig {
                    row: Some("tr.thread".into()),
                    title: Some("a.title".into()),
                    link: None,
                    snippet: Some(".preview".into()),
                    replies: Some("td.replies".into()),
                    views: Some("td.views".into()),
                    last_post: Some("td.last".into()),
                    pinned: Some(".sticky".into()),
                },
                thread: ThreadSelectorConfig {
                    post: Some("div.post".into()),
                    author: Some(".author".into()),
                    date: Some(".date".into()),
                    content: Some(".body".into()),
                    post_number: Some(".num".into()),
                    heading: Some("h1".into()),
                    thread_title: Some(".thread-title".into()),
                    quote: Some(".quote".into()),
                },
            }
        }

        fn default_pagination(&self) -> PaginationConfig {
            PaginationConfig::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 18, 30, 0).unwrap()
    }

    fn extractor(config: &ForumScrapeConfig) -> Extractor {
        Extractor::new(Arc::new(SimplePlatform), config)
            .unwrap()
            .with_now(now())
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    const LIST_HTML: &str = r#"
        <html><body><table>
          <tr class="thread sticky"><td><a class="title" href="/t/rules">Forum rules</a></td></tr>
          <tr class="thread">
            <td><a class="title" href="/t/100-rod-bearings">Rod bearing failure on my E46 M3</a>
                <span class="preview" title="Spun a bearing at 80k miles"></span></td>
            <td class="replies">1,204</td><td class="views">15.2k</td>
            <td class="last">01-15-2024, 10:15 AM</td>
          </tr>
          <tr class="thread">
            <td><a class="title" href="https://other.test/t/200#post5">Show me your wheels</a></td>
            <td class="replies">n/a</td><td class="views"></td><td class="last">whenever</td>
          </tr>
          <tr class="thread"><td><span class="title">No link here</span></td></tr>
        </table></body></html>
    "#;

    #[test]
    fn test_parse_thread_list() {
        let config = ForumScrapeConfig::default();
        let listings = extractor(&config).parse_thread_list(
            LIST_HTML,
            "https://forum.test/forums/engine/",
            &ids(&["e46-m3", "e90-m3"]),
        );

        assert_eq!(listings.len(), 2);
        let first = &listings[0];
        assert_eq!(first.title, "Rod bearing failure on my E46 M3");
        assert_eq!(first.url, "https://forum.test/t/100-rod-bearings");
        assert_eq!(first.snippet.as_deref(), Some("Spun a bearing at 80k miles"));
        assert_eq!(first.reply_count, 1204);
        assert_eq!(first.view_count, 15_200);
        assert_eq!(
            first.last_reply_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 15, 0).unwrap())
        );
        assert_eq!(first.vehicle_ids, ids(&["e46-m3"]));
        assert!(first.relevance_score > listings[1].relevance_score);

        let second = &listings[1];
        assert_eq!(second.url, "https://other.test/t/200");
        assert_eq!(second.reply_count, 0);
        assert_eq!(second.view_count, 0);
        assert!(second.last_reply_at.is_none());
        assert!(second.vehicle_ids.is_empty());
    }

    #[test]
    fn test_pinned_container_excludes_rows() {
        let html = r#"<table>
            <tbody class="sticky"><tr class="thread"><td><a class="title" href="/t/1">Pinned</a></td></tr></tbody>
            <tbody><tr class="thread"><td><a class="title" href="/t/2">Organic</a></td></tr>
                   <tr class="thread"><td><a class="title" href="/t/3">Flagged</a><img class="sticky"></td></tr></tbody>
        </table>"#;
        let listings = extractor(&ForumScrapeConfig::default()).parse_thread_list(
            html,
            "https://forum.test/f/",
            &[],
        );
        let titles: Vec<&str> = listings.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Organic"]);
    }

    #[test]
    fn test_selector_override_wins() {
        let mut config = ForumScrapeConfig::default();
        config.selectors.list.replies = Some("td.views".into());
        let listings =
            extractor(&config).parse_thread_list(LIST_HTML, "https://forum.test/f/", &[]);
        assert_eq!(listings[0].reply_count, 15_200);
    }

    #[test]
    fn test_invalid_override_is_configuration_error() {
        let mut config = ForumScrapeConfig::default();
        config.selectors.thread.post = Some("div[".into());
        let err = Extractor::new(Arc::new(SimplePlatform), &config).err().unwrap();
        assert!(matches!(err, ScrapeError::Configuration(_)));
    }

    const THREAD_HTML: &str = r#"
        <html><head><title>Rod bearing failure - Bimmer Forum</title></head><body>
          <div class="thread-title">Ignored because h1 is empty</div>
          <h1> </h1>
          <div class="post">
            <a class="num">#1</a><span class="author">m3driver</span>
            <span class="date">01-10-2024, 08:00 AM</span>
            <div class="body">My E46 M3 spun a rod bearing at 80k miles. Is this a known failure?
              <script>track()</script></div>
          </div>
          <div class="post">
            <a class="num">#2</a><span class="author">short</span>
            <div class="body">+1</div>
          </div>
          <div class="post">
            <span class="author">mechanic</span><span class="date">Yesterday, 09:02 PM</span>
            <div class="body"><div class="quote">My E46 M3 spun a rod bearing</div>
              Yes, rod bearings are a common problem. Replace them every 60k as maintenance.</div>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_thread() {
        let config = ForumScrapeConfig::default();
        let vehicles = ids(&["e46-m3"]);
        let ctx = ThreadContext {
            url: "https://forum.test/t/100",
            subforum: "/forums/engine/",
            vehicle_ids: &vehicles,
            listing: None,
        };
        let thread = extractor(&config).parse_thread(THREAD_HTML, &ctx).unwrap();

        assert_eq!(thread.title, "Ignored because h1 is empty");
        assert_eq!(thread.posts.len(), 2);
        assert_eq!(thread.reply_count, 1);

        let op = &thread.posts[0];
        assert!(op.is_opening_post);
        assert_eq!(op.position, 1);
        assert_eq!(op.author, "m3driver");
        assert!(!op.content.contains("track()"));
        assert_eq!(
            thread.posted_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap())
        );

        let reply = &thread.posts[1];
        assert_eq!(reply.position, 3);
        assert!(!reply.is_opening_post);
        assert!(!reply.content.contains("spun a rod bearing"));
        assert_eq!(
            thread.last_reply_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 9, 21, 2, 0).unwrap())
        );

        assert_eq!(thread.vehicle_ids, vehicles);
        assert!(thread.relevance_score > 0.0);
    }

    #[test]
    fn test_short_opening_post_still_dates_thread() {
        let html = r#"<html><body><h1>Cracked coolant expansion tank</h1>
          <div class="post">
            <a class="num">#1</a><span class="author">op</span>
            <span class="date">01-10-2024, 08:00 AM</span>
            <div class="body">See pic.</div>
          </div>
          <div class="post">
            <a class="num">#2</a><span class="author">helper</span>
            <span class="date">02-20-2024, 08:00 AM</span>
            <div class="body">The plastic tanks crack with age, swap it along with the cap and bleed screw.</div>
          </div>
        </body></html>"#;
        let ctx = ThreadContext {
            url: "https://forum.test/t/11",
            subforum: "/f/",
            vehicle_ids: &[],
            listing: None,
        };
        let thread = extractor(&ForumScrapeConfig::default())
            .parse_thread(html, &ctx)
            .unwrap();

        assert_eq!(thread.posts.len(), 1);
        assert!(!thread.posts[0].is_opening_post);
        assert_eq!(thread.posts[0].position, 2);
        assert_eq!(
            thread.posted_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap())
        );
        assert_eq!(
            thread.last_reply_at,
            Some(Utc.with_ymd_and_hms(2024, 2, 20, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_title_falls_back_to_page_title() {
        let html = r#"<html><head><title>Oil leak at rear main seal | TacomaWorld</title></head>
            <body><div class="post"><div class="body">The rear main seal started leaking at 120k miles on mine.</div></div></body></html>"#;
        let ctx = ThreadContext {
            url: "https://forum.test/t/7",
            subforum: "/f/",
            vehicle_ids: &[],
            listing: None,
        };
        let thread = extractor(&ForumScrapeConfig::default())
            .parse_thread(html, &ctx)
            .unwrap();
        assert_eq!(thread.title, "Oil leak at rear main seal");
    }

    #[test]
    fn test_thread_without_posts_is_parse_error() {
        let ctx = ThreadContext {
            url: "https://forum.test/t/8",
            subforum: "/f/",
            vehicle_ids: &[],
            listing: None,
        };
        let err = extractor(&ForumScrapeConfig::default())
            .parse_thread("<html><body>Login required</body></html>", &ctx)
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Parse(_)));
    }

    #[test]
    fn test_last_reply_falls_back_to_listing() {
        let html = r#"<div class="post"><div class="body">Long enough post content without any date attached to it.</div></div>"#;
        let listing = ThreadListing {
            title: "Listing title".into(),
            url: "https://forum.test/t/9".into(),
            snippet: None,
            reply_count: 4,
            view_count: 10,
            last_reply_at: Some(now()),
            relevance_score: 1.0,
            vehicle_ids: Vec::new(),
        };
        let ctx = ThreadContext {
            url: &listing.url,
            subforum: "/f/",
            vehicle_ids: &[],
            listing: Some(&listing),
        };
        let thread = extractor(&ForumScrapeConfig::default())
            .parse_thread(html, &ctx)
            .unwrap();
        assert_eq!(thread.title, "Listing title");
        assert_eq!(thread.last_reply_at, Some(now()));
        assert!(thread.posted_at.is_none());
    }
}
