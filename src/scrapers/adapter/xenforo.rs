//! XenForo 2 platform.

use scraper::{ElementRef, Node};

use crate::models::ForumSoftware;
use crate::scrapers::config::{
    ListSelectorConfig, PaginationConfig, PaginationMode, SelectorConfig, ThreadSelectorConfig,
};
use crate::scrapers::platform::ForumPlatform;

/// Thread prefix badges ("Question", "For Sale") rendered inside titles.
const PREFIX_CLASSES: &[&str] = &["label", "label-append"];

#[derive(Debug, Clone, Copy, Default)]
pub struct XenForo;

fn css(s: &str) -> Option<String> {
    Some(s.to_string())
}

fn collect_unprefixed(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if el.classes().any(|c| PREFIX_CLASSES.contains(&c)) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_unprefixed(child_el, out);
                }
            }
            _ => {}
        }
    }
}

impl ForumPlatform for XenForo {
    fn software(&self) -> ForumSoftware {
        ForumSoftware::XenForo
    }

    fn default_selectors(&self) -> SelectorConfig {
        SelectorConfig {
            list: ListSelectorConfig {
                row: css("div.structItem--thread"),
                title: css(
                    "div.structItem-title a[data-tp-primary], div.structItem-title a:last-of-type",
                ),
                link: None,
                snippet: None,
                replies: css("div.structItem-cell--meta dl.pairs--justified:first-of-type dd"),
                views: css("div.structItem-cell--meta dl.structItem-minor dd"),
                last_post: css("div.structItem-cell--latest time"),
                pinned: css(
                    ".structItemContainer-group--sticky, .structItem-status--sticky, .is-sticky",
                ),
            },
            thread: ThreadSelectorConfig {
                post: css("article.message--post"),
                author: css(".message-name .username, .message-userDetails .username"),
                date: css(".message-attribution time.u-dt, .message-attribution time"),
                content: css("div.bbWrapper"),
                post_number: css("ul.message-attribution-opposite li:last-child a"),
                heading: css("h1.p-title-value"),
                thread_title: None,
                quote: css("blockquote.bbCodeBlock--quote, .bbCodeBlock--quote"),
            },
        }
    }

    /// `/forums/name.12/page-2`
    fn default_pagination(&self) -> PaginationConfig {
        PaginationConfig {
            segment: "page-".to_string(),
            trailing_slash: false,
            ..PaginationConfig::with_mode(PaginationMode::PagePath)
        }
    }

    fn title_text(&self, element: ElementRef<'_>) -> String {
        let mut out = String::new();
        collect_unprefixed(element, &mut out);
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use crate::scrapers::config::ForumScrapeConfig;
    use crate::scrapers::extract::{Extractor, ThreadContext};
    use crate::scrapers::pagination::build_list_url;

    const LIST_PAGE: &str = r##"
<html><body>
<div class="structItemContainer">
  <div class="structItemContainer-group structItemContainer-group--sticky">
    <div class="structItem structItem--thread is-sticky">
      <div class="structItem-cell structItem-cell--main">
        <div class="structItem-title"><a href="/threads/read-me.1/" data-tp-primary="on">Read me first</a></div>
      </div>
    </div>
  </div>
  <div class="structItemContainer-group js-threadList">
    <div class="structItem structItem--thread js-inlineModContainer">
      <div class="structItem-cell structItem-cell--main">
        <div class="structItem-title">
          <a href="/forums/engine.12/?prefix_id=3" class="labelLink"><span class="label label--blue">Question</span></a>
          <a href="/threads/oil-leak-at-rear-main.123/" data-tp-primary="on">Oil leak at rear main seal</a>
        </div>
      </div>
      <div class="structItem-cell structItem-cell--meta">
        <dl class="pairs pairs--justified"><dt>Replies</dt><dd>12</dd></dl>
        <dl class="pairs pairs--justified structItem-minor"><dt>Views</dt><dd>1.5K</dd></dl>
      </div>
      <div class="structItem-cell structItem-cell--latest">
        <a href="/threads/oil-leak-at-rear-main.123/latest" rel="nofollow">
          <time class="structItem-latestDate u-dt" datetime="2024-02-01T12:00:00+0000" data-time="1706788800">Feb 1, 2024</time></a>
      </div>
    </div>
  </div>
</div>
</body></html>"##;

    const THREAD_PAGE: &str = r##"
<html><head><title>Oil leak at rear main seal | Tacoma World</title></head><body>
<h1 class="p-title-value"><span class="label label--blue" dir="auto">Question</span><span class="label-append">&nbsp;</span>Oil leak at rear main seal</h1>
<article class="message message--post js-post" id="js-post-1001">
  <div class="message-userDetails"><h4 class="message-name"><a class="username" href="/members/bob.1/">bob</a></h4></div>
  <header class="message-attribution">
    <ul class="message-attribution-main"><li><a href="#"><time class="u-dt" datetime="2024-01-15T10:15:00+0000" data-time="1705313700">Jan 15, 2024</time></a></li></ul>
    <ul class="message-attribution-opposite"><li><a href="#">Share</a></li><li><a href="/threads/x.123/post-1001">#1</a></li></ul>
  </header>
  <article class="message-body"><div class="bbWrapper">My 2017 Tacoma is leaking oil from the rear main seal at 60k miles. Warranty claim denied.</div></article>
  <aside class="message-signature"><div class="bbWrapper">2017 TRD Off Road</div></aside>
</article>
<article class="message message--post js-post" id="js-post-1002">
  <div class="message-userDetails"><h4 class="message-name"><a class="username" href="/members/tech.2/">tech</a></h4></div>
  <header class="message-attribution">
    <ul class="message-attribution-main"><li><time class="u-dt" datetime="2024-01-16T08:00:00+0000">Jan 16, 2024</time></li></ul>
    <ul class="message-attribution-opposite"><li><a href="/threads/x.123/post-1002">#2</a></li></ul>
  </header>
  <article class="message-body"><div class="bbWrapper">
    <blockquote class="bbCodeBlock bbCodeBlock--expandable bbCodeBlock--quote">bob said: leaking oil from the rear main seal</blockquote>
    Check the oil pan gasket first, it is a common problem on the 3rd gen and often misdiagnosed.
  </div></article>
</article>
</body></html>"##;

    fn extractor() -> Extractor {
        Extractor::new(Arc::new(XenForo), &ForumScrapeConfig::default())
            .unwrap()
            .with_now(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_default_pagination() {
        let pagination = XenForo.default_pagination();
        assert_eq!(
            build_list_url("https://www.tacomaworld.com", "/forums/engine.12/", 3, &pagination),
            "https://www.tacomaworld.com/forums/engine.12/page-3"
        );
        assert_eq!(
            build_list_url("https://www.tacomaworld.com", "/forums/engine.12/", 1, &pagination),
            "https://www.tacomaworld.com/forums/engine.12/"
        );
    }

    #[test]
    fn test_list_page_defaults() {
        let listings =
            extractor().parse_thread_list(LIST_PAGE, "https://www.tacomaworld.com/forums/engine.12/", &[]);

        assert_eq!(listings.len(), 1);
        let leak = &listings[0];
        assert_eq!(leak.title, "Oil leak at rear main seal");
        assert_eq!(
            leak.url,
            "https://www.tacomaworld.com/threads/oil-leak-at-rear-main.123/"
        );
        assert_eq!(leak.reply_count, 12);
        assert_eq!(leak.view_count, 1500);
        assert_eq!(
            leak.last_reply_at,
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_thread_page_defaults() {
        let vehicles = vec!["toyota-tacoma-3g".to_string()];
        let mut config = ForumScrapeConfig::default();
        config
            .vehicle_aliases
            .insert("toyota-tacoma-3g".to_string(), vec!["2017 tacoma".to_string()]);
        let extractor = Extractor::new(Arc::new(XenForo), &config).unwrap();

        let ctx = ThreadContext {
            url: "https://www.tacomaworld.com/threads/oil-leak-at-rear-main.123/",
            subforum: "/forums/engine.12/",
            vehicle_ids: &vehicles,
            listing: None,
        };
        let thread = extractor.parse_thread(THREAD_PAGE, &ctx).unwrap();

        assert_eq!(thread.title, "Oil leak at rear main seal");
        assert_eq!(thread.posts.len(), 2);
        assert_eq!(thread.posts[0].author, "bob");
        assert_eq!(thread.posts[0].position, 1);
        assert!(!thread.posts[0].content.contains("TRD Off Road"));
        assert_eq!(
            thread.posted_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 15, 0).unwrap())
        );
        assert_eq!(thread.posts[1].position, 2);
        assert!(!thread.posts[1].content.contains("bob said"));
        assert_eq!(
            thread.last_reply_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 16, 8, 0, 0).unwrap())
        );
        assert_eq!(thread.vehicle_ids, vehicles);
    }
}
