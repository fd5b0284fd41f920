//! vBulletin (3.x/4.x) platform.
//!
//! Defaults target the stock vB4 templates (`li.threadbit` rows,
//! `li.postcontainer` posts) with vB3 table-layout fallbacks. Boards running
//! vBSEO get `/forum-name/index2.html` list URLs, hence `index_html`.

use scraper::ElementRef;

use crate::models::ForumSoftware;
use crate::scrapers::config::{
    ListSelectorConfig, PaginationConfig, PaginationMode, SelectorConfig, ThreadSelectorConfig,
};
use crate::scrapers::extract::inline_text;
use crate::scrapers::platform::ForumPlatform;

/// Prefix vB4 renders in the page heading before the thread title.
const HEADING_PREFIX: &str = "Thread:";

#[derive(Debug, Clone, Copy, Default)]
pub struct VBulletin;

fn css(s: &str) -> Option<String> {
    Some(s.to_string())
}

impl ForumPlatform for VBulletin {
    fn software(&self) -> ForumSoftware {
        ForumSoftware::VBulletin
    }

    fn default_selectors(&self) -> SelectorConfig {
        SelectorConfig {
            list: ListSelectorConfig {
                row: css("li.threadbit, tbody[id^='threadbits_forum_'] > tr"),
                title: css("a.title, a[id^='thread_title_']"),
                link: None,
                snippet: css(".threadinfo[title], td[id^='td_threadtitle_'][title]"),
                replies: css("ul.threadstats li:nth-child(1)"),
                views: css("ul.threadstats li:nth-child(2)"),
                last_post: css("dl.threadlastpost dd:last-child, .lastpost .time"),
                pinned: css(
                    ".sticky, .announcement, #stickies, #announcements, img[alt*='Sticky']",
                ),
            },
            thread: ThreadSelectorConfig {
                post: css("li.postcontainer, table[id^='post']"),
                author: css("a.username, .username, a.bigusername"),
                date: css("span.date, .postdate"),
                content: css("div[id^='post_message_'], blockquote.postcontent"),
                post_number: css("a.postcounter, a[id^='postcount']"),
                heading: css("h1"),
                thread_title: css(".threadtitle"),
                quote: css(".bbcode_container, .bbcode_quote, div.quote"),
            },
        }
    }

    fn default_pagination(&self) -> PaginationConfig {
        PaginationConfig::with_mode(PaginationMode::IndexHtml)
    }

    fn title_text(&self, element: ElementRef<'_>) -> String {
        let text = inline_text(element);
        match text.strip_prefix(HEADING_PREFIX) {
            Some(rest) => rest.trim().to_string(),
            None => text,
        }
    }
}
