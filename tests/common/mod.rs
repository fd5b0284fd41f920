//! Shared fixtures for adapter integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use forumscrape::models::{ForumSoftware, ForumSource, Thread};
use forumscrape::scrapers::config::ForumScrapeConfig;
use forumscrape::storage::{MemoryThreadStore, StorageResult, ThreadStore};

/// Filler that keeps a post above the minimum content length.
pub const LONG_TAIL: &str = "Took it to the dealer twice and they could not reproduce it.";

/// Source with no request delay and keyword-only scoring, so a title
/// containing "failure" (2.5) qualifies and a neutral title does not.
pub fn source(software: ForumSoftware, base_url: &str, subforums: &[(&str, &[&str])]) -> ForumSource {
    let mut config = ForumScrapeConfig::default();
    config.rate_limit_ms = 0;
    config.relevance.reply_weight = 0.0;
    config.relevance.view_weight = 0.0;
    config.qualification.min_relevance = 2.0;
    for (path, vehicles) in subforums {
        config.subforums.insert(
            path.to_string(),
            vehicles.iter().map(|v| v.to_string()).collect(),
        );
    }
    ForumSource::new("test-forum", software, base_url).with_config(config)
}

pub struct VbRow<'a> {
    pub id: u32,
    pub title: &'a str,
    pub href: String,
    pub sticky: bool,
    pub replies: u32,
}

impl<'a> VbRow<'a> {
    pub fn new(id: u32, title: &'a str, href: &str) -> Self {
        Self {
            id,
            title,
            href: href.to_string(),
            sticky: false,
            replies: 0,
        }
    }

    pub fn sticky(mut self) -> Self {
        self.sticky = true;
        self
    }

    pub fn replies(mut self, replies: u32) -> Self {
        self.replies = replies;
        self
    }
}

/// vBulletin 4 thread-list page.
pub fn vb_list_page(rows: &[VbRow<'_>]) -> String {
    let rows: String = rows
        .iter()
        .map(|row| {
            let sticky = if row.sticky { "sticky" } else { "nonsticky" };
            format!(
                r##"<li class="threadbit" id="thread_{id}">
  <div class="rating0 {sticky}"><div class="threadinfo">
    <h3 class="threadtitle"><a class="title" id="thread_title_{id}" href="{href}">{title}</a></h3>
  </div></div>
  <ul class="threadstats td alt"><li>Replies: {replies}</li><li>Views: 1,000</li></ul>
  <dl class="threadlastpost td"><dd><a href="#">someone</a></dd><dd>01-15-2024, <span class="time">10:15 AM</span></dd></dl>
</li>"##,
                id = row.id,
                sticky = sticky,
                href = row.href,
                title = row.title,
                replies = row.replies,
            )
        })
        .collect();
    format!(
        r#"<html><head><title>Engine - Test Forum</title></head><body>
<ol id="threads" class="threads">{}</ol></body></html>"#,
        rows
    )
}

/// vBulletin 4 thread page with `(author, content)` posts.
pub fn vb_thread_page(title: &str, posts: &[(&str, &str)]) -> String {
    let posts: String = posts
        .iter()
        .enumerate()
        .map(|(i, (author, content))| {
            format!(
                r#"<li class="postbitlegacy postcontainer" id="post_{n}">
  <div class="posthead"><span class="date">01-1{day}-2024, <span class="time">08:00 AM</span></span>
    <a name="post{n}" class="postcounter">#{n}</a></div>
  <div class="userinfo"><a class="username" href="member.php?u={n}">{author}</a></div>
  <div id="post_message_{n}"><blockquote class="postcontent">{content}</blockquote></div>
</li>"#,
                n = i + 1,
                day = i.min(9),
                author = author,
                content = content,
            )
        })
        .collect();
    format!(
        r#"<html><head><title>{title} - Test Forum</title></head><body>
<div id="pagetitle"><h1>Thread: <span class="threadtitle">{title}</span></h1></div>
<ol id="posts" class="posts">{posts}</ol></body></html>"#,
        title = title,
        posts = posts
    )
}

/// Store that trips a cancellation token after its first save.
pub struct CancelAfterFirstSave {
    pub inner: Arc<MemoryThreadStore>,
    pub cancel: CancellationToken,
}

#[async_trait]
impl ThreadStore for CancelAfterFirstSave {
    async fn save_scraped_thread(
        &self,
        scrape_run_id: &str,
        forum_source_id: &str,
        thread: &Thread,
    ) -> StorageResult<()> {
        self.inner
            .save_scraped_thread(scrape_run_id, forum_source_id, thread)
            .await?;
        self.cancel.cancel();
        Ok(())
    }
}
