//! Thread, post and listing records produced by extraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Posts with less cleaned content than this are discarded.
pub const MIN_POST_LENGTH: usize = 50;

/// Lightweight thread summary parsed from a list page.
///
/// Only used to decide whether to fetch the full thread; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadListing {
    pub title: String,
    /// Absolute thread URL.
    pub url: String,
    /// Preview text shown on the list page, if any.
    pub snippet: Option<String>,
    pub reply_count: u64,
    pub view_count: u64,
    pub last_reply_at: Option<DateTime<Utc>>,
    pub relevance_score: f64,
    pub vehicle_ids: Vec<String>,
}

impl ThreadListing {
    /// Title plus snippet, the text scored at listing time.
    pub fn listing_text(&self) -> String {
        match self.snippet {
            Some(ref snippet) if !snippet.is_empty() => format!("{} {}", self.title, snippet),
            _ => self.title.clone(),
        }
    }
}

/// One post within a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// 1-based position within the thread.
    pub position: u32,
    pub author: String,
    pub posted_at: Option<DateTime<Utc>>,
    /// Text with markup, scripts and quoted replies removed.
    pub content: String,
    pub is_opening_post: bool,
}

impl Post {
    /// Whether the cleaned content is long enough to keep.
    pub fn has_substance(&self) -> bool {
        self.content.chars().count() >= MIN_POST_LENGTH
    }
}

/// A fully scraped thread.
///
/// `reply_count` is always `posts.len() - 1`; relevance and vehicle ids are
/// computed from full content and supersede the listing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub title: String,
    pub url: String,
    pub subforum: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub last_reply_at: Option<DateTime<Utc>>,
    pub reply_count: u64,
    pub relevance_score: f64,
    pub vehicle_ids: Vec<String>,
    pub posts: Vec<Post>,
}

impl Thread {
    pub fn new(title: String, url: String, subforum: String, posts: Vec<Post>) -> Self {
        let reply_count = (posts.len() as u64).saturating_sub(1);
        let last_reply_at = posts.iter().filter_map(|p| p.posted_at).max();
        Self {
            title,
            url,
            subforum,
            posted_at: None,
            last_reply_at,
            reply_count,
            relevance_score: 0.0,
            vehicle_ids: Vec::new(),
            posts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
