//! Forum crawling and extraction engine.
//!
//! Given a configured [`models::ForumSource`], a [`scrapers::ForumAdapter`]
//! walks its subforum list pages, decides which threads are worth fetching,
//! extracts posts, scores and tags the result, and hands each thread to a
//! [`storage::ThreadStore`].

pub mod config;
pub mod models;
pub mod scrapers;
pub mod storage;

pub use models::{ForumSoftware, ForumSource, Post, ScrapeResult, ScrapeRun, Thread};
pub use scrapers::{adapter_for, ForumAdapter, ScrapeError, ScrapeOptions};
pub use storage::{JsonLinesThreadStore, MemoryThreadStore, ThreadStore};
