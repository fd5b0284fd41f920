//! Data models for forum scraping.

mod run;
mod source;
mod thread;

pub use run::{ScrapeResult, ScrapeRun};
pub use source::{ForumSoftware, ForumSource};
pub use thread::{Post, Thread, ThreadListing, MIN_POST_LENGTH};
