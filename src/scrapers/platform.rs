//! Forum software families.
//!
//! A platform supplies default selectors and pagination for its page
//! skeleton, plus the handful of element-level quirks that differ between
//! families. Crawling, scoring and tagging are shared.

use scraper::ElementRef;

use super::config::{PaginationConfig, SelectorConfig};
use super::extract::text::{inline_text, normalize_whitespace, parse_count};
use crate::models::ForumSoftware;

/// Attributes checked for machine-readable timestamps, in order.
const TIMESTAMP_ATTRS: &[&str] = &["data-time", "datetime", "data-timestamp", "data-date"];

pub trait ForumPlatform: Send + Sync {
    fn software(&self) -> ForumSoftware;

    /// Selectors for the family's stock templates.
    fn default_selectors(&self) -> SelectorConfig;

    fn default_pagination(&self) -> PaginationConfig;

    /// Thread title as shown in a list row or heading element.
    fn title_text(&self, element: ElementRef<'_>) -> String {
        inline_text(element)
    }

    /// Raw timestamp text for the date parser.
    ///
    /// Machine-readable attributes win over rendered text.
    fn timestamp_text(&self, element: ElementRef<'_>) -> String {
        let attrs = element.value();
        for name in TIMESTAMP_ATTRS {
            if let Some(value) = attrs.attr(name) {
                if !value.trim().is_empty() {
                    return value.to_string();
                }
            }
        }
        inline_text(element)
    }

    /// Explicit post ordinal, if the element carries one.
    fn post_number(&self, element: ElementRef<'_>) -> Option<u32> {
        let number = parse_count(&inline_text(element));
        u32::try_from(number).ok().filter(|n| *n > 0)
    }

    /// List-row preview text.
    fn snippet_text(&self, element: ElementRef<'_>) -> Option<String> {
        let text = match element.value().attr("title") {
            Some(title) => normalize_whitespace(title),
            None => inline_text(element),
        };
        (!text.is_empty()).then_some(text)
    }
}
