//! Thread relevance scoring.
//!
//! A weighted sum of keyword hits and logarithmic engagement. Used twice per
//! thread: on the listing (cheap, decides whether to fetch) and on the full
//! content (stored as the thread's score).

use regex::Regex;
use tracing::warn;

use super::config::{KeywordMatch, RelevanceConfig};

struct CompiledKeyword {
    pattern: Regex,
    weight: f64,
}

/// Relevance scorer with keyword patterns compiled once per source.
pub struct RelevanceScorer {
    keywords: Vec<CompiledKeyword>,
    base: f64,
    reply_weight: f64,
    view_weight: f64,
}

impl RelevanceScorer {
    pub fn new(config: &RelevanceConfig) -> Self {
        let keywords = config
            .keywords
            .iter()
            .filter_map(|rule| {
                let escaped = regex::escape(rule.term.trim());
                let pattern = match config.match_mode {
                    KeywordMatch::WholeWord => format!(r"(?i)\b{}\b", escaped),
                    KeywordMatch::Substring => format!("(?i){}", escaped),
                };
                match Regex::new(&pattern) {
                    Ok(pattern) => Some(CompiledKeyword {
                        pattern,
                        weight: rule.weight,
                    }),
                    Err(e) => {
                        warn!("Ignoring keyword '{}': {}", rule.term, e);
                        None
                    }
                }
            })
            .collect();

        Self {
            keywords,
            base: config.base,
            reply_weight: config.reply_weight,
            view_weight: config.view_weight,
        }
    }

    /// Score `text` with the given engagement counts.
    ///
    /// Each keyword contributes its weight once when present, so long
    /// threads are not rewarded for repetition.
    pub fn score(&self, text: &str, reply_count: u64, view_count: u64) -> f64 {
        let keyword_score: f64 = self
            .keywords
            .iter()
            .filter(|k| k.pattern.is_match(text))
            .map(|k| k.weight)
            .sum();

        let engagement = self.reply_weight * (1.0 + reply_count as f64).ln()
            + self.view_weight * (1.0 + view_count as f64).ln();

        (self.base + keyword_score + engagement).max(0.0)
    }
}

/// One-shot scoring without keeping the compiled scorer around.
pub fn score(text: &str, reply_count: u64, view_count: u64, config: &RelevanceConfig) -> f64 {
    RelevanceScorer::new(config).score(text, reply_count, view_count)
}
