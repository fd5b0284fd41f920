//! Forum scrape configuration types.
//!
//! These structs define the JSON/TOML-configurable behavior of a forum
//! source: which subforums to walk, how list pages are addressed, which
//! selectors override the platform defaults, and how threads are scored
//! and qualified before a full fetch.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use super::error::{Result, ScrapeError};

/// Default delay between requests to one forum source.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 2000;

/// Default number of list pages walked per subforum.
pub const DEFAULT_MAX_PAGES: u32 = 5;

/// Default HTTP timeout per request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Scrape configuration attached to a forum source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumScrapeConfig {
    /// Subforum path -> vehicle identifiers valid in that subforum.
    #[serde(default)]
    pub subforums: BTreeMap<String, Vec<String>>,
    /// Vehicle identifier -> alias strings used for tagging.
    /// Identifiers without an entry get aliases derived from the id itself.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub vehicle_aliases: HashMap<String, Vec<String>>,
    /// List page addressing. Platform default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationConfig>,
    #[serde(default, skip_serializing_if = "SelectorConfig::is_default")]
    pub selectors: SelectorConfig,
    /// Minimum delay between requests to this source, in milliseconds.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    /// Hard cap on list pages per subforum for one run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages_per_run: Option<u32>,
    #[serde(default)]
    pub relevance: RelevanceConfig,
    #[serde(default)]
    pub qualification: QualificationConfig,
    /// User agent configuration.
    /// - None: default crawler user agent
    /// - "browser" or "impersonate": a desktop browser user agent
    /// - Any other string: used verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_rate_limit_ms() -> u64 {
    DEFAULT_RATE_LIMIT_MS
}

impl Default for ForumScrapeConfig {
    fn default() -> Self {
        Self {
            subforums: BTreeMap::new(),
            vehicle_aliases: HashMap::new(),
            pagination: None,
            selectors: SelectorConfig::default(),
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            max_pages_per_run: None,
            relevance: RelevanceConfig::default(),
            qualification: QualificationConfig::default(),
            user_agent: None,
            timeout_secs: None,
        }
    }
}

impl ForumScrapeConfig {
    /// Pagination config, falling back to the platform default.
    pub fn pagination_or(&self, platform_default: &PaginationConfig) -> PaginationConfig {
        self.pagination
            .clone()
            .unwrap_or_else(|| platform_default.clone())
    }

    /// Effective page cap: the tighter of the pagination cap and the run cap.
    pub fn effective_max_pages(&self, pagination: &PaginationConfig) -> u32 {
        match (pagination.max_pages, self.max_pages_per_run) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => DEFAULT_MAX_PAGES,
        }
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Check deployment-level mistakes that must surface before any request.
    pub fn validate(&self) -> Result<()> {
        if self.subforums.is_empty() {
            return Err(ScrapeError::Configuration(
                "no subforums configured".to_string(),
            ));
        }
        if self.max_pages_per_run == Some(0) {
            return Err(ScrapeError::Configuration(
                "max_pages_per_run must be at least 1".to_string(),
            ));
        }
        if let Some(ref pagination) = self.pagination {
            pagination.validate()?;
        }
        self.selectors.validate()?;
        self.relevance.validate()?;
        Ok(())
    }
}

/// How page N of a thread-list view is addressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// `path/` for page 1, `path/indexN.html` afterwards.
    #[default]
    IndexHtml,
    /// `path/pageN/`.
    PagePath,
    /// `path?page=N`.
    QueryParam,
}

impl PaginationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IndexHtml => "index_html",
            Self::PagePath => "page_path",
            Self::QueryParam => "query_param",
        }
    }
}

impl fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaginationMode {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "index_html" => Ok(Self::IndexHtml),
            "page_path" => Ok(Self::PagePath),
            "query_param" => Ok(Self::QueryParam),
            other => Err(ScrapeError::Configuration(format!(
                "unknown pagination mode '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default)]
    pub mode: PaginationMode,
    /// Query parameter name for `query_param` mode.
    #[serde(default = "default_param_name")]
    pub param_name: String,
    /// Path segment prefix for `page_path` mode ("page" -> `/page2/`).
    #[serde(default = "default_segment")]
    pub segment: String,
    /// Whether `page_path` URLs end with a slash.
    #[serde(default = "default_true")]
    pub trailing_slash: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}

fn default_param_name() -> String {
    "page".to_string()
}

fn default_segment() -> String {
    "page".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            mode: PaginationMode::default(),
            param_name: default_param_name(),
            segment: default_segment(),
            trailing_slash: true,
            max_pages: None,
        }
    }
}

impl PaginationConfig {
    pub fn with_mode(mode: PaginationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_pages == Some(0) {
            return Err(ScrapeError::Configuration(
                "pagination.max_pages must be at least 1".to_string(),
            ));
        }
        match self.mode {
            PaginationMode::QueryParam if self.param_name.trim().is_empty() => {
                Err(ScrapeError::Configuration(
                    "query_param pagination needs a param_name".to_string(),
                ))
            }
            PaginationMode::PagePath if self.segment.trim().is_empty() => {
                Err(ScrapeError::Configuration(
                    "page_path pagination needs a segment".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Selector overrides. Unset fields use the platform defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default)]
    pub list: ListSelectorConfig,
    #[serde(default)]
    pub thread: ThreadSelectorConfig,
}

impl SelectorConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    fn validate(&self) -> Result<()> {
        let list = &self.list;
        let thread = &self.thread;
        let fields = [
            ("list.row", &list.row),
            ("list.title", &list.title),
            ("list.link", &list.link),
            ("list.snippet", &list.snippet),
            ("list.replies", &list.replies),
            ("list.views", &list.views),
            ("list.last_post", &list.last_post),
            ("list.pinned", &list.pinned),
            ("thread.post", &thread.post),
            ("thread.author", &thread.author),
            ("thread.date", &thread.date),
            ("thread.content", &thread.content),
            ("thread.post_number", &thread.post_number),
            ("thread.heading", &thread.heading),
            ("thread.thread_title", &thread.thread_title),
            ("thread.quote", &thread.quote),
        ];
        for (name, value) in fields {
            if let Some(css) = value {
                compile_selector(name, css)?;
            }
        }
        Ok(())
    }
}

/// Thread-list page selectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListSelectorConfig {
    /// One element per thread row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Element carrying the thread href (defaults to the title element).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Preview text; read from a `title` attribute when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_post: Option<String>,
    /// Marks sticky/announcement rows (matched on the row, its ancestors or descendants).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<String>,
}

/// Thread-content page selectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadSelectorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_title: Option<String>,
    /// Quoted-reply blocks stripped from post content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

/// Compile a CSS selector, naming the config field on failure.
pub fn compile_selector(field: &str, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| {
        ScrapeError::Configuration(format!("invalid selector for {}: '{}' ({})", field, css, e))
    })
}

/// How keyword terms are matched against thread text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMatch {
    #[default]
    WholeWord,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub term: String,
    #[serde(default = "default_keyword_weight")]
    pub weight: f64,
}

fn default_keyword_weight() -> f64 {
    1.0
}

impl KeywordRule {
    pub fn new(term: &str, weight: f64) -> Self {
        Self {
            term: term.to_string(),
            weight,
        }
    }
}

/// Weights for the relevance score.
///
/// `score = base + sum(weight of each keyword present)
///        + reply_weight * ln(1 + replies) + view_weight * ln(1 + views)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<KeywordRule>,
    #[serde(default)]
    pub match_mode: KeywordMatch,
    #[serde(default)]
    pub base: f64,
    #[serde(default = "default_reply_weight")]
    pub reply_weight: f64,
    #[serde(default = "default_view_weight")]
    pub view_weight: f64,
}

fn default_reply_weight() -> f64 {
    1.0
}

fn default_view_weight() -> f64 {
    0.5
}

fn default_keywords() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new("problem", 2.0),
        KeywordRule::new("issue", 2.0),
        KeywordRule::new("failure", 2.5),
        KeywordRule::new("recall", 2.5),
        KeywordRule::new("reliability", 2.0),
        KeywordRule::new("review", 1.5),
        KeywordRule::new("long term", 1.5),
        KeywordRule::new("ownership", 1.5),
        KeywordRule::new("maintenance", 1.0),
        KeywordRule::new("repair", 1.0),
        KeywordRule::new("warranty", 1.0),
        KeywordRule::new("mpg", 1.0),
    ]
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            match_mode: KeywordMatch::default(),
            base: 0.0,
            reply_weight: default_reply_weight(),
            view_weight: default_view_weight(),
        }
    }
}

impl RelevanceConfig {
    fn validate(&self) -> Result<()> {
        if self.reply_weight < 0.0 || self.view_weight < 0.0 {
            return Err(ScrapeError::Configuration(
                "relevance weights must not be negative".to_string(),
            ));
        }
        if let Some(rule) = self.keywords.iter().find(|k| k.term.trim().is_empty()) {
            return Err(ScrapeError::Configuration(format!(
                "empty keyword term (weight {})",
                rule.weight
            )));
        }
        Ok(())
    }
}

/// Bar a listed thread must clear before its full content is fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationConfig {
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,
    #[serde(default)]
    pub min_replies: u64,
    /// Skip threads whose known last reply is older than this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_days: Option<u32>,
}

fn default_min_relevance() -> f64 {
    1.0
}

impl Default for QualificationConfig {
    fn default() -> Self {
        Self {
            min_relevance: default_min_relevance(),
            min_replies: 0,
            max_age_days: None,
        }
    }
}
