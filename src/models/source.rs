//! Forum source models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::scrapers::config::ForumScrapeConfig;
use crate::scrapers::error::{Result, ScrapeError};

/// Forum software family a source runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForumSoftware {
    #[default]
    #[serde(rename = "vbulletin")]
    VBulletin,
    #[serde(rename = "xenforo")]
    XenForo,
}

impl ForumSoftware {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VBulletin => "vbulletin",
            Self::XenForo => "xenforo",
        }
    }
}

impl fmt::Display for ForumSoftware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForumSoftware {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vbulletin" | "vb" => Ok(Self::VBulletin),
            "xenforo" | "xf" => Ok(Self::XenForo),
            other => Err(ScrapeError::Configuration(format!(
                "unknown forum software '{}'",
                other
            ))),
        }
    }
}

/// A third-party forum configured for scraping.
///
/// Owned by external configuration and immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumSource {
    /// Unique identifier for this source.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub software: ForumSoftware,
    /// Root URL that subforum paths are resolved against.
    pub base_url: String,
    #[serde(default)]
    pub scrape_config: ForumScrapeConfig,
}

impl ForumSource {
    pub fn new(id: &str, software: ForumSoftware, base_url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            software,
            base_url: base_url.to_string(),
            scrape_config: ForumScrapeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ForumScrapeConfig) -> Self {
        self.scrape_config = config;
        self
    }

    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Validate identity, base URL and scrape config.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ScrapeError::Configuration(
                "forum source id is empty".to_string(),
            ));
        }
        let parsed = Url::parse(&self.base_url).map_err(|e| {
            ScrapeError::Configuration(format!(
                "source {}: invalid base_url '{}' ({})",
                self.id, self.base_url, e
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScrapeError::Configuration(format!(
                "source {}: base_url must be http(s), got '{}'",
                self.id, self.base_url
            )));
        }
        self.scrape_config.validate().map_err(|e| match e {
            ScrapeError::Configuration(msg) => {
                ScrapeError::Configuration(format!("source {}: {}", self.id, msg))
            }
            other => other,
        })
    }
}
