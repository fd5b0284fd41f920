//! Source list loading for the command-line runner.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::ForumSource;
use crate::scrapers::error::{Result, ScrapeError};

/// Default location of the sources file.
pub const DEFAULT_SOURCES_FILE: &str = "sources.toml";

/// Environment variable naming the sources file.
pub const SOURCES_FILE_ENV: &str = "FORUMSCRAPE_CONFIG";

/// Forum sources declared in a TOML (`[[sources]]`) or JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcesFile {
    #[serde(default)]
    pub sources: Vec<ForumSource>,
    /// Where the file was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl SourcesFile {
    /// Load and parse by extension: `.toml`, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            ScrapeError::Configuration(format!(
                "failed to read sources file {}: {}",
                path.display(),
                e
            ))
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut file = Self::parse(&contents, ext).map_err(|e| match e {
            ScrapeError::Configuration(msg) => {
                ScrapeError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        file.source_path = Some(path.to_path_buf());
        Ok(file)
    }

    /// Parse file contents in the given format (`toml` or `json`).
    pub fn parse(contents: &str, format: &str) -> Result<Self> {
        let file: SourcesFile = match format {
            "toml" => toml::from_str(contents)
                .map_err(|e| ScrapeError::Configuration(format!("invalid TOML: {}", e)))?,
            _ => serde_json::from_str(contents)
                .map_err(|e| ScrapeError::Configuration(format!("invalid JSON: {}", e)))?,
        };

        let mut ids: Vec<&str> = file.sources.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        if let Some(dup) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(ScrapeError::Configuration(format!(
                "duplicate source id '{}'",
                dup[0]
            )));
        }
        Ok(file)
    }

    pub fn find(&self, id: &str) -> Option<&ForumSource> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.id.as_str()).collect()
    }
}
