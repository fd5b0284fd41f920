//! Command-line runner: one adapter invocation per named source.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use forumscrape::config::{SourcesFile, DEFAULT_SOURCES_FILE};
use forumscrape::models::{ForumSource, ScrapeRun};
use forumscrape::scrapers::{adapter_for, ScrapeOptions};
use forumscrape::storage::JsonLinesThreadStore;

#[derive(Parser, Debug)]
#[command(name = "forumscrape")]
#[command(about = "Crawl automotive forums for vehicle reliability threads")]
#[command(version)]
pub struct Cli {
    /// Sources file (TOML or JSON)
    #[arg(short, long, env = "FORUMSCRAPE_CONFIG", default_value = DEFAULT_SOURCES_FILE)]
    config: PathBuf,

    /// Source IDs to scrape (repeatable)
    #[arg(short, long = "source", required = true)]
    sources: Vec<String>,

    /// Cap on threads fully scraped per source
    #[arg(long)]
    max_threads: Option<usize>,

    /// Only crawl these subforum paths (repeatable)
    #[arg(long = "subforum")]
    subforums: Vec<String>,

    /// JSON-lines file that scraped threads are appended to
    #[arg(short, long, env = "FORUMSCRAPE_OUTPUT", default_value = "threads.jsonl")]
    output: PathBuf,

    /// Run identifier recorded with every saved thread
    #[arg(long)]
    run_id: Option<String>,

    /// Cancel the whole run after this many seconds
    #[arg(long, env = "FORUMSCRAPE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Serialize)]
struct SourceSummary {
    source_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<ScrapeRun>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn select_sources(file: &SourcesFile, ids: &[String]) -> anyhow::Result<Vec<ForumSource>> {
    let mut selected = Vec::new();
    for id in ids {
        let Some(source) = file.find(id) else {
            bail!(
                "unknown source '{}' (configured: {})",
                id,
                file.ids().join(", ")
            );
        };
        source
            .validate()
            .with_context(|| format!("invalid configuration for source '{}'", id))?;
        selected.push(source.clone());
    }
    Ok(selected)
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file = SourcesFile::load_from_path(&cli.config).await?;
    let sources = select_sources(&file, &cli.sources)?;

    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| format!("run-{}", Utc::now().format("%Y%m%dT%H%M%SZ")));
    let store = Arc::new(JsonLinesThreadStore::new(&cli.output));
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing current request and stopping");
            ctrl_c.cancel();
        }
    });

    if let Some(secs) = cli.timeout_secs {
        let deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!("Run timeout of {}s reached, stopping", secs);
            deadline.cancel();
        });
    }

    let options = ScrapeOptions {
        max_threads: cli.max_threads,
        subforums: (!cli.subforums.is_empty()).then(|| cli.subforums.clone()),
        cancel: cancel.clone(),
    };

    info!(
        "Run {}: scraping {} source(s) into {}",
        run_id,
        sources.len(),
        cli.output.display()
    );

    let mut tasks = JoinSet::new();
    let mut task_sources = HashMap::new();
    for source in sources {
        let store = store.clone();
        let options = options.clone();
        let run_id = run_id.clone();
        let source_id = source.id.clone();
        let handle = tasks.spawn(async move {
            let mut run = ScrapeRun::new(&run_id);
            let adapter = adapter_for(source.software);
            let outcome = adapter
                .scrape(&source, &run, &options, store.as_ref())
                .await;
            match outcome {
                Ok(result) => {
                    run.record(&result);
                    SourceSummary {
                        source_id: source.id.clone(),
                        run: Some(run),
                        error: None,
                    }
                }
                Err(e) => {
                    error!("{}: {}", source.id, e);
                    SourceSummary {
                        source_id: source.id.clone(),
                        run: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        });
        task_sources.insert(handle.id(), source_id);
    }

    let mut summaries = Vec::new();
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, summary)) => summaries.push(summary),
            Err(e) => {
                let source_id = task_sources.remove(&e.id()).unwrap_or_default();
                error!("{}: scrape task failed: {}", source_id, e);
                summaries.push(SourceSummary {
                    source_id,
                    run: None,
                    error: Some(format!("scrape task failed: {}", e)),
                });
            }
        }
    }
    summaries.sort_by(|a, b| a.source_id.cmp(&b.source_id));

    println!("{}", serde_json::to_string_pretty(&summaries)?);

    let failed: Vec<&str> = summaries
        .iter()
        .filter(|s| s.error.is_some())
        .map(|s| s.source_id.as_str())
        .collect();
    if !failed.is_empty() {
        bail!("{} source(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}
