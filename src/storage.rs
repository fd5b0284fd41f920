//! Persistence seam for scraped threads.
//!
//! Adapters hand every non-empty thread to a [`ThreadStore`]. Upsert
//! semantics (thread URL as the natural key) belong to the store, so the
//! same thread may be saved again on a later run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::models::Thread;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Rejected thread {url}: {reason}")]
    Rejected { url: String, reason: String },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Collaborator that persists scraped threads.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Save (or upsert) one thread scraped during `scrape_run_id` from
    /// `forum_source_id`.
    async fn save_scraped_thread(
        &self,
        scrape_run_id: &str,
        forum_source_id: &str,
        thread: &Thread,
    ) -> StorageResult<()>;
}

/// A thread as persisted, tagged with the run and source it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredThread {
    pub scrape_run_id: String,
    pub forum_source_id: String,
    pub saved_at: DateTime<Utc>,
    pub thread: Thread,
}

impl StoredThread {
    fn new(scrape_run_id: &str, forum_source_id: &str, thread: &Thread) -> Self {
        Self {
            scrape_run_id: scrape_run_id.to_string(),
            forum_source_id: forum_source_id.to_string(),
            saved_at: Utc::now(),
            thread: thread.clone(),
        }
    }
}

/// In-memory store keyed by thread URL. Later saves replace earlier ones.
#[derive(Debug, Default)]
pub struct MemoryThreadStore {
    threads: Mutex<HashMap<String, StoredThread>>,
    saves: Mutex<u64>,
}

impl MemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of stored threads, ordered by URL.
    pub async fn threads(&self) -> Vec<StoredThread> {
        let threads = self.threads.lock().await;
        let mut all: Vec<StoredThread> = threads.values().cloned().collect();
        all.sort_by(|a, b| a.thread.url.cmp(&b.thread.url));
        all
    }

    pub async fn get(&self, url: &str) -> Option<StoredThread> {
        self.threads.lock().await.get(url).cloned()
    }

    pub async fn len(&self) -> usize {
        self.threads.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.threads.lock().await.is_empty()
    }

    /// Number of save calls, including upserts of an existing URL.
    pub async fn save_count(&self) -> u64 {
        *self.saves.lock().await
    }
}

#[async_trait]
impl ThreadStore for MemoryThreadStore {
    async fn save_scraped_thread(
        &self,
        scrape_run_id: &str,
        forum_source_id: &str,
        thread: &Thread,
    ) -> StorageResult<()> {
        let record = StoredThread::new(scrape_run_id, forum_source_id, thread);
        self.threads
            .lock()
            .await
            .insert(thread.url.clone(), record);
        *self.saves.lock().await += 1;
        Ok(())
    }
}

/// Appends one JSON object per saved thread to a file.
///
/// Deduplication by URL is left to whoever loads the file; the last line
/// for a URL wins.
pub struct JsonLinesThreadStore {
    path: PathBuf,
    file: Mutex<Option<tokio::fs::File>>,
}

impl JsonLinesThreadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back stored records, keeping the last one per URL.
    pub async fn load(path: &Path) -> StorageResult<Vec<StoredThread>> {
        let contents = tokio::fs::read_to_string(path).await?;
        let mut by_url: HashMap<String, usize> = HashMap::new();
        let mut records: Vec<StoredThread> = Vec::new();
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            let record: StoredThread = serde_json::from_str(line)?;
            match by_url.get(&record.thread.url) {
                Some(&idx) => records[idx] = record,
                None => {
                    by_url.insert(record.thread.url.clone(), records.len());
                    records.push(record);
                }
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl ThreadStore for JsonLinesThreadStore {
    async fn save_scraped_thread(
        &self,
        scrape_run_id: &str,
        forum_source_id: &str,
        thread: &Thread,
    ) -> StorageResult<()> {
        if thread.url.is_empty() {
            return Err(StorageError::Rejected {
                url: thread.url.clone(),
                reason: "thread has no URL".to_string(),
            });
        }

        let record = StoredThread::new(scrape_run_id, forum_source_id, thread);
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            *guard = Some(file);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
        }
        Ok(())
    }
}
