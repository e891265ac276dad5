//! File-based storage backend implementation
//!
//! Layout under the base directory:
//!
//! ```text
//! callbacks/<callback-id>.json   one JSON document per callback
//! events/<callback-id>.jsonl     append-only event log, one JSON object per line
//! ```
//!
//! Logs are read whole on every query. With a `retention` configured, a query
//! that finds at least half of a log older than the horizon rewrites that
//! log without the stale events, which keeps read cost proportional to the
//! retained history.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::storage::{
    config::{BackendConfig, FileConfig, StorageConfig},
    error::{StorageError, StorageResult},
    traits::*,
    types::*,
};

const CALLBACKS_DIR: &str = "callbacks";
const EVENTS_DIR: &str = "events";

/// File-based storage backend
pub struct FileBackend {
    config: FileConfig,
    base_dir: PathBuf,
    write_lock: Mutex<()>,
    operations: AtomicU64,
    failures: AtomicU64,
}

impl FileBackend {
    /// Create a new file backend
    pub async fn new(config: &StorageConfig) -> StorageResult<Self> {
        let file_config = match &config.backend_config {
            BackendConfig::File(cfg) => cfg.clone(),
            _ => {
                return Err(StorageError::configuration(
                    "Invalid backend config for file storage",
                ))
            }
        };

        let base_dir = file_config.base_dir.clone();
        fs::create_dir_all(base_dir.join(CALLBACKS_DIR)).await?;
        fs::create_dir_all(base_dir.join(EVENTS_DIR)).await?;

        Ok(Self {
            config: file_config,
            base_dir,
            write_lock: Mutex::new(()),
            operations: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        })
    }

    fn callback_path(&self, id: &CallbackId) -> StorageResult<PathBuf> {
        Ok(self
            .base_dir
            .join(CALLBACKS_DIR)
            .join(format!("{}.json", checked_key(id)?)))
    }

    fn events_path(&self, id: &CallbackId) -> StorageResult<PathBuf> {
        Ok(self
            .base_dir
            .join(EVENTS_DIR)
            .join(format!("{}.jsonl", checked_key(id)?)))
    }

    fn track<T>(&self, result: StorageResult<T>) -> StorageResult<T> {
        self.operations.fetch_add(1, Ordering::Relaxed);
        if matches!(&result, Err(err) if !err.is_not_found()) {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Read JSON file
    async fn read_json<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> StorageResult<T> {
        let content = fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(StorageError::serialization)
    }

    /// Write JSON file through a temporary file so readers never see a partial document
    async fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(data)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn load_callback(&self, id: &CallbackId) -> StorageResult<Callback> {
        let path = self.callback_path(id)?;
        match self.read_json(&path).await {
            Err(StorageError::Io(e)) if e.kind() == ErrorKind::NotFound => Err(
                StorageError::not_found(format!("Callback not found: {}", id)),
            ),
            other => other,
        }
    }

    /// Every readable event in the log of `id`, oldest first
    async fn read_log(&self, id: &CallbackId) -> StorageResult<Vec<CallEvent>> {
        let path = self.events_path(id)?;
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut lines = BufReader::new(file).lines();
        let mut events = Vec::new();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CallEvent>(&line) {
                Ok(event) => events.push(event),
                Err(e) => warn!("Skipping unreadable event line in {}: {}", path.display(), e),
            }
        }
        Ok(events)
    }

    fn retention_cutoff(&self) -> Option<DateTime<Utc>> {
        let retention = TimeDelta::from_std(self.config.retention?).ok()?;
        Utc::now().checked_sub_signed(retention)
    }

    /// Rewrite the log of `id` without the events created before `cutoff`
    ///
    /// Returns the number of events removed. Unreadable lines are dropped too.
    pub async fn compact(&self, id: &CallbackId, cutoff: DateTime<Utc>) -> StorageResult<usize> {
        let path = self.events_path(id)?;
        let _guard = self.write_lock.lock().await;

        let events = self.read_log(id).await?;
        let total = events.len();
        let mut content = String::new();
        for event in events.iter().filter(|e| e.created_at >= cutoff) {
            content.push_str(&serde_json::to_string(event)?);
            content.push('\n');
        }
        let removed = total - content.lines().count();
        if removed == 0 {
            return Ok(0);
        }

        let tmp = path.with_extension("jsonl.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;

        debug!(callback_id = %id, removed, "Compacted event log");
        Ok(removed)
    }
}

/// Callback ids become file names, so only accept a conservative alphabet
fn checked_key(id: &CallbackId) -> StorageResult<&str> {
    let key = id.as_str();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(key)
    } else {
        Err(StorageError::not_found(format!("Callback not found: {}", id)))
    }
}

#[async_trait]
impl UnifiedStorage for FileBackend {
    fn callback_storage(&self) -> &dyn CallbackStorage {
        self
    }

    fn event_storage(&self) -> &dyn EventStorage {
        self
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let healthy = fs::metadata(&self.base_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        Ok(HealthStatus {
            healthy,
            backend_type: "file".to_string(),
            message: (!healthy)
                .then(|| format!("Storage directory missing: {}", self.base_dir.display())),
        })
    }

    async fn get_metrics(&self) -> StorageResult<StorageMetrics> {
        let callbacks_total = count_entries(&self.base_dir.join(CALLBACKS_DIR), "json").await?;

        let mut events_total = 0u64;
        let mut entries = fs::read_dir(self.base_dir.join(EVENTS_DIR)).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().and_then(|s| s.to_str()) == Some("jsonl") {
                let content = fs::read_to_string(entry.path()).await?;
                events_total += content.lines().filter(|l| !l.trim().is_empty()).count() as u64;
            }
        }

        Ok(StorageMetrics {
            callbacks_total,
            events_total,
            operations_total: self.operations.load(Ordering::Relaxed),
            operations_failed: self.failures.load(Ordering::Relaxed),
        })
    }
}

async fn count_entries(dir: &Path, extension: &str) -> StorageResult<u64> {
    let mut count = 0;
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) == Some(extension) {
            count += 1;
        }
    }
    Ok(count)
}

#[async_trait]
impl CallbackStorage for FileBackend {
    async fn create(&self, display_name: &str) -> StorageResult<Callback> {
        let callback = Callback {
            id: CallbackId::new(),
            display_name: display_name.to_string(),
        };
        let result: StorageResult<Callback> = async {
            let path = self.callback_path(&callback.id)?;
            self.write_json(&path, &callback).await?;
            Ok::<_, StorageError>(callback)
        }
        .await;
        self.track(result)
    }

    async fn get(&self, id: &CallbackId) -> StorageResult<Callback> {
        let result = self.load_callback(id).await;
        self.track(result)
    }

    async fn rename(&self, id: &CallbackId, display_name: &str) -> StorageResult<Callback> {
        let result: StorageResult<Callback> = async {
            let _guard = self.write_lock.lock().await;
            let mut callback = self.load_callback(id).await?;
            callback.display_name = display_name.to_string();
            self.write_json(&self.callback_path(id)?, &callback).await?;
            Ok::<_, StorageError>(callback)
        }
        .await;
        self.track(result)
    }

    async fn delete(&self, id: &CallbackId) -> StorageResult<()> {
        let result: StorageResult<()> = async {
            let path = self.callback_path(id)?;
            // Serialized with rename so a concurrent rename cannot write the document back
            let _guard = self.write_lock.lock().await;
            match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::not_found(
                    format!("Callback not found: {}", id),
                )),
                Err(e) => Err(e.into()),
            }
        }
        .await;
        self.track(result)
    }
}

#[async_trait]
impl EventStorage for FileBackend {
    async fn append(&self, event: CallEvent) -> StorageResult<()> {
        let result: StorageResult<()> = async {
            let path = self.events_path(&event.callback_id)?;
            let mut line = serde_json::to_string(&event)?;
            line.push('\n');

            let _guard = self.write_lock.lock().await;
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            if self.config.sync_writes {
                file.sync_data().await?;
            } else {
                file.flush().await?;
            }
            Ok::<_, StorageError>(())
        }
        .await;
        self.track(result)
    }

    async fn query_recent(
        &self,
        callback_id: &CallbackId,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<CallEvent>> {
        let result: StorageResult<Vec<CallEvent>> = async {
            // An id that could never have been stored has no events
            if checked_key(callback_id).is_err() {
                return Ok(Vec::new());
            }

            let events = self.read_log(callback_id).await?;
            if let Some(cutoff) = self.retention_cutoff() {
                // Never compact away anything this query asked for
                let cutoff = cutoff.min(since);
                let stale = events.iter().filter(|e| e.created_at < cutoff).count();
                if stale > 0 && stale * 2 >= events.len() {
                    if let Err(e) = self.compact(callback_id, cutoff).await {
                        warn!("Failed to compact events for {}: {}", callback_id, e);
                    }
                }
            }

            Ok::<_, StorageError>(
                events
                    .into_iter()
                    .filter(|event| event.created_at >= since)
                    .collect(),
            )
        }
        .await;
        self.track(result)
    }

    async fn count(&self, callback_id: &CallbackId) -> StorageResult<usize> {
        let result = match checked_key(callback_id) {
            Ok(_) => self.read_log(callback_id).await.map(|e| e.len()),
            Err(_) => Ok(0),
        };
        self.track(result)
    }
}
