//! Helpers shared by the integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;

use pingboard::storage::{StorageConfig, StorageFactory, UnifiedStorage};

/// 2024-05-01 at `h:m:s` UTC
pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
}

/// File-backed storage in a fresh temporary directory
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub async fn file_storage() -> (Arc<dyn UnifiedStorage>, TempDir) {
    let dir = TempDir::new().unwrap();
    let storage = StorageFactory::from_config(&StorageConfig::file(dir.path()))
        .await
        .unwrap();
    (storage, dir)
}
