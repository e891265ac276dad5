//! Storage doubles for failure-path tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::storage::{
    CallEvent, Callback, CallbackId, CallbackStorage, EventStorage, HealthStatus, MemoryBackend,
    StorageError, StorageMetrics, StorageResult, UnifiedStorage,
};

/// A store that is always unreachable
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStorage;

fn unreachable_store<T>() -> StorageResult<T> {
    Err(StorageError::unavailable("connection refused"))
}

#[async_trait]
impl UnifiedStorage for FailingStorage {
    fn callback_storage(&self) -> &dyn CallbackStorage {
        self
    }

    fn event_storage(&self) -> &dyn EventStorage {
        self
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        Ok(HealthStatus {
            healthy: false,
            backend_type: "failing".to_string(),
            message: Some("connection refused".to_string()),
        })
    }

    async fn get_metrics(&self) -> StorageResult<StorageMetrics> {
        unreachable_store()
    }
}

#[async_trait]
impl CallbackStorage for FailingStorage {
    async fn create(&self, _display_name: &str) -> StorageResult<Callback> {
        unreachable_store()
    }

    async fn get(&self, _id: &CallbackId) -> StorageResult<Callback> {
        unreachable_store()
    }

    async fn rename(&self, _id: &CallbackId, _display_name: &str) -> StorageResult<Callback> {
        unreachable_store()
    }

    async fn delete(&self, _id: &CallbackId) -> StorageResult<()> {
        unreachable_store()
    }
}

#[async_trait]
impl EventStorage for FailingStorage {
    async fn append(&self, _event: CallEvent) -> StorageResult<()> {
        unreachable_store()
    }

    async fn query_recent(
        &self,
        _callback_id: &CallbackId,
        _since: DateTime<Utc>,
    ) -> StorageResult<Vec<CallEvent>> {
        unreachable_store()
    }

    async fn count(&self, _callback_id: &CallbackId) -> StorageResult<usize> {
        unreachable_store()
    }
}

/// An in-memory store whose callback and event operations stall for a fixed delay
pub struct SlowStorage {
    inner: MemoryBackend,
    delay: Duration,
}

impl SlowStorage {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryBackend::default(),
            delay,
        }
    }
}

#[async_trait]
impl UnifiedStorage for SlowStorage {
    fn callback_storage(&self) -> &dyn CallbackStorage {
        self
    }

    fn event_storage(&self) -> &dyn EventStorage {
        self
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.inner.health_check().await
    }

    async fn get_metrics(&self) -> StorageResult<StorageMetrics> {
        self.inner.get_metrics().await
    }
}

#[async_trait]
impl CallbackStorage for SlowStorage {
    async fn create(&self, display_name: &str) -> StorageResult<Callback> {
        tokio::time::sleep(self.delay).await;
        self.inner.create(display_name).await
    }

    async fn get(&self, id: &CallbackId) -> StorageResult<Callback> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(id).await
    }

    async fn rename(&self, id: &CallbackId, display_name: &str) -> StorageResult<Callback> {
        tokio::time::sleep(self.delay).await;
        self.inner.rename(id, display_name).await
    }

    async fn delete(&self, id: &CallbackId) -> StorageResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(id).await
    }
}

#[async_trait]
impl EventStorage for SlowStorage {
    async fn append(&self, event: CallEvent) -> StorageResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.append(event).await
    }

    async fn query_recent(
        &self,
        callback_id: &CallbackId,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<CallEvent>> {
        tokio::time::sleep(self.delay).await;
        self.inner.query_recent(callback_id, since).await
    }

    async fn count(&self, callback_id: &CallbackId) -> StorageResult<usize> {
        self.inner.count(callback_id).await
    }
}
