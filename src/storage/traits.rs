//! Core trait definitions for the storage abstraction layer

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StorageResult;
use super::types::*;

/// Unified storage interface providing access to all storage subsystems
#[async_trait]
pub trait UnifiedStorage: Send + Sync {
    /// Get the callback storage implementation
    fn callback_storage(&self) -> &dyn CallbackStorage;

    /// Get the event storage implementation
    fn event_storage(&self) -> &dyn EventStorage;

    /// Check the health of the storage backend
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Get backend-specific metrics
    async fn get_metrics(&self) -> StorageResult<StorageMetrics>;
}

/// Callback entity operations
#[async_trait]
pub trait CallbackStorage: Send + Sync {
    /// Register a new callback under a fresh identifier
    async fn create(&self, display_name: &str) -> StorageResult<Callback>;

    /// Load a callback, failing with `NotFound` if absent
    async fn get(&self, id: &CallbackId) -> StorageResult<Callback>;

    /// Change the display name of an existing callback
    async fn rename(&self, id: &CallbackId, display_name: &str) -> StorageResult<Callback>;

    /// Remove a callback. Events recorded against it are left in place.
    async fn delete(&self, id: &CallbackId) -> StorageResult<()>;
}

/// Append-only event log keyed by callback
#[async_trait]
pub trait EventStorage: Send + Sync {
    /// Append a single event
    async fn append(&self, event: CallEvent) -> StorageResult<()>;

    /// All events for `callback_id` created at or after `since`, in no particular order
    async fn query_recent(
        &self,
        callback_id: &CallbackId,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<CallEvent>>;

    /// Total number of events stored for a callback
    async fn count(&self, callback_id: &CallbackId) -> StorageResult<usize>;
}
