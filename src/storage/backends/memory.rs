//! In-memory storage backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{
    config::{BackendConfig, MemoryConfig, StorageConfig},
    error::{StorageError, StorageResult},
    traits::*,
    types::*,
};

/// In-memory storage backend
pub struct MemoryBackend {
    config: MemoryConfig,
    callbacks: Arc<RwLock<HashMap<CallbackId, Callback>>>,
    events: Arc<RwLock<HashMap<CallbackId, Vec<CallEvent>>>>,
    operations: AtomicU64,
}

impl MemoryBackend {
    /// Create a new memory backend
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        match &config.backend_config {
            BackendConfig::Memory(cfg) => Self::from_memory_config(cfg),
            _ => Err(StorageError::configuration(
                "Invalid backend config for memory storage",
            )),
        }
    }

    /// Create a new memory backend directly from MemoryConfig
    pub fn from_memory_config(config: &MemoryConfig) -> StorageResult<Self> {
        if config.max_events_per_callback == 0 {
            return Err(StorageError::configuration(
                "max_events_per_callback must be greater than zero",
            ));
        }

        Ok(Self {
            config: config.clone(),
            ..Self::default()
        })
    }

    fn record_operation(&self) {
        self.operations.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            config: MemoryConfig::default(),
            callbacks: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(HashMap::new())),
            operations: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl UnifiedStorage for MemoryBackend {
    fn callback_storage(&self) -> &dyn CallbackStorage {
        self
    }

    fn event_storage(&self) -> &dyn EventStorage {
        self
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        Ok(HealthStatus {
            healthy: true,
            backend_type: "memory".to_string(),
            message: None,
        })
    }

    async fn get_metrics(&self) -> StorageResult<StorageMetrics> {
        let callbacks_total = self.callbacks.read().await.len() as u64;
        let events_total = self
            .events
            .read()
            .await
            .values()
            .map(|events| events.len() as u64)
            .sum();

        Ok(StorageMetrics {
            callbacks_total,
            events_total,
            operations_total: self.operations.load(Ordering::Relaxed),
            operations_failed: 0,
        })
    }
}

#[async_trait]
impl CallbackStorage for MemoryBackend {
    async fn create(&self, display_name: &str) -> StorageResult<Callback> {
        self.record_operation();
        let callback = Callback {
            id: CallbackId::new(),
            display_name: display_name.to_string(),
        };
        self.callbacks
            .write()
            .await
            .insert(callback.id.clone(), callback.clone());
        Ok(callback)
    }

    async fn get(&self, id: &CallbackId) -> StorageResult<Callback> {
        self.record_operation();
        self.callbacks
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(format!("Callback not found: {}", id)))
    }

    async fn rename(&self, id: &CallbackId, display_name: &str) -> StorageResult<Callback> {
        self.record_operation();
        let mut callbacks = self.callbacks.write().await;
        if let Some(callback) = callbacks.get_mut(id) {
            callback.display_name = display_name.to_string();
            Ok(callback.clone())
        } else {
            Err(StorageError::not_found(format!("Callback not found: {}", id)))
        }
    }

    async fn delete(&self, id: &CallbackId) -> StorageResult<()> {
        self.record_operation();
        match self.callbacks.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(StorageError::not_found(format!("Callback not found: {}", id))),
        }
    }
}

#[async_trait]
impl EventStorage for MemoryBackend {
    async fn append(&self, event: CallEvent) -> StorageResult<()> {
        self.record_operation();
        let mut events = self.events.write().await;
        let log = events.entry(event.callback_id.clone()).or_default();
        log.push(event);

        let overflow = log.len().saturating_sub(self.config.max_events_per_callback);
        if overflow > 0 {
            log.drain(..overflow);
        }
        Ok(())
    }

    async fn query_recent(
        &self,
        callback_id: &CallbackId,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<CallEvent>> {
        self.record_operation();
        let events = self.events.read().await;
        Ok(events
            .get(callback_id)
            .map(|log| {
                log.iter()
                    .filter(|event| event.created_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, callback_id: &CallbackId) -> StorageResult<usize> {
        self.record_operation();
        Ok(self
            .events
            .read()
            .await
            .get(callback_id)
            .map(Vec::len)
            .unwrap_or(0))
    }
}
