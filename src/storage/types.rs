//! Type definitions for the storage abstraction layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Callback identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackId(pub String);

impl Default for CallbackId {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallbackId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CallbackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Event identifier, unique per recorded ping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered callback endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    pub id: CallbackId,
    pub display_name: String,
}

/// One timestamped status ping against a callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvent {
    pub callback_id: CallbackId,
    pub id: EventId,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl CallEvent {
    /// Create a new event with a fresh identifier
    pub fn new(callback_id: CallbackId, status: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            callback_id,
            id: EventId::new(),
            status: status.into(),
            created_at,
        }
    }
}

/// Storage health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub backend_type: String,
    pub message: Option<String>,
}

/// Storage metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageMetrics {
    pub callbacks_total: u64,
    pub events_total: u64,
    pub operations_total: u64,
    pub operations_failed: u64,
}
