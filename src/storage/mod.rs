//! Storage abstraction layer for Pingboard
//!
//! Callbacks and their status events live behind the [`UnifiedStorage`]
//! trait. Two backends are provided: an in-memory store and a directory of
//! JSON/JSONL files. Events are append-only; deleting a callback leaves its
//! events in place.

pub mod backends;
pub mod config;
pub mod error;
pub mod factory;
pub mod traits;
pub mod types;

pub use backends::{FileBackend, MemoryBackend};
pub use config::{BackendConfig, BackendType, FileConfig, MemoryConfig, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use factory::StorageFactory;
pub use traits::{CallbackStorage, EventStorage, UnifiedStorage};
pub use types::{
    CallEvent, Callback, CallbackId, EventId, HealthStatus, StorageMetrics,
};
