//! Storage configuration types and utilities

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Storage backend type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// File-based storage (default)
    #[default]
    File,
    /// Memory storage (for testing and ephemeral deployments)
    Memory,
}

impl BackendType {
    /// Parse a backend name as accepted in `PINGBOARD_STORAGE_TYPE`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "file" => Some(Self::File),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Main storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend type
    #[serde(default)]
    pub backend: BackendType,

    /// Upper bound for a single callback or ingestion store call
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,

    /// Backend-specific configuration
    #[serde(default = "default_backend_config")]
    pub backend_config: BackendConfig,
}

/// Backend-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackendConfig {
    File(FileConfig),
    Memory(MemoryConfig),
}

impl BackendConfig {
    fn default_for(backend: &BackendType) -> Self {
        match backend {
            BackendType::File => Self::File(FileConfig::default()),
            BackendType::Memory => Self::Memory(MemoryConfig::default()),
        }
    }

    fn matches(&self, backend: &BackendType) -> bool {
        matches!(
            (self, backend),
            (Self::File(_), BackendType::File) | (Self::Memory(_), BackendType::Memory)
        )
    }
}

/// File storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Base directory for storage
    pub base_dir: PathBuf,

    /// Flush event appends to disk before acknowledging them
    #[serde(default)]
    pub sync_writes: bool,

    /// Events older than this are compacted out of the log; `None` keeps everything
    #[serde(with = "humantime_serde", default = "default_retention")]
    pub retention: Option<Duration>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            sync_writes: false,
            retention: default_retention(),
        }
    }
}

/// Memory storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Oldest events are discarded once a callback holds more than this many
    #[serde(default = "default_max_events")]
    pub max_events_per_callback: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_events_per_callback: default_max_events(),
        }
    }
}

// Default value functions for serde
fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retention() -> Option<Duration> {
    Some(Duration::from_secs(24 * 60 * 60))
}

fn default_max_events() -> usize {
    10_000
}

fn default_backend_config() -> BackendConfig {
    BackendConfig::File(FileConfig::default())
}

fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".pingboard"))
        .unwrap_or_else(|| std::env::temp_dir().join(".pingboard"))
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::default(),
            timeout: default_timeout(),
            backend_config: default_backend_config(),
        }
    }
}

impl StorageConfig {
    /// In-memory configuration, mostly useful for tests
    pub fn memory() -> Self {
        Self {
            backend: BackendType::Memory,
            backend_config: BackendConfig::Memory(MemoryConfig::default()),
            ..Default::default()
        }
    }

    /// File configuration rooted at `base_dir`
    pub fn file(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendType::File,
            backend_config: BackendConfig::File(FileConfig {
                base_dir: base_dir.into(),
                ..FileConfig::default()
            }),
            ..Default::default()
        }
    }

    /// Apply `PINGBOARD_STORAGE_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("PINGBOARD_STORAGE_TYPE").and_then(|s| BackendType::parse(&s)) {
            self.backend = backend;
        }

        if !self.backend_config.matches(&self.backend) {
            self.backend_config = BackendConfig::default_for(&self.backend);
        }

        if let Some(dir) = lookup("PINGBOARD_STORAGE_DIR") {
            if let BackendConfig::File(ref mut file_config) = self.backend_config {
                file_config.base_dir = PathBuf::from(dir);
            }
        }
    }
}
