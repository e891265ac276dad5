//! Service configuration
//!
//! Settings come from an optional TOML file and are then overridden by
//! `PINGBOARD_*` environment variables. Durations use humantime syntax
//! (`20m`, `90s`, `1h 30m`).
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0"
//! port = 8080
//!
//! [activity]
//! window = "1h"
//! bucket_width = "5m"
//!
//! [storage]
//! backend = "file"
//! backend_config = { base_dir = "/var/lib/pingboard" }
//! ```

use anyhow::{Context, Result};
use humantime_serde::re::humantime;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::activity::{ActivityResult, WindowSpec};
use crate::storage::StorageConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PingboardConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Rolling window settings for the activity chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    #[serde(with = "humantime_serde", default = "default_window")]
    pub window: Duration,
    #[serde(with = "humantime_serde", default = "default_bucket_width")]
    pub bucket_width: Duration,
    /// Upper bound on the event query behind one activity request
    #[serde(with = "humantime_serde", default = "default_query_timeout")]
    pub query_timeout: Duration,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            bucket_width: default_bucket_width(),
            query_timeout: default_query_timeout(),
        }
    }
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    5000
}

fn default_window() -> Duration {
    Duration::from_secs(20 * 60)
}

fn default_bucket_width() -> Duration {
    Duration::from_secs(60)
}

fn default_query_timeout() -> Duration {
    Duration::from_secs(5)
}

impl PingboardConfig {
    /// Load from `path` (if any), then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `PINGBOARD_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("PINGBOARD_BIND") {
            self.server.bind = bind
                .trim()
                .parse()
                .with_context(|| format!("Invalid PINGBOARD_BIND: {bind}"))?;
        }
        if let Some(port) = lookup("PINGBOARD_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PINGBOARD_PORT: {port}"))?;
        }
        if let Some(window) = lookup("PINGBOARD_WINDOW") {
            self.activity.window = parse_duration("PINGBOARD_WINDOW", &window)?;
        }
        if let Some(width) = lookup("PINGBOARD_BUCKET_WIDTH") {
            self.activity.bucket_width = parse_duration("PINGBOARD_BUCKET_WIDTH", &width)?;
        }
        if let Some(timeout) = lookup("PINGBOARD_QUERY_TIMEOUT") {
            self.activity.query_timeout = parse_duration("PINGBOARD_QUERY_TIMEOUT", &timeout)?;
        }

        self.storage.apply_overrides(&lookup);
        Ok(())
    }

    /// Validated window for the activity pipeline
    pub fn window_spec(&self) -> ActivityResult<WindowSpec> {
        WindowSpec::new(self.activity.window, self.activity.bucket_width)
    }
}

fn parse_duration(key: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim()).with_context(|| format!("Invalid {key}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityError;
    use crate::storage::{BackendConfig, BackendType};
    use serial_test::serial;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PingboardConfig::default();

        assert_eq!(config.server.socket_addr().to_string(), "127.0.0.1:5000");
        assert_eq!(config.activity.window, Duration::from_secs(1200));
        assert_eq!(config.activity.bucket_width, Duration::from_secs(60));
        assert_eq!(config.activity.query_timeout, Duration::from_secs(5));
        assert_eq!(config.window_spec().unwrap(), WindowSpec::reference());
    }

    #[test]
    fn test_parse_toml() {
        let config = PingboardConfig::from_toml(
            r#"
            [server]
            port = 8080

            [activity]
            window = "1h"
            bucket_width = "5m"

            [storage]
            backend = "memory"
            backend_config = { max_events_per_callback = 50 }
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, default_bind());
        assert_eq!(config.activity.window, Duration::from_secs(3600));
        assert_eq!(config.activity.query_timeout, Duration::from_secs(5));
        assert_eq!(config.window_spec().unwrap().bucket_count(), 12);
        assert_eq!(config.storage.backend, BackendType::Memory);
        match config.storage.backend_config {
            BackendConfig::Memory(memory) => assert_eq!(memory.max_events_per_callback, 50),
            BackendConfig::File(_) => panic!("Expected MemoryConfig"),
        }
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = PingboardConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.activity.window, Duration::from_secs(1200));
    }

    #[test]
    fn test_overrides() {
        let mut config = PingboardConfig::default();
        config
            .apply_overrides(lookup(&[
                ("PINGBOARD_BIND", "0.0.0.0"),
                ("PINGBOARD_PORT", "9000"),
                ("PINGBOARD_WINDOW", "10m"),
                ("PINGBOARD_BUCKET_WIDTH", "30s"),
                ("PINGBOARD_QUERY_TIMEOUT", "250ms"),
                ("PINGBOARD_STORAGE_TYPE", "memory"),
            ]))
            .unwrap();

        assert_eq!(config.server.socket_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.activity.window, Duration::from_secs(600));
        assert_eq!(config.activity.bucket_width, Duration::from_secs(30));
        assert_eq!(config.activity.query_timeout, Duration::from_millis(250));
        assert_eq!(config.window_spec().unwrap().bucket_count(), 20);
        assert_eq!(config.storage.backend, BackendType::Memory);
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let mut config = PingboardConfig::default();
        let err = config
            .apply_overrides(lookup(&[("PINGBOARD_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("PINGBOARD_PORT"));

        let err = config
            .apply_overrides(lookup(&[("PINGBOARD_WINDOW", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("PINGBOARD_WINDOW"));
    }

    #[test]
    fn test_window_spec_rejects_uneven_width() {
        let mut config = PingboardConfig::default();
        config.activity.bucket_width = Duration::from_secs(7 * 60);

        assert!(matches!(
            config.window_spec(),
            Err(ActivityError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 7000").unwrap();

        let config = PingboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 7000);

        let missing = PingboardConfig::from_file(Path::new("/nonexistent/pingboard.toml"));
        assert!(missing.is_err());
    }

    #[test]
    #[serial]
    fn test_load_reads_environment() {
        std::env::set_var("PINGBOARD_PORT", "6123");
        let config = PingboardConfig::load(None);
        std::env::remove_var("PINGBOARD_PORT");

        assert_eq!(config.unwrap().server.port, 6123);
    }
}
