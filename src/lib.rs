//! # Pingboard
//!
//! Register named callbacks, record a status ping every time one is hit,
//! and chart each callback's recent activity as a rolling, gap-filled time
//! series.
//!
//! ## Usage
//!
//! ```bash
//! pingboard serve [--config pingboard.toml] [--port 5000]
//! curl 'http://127.0.0.1:5000/<id>/call?status=ok'
//! ```
//!
//! ## Modules
//!
//! - `activity` - Window bucketing, status aggregation and series assembly
//! - `app` - CLI-level configuration, logging and fatal error reporting
//! - `callbacks` - Callback management and ping ingestion
//! - `config` - Service configuration from TOML and environment
//! - `render` - Chart rendering for activity tables
//! - `server` - HTTP routes
//! - `storage` - Callback and event stores
//! - `testing` - Testing utilities and fixtures
pub mod activity;
pub mod app;
pub mod callbacks;
pub mod config;
pub mod render;
pub mod server;
pub mod storage;

pub mod testing;
