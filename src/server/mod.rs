//! HTTP surface
//!
//! Callback management, ping ingestion and the activity chart over axum.

pub mod error;
pub mod handlers;

pub use error::ApiError;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::activity::{ActivityService, Clock, SystemClock};
use crate::callbacks::CallbackService;
use crate::config::PingboardConfig;
use crate::render::{ChartRenderer, SvgChartRenderer};
use crate::storage::{StorageFactory, UnifiedStorage};

/// Shared handler state
pub struct AppState {
    pub storage: Arc<dyn UnifiedStorage>,
    pub callbacks: CallbackService,
    pub activity: ActivityService,
    pub renderer: Arc<dyn ChartRenderer>,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn UnifiedStorage>,
        callbacks: CallbackService,
        activity: ActivityService,
        renderer: Arc<dyn ChartRenderer>,
    ) -> Self {
        Self {
            storage,
            callbacks,
            activity,
            renderer,
        }
    }

    /// Wire storage, the system clock and the SVG renderer from `config`
    ///
    /// Fails on an invalid window before any storage is touched.
    pub async fn from_config(config: &PingboardConfig) -> Result<Self> {
        let window = config.window_spec()?;
        let storage = StorageFactory::from_config(&config.storage)
            .await
            .context("Failed to initialize storage")?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        Ok(Self::new(
            storage.clone(),
            CallbackService::new(storage.clone(), clock.clone())
                .with_timeout(config.storage.timeout),
            ActivityService::new(storage, clock, window, config.activity.query_timeout),
            Arc::new(SvgChartRenderer::default()),
        ))
    }
}

/// Build the router over `state`
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::index).post(handlers::create_callback))
        .route(
            "/{id}/",
            get(handlers::get_callback)
                .post(handlers::manage_callback)
                .put(handlers::rename_callback)
                .delete(handlers::delete_callback),
        )
        .route("/{id}/call", get(handlers::record_call))
        .route("/{id}/img", get(handlers::activity_chart))
        .route("/{id}/activity", get(handlers::activity_table))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve_on<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("Pingboard listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Pingboard stopped");
    Ok(())
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(config: &PingboardConfig) -> Result<()> {
    let state = Arc::new(AppState::from_config(config).await?);
    let addr = config.server.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    serve_on(listener, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
