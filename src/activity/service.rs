//! Activity pipeline: store snapshot → bucket grid → counts → table

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::aggregator::aggregate;
use super::clock::Clock;
use super::error::{ActivityError, ActivityResult};
use super::series::{assemble, ActivityTable};
use super::window::{BucketGrid, WindowSpec};
use crate::storage::{CallEvent, CallbackId, StorageError, UnifiedStorage};

/// Computes the rolling activity table for a callback
///
/// Holds no per-request state; share it behind an `Arc` across handlers.
#[derive(Clone)]
pub struct ActivityService {
    storage: Arc<dyn UnifiedStorage>,
    clock: Arc<dyn Clock>,
    window: WindowSpec,
    query_timeout: Duration,
}

impl ActivityService {
    pub fn new(
        storage: Arc<dyn UnifiedStorage>,
        clock: Arc<dyn Clock>,
        window: WindowSpec,
        query_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            clock,
            window,
            query_timeout,
        }
    }

    pub fn window(&self) -> &WindowSpec {
        &self.window
    }

    /// Activity table for the window ending now
    ///
    /// Does not check that the callback exists: an unknown id simply has
    /// no events and yields an all-zero table.
    pub async fn activity(&self, callback_id: &CallbackId) -> ActivityResult<ActivityTable> {
        let grid = self.window.build_buckets(self.clock.now());
        let events = self.fetch(callback_id, &grid).await?;

        let aggregation = aggregate(&events, &grid);
        debug!(
            callback_id = %callback_id,
            events = events.len(),
            labels = aggregation.labels().len(),
            dropped = aggregation.dropped(),
            "Aggregated activity"
        );

        Ok(assemble(aggregation.counts(), &grid, aggregation.labels()))
    }

    async fn fetch(&self, callback_id: &CallbackId, grid: &BucketGrid) -> ActivityResult<Vec<CallEvent>> {
        let query = self
            .storage
            .event_storage()
            .query_recent(callback_id, grid.start());

        let result = match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(self.query_timeout)),
        };

        result.map_err(|e| {
            warn!("Failed to query events for {}: {}", callback_id, e);
            ActivityError::StoreUnavailable(e.to_string())
        })
    }
}
