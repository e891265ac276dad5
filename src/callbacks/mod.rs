//! Callback management and ping ingestion
//!
//! A callback is a named endpoint; every hit on it is recorded as a
//! [`CallEvent`] stamped with the injected clock. Renaming or deleting a
//! callback never touches its events.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::activity::{ActivityError, ActivityResult, Clock};
use crate::storage::{
    CallEvent, Callback, CallbackId, EventId, StorageError, StorageResult, UnifiedStorage,
};

/// Status recorded when a ping carries none
pub const UNKNOWN_STATUS: &str = "(unknown)";

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// CRUD for callbacks plus event ingestion
///
/// Every store call is bounded by the store timeout; expiry surfaces as
/// [`ActivityError::StoreUnavailable`].
#[derive(Clone)]
pub struct CallbackService {
    storage: Arc<dyn UnifiedStorage>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl CallbackService {
    pub fn new(storage: Arc<dyn UnifiedStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Bound each store call by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn create(&self, display_name: &str) -> ActivityResult<Callback> {
        let callback = self
            .bounded(
                "create callback",
                self.storage.callback_storage().create(display_name),
            )
            .await?;

        info!(callback_id = %callback.id, display_name, "Created callback");
        Ok(callback)
    }

    pub async fn get(&self, id: &CallbackId) -> ActivityResult<Callback> {
        self.bounded("load callback", self.storage.callback_storage().get(id))
            .await
    }

    pub async fn rename(&self, id: &CallbackId, display_name: &str) -> ActivityResult<Callback> {
        let callback = self
            .bounded(
                "rename callback",
                self.storage.callback_storage().rename(id, display_name),
            )
            .await?;

        info!(callback_id = %id, display_name, "Renamed callback");
        Ok(callback)
    }

    /// Remove the callback; its recorded events stay in the store
    pub async fn delete(&self, id: &CallbackId) -> ActivityResult<()> {
        self.bounded("delete callback", self.storage.callback_storage().delete(id))
            .await?;

        info!(callback_id = %id, "Deleted callback");
        Ok(())
    }

    /// Record one ping against `id`
    ///
    /// The callback is not looked up first; pings against unknown ids are
    /// stored like any other.
    pub async fn record_call(&self, id: &CallbackId, status: Option<&str>) -> ActivityResult<EventId> {
        let status = match status {
            Some(s) if !s.is_empty() => s,
            _ => UNKNOWN_STATUS,
        };
        let event = CallEvent::new(id.clone(), status, self.clock.now());
        let event_id = event.id.clone();

        self.bounded("record call", self.storage.event_storage().append(event))
            .await?;

        debug!(callback_id = %id, event_id = %event_id, status, "Recorded call");
        Ok(event_id)
    }

    async fn bounded<T, F>(&self, action: &str, op: F) -> ActivityResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        let result = match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(self.timeout)),
        };

        result.map_err(|err| {
            if !err.is_not_found() {
                warn!("Failed to {}: {}", action, err);
            }
            ActivityError::from(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityService, FixedClock, WindowSpec};
    use crate::storage::MemoryBackend;
    use crate::testing::{FailingStorage, SlowStorage};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    fn setup() -> (CallbackService, Arc<MemoryBackend>, Arc<FixedClock>) {
        let storage = Arc::new(MemoryBackend::default());
        let clock = Arc::new(FixedClock::new(at(10, 0, 0)));
        let service = CallbackService::new(storage.clone(), clock.clone());
        (service, storage, clock)
    }

    #[tokio::test]
    async fn test_create_get_rename_delete() {
        let (service, _, _) = setup();

        let callback = service.create("deploy hook").await.unwrap();
        assert_eq!(service.get(&callback.id).await.unwrap().display_name, "deploy hook");

        let renamed = service.rename(&callback.id, "deploys").await.unwrap();
        assert_eq!(renamed.id, callback.id);
        assert_eq!(renamed.display_name, "deploys");

        service.delete(&callback.id).await.unwrap();
        assert!(matches!(
            service.get(&callback.id).await,
            Err(ActivityError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_record_call_uses_clock_and_default_status() {
        let (service, storage, clock) = setup();
        let id = CallbackId::from("cb");

        service.record_call(&id, Some("ok")).await.unwrap();
        clock.advance(Duration::seconds(30));
        service.record_call(&id, None).await.unwrap();
        service.record_call(&id, Some("")).await.unwrap();

        let mut events = storage
            .event_storage()
            .query_recent(&id, at(0, 0, 0))
            .await
            .unwrap();
        events.sort_by_key(|e| e.created_at);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].status, "ok");
        assert_eq!(events[0].created_at, at(10, 0, 0));
        assert_eq!(events[1].status, UNKNOWN_STATUS);
        assert_eq!(events[2].created_at, at(10, 0, 30));
    }

    #[tokio::test]
    async fn test_record_call_returns_distinct_ids() {
        let (service, _, _) = setup();
        let id = CallbackId::from("cb");

        let first = service.record_call(&id, Some("ok")).await.unwrap();
        let second = service.record_call(&id, Some("ok")).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_rename_keeps_activity() {
        let storage = Arc::new(MemoryBackend::default());
        let clock = Arc::new(FixedClock::new(at(10, 7, 10)));
        let callbacks = CallbackService::new(storage.clone(), clock.clone());
        let activity = ActivityService::new(
            storage,
            clock.clone(),
            WindowSpec::reference(),
            std::time::Duration::from_secs(1),
        );

        let callback = callbacks.create("before").await.unwrap();
        callbacks.record_call(&callback.id, Some("ok")).await.unwrap();
        clock.set(at(10, 7, 40));
        callbacks.record_call(&callback.id, Some("ok")).await.unwrap();

        clock.set(at(10, 20, 37));
        let before = activity.activity(&callback.id).await.unwrap();
        callbacks.rename(&callback.id, "after").await.unwrap();
        let after = activity.activity(&callback.id).await.unwrap();

        assert_eq!(before, after);
        assert_eq!(after.count(at(10, 7, 0), "ok"), Some(2));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_unavailable() {
        let service = CallbackService::new(
            Arc::new(FailingStorage),
            Arc::new(FixedClock::new(at(10, 0, 0))),
        );

        let err = service
            .record_call(&CallbackId::from("cb"), Some("ok"))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(matches!(
            service.create("x").await,
            Err(ActivityError::StoreUnavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_store_times_out_on_ingestion() {
        let service = CallbackService::new(
            Arc::new(SlowStorage::new(std::time::Duration::from_secs(30))),
            Arc::new(FixedClock::new(at(10, 0, 0))),
        )
        .with_timeout(std::time::Duration::from_secs(2));

        match service.record_call(&CallbackId::from("cb"), Some("ok")).await {
            Err(ActivityError::StoreUnavailable(msg)) => assert!(msg.contains("Timeout")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            service.create("x").await,
            Err(ActivityError::StoreUnavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_within_timeout_succeeds() {
        let service = CallbackService::new(
            Arc::new(SlowStorage::new(std::time::Duration::from_millis(500))),
            Arc::new(FixedClock::new(at(10, 0, 0))),
        )
        .with_timeout(std::time::Duration::from_secs(2));

        let callback = service.create("patient").await.unwrap();
        service.record_call(&callback.id, None).await.unwrap();
        assert_eq!(service.get(&callback.id).await.unwrap().display_name, "patient");
    }
}
