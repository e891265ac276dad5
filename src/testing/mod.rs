//! Testing utilities and fixtures
//!
//! Shared by unit tests and the integration tests under `tests/`: a test
//! context wiring services to an in-memory store and a pinned clock, store
//! doubles that fail or stall, and event builders.

pub mod fixtures;
pub mod mocks;

pub use fixtures::EventBuilder;
pub use mocks::{FailingStorage, SlowStorage};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::activity::{ActivityService, FixedClock, WindowSpec};
use crate::callbacks::CallbackService;
use crate::storage::{MemoryBackend, UnifiedStorage};

/// Services wired to one in-memory store and one fixed clock
pub struct TestContext {
    pub storage: Arc<dyn UnifiedStorage>,
    pub clock: Arc<FixedClock>,
    pub callbacks: CallbackService,
    pub activity: ActivityService,
}

impl TestContext {
    /// Reference window, clock pinned at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_storage(Arc::new(MemoryBackend::default()), now)
    }

    /// Reference window over a caller-provided store
    pub fn with_storage(storage: Arc<dyn UnifiedStorage>, now: DateTime<Utc>) -> Self {
        let clock = Arc::new(FixedClock::new(now));
        let callbacks = CallbackService::new(storage.clone(), clock.clone());
        let activity = ActivityService::new(
            storage.clone(),
            clock.clone(),
            WindowSpec::reference(),
            Duration::from_secs(1),
        );

        Self {
            storage,
            clock,
            callbacks,
            activity,
        }
    }
}
