//! Activity aggregation engine
//!
//! Turns an unordered snapshot of status events into a fixed-width,
//! gap-filled time series:
//!
//! 1. [`WindowSpec::build_buckets`] lays out the bucket grid ending at "now"
//! 2. [`aggregate`] counts events per bucket per status label
//! 3. [`assemble`] emits a rectangular [`ActivityTable`]
//!
//! [`ActivityService`] wires these to the event store and an injected clock.

pub mod aggregator;
pub mod clock;
pub mod error;
pub mod series;
pub mod service;
pub mod window;

pub use aggregator::{aggregate, Aggregation, BucketCounts, StatusLabels};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ActivityError, ActivityResult};
pub use series::{assemble, ActivityRow, ActivityTable};
pub use service::ActivityService;
pub use window::{BucketGrid, WindowSpec};
