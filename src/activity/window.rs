//! Time bucketing: the rolling window and its uniform bucket grid
//!
//! A window of length `W` with bucket width `B` ending at `now` yields
//! `W / B + 1` bucket timestamps. Both the first and the last minute of the
//! window get a bucket, so a 20 minute window at 1 minute granularity has 21
//! points: `trunc(now) - 20m, ..., trunc(now)`.
//!
//! Truncation happens on the UTC timeline against the Unix epoch, so it is
//! independent of any local time zone.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

use super::error::{ActivityError, ActivityResult};

/// Largest number of bucket widths a window may span
pub const MAX_BUCKETS: usize = 10_000;

/// Validated window length and bucket width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    window: Duration,
    bucket_width: Duration,
    width: TimeDelta,
    bucket_count: usize,
}

impl WindowSpec {
    /// Validate a window/bucket-width pair
    pub fn new(window: Duration, bucket_width: Duration) -> ActivityResult<Self> {
        let invalid = |reason: &str| ActivityError::invalid_window(window, bucket_width, reason);

        if window.is_zero() {
            return Err(invalid("window length must be positive"));
        }
        if bucket_width.is_zero() {
            return Err(invalid("bucket width must be positive"));
        }
        if bucket_width.subsec_nanos() != 0 {
            return Err(invalid("bucket width must be a whole number of seconds"));
        }
        if window.as_nanos() % bucket_width.as_nanos() != 0 {
            return Err(invalid("bucket width must evenly divide the window length"));
        }

        let width = TimeDelta::from_std(bucket_width)
            .map_err(|_| invalid("bucket width is out of range"))?;
        TimeDelta::from_std(window).map_err(|_| invalid("window length is out of range"))?;

        let bucket_count = window.as_nanos() / bucket_width.as_nanos();
        if bucket_count > MAX_BUCKETS as u128 {
            return Err(invalid(&format!(
                "window holds {bucket_count} buckets, at most {MAX_BUCKETS} are allowed"
            )));
        }

        Ok(Self {
            window,
            bucket_width,
            width,
            bucket_count: bucket_count as usize,
        })
    }

    /// The reference deployment: 20 minutes at 1 minute granularity
    pub fn reference() -> Self {
        Self {
            window: Duration::from_secs(20 * 60),
            bucket_width: Duration::from_secs(60),
            width: TimeDelta::minutes(1),
            bucket_count: 20,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn bucket_width(&self) -> Duration {
        self.bucket_width
    }

    /// Number of bucket widths in the window; the grid has one more point than this
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Truncate a timestamp down to the window's bucket boundary
    pub fn truncate(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        truncate_to(ts, self.width)
    }

    /// Build the ascending bucket grid ending at `truncate(now)`
    pub fn build_buckets(&self, now: DateTime<Utc>) -> BucketGrid {
        let end = self.truncate(now);
        let timestamps = (0..=self.bucket_count)
            .rev()
            .map(|i| end - self.width * i as i32)
            .collect();

        BucketGrid {
            timestamps,
            width: self.width,
        }
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self::reference()
    }
}

/// Floor `ts` to a multiple of `width` since the Unix epoch, dropping sub-second parts
fn truncate_to(ts: DateTime<Utc>, width: TimeDelta) -> DateTime<Utc> {
    let width_secs = width.num_seconds().max(1);
    let over = ts.timestamp().rem_euclid(width_secs);
    ts - TimeDelta::seconds(over) - TimeDelta::nanoseconds(i64::from(ts.timestamp_subsec_nanos()))
}

/// Ordered, equally spaced bucket timestamps covering one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketGrid {
    timestamps: Vec<DateTime<Utc>>,
    width: TimeDelta,
}

impl BucketGrid {
    /// Earliest bucket; also the inclusive lower bound for the store query
    pub fn start(&self) -> DateTime<Utc> {
        self.timestamps[0]
    }

    /// Latest bucket, equal to the truncated "now"
    pub fn end(&self) -> DateTime<Utc> {
        self.timestamps[self.timestamps.len() - 1]
    }

    pub fn width(&self) -> TimeDelta {
        self.width
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn iter(&self) -> impl Iterator<Item = &DateTime<Utc>> {
        self.timestamps.iter()
    }

    /// Truncate a raw event timestamp to this grid's granularity
    pub fn truncate(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        truncate_to(ts, self.width)
    }

    /// Index of the bucket whose timestamp equals `bucket` exactly
    pub fn position(&self, bucket: DateTime<Utc>) -> Option<usize> {
        if bucket < self.start() || bucket > self.end() {
            return None;
        }
        let offset = (bucket - self.start()).num_seconds() / self.width.num_seconds();
        let index = usize::try_from(offset).ok()?;
        (self.timestamps.get(index) == Some(&bucket)).then_some(index)
    }
}
