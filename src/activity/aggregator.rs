//! Status aggregation: count events per bucket per status label
//!
//! Status labels are free-form and only known from the data, so the label
//! set is computed once per call and carried alongside the counts. Every
//! bucket holds a count for every label (zero when absent), which keeps the
//! result rectangular.
//!
//! Events whose truncated timestamp matches no bucket are dropped. This
//! happens when an event lands between computing the window and running the
//! store query (or with clock skew between writers); the next request picks
//! it up, so no attempt is made to widen the window after the fact.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::window::BucketGrid;
use crate::storage::CallEvent;

/// Per-bucket counts keyed by status label
pub type BucketCounts = BTreeMap<DateTime<Utc>, BTreeMap<String, u64>>;

/// Distinct status labels observed in one snapshot, in lexicographic order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLabels(BTreeSet<String>);

impl StatusLabels {
    /// Collect the labels of every supplied event
    pub fn from_events(events: &[CallEvent]) -> Self {
        Self(events.iter().map(|e| e.status.clone()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for StatusLabels {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Result of aggregating one event snapshot over one bucket grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    labels: StatusLabels,
    counts: BucketCounts,
    dropped: usize,
}

impl Aggregation {
    pub fn labels(&self) -> &StatusLabels {
        &self.labels
    }

    pub fn counts(&self) -> &BucketCounts {
        &self.counts
    }

    /// Count for one bucket and label, `None` if either is unknown
    pub fn count(&self, bucket: DateTime<Utc>, label: &str) -> Option<u64> {
        self.counts.get(&bucket)?.get(label).copied()
    }

    /// Events that fell outside the grid
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Count `events` into the buckets of `grid`
pub fn aggregate(events: &[CallEvent], grid: &BucketGrid) -> Aggregation {
    let labels = StatusLabels::from_events(events);
    let index: BTreeMap<&str, usize> = labels.iter().enumerate().map(|(i, l)| (l, i)).collect();

    let mut matrix = vec![vec![0u64; labels.len()]; grid.len()];
    let mut dropped = 0;

    for event in events {
        let bucket = grid.truncate(event.created_at);
        match (grid.position(bucket), index.get(event.status.as_str())) {
            (Some(row), Some(&col)) => matrix[row][col] += 1,
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(
            dropped,
            window_start = %grid.start(),
            window_end = %grid.end(),
            "Dropped events outside the activity window"
        );
    }

    let counts = grid
        .iter()
        .zip(matrix)
        .map(|(ts, row)| {
            let per_label = labels
                .iter()
                .zip(row)
                .map(|(label, count)| (label.to_string(), count))
                .collect();
            (*ts, per_label)
        })
        .collect();

    Aggregation {
        labels,
        counts,
        dropped,
    }
}
