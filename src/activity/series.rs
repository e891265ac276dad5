//! Series assembly: shape aggregated counts into a rectangular table
//!
//! The table always has one row per bucket and one column per observed
//! status label. Column order is lexicographic and identical for every row,
//! so a chart renderer can key series colors on the column index.

use chrono::{DateTime, Utc};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

use super::aggregator::{BucketCounts, StatusLabels};
use super::window::BucketGrid;

/// One bucket of the activity table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRow {
    pub timestamp: DateTime<Utc>,
    counts: Vec<u64>,
}

impl ActivityRow {
    /// Counts aligned with [`ActivityTable::columns`]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Gap-filled activity time series for one callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityTable {
    columns: Vec<String>,
    rows: Vec<ActivityRow>,
}

impl ActivityTable {
    /// Status labels, in the order used by every row
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ActivityRow] {
        &self.rows
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Count for the row at `timestamp` and column `label`
    pub fn count(&self, timestamp: DateTime<Utc>, label: &str) -> Option<u64> {
        let col = self.column_index(label)?;
        self.rows
            .iter()
            .find(|row| row.timestamp == timestamp)
            .map(|row| row.counts[col])
    }

    /// All counts of one column, in row order
    pub fn series(&self, label: &str) -> Option<Vec<u64>> {
        let col = self.column_index(label)?;
        Some(self.rows.iter().map(|row| row.counts[col]).collect())
    }

    /// Largest single cell, zero for an empty table
    pub fn max_count(&self) -> u64 {
        self.rows
            .iter()
            .flat_map(|row| row.counts.iter().copied())
            .max()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().map(ActivityRow::total).sum()
    }
}

/// Build the table for `grid` with one column per label in `labels`
///
/// Buckets or labels missing from `counts` are filled with zero, so the
/// output is rectangular even for a sparse or empty aggregation.
pub fn assemble(counts: &BucketCounts, grid: &BucketGrid, labels: &StatusLabels) -> ActivityTable {
    let columns: Vec<String> = labels.iter().map(str::to_string).collect();

    let rows = grid
        .iter()
        .map(|ts| {
            let per_label = counts.get(ts);
            let counts = columns
                .iter()
                .map(|label| {
                    per_label
                        .and_then(|m| m.get(label))
                        .copied()
                        .unwrap_or(0)
                })
                .collect();
            ActivityRow {
                timestamp: *ts,
                counts,
            }
        })
        .collect();

    ActivityTable { columns, rows }
}

#[derive(Serialize)]
struct SerializedRow<'a> {
    timestamp: DateTime<Utc>,
    counts: BTreeMap<&'a str, u64>,
}

impl Serialize for ActivityTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<SerializedRow<'_>> = self
            .rows
            .iter()
            .map(|row| SerializedRow {
                timestamp: row.timestamp,
                counts: self
                    .columns
                    .iter()
                    .map(String::as_str)
                    .zip(row.counts.iter().copied())
                    .collect(),
            })
            .collect();

        let mut state = serializer.serialize_struct("ActivityTable", 2)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}
