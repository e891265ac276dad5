//! Error taxonomy for the activity pipeline and the callback-facing surface

use std::time::Duration;
use thiserror::Error;

use crate::storage::StorageError;

/// Result type for activity and callback operations
pub type ActivityResult<T> = Result<T, ActivityError>;

#[derive(Error, Debug)]
pub enum ActivityError {
    /// The store could not be reached, errored or timed out. Transient.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A callback lookup found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Window and bucket width do not describe a usable grid
    #[error("Invalid window ({window:?} / {bucket_width:?}): {reason}")]
    InvalidWindow {
        window: Duration,
        bucket_width: Duration,
        reason: String,
    },
}

impl ActivityError {
    pub fn invalid_window(window: Duration, bucket_width: Duration, reason: impl Into<String>) -> Self {
        Self::InvalidWindow {
            window,
            bucket_width,
            reason: reason.into(),
        }
    }

    /// Whether the caller should retry later
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<StorageError> for ActivityError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => Self::NotFound(what),
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}
