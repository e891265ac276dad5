//! Event fixtures for aggregation scenarios

use chrono::{DateTime, Duration, Utc};

use crate::storage::{CallEvent, CallbackId};

/// Builds batches of events for a single callback
pub struct EventBuilder {
    callback_id: CallbackId,
    events: Vec<CallEvent>,
}

impl EventBuilder {
    pub fn new(callback_id: impl Into<CallbackId>) -> Self {
        Self {
            callback_id: callback_id.into(),
            events: Vec::new(),
        }
    }

    /// One event with `status` at `ts`
    pub fn at(mut self, ts: DateTime<Utc>, status: &str) -> Self {
        self.events
            .push(CallEvent::new(self.callback_id.clone(), status, ts));
        self
    }

    /// `count` events with `status`, starting at `start` and spaced by `step`
    pub fn repeated(mut self, start: DateTime<Utc>, step: Duration, count: usize, status: &str) -> Self {
        let mut ts = start;
        for _ in 0..count {
            self.events
                .push(CallEvent::new(self.callback_id.clone(), status, ts));
            ts += step;
        }
        self
    }

    pub fn build(self) -> Vec<CallEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_repeated_spacing() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let events = EventBuilder::new("cb")
            .repeated(start, Duration::seconds(30), 4, "ok")
            .at(start, "error")
            .build();

        assert_eq!(events.len(), 5);
        assert_eq!(events[3].created_at, start + Duration::seconds(90));
        assert!(events.iter().all(|e| e.callback_id.as_str() == "cb"));
    }
}
