//! crates/meal_planner_core/src/observer.rs
//!
//! Ready-made `PersistenceObserver` implementations.

use crate::ports::{PersistenceEvent, PersistenceObserver};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Ignores every event. The persistence layer still logs them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl PersistenceObserver for NullObserver {
    fn notify(&self, _event: &PersistenceEvent) {}
}

/// Keeps the most recent events and a running count of dropped writes.
#[derive(Debug)]
pub struct RecordingObserver {
    capacity: usize,
    inner: Mutex<Recorded>,
}

#[derive(Debug, Default)]
struct Recorded {
    events: VecDeque<PersistenceEvent>,
    dropped_writes: u64,
}

impl RecordingObserver {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::default(),
        }
    }

    /// Recent events, oldest first.
    pub fn events(&self) -> Vec<PersistenceEvent> {
        self.inner
            .lock()
            .map(|r| r.events.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Writes abandoned since startup, including ones no longer in the history.
    pub fn dropped_writes(&self) -> u64 {
        self.inner.lock().map(|r| r.dropped_writes).unwrap_or(0)
    }
}

impl Default for RecordingObserver {
    fn default() -> Self {
        Self::new(64)
    }
}

impl PersistenceObserver for RecordingObserver {
    fn notify(&self, event: &PersistenceEvent) {
        let Ok(mut recorded) = self.inner.lock() else {
            return;
        };
        if matches!(event, PersistenceEvent::WriteDropped { .. }) {
            recorded.dropped_writes += 1;
        }
        if recorded.events.len() == self.capacity {
            recorded.events.pop_front();
        }
        recorded.events.push_back(event.clone());
    }
}
