//! Bounded per-camera event buffers.
//!
//! Each camera gets its own FIFO ring of recent events so a burst on one
//! camera cannot evict another camera's history. Capacity is fixed at
//! construction and applies per camera.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use tracing::trace;

use camhub_models::DetectionEvent;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Per-camera bounded history of detection events.
pub struct EventHistory {
    capacity: usize,
    events: HashMap<String, VecDeque<DetectionEvent>>,
}

impl EventHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            events: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an event to its camera's buffer, evicting the oldest entry
    /// once the buffer is full.
    pub fn append(&mut self, event: DetectionEvent) {
        let buffer = self.events.entry(event.camera_id.clone()).or_default();
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        trace!(camera_id = %event.camera_id, buffered = buffer.len() + 1, "event buffered");
        buffer.push_back(event);
    }

    /// All buffered events for a camera, newest first.
    pub fn snapshot(&self, camera_id: &str) -> Vec<DetectionEvent> {
        self.events
            .get(camera_id)
            .map(|buffer| buffer.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Buffered events for a camera no older than `window_minutes` before
    /// `now`, newest first.
    pub fn recent(
        &self,
        camera_id: &str,
        window_minutes: i64,
        now: DateTime<Utc>,
    ) -> Vec<DetectionEvent> {
        let cutoff = now - Duration::minutes(window_minutes);
        self.events
            .get(camera_id)
            .map(|buffer| {
                buffer
                    .iter()
                    .rev()
                    .filter(|e| e.timestamp >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Count zone occurrences across a slice of events.
    pub fn zone_tally(events: &[DetectionEvent]) -> HashMap<String, usize> {
        let mut tally = HashMap::new();
        for event in events {
            for zone in &event.zones {
                *tally.entry(zone.clone()).or_insert(0) += 1;
            }
        }
        tally
    }

    /// Number of events currently buffered for a camera.
    pub fn len(&self, camera_id: &str) -> usize {
        self.events.get(camera_id).map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, camera_id: &str) -> bool {
        self.len(camera_id) == 0
    }
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new()
    }
}
