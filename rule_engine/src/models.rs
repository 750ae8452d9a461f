//! Engine-internal view models.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use camhub_models::{ActionRequest, DetectionEvent, RuleTriggerNotice};

/// Snapshot of per-camera state assembled once per incoming event and
/// shared by all condition evaluators.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub event: DetectionEvent,
    /// Buffered events for the same camera, newest first. Does not yet
    /// include `event` itself.
    pub recent: Vec<DetectionEvent>,
    /// Zone name to occurrence count over the buffered events.
    pub zone_tally: HashMap<String, usize>,
    /// Evaluation instant, injectable for tests.
    pub now: DateTime<Utc>,
}

/// What one event produced: which rules fired and which actions were
/// issued.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventOutcome {
    pub triggered: Vec<RuleTriggerNotice>,
    pub actions: Vec<ActionRequest>,
}

impl EventOutcome {
    pub fn is_empty(&self) -> bool {
        self.triggered.is_empty() && self.actions.is_empty()
    }
}
