//! Training samples and classification output for the k-NN refinement path.

use crate::event::DetectionEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One labeled embedding belonging to a user-trained model. Immutable after
/// creation; deleted individually or cleared wholesale per model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub id: Uuid,
    pub model_id: String,
    pub label: String,
    pub embedding: Vec<f32>,
}

impl TrainingSample {
    pub fn new(
        model_id: impl Into<String>,
        label: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            model_id: model_id.into(),
            label: label.into(),
            embedding,
        }
    }
}

/// One ranked neighbor of a classification. `confidence` is the neighbor's
/// similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub label: String,
    pub distance: f32,
    pub confidence: f32,
}

/// Outcome of one k-NN vote. Produced fresh per classification call and not
/// persisted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    pub confidence: f32,
    /// Distance of the single best neighbor.
    pub distance: f32,
    /// The ranked neighbors that voted, at most k entries.
    pub neighbors: Vec<Neighbor>,
}

impl ClassificationResult {
    /// Apply the refined label/confidence to an event before it reaches the
    /// rule engine.
    pub fn apply_to(&self, event: &mut DetectionEvent) {
        event.detection_type = self.label.clone();
        event.confidence = self.confidence;
    }
}
