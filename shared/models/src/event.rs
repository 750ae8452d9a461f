use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Confidence assigned to motion-only events normalized by the inbound feed.
pub const DEFAULT_MOTION_CONFIDENCE: f32 = 0.8;

/// Three-level ordered severity scale used by the rule engine.
///
/// Upstream systems that use a four-level scheme must normalize to this
/// scale before events reach the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Fixed ordinal used by `gte` severity comparisons: low=1, medium=2, high=3.
    pub fn ordinal(self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

/// Axis-aligned detection bounding box in frame coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Placeholder box for events without spatial information (e.g. motion).
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One auxiliary classifier output attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomDetection {
    pub label: String,
    pub confidence: f32,
}

/// One detection reported by the perception pipeline for one camera at one
/// instant. Immutable once handed to the engine; the engine appends its own
/// copy into the per-camera history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub id: Uuid,
    pub camera_id: String,
    pub timestamp: DateTime<Utc>,
    pub detection_type: String,
    pub confidence: f32,
    #[serde(default)]
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub zones: HashSet<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub custom_detections: Vec<CustomDetection>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl DetectionEvent {
    pub fn new(
        camera_id: impl Into<String>,
        detection_type: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            camera_id: camera_id.into(),
            timestamp: Utc::now(),
            detection_type: detection_type.into(),
            confidence,
            bounding_box: BoundingBox::empty(),
            zones: HashSet::new(),
            severity: Severity::default(),
            custom_detections: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Normalize a motion-only payload into a detection event: fixed
    /// `"motion"` type, default confidence, empty bounding box, severity
    /// from the upstream payload when present.
    pub fn motion(camera_id: impl Into<String>, severity: Option<Severity>) -> Self {
        let mut event = Self::new(camera_id, "motion", DEFAULT_MOTION_CONFIDENCE);
        event.severity = severity.unwrap_or(Severity::Medium);
        event
    }

    pub fn in_zone(&self, zone: &str) -> bool {
        self.zones.contains(zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_matches_ordinals() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert_eq!(Severity::Low.ordinal(), 1);
        assert_eq!(Severity::Medium.ordinal(), 2);
        assert_eq!(Severity::High.ordinal(), 3);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
        let parsed: Severity = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Severity::Low);
    }

    #[test]
    fn motion_normalization_defaults() {
        let event = DetectionEvent::motion("front_door", None);
        assert_eq!(event.detection_type, "motion");
        assert_eq!(event.confidence, DEFAULT_MOTION_CONFIDENCE);
        assert_eq!(event.bounding_box, BoundingBox::empty());
        assert_eq!(event.severity, Severity::Medium);

        let event = DetectionEvent::motion("front_door", Some(Severity::High));
        assert_eq!(event.severity, Severity::High);
    }

    #[test]
    fn event_deserializes_with_optional_fields_missing() {
        let json = r#"{
            "id": "2fbf32f2-6f8e-44d4-9a7e-2f3a0a1a9b10",
            "camera_id": "driveway",
            "timestamp": "2025-05-01T12:00:00Z",
            "detection_type": "person",
            "confidence": 0.92
        }"#;
        let event: DetectionEvent = serde_json::from_str(json).unwrap();
        assert!(event.zones.is_empty());
        assert!(event.custom_detections.is_empty());
        assert_eq!(event.severity, Severity::Medium);
    }
}
