//! CamHub rule engine binary.
//!
//! Reads one detection event as JSON per stdin line, optionally refines it
//! through the k-NN classifier, evaluates it against the configured rules
//! and writes every emitted action request as one JSON line on stdout.
//! Events are processed strictly one at a time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use camhub_config::{ClassifierSettings, EngineSettings};
use camhub_models::{
    ActionRequest, BoundingBox, CustomDetection, DetectionEvent, Severity, TrainingSample,
};
use camhub_observability::{init_tracing, TracingConfig};
use camhub_recognition::{InMemorySampleStore, KnnClassifier, KnnConfig};
use camhub_rule_engine::{ChannelDispatcher, JsonFileRuleProvider, RuleEngine};

/// Inbound wire form of a detection event. Motion-only payloads omit the
/// detection type; the optional embedding rides alongside the event and is
/// stripped before the engine sees it.
#[derive(Debug, Deserialize)]
struct InboundEvent {
    camera_id: String,
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    detection_type: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    bounding_box: Option<BoundingBox>,
    #[serde(default)]
    zones: HashSet<String>,
    #[serde(default)]
    severity: Option<Severity>,
    #[serde(default)]
    custom_detections: Vec<CustomDetection>,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

impl InboundEvent {
    /// Normalize into an engine event plus the optional embedding. A payload
    /// without a detection type is treated as motion-only.
    fn into_event(self) -> (DetectionEvent, Option<Vec<f32>>) {
        let mut event = match self.detection_type {
            Some(detection_type) => {
                let mut event = DetectionEvent::new(
                    self.camera_id,
                    detection_type,
                    self.confidence.unwrap_or(0.0),
                );
                event.bounding_box = self.bounding_box.unwrap_or_else(BoundingBox::empty);
                event
            }
            None => DetectionEvent::motion(self.camera_id, self.severity),
        };

        if let Some(id) = self.id {
            event.id = id;
        }
        if let Some(timestamp) = self.timestamp {
            event.timestamp = timestamp;
        }
        if let Some(severity) = self.severity {
            event.severity = severity;
        }
        event.zones = self.zones;
        event.custom_detections = self.custom_detections;
        event.metadata = self.metadata;

        (event, self.embedding)
    }
}

async fn load_classifier(
    settings: &EngineSettings,
    classifier_settings: ClassifierSettings,
) -> Option<KnnClassifier> {
    let path = settings.samples_path.as_ref()?;

    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %path, error = %err, "cannot read sample file, refinement disabled");
            return None;
        }
    };
    let samples: Vec<TrainingSample> = match serde_json::from_str(&raw) {
        Ok(samples) => samples,
        Err(err) => {
            warn!(path = %path, error = %err, "cannot parse sample file, refinement disabled");
            return None;
        }
    };

    info!(path = %path, count = samples.len(), "training samples loaded");
    let store = Arc::new(InMemorySampleStore::new());
    store.load(samples).await;

    Some(KnnClassifier::new(
        store,
        KnnConfig {
            k: classifier_settings.k,
            similarity_threshold: classifier_settings.similarity_threshold,
            use_distance: classifier_settings.use_distance,
        },
    ))
}

async fn write_request(
    stdout: &mut tokio::io::Stdout,
    request: &ActionRequest,
) -> std::io::Result<()> {
    let line = serde_json::to_string(request)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(TracingConfig::for_service("rule-engine"));

    let settings = EngineSettings::from_env();
    let classifier_settings = ClassifierSettings::from_env();
    info!(
        rules_path = %settings.rules_path,
        history_capacity = settings.history_capacity,
        "starting rule engine"
    );

    let provider = Arc::new(JsonFileRuleProvider::new(&settings.rules_path));
    let (tx, mut rx) = mpsc::channel::<ActionRequest>(64);
    let dispatcher = Arc::new(ChannelDispatcher::new(tx));

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(request) = rx.recv().await {
            if let Err(err) = write_request(&mut stdout, &request).await {
                error!(error = %err, "stdout write failed, stopping action writer");
                break;
            }
        }
    });

    let classifier = load_classifier(&settings, classifier_settings).await;
    let refine_model_id = settings.refine_model_id.clone();

    let mut engine = RuleEngine::new(provider, dispatcher, settings.history_capacity);
    engine.initialize().await;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let inbound: InboundEvent = match serde_json::from_str(line) {
            Ok(inbound) => inbound,
            Err(err) => {
                warn!(error = %err, "skipping malformed event line");
                continue;
            }
        };

        let (mut event, embedding) = inbound.into_event();

        if let (Some(classifier), Some(embedding)) = (&classifier, embedding) {
            match classifier.classify(&refine_model_id, &embedding).await {
                Ok(Some(result)) => {
                    debug!(
                        camera_id = %event.camera_id,
                        label = %result.label,
                        confidence = result.confidence,
                        "event refined by classifier"
                    );
                    result.apply_to(&mut event);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(camera_id = %event.camera_id, error = %err, "classification failed, using raw event");
                }
            }
        }

        let outcome = engine.process_event(event).await;
        if !outcome.is_empty() {
            debug!(
                triggered = outcome.triggered.len(),
                actions = outcome.actions.len(),
                "event produced actions"
            );
        }
    }

    info!("event feed closed, shutting down");
    drop(engine);
    let _ = writer.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camhub_models::DEFAULT_MOTION_CONFIDENCE;

    #[test]
    fn motion_only_payload_normalizes() {
        let inbound: InboundEvent = serde_json::from_str(
            r#"{"camera_id": "front", "severity": "high"}"#,
        )
        .unwrap();
        let (event, embedding) = inbound.into_event();

        assert_eq!(event.detection_type, "motion");
        assert_eq!(event.confidence, DEFAULT_MOTION_CONFIDENCE);
        assert_eq!(event.bounding_box, BoundingBox::empty());
        assert_eq!(event.severity, Severity::High);
        assert!(embedding.is_none());
    }

    #[test]
    fn typed_payload_keeps_fields() {
        let inbound: InboundEvent = serde_json::from_str(
            r#"{
                "camera_id": "front",
                "detection_type": "person",
                "confidence": 0.92,
                "zones": ["driveway"],
                "embedding": [0.1, 0.2]
            }"#,
        )
        .unwrap();
        let (event, embedding) = inbound.into_event();

        assert_eq!(event.detection_type, "person");
        assert_eq!(event.confidence, 0.92);
        assert!(event.in_zone("driveway"));
        assert_eq!(embedding, Some(vec![0.1, 0.2]));
    }
}
