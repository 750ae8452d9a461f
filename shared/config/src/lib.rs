//! Environment-driven configuration for CamHub services.
//!
//! Every setting has a default so a bare environment still yields a working
//! edge deployment. Unparseable values log a warning and fall back to the
//! default rather than aborting startup.

use serde::Serialize;
use tracing::warn;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("invalid value for {}: {:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

/// Settings for the rule evaluation service.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSettings {
    /// Path of the JSON rule file loaded by the file-backed rule provider.
    pub rules_path: String,
    /// Per-camera event history capacity.
    pub history_capacity: usize,
    /// Optional JSON file of training samples enabling k-NN refinement.
    pub samples_path: Option<String>,
    /// Model id consulted for refinement when an inbound event carries an
    /// embedding.
    pub refine_model_id: String,
}

impl EngineSettings {
    pub fn from_env() -> Self {
        Self {
            rules_path: std::env::var("CAMHUB_RULES_PATH")
                .unwrap_or_else(|_| "config/rules.json".to_string()),
            history_capacity: env_or("CAMHUB_HISTORY_CAPACITY", 100),
            samples_path: std::env::var("CAMHUB_SAMPLES_PATH").ok(),
            refine_model_id: std::env::var("CAMHUB_REFINE_MODEL")
                .unwrap_or_else(|_| "default".to_string()),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            rules_path: "config/rules.json".to_string(),
            history_capacity: 100,
            samples_path: None,
            refine_model_id: "default".to_string(),
        }
    }
}

/// Settings for the k-NN classifier.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierSettings {
    pub k: usize,
    pub similarity_threshold: f32,
    pub use_distance: bool,
}

impl ClassifierSettings {
    pub fn from_env() -> Self {
        let settings = Self {
            k: env_or("CAMHUB_KNN_K", 5),
            similarity_threshold: env_or("CAMHUB_KNN_THRESHOLD", 0.7),
            use_distance: env_or("CAMHUB_KNN_USE_DISTANCE", false),
        };
        settings.clamped()
    }

    /// Enforce the documented bounds: k >= 1, threshold in [0, 1].
    pub fn clamped(mut self) -> Self {
        self.k = self.k.max(1);
        self.similarity_threshold = self.similarity_threshold.clamp(0.0, 1.0);
        self
    }
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self { k: 5, similarity_threshold: 0.7, use_distance: false }
    }
}
