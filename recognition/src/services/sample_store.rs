//! Training sample storage.
//!
//! Samples are grouped by model id so one deployment can host independent
//! classifiers (faces, vehicles, packages) side by side.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use camhub_models::TrainingSample;

use crate::errors::ClassifierError;

/// Storage backend for labeled embeddings.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// All samples registered under a model id, in insertion order.
    async fn list_samples(&self, model_id: &str) -> Result<Vec<TrainingSample>, ClassifierError>;

    /// Register a new sample.
    async fn insert_sample(&self, sample: TrainingSample) -> Result<(), ClassifierError>;

    /// Remove one sample by id. Returns whether anything was removed.
    async fn delete_sample(&self, sample_id: Uuid) -> Result<bool, ClassifierError>;

    /// Drop every sample for a model. Returns the number removed.
    async fn delete_all_samples(&self, model_id: &str) -> Result<usize, ClassifierError>;
}

/// In-memory sample store used on edge deployments without a database.
pub struct InMemorySampleStore {
    samples: RwLock<HashMap<String, Vec<TrainingSample>>>,
}

impl InMemorySampleStore {
    pub fn new() -> Self {
        Self { samples: RwLock::new(HashMap::new()) }
    }

    /// Bulk-load samples, e.g. from a JSON file at startup.
    pub async fn load(&self, samples: Vec<TrainingSample>) {
        let mut guard = self.samples.write().await;
        for sample in samples {
            guard.entry(sample.model_id.clone()).or_default().push(sample);
        }
    }
}

impl Default for InMemorySampleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SampleStore for InMemorySampleStore {
    async fn list_samples(&self, model_id: &str) -> Result<Vec<TrainingSample>, ClassifierError> {
        let guard = self.samples.read().await;
        Ok(guard.get(model_id).cloned().unwrap_or_default())
    }

    async fn insert_sample(&self, sample: TrainingSample) -> Result<(), ClassifierError> {
        let mut guard = self.samples.write().await;
        debug!(
            model_id = %sample.model_id,
            label = %sample.label,
            dims = sample.embedding.len(),
            "inserting training sample"
        );
        guard.entry(sample.model_id.clone()).or_default().push(sample);
        Ok(())
    }

    async fn delete_sample(&self, sample_id: Uuid) -> Result<bool, ClassifierError> {
        let mut guard = self.samples.write().await;
        for samples in guard.values_mut() {
            if let Some(pos) = samples.iter().position(|s| s.id == sample_id) {
                samples.remove(pos);
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn delete_all_samples(&self, model_id: &str) -> Result<usize, ClassifierError> {
        let mut guard = self.samples.write().await;
        Ok(guard.remove(model_id).map(|s| s.len()).unwrap_or(0))
    }
}
