//! k-NN classifier over stored embedding samples.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};
use uuid::Uuid;

use camhub_models::{ClassificationResult, Neighbor, TrainingSample};

use crate::errors::ClassifierError;
use crate::services::sample_store::SampleStore;
use crate::services::similarity;

/// Tuning knobs for the classifier.
#[derive(Debug, Clone)]
pub struct KnnConfig {
    /// Number of neighbors consulted per query.
    pub k: usize,
    /// Minimum similarity of the single best neighbor for any
    /// classification to be produced.
    pub similarity_threshold: f32,
    /// When true, rank by euclidean distance instead of cosine.
    pub use_distance: bool,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self { k: 5, similarity_threshold: 0.7, use_distance: false }
    }
}

/// Classifies query embeddings against labeled samples in a [`SampleStore`].
pub struct KnnClassifier {
    store: Arc<dyn SampleStore>,
    config: KnnConfig,
}

struct ScoredSample {
    label: String,
    distance: f32,
    similarity: f32,
}

impl KnnClassifier {
    pub fn new(store: Arc<dyn SampleStore>, config: KnnConfig) -> Self {
        Self { store, config }
    }

    pub fn with_defaults(store: Arc<dyn SampleStore>) -> Self {
        Self::new(store, KnnConfig::default())
    }

    pub fn config(&self) -> &KnnConfig {
        &self.config
    }

    /// Set the neighbor count. Values below 1 are raised to 1.
    pub fn set_k(&mut self, k: usize) {
        self.config.k = k.max(1);
    }

    /// Set the acceptance threshold, clamped into [0, 1].
    pub fn set_similarity_threshold(&mut self, threshold: f32) {
        self.config.similarity_threshold = threshold.clamp(0.0, 1.0);
    }

    /// Classify a query embedding against the samples of `model_id`.
    ///
    /// Returns `Ok(None)` when no samples exist, when the best match falls
    /// below the similarity threshold, or when the store is unavailable.
    /// Only malformed input (empty query, dimension mismatch) is an error.
    pub async fn classify(
        &self,
        model_id: &str,
        query: &[f32],
    ) -> Result<Option<ClassificationResult>, ClassifierError> {
        if query.is_empty() {
            return Err(ClassifierError::InvalidInput(
                "query embedding is empty".to_string(),
            ));
        }

        let samples = match self.store.list_samples(model_id).await {
            Ok(samples) => samples,
            Err(err) => {
                warn!(model_id, error = %err, "sample store unavailable, skipping classification");
                return Ok(None);
            }
        };

        if samples.is_empty() {
            debug!(model_id, "no training samples, skipping classification");
            return Ok(None);
        }

        for sample in &samples {
            if sample.embedding.len() != query.len() {
                return Err(ClassifierError::InvalidInput(format!(
                    "sample {} has dimension {} but query has {}",
                    sample.id,
                    sample.embedding.len(),
                    query.len()
                )));
            }
        }

        let mut scored = Vec::with_capacity(samples.len());
        for sample in &samples {
            let (distance, similarity) = if self.config.use_distance {
                let d = similarity::euclidean_distance(query, &sample.embedding)?;
                (d, 1.0 / (1.0 + d))
            } else {
                let s = similarity::cosine_similarity(query, &sample.embedding)?;
                (1.0 - s, s)
            };
            scored.push(ScoredSample {
                label: sample.label.clone(),
                distance,
                similarity,
            });
        }

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        let k_eff = self.config.k.min(scored.len());
        let neighbors = &scored[..k_eff];

        if neighbors[0].similarity < self.config.similarity_threshold {
            debug!(
                model_id,
                best = neighbors[0].similarity,
                threshold = self.config.similarity_threshold,
                "best neighbor below threshold"
            );
            return Ok(None);
        }

        // Vote in rank order so ties resolve toward the closest label.
        let mut votes: IndexMap<String, (usize, f32)> = IndexMap::new();
        for n in neighbors {
            let entry = votes.entry(n.label.clone()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += n.similarity;
        }

        let mut winner: Option<(&String, f32, usize, f32)> = None;
        for (label, (count, sum)) in &votes {
            let mean = sum / *count as f32;
            let score = *count as f32 * mean;
            match winner {
                Some((_, best_score, _, _)) if score <= best_score => {}
                _ => winner = Some((label, score, *count, mean)),
            }
        }

        let (label, _, count, mean_sim) = match winner {
            Some(w) => w,
            None => return Ok(None),
        };

        let confidence = (mean_sim * count as f32 / k_eff as f32).min(1.0);

        let result = ClassificationResult {
            label: label.clone(),
            confidence,
            distance: neighbors[0].distance,
            neighbors: neighbors
                .iter()
                .map(|n| Neighbor {
                    label: n.label.clone(),
                    distance: n.distance,
                    confidence: n.similarity,
                })
                .collect(),
        };

        debug!(
            model_id,
            label = %result.label,
            confidence = result.confidence,
            k_eff,
            "classification produced"
        );

        Ok(Some(result))
    }

    /// Register a labeled embedding for future queries.
    pub async fn add_training_sample(
        &self,
        model_id: &str,
        label: &str,
        embedding: Vec<f32>,
    ) -> Result<Uuid, ClassifierError> {
        if embedding.is_empty() {
            return Err(ClassifierError::InvalidInput(
                "training embedding is empty".to_string(),
            ));
        }
        let sample = TrainingSample::new(model_id, label, embedding);
        let id = sample.id;
        self.store.insert_sample(sample).await?;
        Ok(id)
    }

    /// Remove one sample. Returns whether it existed.
    pub async fn remove_training_sample(&self, sample_id: Uuid) -> Result<bool, ClassifierError> {
        self.store.delete_sample(sample_id).await
    }

    /// Drop all samples for a model. Returns the number removed.
    pub async fn clear_training_data(&self, model_id: &str) -> Result<usize, ClassifierError> {
        self.store.delete_all_samples(model_id).await
    }
}
