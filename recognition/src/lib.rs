//! CamHub recognition library.
//!
//! k-nearest-neighbor classification over stored embedding samples. The
//! classifier refines coarse detection labels ("person") into specific ones
//! ("person:john") when the event carries an embedding and enough training
//! samples exist for the model.

pub mod errors;
pub mod services;

pub use errors::ClassifierError;
pub use services::classifier::{KnnClassifier, KnnConfig};
pub use services::sample_store::{InMemorySampleStore, SampleStore};
pub use services::similarity;
