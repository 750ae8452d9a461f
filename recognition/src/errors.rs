//! Error types for the recognition service.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    /// The caller handed us something we cannot classify, typically an
    /// empty embedding or one whose dimension disagrees with the stored
    /// samples. These surface to the caller.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The sample store failed. Classification degrades to "no result"
    /// rather than failing the event pipeline.
    #[error("Storage error: {0}")]
    Storage(String),
}
