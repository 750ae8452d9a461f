//! Error types for the rule engine service.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Rule definitions could not be parsed or are internally invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The rule provider backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An action could not be delivered to its sink.
    #[error("Dispatch error: {0}")]
    Dispatch(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}
