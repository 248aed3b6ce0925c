//! Executor error types

use crate::site::ConfigError;

/// Errors that escape a run.
///
/// Browser and endpoint failures degrade to a negative verdict inside the run;
/// only configuration and artifact-writing problems surface here.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
