use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Failure reported by an inference backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("malformed tensor: {0}")]
    MalformedTensor(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Which inference call of a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Detector,
    Classifier,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Detector => f.write_str("detector"),
            Stage::Classifier => f.write_str("classifier"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} inference failed ({backend}): {source}")]
    InferenceFailure {
        stage: Stage,
        backend: String,
        #[source]
        source: InferenceError,
    },
    #[error("a pipeline run is already in progress")]
    Busy,
    #[error("pipeline run timed out after {0:?}")]
    Timeout(Duration),
    #[error("pipeline task aborted: {0}")]
    Join(String),
}

impl PipelineError {
    pub(crate) fn inference(stage: Stage, backend: &str) -> impl FnOnce(InferenceError) -> Self + '_ {
        move |source| PipelineError::InferenceFailure { stage, backend: backend.to_string(), source }
    }

    /// Whether the caller may trigger another run. Nothing is retried automatically.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PipelineError::Join(_))
    }
}
