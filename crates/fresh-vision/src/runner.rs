use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use crate::Outcome;

/// Single-flight handle for triggering pipeline runs from async code.
///
/// A trigger that arrives while a run is in flight gets `Busy`. A run that
/// outlives its timeout is reported as `Timeout` but keeps the pipeline until
/// it finishes, so stages of two runs never interleave.
#[derive(Clone)]
pub struct SharedPipeline {
    inner: Arc<Mutex<Pipeline>>,
}

impl SharedPipeline {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { inner: Arc::new(Mutex::new(pipeline)) }
    }

    pub async fn run(&self, image: DynamicImage, timeout: Option<Duration>) -> Result<Outcome, PipelineError> {
        let mut guard = self.inner.clone().try_lock_owned().map_err(|_| PipelineError::Busy)?;
        let task = tokio::task::spawn_blocking(move || guard.run(&image));

        let joined = match timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("pipeline: run exceeded {:?}", limit);
                    return Err(PipelineError::Timeout(limit));
                }
            },
            None => task.await,
        };
        joined.map_err(|e| PipelineError::Join(e.to_string()))?
    }

    /// Waits for any in-flight run, then releases the model bindings.
    pub async fn close(&self) {
        self.inner.lock().await.close();
    }
}
