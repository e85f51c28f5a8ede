//! Detection post-processing and freshness decision pipeline.
//!
//! A detector's flat output is decoded into pixel-space boxes, deduplicated
//! with greedy NMS, and every surviving box is cropped and handed to a
//! two-class freshness classifier.

pub mod backend;
pub mod config;
pub mod crop;
pub mod decode;
pub mod doctor;
pub mod error;
pub mod geometry;
pub mod nms;
pub mod orientation;
pub mod pipeline;
pub mod preprocess;
pub mod runner;
#[cfg(feature = "tflite")]
pub mod tflite;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use backend::{open_backend, InferenceBackend, ReplayBackend};
pub use config::{BackendConfig, PipelineConfig, SelectionMode};
pub use crop::crop;
pub use decode::decode;
pub use error::{InferenceError, PipelineError, Stage};
pub use geometry::{intersection_over_union, Rect};
pub use nms::suppress;
pub use orientation::{correct_orientation, OrientationTag};
pub use pipeline::{Pipeline, PipelineState};
pub use runner::SharedPipeline;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub rect: Rect,
    // objectness * class score
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Freshness {
    Fresh,
    NonFresh,
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Freshness::Fresh => f.write_str("Fresh"),
            Freshness::NonFresh => f.write_str("Non-Fresh"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedDetection {
    pub detection: Detection,
    pub label: Freshness,
    /// Raw classifier output for the winning class.
    pub score: f32,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    NoDetections,
    /// Boxes without labels; produced when no classifier is configured.
    Detected(Vec<Detection>),
    Classified(Vec<ClassifiedDetection>),
}

impl Outcome {
    pub fn len(&self) -> usize {
        match self {
            Outcome::NoDetections => 0,
            Outcome::Detected(d) => d.len(),
            Outcome::Classified(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
