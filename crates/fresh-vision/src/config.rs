use std::time::Duration;

use serde::Deserialize;

use crate::decode::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::nms::DEFAULT_IOU_THRESHOLD;

/// Which detections go on to classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// Skip suppression and classify only the highest-confidence detection.
    BestOnly,
    /// Suppress overlaps, then classify every survivor.
    #[default]
    AllSurvivors,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f32,
    #[serde(default)]
    pub selection: SelectionMode,
    pub max_detections: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl PipelineConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            selection: SelectionMode::default(),
            max_detections: None,
            timeout_ms: None,
        }
    }
}

fn default_confidence_threshold() -> f32 { DEFAULT_CONFIDENCE_THRESHOLD }
fn default_iou_threshold() -> f32 { DEFAULT_IOU_THRESHOLD }

/// One model binding. `backend` picks the implementation: "replay" | "tflite".
///
/// `input_w`/`input_h` may be left out; the loader fills them with the
/// section's default (`DETECTOR_INPUT` or `CLASSIFIER_INPUT`).
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub backend: String,
    pub model_path: Option<String>,
    pub replay_path: Option<String>,
    #[serde(default)]
    pub input_w: Option<u32>,
    #[serde(default)]
    pub input_h: Option<u32>,
    pub threads: Option<u32>,
}

impl BackendConfig {
    pub const DETECTOR_INPUT: (u32, u32) = (416, 416);
    pub const CLASSIFIER_INPUT: (u32, u32) = (240, 240);

    /// Fills whichever input dimension is unset.
    pub fn with_default_input(mut self, (w, h): (u32, u32)) -> Self {
        self.input_w.get_or_insert(w);
        self.input_h.get_or_insert(h);
        self
    }

    /// Model input as (width, height), if both are set and non-zero.
    pub fn input_size(&self) -> Option<(u32, u32)> {
        match (self.input_w, self.input_h) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}
