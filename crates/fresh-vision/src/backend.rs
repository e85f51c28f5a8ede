use std::path::Path;

use image::DynamicImage;
use tracing::info;

use crate::config::BackendConfig;
use crate::error::InferenceError;
use crate::preprocess::{to_input_tensor, InputTensor};

/// A model binding the pipeline can drive: preprocess, infer, close.
pub trait InferenceBackend: Send {
    fn name(&self) -> &str;

    /// Model input resolution as (width, height).
    fn input_size(&self) -> (u32, u32);

    fn preprocess(&self, image: &DynamicImage) -> InputTensor {
        let (w, h) = self.input_size();
        to_input_tensor(image, w, h)
    }

    /// Runs the model and returns output tensor 0 as a flat buffer.
    fn infer(&mut self, input: &InputTensor) -> Result<Vec<f32>, InferenceError>;

    /// Releases model resources. Further `infer` calls may fail.
    fn close(&mut self) {}
}

/// Serves recorded output tensors instead of running a model.
///
/// Outputs are returned in order and wrap around, so a single recorded
/// tensor answers every call.
#[derive(Debug, Clone)]
pub struct ReplayBackend {
    name: String,
    input: (u32, u32),
    outputs: Vec<Vec<f32>>,
    next: usize,
    closed: bool,
}

impl ReplayBackend {
    pub fn new(input_w: u32, input_h: u32, outputs: Vec<Vec<f32>>) -> Self {
        Self { name: "replay".into(), input: (input_w, input_h), outputs, next: 0, closed: false }
    }

    /// One output tensor per non-empty line; values separated by commas and/or whitespace.
    /// `#` starts a comment.
    pub fn parse(input_w: u32, input_h: u32, text: &str) -> Result<Self, InferenceError> {
        let mut outputs = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let values = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<f32>().map_err(|e| {
                        InferenceError::MalformedTensor(format!("line {}: {:?}: {}", n + 1, s, e))
                    })
                })
                .collect::<Result<Vec<f32>, _>>()?;
            outputs.push(values);
        }
        Ok(Self::new(input_w, input_h, outputs))
    }

    pub fn from_file(input_w: u32, input_h: u32, path: &Path) -> Result<Self, InferenceError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            InferenceError::ModelUnavailable(format!("read replay file {}: {}", path.display(), e))
        })?;
        let mut backend = Self::parse(input_w, input_h, &text)?;
        backend.name = format!("replay:{}", path.display());
        Ok(backend)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl InferenceBackend for ReplayBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_size(&self) -> (u32, u32) {
        self.input
    }

    fn infer(&mut self, input: &InputTensor) -> Result<Vec<f32>, InferenceError> {
        if self.closed {
            return Err(InferenceError::ModelUnavailable(format!("{} is closed", self.name)));
        }
        let need = InputTensor::expected_len(self.input.0, self.input.1);
        if input.data.len() != need {
            return Err(InferenceError::MalformedTensor(format!(
                "input has {} values, expected {} ({}x{}x3)",
                input.data.len(),
                need,
                self.input.0,
                self.input.1
            )));
        }
        if self.outputs.is_empty() {
            return Err(InferenceError::ModelUnavailable(format!("{} has no recorded outputs", self.name)));
        }
        let out = self.outputs[self.next % self.outputs.len()].clone();
        self.next += 1;
        Ok(out)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Builds the backend named by `cfg.backend`.
pub fn open_backend(cfg: &BackendConfig) -> Result<Box<dyn InferenceBackend>, InferenceError> {
    match cfg.backend.as_str() {
        "replay" => {
            let path = cfg.replay_path.as_deref().ok_or_else(|| {
                InferenceError::ModelUnavailable("replay backend needs replay_path".into())
            })?;
            let (w, h) = model_input(cfg)?;
            let b = ReplayBackend::from_file(w, h, Path::new(path))?;
            info!("vision: loaded {} recorded output(s) from {}", b.len(), path);
            Ok(Box::new(b))
        }
        #[cfg(feature = "tflite")]
        "tflite" => Ok(Box::new(crate::tflite::TfliteBackend::new(cfg)?)),
        #[cfg(not(feature = "tflite"))]
        "tflite" => Err(InferenceError::ModelUnavailable(
            "backend = \"tflite\" but binary not built with --features tflite".into(),
        )),
        other => Err(InferenceError::ModelUnavailable(format!("unknown backend: {}", other))),
    }
}

pub(crate) fn model_input(cfg: &BackendConfig) -> Result<(u32, u32), InferenceError> {
    cfg.input_size()
        .ok_or_else(|| InferenceError::ModelUnavailable("input_w/input_h missing or zero".into()))
}
