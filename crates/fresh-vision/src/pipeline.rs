use image::DynamicImage;
use tracing::{debug, info};

use crate::backend::InferenceBackend;
use crate::config::{PipelineConfig, SelectionMode};
use crate::crop::crop;
use crate::decode::decode;
use crate::error::{InferenceError, PipelineError, Stage};
use crate::nms::suppress;
use crate::{ClassifiedDetection, Detection, Freshness, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Detecting,
    Suppressing,
    ClassifyingEach,
    Done,
}

/// Detector -> decode -> selection -> per-box classification.
///
/// Runs take `&mut self`, so a pipeline never interleaves two runs. Nothing
/// but the model bindings survives from one run to the next.
pub struct Pipeline {
    cfg: PipelineConfig,
    detector: Box<dyn InferenceBackend>,
    classifier: Option<Box<dyn InferenceBackend>>,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(
        cfg: PipelineConfig,
        detector: Box<dyn InferenceBackend>,
        classifier: Option<Box<dyn InferenceBackend>>,
    ) -> Self {
        Self { cfg, detector, classifier, state: PipelineState::Idle }
    }

    /// Last state reached. `Done` after a successful run.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn run(&mut self, image: &DynamicImage) -> Result<Outcome, PipelineError> {
        self.state = PipelineState::Idle;

        self.enter(PipelineState::Detecting);
        let input = self.detector.preprocess(image);
        let raw = self
            .detector
            .infer(&input)
            .map_err(PipelineError::inference(Stage::Detector, self.detector.name()))?;
        let dets = decode(&raw, image.width(), image.height(), self.cfg.confidence_threshold);
        debug!(
            "decode: {} value(s) -> {} candidate(s) above {}",
            raw.len(),
            dets.len(),
            self.cfg.confidence_threshold
        );

        if dets.is_empty() {
            self.enter(PipelineState::Done);
            info!("pipeline: no detections");
            return Ok(Outcome::NoDetections);
        }

        self.enter(PipelineState::Suppressing);
        let candidates = dets.len();
        let selected = select(dets, &self.cfg);
        debug!("select ({:?}): {} -> {}", self.cfg.selection, candidates, selected.len());

        if self.classifier.is_none() {
            self.enter(PipelineState::Done);
            info!("pipeline: {} detection(s), no classifier configured", selected.len());
            return Ok(Outcome::Detected(selected));
        }

        self.enter(PipelineState::ClassifyingEach);
        let mut out = Vec::with_capacity(selected.len());
        if let Some(classifier) = self.classifier.as_mut() {
            for det in selected {
                let region = crop(image, &det.rect);
                let input = classifier.preprocess(&region);
                let probs = classifier
                    .infer(&input)
                    .map_err(PipelineError::inference(Stage::Classifier, classifier.name()))?;
                let (label, score) = decide_label(&probs)
                    .map_err(PipelineError::inference(Stage::Classifier, classifier.name()))?;
                debug!("classify: conf={:.2} -> {} ({:.3})", det.confidence, label, score);
                out.push(ClassifiedDetection { detection: det, label, score });
            }
        }

        self.enter(PipelineState::Done);
        info!("pipeline: classified {} detection(s)", out.len());
        Ok(Outcome::Classified(out))
    }

    pub fn close(&mut self) {
        self.detector.close();
        if let Some(c) = self.classifier.as_mut() {
            c.close();
        }
    }

    fn enter(&mut self, next: PipelineState) {
        debug!("pipeline: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Picks the detections that go on to classification.
pub fn select(dets: Vec<Detection>, cfg: &PipelineConfig) -> Vec<Detection> {
    match cfg.selection {
        SelectionMode::BestOnly => best(dets).into_iter().collect(),
        SelectionMode::AllSurvivors => {
            let mut kept = suppress(dets, cfg.iou_threshold);
            if let Some(max) = cfg.max_detections {
                kept.truncate(max);
            }
            kept
        }
    }
}

/// Highest confidence; the earliest one wins a tie.
fn best(dets: Vec<Detection>) -> Option<Detection> {
    dets.into_iter().reduce(|best, d| if d.confidence > best.confidence { d } else { best })
}

/// Two-class decision on raw classifier output.
///
/// Index 0 is "non-fresh" and index 1 is "fresh" by convention of the model
/// export; the values are compared as-is, without softmax. Ties go to Fresh.
pub fn decide_label(probs: &[f32]) -> Result<(Freshness, f32), InferenceError> {
    match probs {
        [non_fresh, fresh, ..] => Ok(if non_fresh > fresh {
            (Freshness::NonFresh, *non_fresh)
        } else {
            (Freshness::Fresh, *fresh)
        }),
        _ => Err(InferenceError::MalformedTensor(format!(
            "classifier returned {} value(s), expected 2",
            probs.len()
        ))),
    }
}
