use std::path::Path;

use anyhow::Result;

use crate::config::{BackendConfig, PipelineConfig};

pub fn check_thresholds(cfg: &PipelineConfig) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&cfg.confidence_threshold),
        "pipeline.confidence_threshold must be within 0..1"
    );
    anyhow::ensure!((0.0..=1.0).contains(&cfg.iou_threshold), "pipeline.iou_threshold must be within 0..1");
    anyhow::ensure!(cfg.max_detections != Some(0), "pipeline.max_detections must be >= 1");
    anyhow::ensure!(cfg.timeout_ms != Some(0), "pipeline.timeout_ms must be >= 1");
    Ok(())
}

pub fn check_backend(section: &str, cfg: &BackendConfig) -> Result<()> {
    anyhow::ensure!(cfg.input_size().is_some(), "{}.input_w/input_h must be non-zero", section);
    match cfg.backend.as_str() {
        "replay" => {
            let p = cfg.replay_path.as_deref().unwrap_or_default();
            anyhow::ensure!(!p.is_empty(), "{}.replay_path missing", section);
            anyhow::ensure!(Path::new(p).is_file(), "{}.replay_path not found: {}", section, p);
        }
        "tflite" => {
            let p = cfg.model_path.as_deref().unwrap_or_default();
            anyhow::ensure!(!p.is_empty(), "{}.model_path missing", section);
            anyhow::ensure!(Path::new(p).is_file(), "{}.model_path not found: {}", section, p);
            anyhow::ensure!(cfg.threads != Some(0), "{}.threads must be >= 1", section);
        }
        other => anyhow::bail!("unknown {}.backend: {}", section, other),
    }
    Ok(())
}
