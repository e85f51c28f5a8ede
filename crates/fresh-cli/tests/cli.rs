//! Integration tests for the freshscan binary, driven by replay backends.

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(detector_output: &str, classifier_output: Option<&str>, pipeline: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let det = dir.path().join("detector.txt");
        std::fs::write(&det, detector_output).unwrap();

        let mut cfg = format!(
            "[pipeline]\n{}\n\n[detector]\nbackend = \"replay\"\nreplay_path = {:?}\ninput_w = 416\ninput_h = 416\n",
            pipeline,
            det.display().to_string()
        );
        if let Some(out) = classifier_output {
            let cls = dir.path().join("classifier.txt");
            std::fs::write(&cls, out).unwrap();
            cfg.push_str(&format!(
                "\n[classifier]\nbackend = \"replay\"\nreplay_path = {:?}\n",
                cls.display().to_string()
            ));
        }
        std::fs::write(dir.path().join("freshscan.toml"), cfg).unwrap();
        RgbImage::from_pixel(416, 416, Rgb([90, 140, 60])).save(dir.path().join("photo.png")).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("freshscan");
        cmd.arg("--config").arg(self.path("freshscan.toml"));
        cmd
    }
}

const TWO_BOXES: &str = "0.5 0.5 0.2 0.2 0.9 0.9 0.52 0.52 0.2 0.2 0.85 0.85\n";

#[test]
fn detect_prints_one_line_per_box() {
    let ws = Workspace::new(TWO_BOXES, Some("0.2, 0.8\n"), "");
    ws.cmd()
        .arg("detect")
        .arg(ws.path("photo.png"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Fresh: confidence=0.81 box=(166.4, 166.4, 249.6, 249.6)"));
}

#[test]
fn detect_json_report() {
    let ws = Workspace::new(TWO_BOXES, Some("0.9 0.1\n"), "selection = \"all-survivors\"");
    let out = ws
        .cmd()
        .args(["detect", "--json", "--camera"])
        .arg(ws.path("photo.png"))
        .output()
        .unwrap();
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["origin"], "camera");
    assert_eq!(report["orientation_degrees"], 0);
    assert_eq!(report["boxes"].as_array().unwrap().len(), 1);
    assert_eq!(report["boxes"][0]["label"], "Non-Fresh");
}

#[test]
fn detect_without_detections() {
    let ws = Workspace::new("# nothing above threshold\n0.5 0.5 0.2 0.2 0.1 0.1\n", Some("0.2 0.8\n"), "");
    ws.cmd()
        .arg("detect")
        .arg(ws.path("photo.png"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No objects detected"));
}

#[test]
fn detect_without_image_asks_for_one() {
    let ws = Workspace::new(TWO_BOXES, None, "");
    ws.cmd()
        .arg("detect")
        .assert()
        .success()
        .stdout(predicate::str::contains("Please load an image first."));
}

#[test]
fn detect_writes_annotated_png() {
    let ws = Workspace::new(TWO_BOXES, None, "");
    let out = ws.path("annotated.png");
    ws.cmd()
        .arg("detect")
        .arg(ws.path("photo.png"))
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Detected: confidence=0.81"));

    let img = image::open(&out).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (416, 416));
    assert_eq!(img.get_pixel(166, 200), &Rgb([220, 0, 0]));
}

#[test]
fn doctor_accepts_a_valid_config() {
    let ws = Workspace::new(TWO_BOXES, Some("0.2 0.8\n"), "iou_threshold = 0.45");
    ws.cmd().arg("doctor").assert().success().stdout(predicate::str::contains("OK"));
}

#[test]
fn doctor_rejects_bad_thresholds() {
    let ws = Workspace::new(TWO_BOXES, None, "confidence_threshold = 1.5");
    ws.cmd().arg("doctor").assert().failure();
}

#[test]
fn inspect_needs_tflite() {
    let ws = Workspace::new(TWO_BOXES, None, "");
    ws.cmd()
        .arg("inspect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tflite"));
}

#[test]
fn missing_config_fails() {
    let mut cmd = cargo_bin_cmd!("freshscan");
    cmd.arg("--config")
        .arg(Path::new("/nonexistent/freshscan.toml"))
        .arg("doctor")
        .assert()
        .failure()
        .stderr(predicate::str::contains("read config"));
}
