use fresh_proto::report::{BoxReport, DetectionReport};
use fresh_vision::crop::crop_bounds;
use fresh_vision::{Freshness, Outcome, Rect};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as PixelRect;
use serde::Deserialize;

use crate::source::LoadedImage;

const GREEN: Rgb<u8> = Rgb([0, 200, 0]);
const RED: Rgb<u8> = Rgb([220, 0, 0]);

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_stroke")]
    pub stroke: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { stroke: default_stroke() }
    }
}

fn default_stroke() -> u32 { 4 }

fn color_for(label: Option<Freshness>) -> Rgb<u8> {
    match label {
        Some(Freshness::Fresh) => GREEN,
        Some(Freshness::NonFresh) | None => RED,
    }
}

/// (box, label) pairs in outcome order.
fn boxes(outcome: &Outcome) -> Vec<(Rect, f32, Option<Freshness>)> {
    match outcome {
        Outcome::NoDetections => Vec::new(),
        Outcome::Detected(d) => d.iter().map(|d| (d.rect, d.confidence, None)).collect(),
        Outcome::Classified(c) => c
            .iter()
            .map(|c| (c.detection.rect, c.detection.confidence, Some(c.label)))
            .collect(),
    }
}

/// Draws every box on an owned copy of the photo.
///
/// The stroke is capped at half the shorter image side; wider rings would
/// only redraw the same clamped pixels.
pub fn annotate(image: &DynamicImage, outcome: &Outcome, cfg: &RenderConfig) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (w, h) = canvas.dimensions();
    let stroke = cfg.stroke.clamp(1, (w.min(h) / 2).max(1));
    for (rect, _, label) in boxes(outcome) {
        let color = color_for(label);
        for i in 0..stroke {
            let inset = i as f32;
            let ring = Rect::new(rect.left + inset, rect.top + inset, rect.right - inset, rect.bottom - inset);
            let b = crop_bounds(w, h, &ring);
            draw_hollow_rect_mut(&mut canvas, PixelRect::at(b.x as i32, b.y as i32).of_size(b.width, b.height), color);
        }
    }
    canvas
}

pub fn summary(outcome: &Outcome) -> String {
    let found = boxes(outcome);
    if found.is_empty() {
        return "No objects detected".to_string();
    }
    found
        .iter()
        .map(|(r, conf, label)| {
            let name = label.map(|l| l.to_string()).unwrap_or_else(|| "Detected".to_string());
            format!(
                "{}: confidence={:.2} box=({:.1}, {:.1}, {:.1}, {:.1})",
                name, conf, r.left, r.top, r.right, r.bottom
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn report(loaded: &LoadedImage, outcome: &Outcome) -> DetectionReport {
    let scores: Vec<Option<f32>> = match outcome {
        Outcome::Classified(c) => c.iter().map(|c| Some(c.score)).collect(),
        _ => vec![None; outcome.len()],
    };
    let boxes = boxes(outcome)
        .into_iter()
        .zip(scores)
        .map(|((r, confidence, label), classifier_score)| BoxReport {
            left: r.left,
            top: r.top,
            right: r.right,
            bottom: r.bottom,
            confidence,
            label: label.map(|l| l.to_string()),
            classifier_score,
        })
        .collect();

    DetectionReport {
        image_width: loaded.image.width(),
        image_height: loaded.image.height(),
        origin: loaded.origin,
        orientation_degrees: loaded.orientation.degrees(),
        boxes,
        summary: summary(outcome),
    }
}
