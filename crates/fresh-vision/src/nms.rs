use std::cmp::Ordering;

use crate::Detection;

pub const DEFAULT_IOU_THRESHOLD: f32 = 0.4;

/// Greedy non-maximum suppression.
///
/// Detections are visited in descending confidence (stable among ties); each
/// one is kept unless it overlaps an already kept detection by more than
/// `iou_th`. The result is in selection order. NaN confidences sort last.
pub fn suppress(mut dets: Vec<Detection>, iou_th: f32) -> Vec<Detection> {
    dets.sort_by(|a, b| by_confidence_desc(a.confidence, b.confidence));
    let mut kept: Vec<Detection> = Vec::with_capacity(dets.len());

    'outer: for d in dets {
        for k in &kept {
            if k.rect.iou(&d.rect) > iou_th {
                continue 'outer;
            }
        }
        kept.push(d);
    }
    kept
}

fn by_confidence_desc(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}
