use crate::geometry::Rect;
use crate::Detection;

/// Values per detector record: cx, cy, w, h, objectness, class score.
pub const RECORD_LEN: usize = 6;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Decodes a flat detector output into pixel-space detections.
///
/// Records are normalized to the model input; boxes are mapped onto an
/// `image_width` x `image_height` image without clamping. A record survives
/// when `objectness * class_score` is strictly above `conf_th`. Survivors keep
/// their input order. A trailing partial record is ignored.
pub fn decode(raw: &[f32], image_width: u32, image_height: u32, conf_th: f32) -> Vec<Detection> {
    let (w_px, h_px) = (image_width as f32, image_height as f32);

    raw.chunks_exact(RECORD_LEN)
        .filter_map(|rec| {
            let (cx, cy, w, h) = (rec[0], rec[1], rec[2], rec[3]);
            let confidence = rec[4] * rec[5];
            (confidence > conf_th).then(|| Detection {
                rect: Rect::from_center(cx, cy, w, h).scale(w_px, h_px),
                confidence,
            })
        })
        .collect()
}
