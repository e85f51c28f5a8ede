use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates of one specific image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Box from a center point and a size, in whatever units the inputs use.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            left: cx - w / 2.0,
            top: cy - h / 2.0,
            right: cx + w / 2.0,
            bottom: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }

    /// Zero for degenerate boxes (right <= left or bottom <= top).
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        Self {
            left: self.left * sx,
            top: self.top * sy,
            right: self.right * sx,
            bottom: self.bottom * sy,
        }
    }

    pub fn iou(&self, other: &Rect) -> f32 {
        intersection_over_union(self, other)
    }
}

/// Overlap ratio of two boxes. Returns 0 when the union is empty.
pub fn intersection_over_union(a: &Rect, b: &Rect) -> f32 {
    let ix_a = a.left.max(b.left);
    let iy_a = a.top.max(b.top);
    let ix_b = a.right.min(b.right);
    let iy_b = a.bottom.min(b.bottom);

    let iw = (ix_b - ix_a).max(0.0);
    let ih = (iy_b - iy_a).max(0.0);
    let inter = iw * ih;
    let union = a.area() + b.area() - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}
