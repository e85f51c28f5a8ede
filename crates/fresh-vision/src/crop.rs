use image::DynamicImage;

use crate::geometry::Rect;

/// In-bounds pixel region, always at least 1x1 for a non-empty image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clamps `rect` onto a `width` x `height` image.
///
/// left/top land in `[0, dim-1]`, right/bottom in `[start+1, dim]`. Fractional
/// coordinates truncate toward zero and NaN becomes 0.
pub fn crop_bounds(width: u32, height: u32, rect: &Rect) -> CropBounds {
    let (x0, x1) = clamp_span(rect.left, rect.right, width);
    let (y0, y1) = clamp_span(rect.top, rect.bottom, height);
    CropBounds { x: x0, y: y0, width: x1 - x0, height: y1 - y0 }
}

fn clamp_span(start: f32, end: f32, dim: u32) -> (u32, u32) {
    let dim = i64::from(dim.max(1));
    // float -> int casts saturate and map NaN to 0
    let s = (start as i64).clamp(0, dim - 1);
    let e = (end as i64).clamp(s + 1, dim);
    (s as u32, e as u32)
}

/// Crops the region under `rect`, clamped to the image. Never fails.
pub fn crop(image: &DynamicImage, rect: &Rect) -> DynamicImage {
    if image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    let b = crop_bounds(image.width(), image.height(), rect);
    image.crop_imm(b.x, b.y, b.width, b.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 0])))
    }

    #[test]
    fn oversized_rect_covers_whole_image() {
        let r = Rect::new(-10.0, -10.0, 500.0, 500.0);
        assert_eq!(crop_bounds(416, 416, &r), CropBounds { x: 0, y: 0, width: 416, height: 416 });
        let out = crop(&image(416, 416), &r);
        assert_eq!((out.width(), out.height()), (416, 416));
    }

    #[test]
    fn inner_rect_is_cropped_exactly() {
        let img = image(64, 48);
        let out = crop(&img, &Rect::new(10.0, 5.0, 30.0, 25.0));
        assert_eq!((out.width(), out.height()), (20, 20));
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &Rgb([10, 5, 0]));
    }

    #[test]
    fn fractional_coordinates_truncate() {
        let b = crop_bounds(100, 100, &Rect::new(10.7, 20.2, 30.9, 40.5));
        assert_eq!(b, CropBounds { x: 10, y: 20, width: 20, height: 20 });
    }

    #[test]
    fn rect_outside_image_still_yields_a_pixel() {
        let beyond = crop_bounds(50, 40, &Rect::new(80.0, 90.0, 120.0, 130.0));
        assert_eq!(beyond, CropBounds { x: 49, y: 39, width: 1, height: 1 });

        let before = crop_bounds(50, 40, &Rect::new(-80.0, -90.0, -20.0, -30.0));
        assert_eq!(before, CropBounds { x: 0, y: 0, width: 1, height: 1 });

        let inverted = crop_bounds(50, 40, &Rect::new(30.0, 30.0, 10.0, 10.0));
        assert_eq!(inverted, CropBounds { x: 30, y: 30, width: 1, height: 1 });
    }

    #[test]
    fn non_finite_coordinates_are_clamped() {
        let b = crop_bounds(50, 40, &Rect::new(f32::NAN, f32::NEG_INFINITY, f32::INFINITY, f32::NAN));
        assert_eq!(b.x, 0);
        assert_eq!(b.y, 0);
        assert_eq!(b.width, 50);
        assert_eq!(b.height, 1);
    }

    #[test]
    fn zero_sized_image_is_returned_unchanged() {
        let img = DynamicImage::new_rgb8(0, 5);
        let out = crop(&img, &Rect::new(1.0, 1.0, 4.0, 4.0));
        assert_eq!((out.width(), out.height()), (0, 5));

        let out = crop(&DynamicImage::new_rgb8(7, 0), &Rect::new(-3.0, 0.0, 100.0, 2.0));
        assert_eq!((out.width(), out.height()), (7, 0));
    }

    #[test]
    fn bounds_always_fit() {
        let dims = [(1u32, 1u32), (3, 7), (416, 416), (640, 480)];
        let coords = [-1e6f32, -10.0, -0.5, 0.0, 0.4, 1.0, 2.5, 100.0, 415.9, 416.0, 1e6];
        for &(w, h) in &dims {
            for &l in &coords {
                for &r in &coords {
                    for &t in &coords[..4] {
                        for &b in &coords[5..] {
                            let c = crop_bounds(w, h, &Rect::new(l, t, r, b));
                            assert!(c.width >= 1 && c.x + c.width <= w, "{:?} in {}x{}", c, w, h);
                            assert!(c.height >= 1 && c.y + c.height <= h, "{:?} in {}x{}", c, w, h);
                        }
                    }
                }
            }
        }
    }
}
