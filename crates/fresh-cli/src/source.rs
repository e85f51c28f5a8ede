use std::path::Path;

use anyhow::{Context, Result};
use fresh_proto::report::ImageOrigin;
use fresh_vision::{correct_orientation, OrientationTag};
use image::{DynamicImage, ImageDecoder, ImageReader};
use tracing::{debug, warn};

pub struct LoadedImage {
    pub image: DynamicImage,
    pub origin: ImageOrigin,
    /// Correction that was applied while loading.
    pub orientation: OrientationTag,
}

/// Decodes an image file. Camera captures are rotated upright from their
/// EXIF orientation; gallery picks are taken as stored.
pub fn load(path: &Path, origin: ImageOrigin) -> Result<LoadedImage> {
    let mut decoder = ImageReader::open(path)
        .with_context(|| format!("open image {}", path.display()))?
        .with_guessed_format()
        .context("detect image format")?
        .into_decoder()
        .with_context(|| format!("decode image {}", path.display()))?;

    let orientation = match origin {
        ImageOrigin::Camera => match decoder.orientation() {
            Ok(o) => OrientationTag::from(o),
            Err(e) => {
                warn!("source: unreadable orientation metadata, assuming upright: {}", e);
                OrientationTag::Normal
            }
        },
        ImageOrigin::Gallery => OrientationTag::Normal,
    };

    let image = DynamicImage::from_decoder(decoder).with_context(|| format!("decode image {}", path.display()))?;
    anyhow::ensure!(image.width() > 0 && image.height() > 0, "image has no pixels: {}", path.display());

    debug!(
        "source: {} {}x{} origin={:?} rotate={}",
        path.display(),
        image.width(),
        image.height(),
        origin,
        orientation.degrees()
    );
    Ok(LoadedImage { image: correct_orientation(image, orientation), origin, orientation })
}
