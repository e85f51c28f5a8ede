use image::metadata::Orientation;
use image::DynamicImage;

/// Clockwise rotation needed to bring a captured photo upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrientationTag {
    #[default]
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl OrientationTag {
    /// Maps the EXIF orientation value. Mirrored and unknown values are treated as `Normal`.
    pub fn from_exif(value: u16) -> Self {
        match value {
            6 => Self::Rotate90,
            3 => Self::Rotate180,
            8 => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::Rotate90 => 90,
            Self::Rotate180 => 180,
            Self::Rotate270 => 270,
        }
    }
}

impl From<Orientation> for OrientationTag {
    fn from(o: Orientation) -> Self {
        match o {
            Orientation::Rotate90 => Self::Rotate90,
            Orientation::Rotate180 => Self::Rotate180,
            Orientation::Rotate270 => Self::Rotate270,
            _ => Self::Normal,
        }
    }
}

/// Rotates `image` clockwise by the tag's angle. Dimensions swap for 90/270.
///
/// Only camera captures carry a meaningful tag; gallery images are expected
/// to be upright already and callers should not route them through here.
pub fn correct_orientation(image: DynamicImage, tag: OrientationTag) -> DynamicImage {
    match tag {
        OrientationTag::Normal => image,
        OrientationTag::Rotate90 => image.rotate90(),
        OrientationTag::Rotate180 => image.rotate180(),
        OrientationTag::Rotate270 => image.rotate270(),
    }
}
