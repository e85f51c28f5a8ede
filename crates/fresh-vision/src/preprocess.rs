use image::{imageops::FilterType, DynamicImage};

/// Model input: RGB, NHWC, f32 in [0,1].
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl InputTensor {
    pub const CHANNELS: usize = 3;

    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * Self::CHANNELS
    }

    /// Shape as `[1, h, w, 3]`.
    pub fn shape(&self) -> [usize; 4] {
        [1, self.height as usize, self.width as usize, Self::CHANNELS]
    }
}

/// Bilinear resize to the model resolution, then divide every channel by 255.
pub fn to_input_tensor(image: &DynamicImage, width: u32, height: u32) -> InputTensor {
    let rgb = image.to_rgb8();
    let resized = image::imageops::resize(&rgb, width, height, FilterType::Triangle);
    let data = resized.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect();
    InputTensor { width, height, data }
}
