use image::imageops::{self, FilterType};
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::CLASSIFIER_INPUT_SIZE;
use crate::shared::frame::Frame;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("invalid input image: {0}")]
    InvalidInput(String),
}

/// Channel layout the classifier was trained on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Rgb,
    #[default]
    Bgr,
}

/// Turns a face crop of any size into the classifier's input tensor.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    size: u32,
    channel_order: ChannelOrder,
}

impl ImageNormalizer {
    pub fn new(channel_order: ChannelOrder) -> Self {
        Self {
            size: CLASSIFIER_INPUT_SIZE,
            channel_order,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// The `(1, size, size, 3)` shape every tensor from this normalizer has.
    pub fn output_shape(&self) -> [usize; 4] {
        let s = self.size as usize;
        [1, s, s, 3]
    }

    /// Bilinear resize to `size × size`, `u8 → f32 / 255`, NHWC with a
    /// leading batch axis of 1.
    pub fn normalize(&self, image: &Frame) -> Result<Array4<f32>, NormalizeError> {
        if image.is_empty() {
            return Err(NormalizeError::InvalidInput(format!(
                "empty {}x{} image",
                image.width(),
                image.height()
            )));
        }
        let rgb = image
            .to_rgb_image()
            .map_err(|e| NormalizeError::InvalidInput(e.to_string()))?;
        let resized = imageops::resize(&rgb, self.size, self.size, FilterType::Triangle);

        let channel_map: [usize; 3] = match self.channel_order {
            ChannelOrder::Rgb => [0, 1, 2],
            ChannelOrder::Bgr => [2, 1, 0],
        };
        let s = self.size as usize;
        let tensor = Array4::from_shape_fn((1, s, s, 3), |(_, y, x, c)| {
            resized.get_pixel(x as u32, y as u32).0[channel_map[c]] as f32 / 255.0
        });
        Ok(tensor)
    }
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(ChannelOrder::default())
    }
}
