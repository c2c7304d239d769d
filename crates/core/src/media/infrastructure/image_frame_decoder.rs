use crate::media::domain::frame_codec::FrameDecoder;
use crate::shared::frame::Frame;

/// Decodes in-memory image bytes with the `image` crate, guessing the
/// container format from the content.
pub struct ImageFrameDecoder;

impl ImageFrameDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for ImageFrameDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>> {
        let image = image::load_from_memory(bytes)?;
        Ok(Frame::from_rgb_image(image.to_rgb8(), 0))
    }
}
