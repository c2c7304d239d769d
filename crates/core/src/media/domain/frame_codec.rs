use crate::shared::frame::Frame;

/// Encodes an annotated frame into a compressed image for transport.
pub trait FrameEncoder: Send {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Decodes uploaded bytes of any supported container into an RGB frame.
pub trait FrameDecoder: Send {
    fn decode(&self, bytes: &[u8]) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>>;
}
