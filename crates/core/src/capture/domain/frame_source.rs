use crate::shared::frame::Frame;

/// An open camera handle producing frames one at a time.
pub trait FrameSource: Send {
    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>>;

    /// Releases the underlying device. Default: rely on `Drop`.
    fn release(&mut self) {}
}

/// Opens camera handles on demand.
pub trait CameraProvider: Send + Sync {
    fn open(&self) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error + Send + Sync>>;
}
