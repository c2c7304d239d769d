use std::time::Instant;

use thiserror::Error;

use crate::annotation::frame_annotator::{Detection, FrameAnnotator};
use crate::capture::camera_controller::{CameraController, CameraError, CameraLease};
use crate::classification::domain::emotion_classifier::EmotionClassifier;
use crate::detection::domain::face_locator::FaceLocator;
use crate::media::domain::frame_codec::FrameEncoder;
use crate::pipeline::multipart::frame_chunk;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::{Frame, FrameError};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum LiveError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error("frame conversion failed: {0}")]
    Frame(#[from] FrameError),
    #[error("face locator failed: {0}")]
    Locate(#[source] BoxError),
    #[error("frame encoding failed: {0}")]
    Encode(#[source] BoxError),
}

/// Live pipeline: camera → grayscale → locate → classify → annotate → JPEG.
///
/// A face whose classification fails keeps its box but gets no caption.
pub struct LiveAnnotationUseCase {
    locator: Box<dyn FaceLocator>,
    classifier: EmotionClassifier,
    annotator: FrameAnnotator,
    encoder: Box<dyn FrameEncoder>,
    logger: Box<dyn PipelineLogger>,
}

impl LiveAnnotationUseCase {
    pub fn new(
        locator: Box<dyn FaceLocator>,
        classifier: EmotionClassifier,
        annotator: FrameAnnotator,
        encoder: Box<dyn FrameEncoder>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            locator,
            classifier,
            annotator,
            encoder,
            logger,
        }
    }

    /// Acquires the camera and returns the chunk stream. Fails with
    /// [`CameraError::ResourceBusy`] while another session is live.
    pub fn start(mut self, camera: &CameraController) -> Result<LiveStream, LiveError> {
        let lease = camera.acquire()?;
        self.logger
            .info(&format!("Live session {} started", lease.session()));
        Ok(LiveStream {
            use_case: self,
            lease: Some(lease),
        })
    }

    /// Locates and classifies every face in `frame`, in locator order.
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, LiveError> {
        let t0 = Instant::now();
        let gray = frame.to_grayscale()?;
        let regions = self.locator.locate(&gray).map_err(LiveError::Locate)?;
        self.logger.timing("locate", ms_since(t0));
        self.logger.metric("faces", regions.len() as f64);

        let t1 = Instant::now();
        let mut detections = Vec::with_capacity(regions.len());
        for region in regions {
            if region.is_empty() || !region.fits_within(frame.width(), frame.height()) {
                log::debug!("Skipping out-of-bounds region {region:?}");
                continue;
            }
            let classification = match frame.crop(&region) {
                Ok(face) => match self.classifier.classify(&face) {
                    Ok(result) => Some(result),
                    Err(e) => {
                        log::warn!("Classification failed for face at {region:?}: {e}");
                        None
                    }
                },
                Err(e) => {
                    log::warn!("Could not crop face at {region:?}: {e}");
                    None
                }
            };
            detections.push(Detection {
                region,
                classification,
            });
        }
        self.logger.timing("classify", ms_since(t1));
        Ok(detections)
    }

    /// Runs one frame through the pipeline and returns its multipart chunk.
    pub fn process_frame(&mut self, mut frame: Frame) -> Result<Vec<u8>, LiveError> {
        let detections = self.detect(&frame)?;
        log::debug!(
            "Frame {}: {} face(s) annotated",
            frame.index(),
            detections.len()
        );

        let t0 = Instant::now();
        self.annotator.annotate(&mut frame, &detections);
        self.logger.timing("annotate", ms_since(t0));

        let t1 = Instant::now();
        let jpeg = self.encoder.encode(&frame).map_err(LiveError::Encode)?;
        self.logger.timing("encode", ms_since(t1));

        self.logger.frame(frame.index());
        Ok(frame_chunk(&jpeg))
    }
}

fn ms_since(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Multipart chunks of one live session.
///
/// Ends (returns `None`) when the camera is stopped or a frame read fails.
/// A processing failure yields one `Err` item, then the stream ends. The
/// camera is released whenever the stream ends or is dropped.
pub struct LiveStream {
    use_case: LiveAnnotationUseCase,
    lease: Option<CameraLease>,
}

impl LiveStream {
    pub fn is_active(&self) -> bool {
        self.lease.is_some()
    }

    fn finish(&mut self) {
        if let Some(mut lease) = self.lease.take() {
            lease.release();
            self.use_case.logger.summary();
        }
    }
}

impl Iterator for LiveStream {
    type Item = Result<Vec<u8>, LiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        let lease = self.lease.as_mut()?;
        let frame = match lease.read_frame() {
            Ok(frame) => frame,
            Err(CameraError::Closed) => {
                log::info!("Camera stopped, ending stream");
                self.finish();
                return None;
            }
            Err(e) => {
                log::warn!("Ending stream: {e}");
                self.finish();
                return None;
            }
        };
        match self.use_case.process_frame(frame) {
            Ok(chunk) => Some(Ok(chunk)),
            Err(e) => {
                self.finish();
                Some(Err(e))
            }
        }
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        self.finish();
    }
}
