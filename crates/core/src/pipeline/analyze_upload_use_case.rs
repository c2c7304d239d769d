use thiserror::Error;

use crate::classification::domain::emotion_classifier::EmotionClassifier;
use crate::detection::domain::face_locator::FaceLocator;
use crate::media::domain::frame_codec::FrameDecoder;
use crate::pipeline::responses::{BatchResult, DetectionRecord, ErrorBody, FaceFailure};
use crate::shared::constants::MAX_UPLOAD_BYTES;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The image field of an upload request after transport decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: Some(filename.into()),
            bytes,
        }
    }
}

/// Request-level failures. The `Display` text is the client-facing message.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No image provided")]
    MissingFile,
    #[error("No image selected")]
    EmptyFilename,
    #[error("File too large")]
    TooLarge { size: usize, limit: usize },
    #[error("Invalid image format")]
    Decode(#[source] BoxError),
    #[error("Error processing image")]
    Processing(#[source] BoxError),
    #[error("Face detection failed")]
    Locator(#[source] BoxError),
    #[error("No face detected in the image")]
    NoFaceDetected,
}

impl UploadError {
    /// HTTP-style status for the error payload.
    pub fn status_code(&self) -> u16 {
        match self {
            UploadError::TooLarge { .. } => 413,
            UploadError::Locator(_) => 500,
            _ => 400,
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }
}

/// Single-image pipeline: decode → grayscale → locate → classify each face.
///
/// Per-face classification failures are logged and reported in
/// [`BatchResult::failures`]; they never fail the request.
pub struct AnalyzeUploadUseCase {
    decoder: Box<dyn FrameDecoder>,
    locator: Box<dyn FaceLocator>,
    classifier: EmotionClassifier,
    max_bytes: usize,
}

impl AnalyzeUploadUseCase {
    pub fn new(
        decoder: Box<dyn FrameDecoder>,
        locator: Box<dyn FaceLocator>,
        classifier: EmotionClassifier,
    ) -> Self {
        Self {
            decoder,
            locator,
            classifier,
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Validates the upload field, then analyzes its bytes.
    pub fn process_upload(
        &mut self,
        upload: Option<&UploadedFile>,
    ) -> Result<BatchResult, UploadError> {
        let upload = upload.ok_or(UploadError::MissingFile)?;
        if upload.filename.as_deref().map_or(true, str::is_empty) {
            return Err(UploadError::EmptyFilename);
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: upload.bytes.len(),
                limit: self.max_bytes,
            });
        }
        self.analyze(&upload.bytes)
    }

    /// Runs the pipeline over raw image bytes.
    pub fn analyze(&mut self, bytes: &[u8]) -> Result<BatchResult, UploadError> {
        let frame = self.decoder.decode(bytes).map_err(UploadError::Decode)?;
        let gray = frame
            .to_grayscale()
            .map_err(|e| UploadError::Processing(Box::new(e)))?;
        let regions = self.locator.locate(&gray).map_err(UploadError::Locator)?;
        if regions.is_empty() {
            return Err(UploadError::NoFaceDetected);
        }
        log::debug!(
            "Located {} face(s) in {}x{} upload",
            regions.len(),
            frame.width(),
            frame.height()
        );

        let mut results = Vec::with_capacity(regions.len());
        let mut failures = Vec::new();
        for region in &regions {
            if !region.fits_within(frame.width(), frame.height()) || region.is_empty() {
                log::debug!("Skipping out-of-bounds region {region:?}");
                continue;
            }
            let outcome = frame
                .crop(region)
                .map_err(|e| e.to_string())
                .and_then(|face| self.classifier.classify(&face).map_err(|e| e.to_string()));
            match outcome {
                Ok(result) => results.push(DetectionRecord::new(*region, result)),
                Err(reason) => {
                    log::warn!("Classification failed for face at {region:?}: {reason}");
                    failures.push(FaceFailure {
                        bbox: *region,
                        reason,
                    });
                }
            }
        }

        Ok(BatchResult {
            faces_detected: regions.len(),
            results,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::emotion_label::EmotionLabel;
    use crate::classification::domain::emotion_model::EmotionModel;
    use crate::classification::domain::image_normalizer::ImageNormalizer;
    use crate::media::infrastructure::image_frame_decoder::ImageFrameDecoder;
    use crate::shared::frame::Frame;
    use crate::shared::region::FaceRegion;
    use approx::assert_relative_eq;
    use image::{GrayImage, ImageFormat, Rgb, RgbImage};
    use ndarray::ArrayView4;
    use std::collections::VecDeque;
    use std::io::Cursor;

    // --- Stubs ---

    struct StubLocator {
        regions: Vec<FaceRegion>,
    }

    impl FaceLocator for StubLocator {
        fn locate(&mut self, _gray: &GrayImage) -> Result<Vec<FaceRegion>, BoxError> {
            Ok(self.regions.clone())
        }
    }

    struct FailingLocator;

    impl FaceLocator for FailingLocator {
        fn locate(&mut self, _gray: &GrayImage) -> Result<Vec<FaceRegion>, BoxError> {
            Err("cascade exploded".into())
        }
    }

    /// Replays scripted outputs in call order; `None` means the call fails.
    struct ScriptedModel {
        outputs: VecDeque<Option<Vec<f32>>>,
    }

    impl ScriptedModel {
        fn new(outputs: Vec<Option<Vec<f32>>>) -> Self {
            Self {
                outputs: outputs.into(),
            }
        }
    }

    impl EmotionModel for ScriptedModel {
        fn predict(&mut self, _input: ArrayView4<'_, f32>) -> Result<Vec<f32>, BoxError> {
            match self.outputs.pop_front().flatten() {
                Some(output) => Ok(output),
                None => Err("inference failed".into()),
            }
        }
    }

    /// Ignores the bytes and hands back a 4-channel frame.
    struct RgbaDecoder;

    impl FrameDecoder for RgbaDecoder {
        fn decode(&self, _bytes: &[u8]) -> Result<Frame, BoxError> {
            Ok(Frame::new(vec![0; 16], 2, 2, 4, 0)?)
        }
    }

    // --- Helpers ---

    const HAPPY: [f32; 7] = [0.05, 0.05, 0.05, 0.6, 0.1, 0.1, 0.05];

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(w, h, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn use_case(
        locator: Box<dyn FaceLocator>,
        outputs: Vec<Option<Vec<f32>>>,
    ) -> AnalyzeUploadUseCase {
        AnalyzeUploadUseCase::new(
            Box::new(ImageFrameDecoder::new()),
            locator,
            EmotionClassifier::new(
                Box::new(ScriptedModel::new(outputs)),
                ImageNormalizer::default(),
            ),
        )
    }

    fn stub_locator(regions: Vec<FaceRegion>) -> Box<dyn FaceLocator> {
        Box::new(StubLocator { regions })
    }

    // --- Tests ---

    #[test]
    fn test_single_happy_face() {
        let mut uc = use_case(
            stub_locator(vec![FaceRegion::new(10, 10, 50, 50)]),
            vec![Some(HAPPY.to_vec())],
        );
        let upload = UploadedFile::new("face.png", png_bytes(100, 100));
        let result = uc.process_upload(Some(&upload)).unwrap();

        assert_eq!(result.faces_detected, 1);
        assert_eq!(result.results.len(), 1);
        let record = &result.results[0];
        assert_eq!(record.emotion, EmotionLabel::Happy);
        assert_relative_eq!(record.confidence, 0.6);
        assert_eq!(record.bbox, FaceRegion::new(10, 10, 50, 50));
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_one_failing_face_is_isolated() {
        let regions = vec![
            FaceRegion::new(0, 0, 20, 20),
            FaceRegion::new(30, 30, 20, 20),
            FaceRegion::new(60, 60, 20, 20),
        ];
        let mut uc = use_case(
            stub_locator(regions.clone()),
            vec![Some(HAPPY.to_vec()), None, Some(HAPPY.to_vec())],
        );
        let result = uc.analyze(&png_bytes(100, 100)).unwrap();

        assert_eq!(result.faces_detected, 3);
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.results[0].bbox, regions[0]);
        assert_eq!(result.results[1].bbox, regions[2]);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].bbox, regions[1]);
    }

    #[test]
    fn test_malformed_model_output_is_isolated() {
        let mut uc = use_case(
            stub_locator(vec![FaceRegion::new(0, 0, 20, 20), FaceRegion::new(40, 40, 20, 20)]),
            vec![Some(vec![0.5; 3]), Some(HAPPY.to_vec())],
        );
        let result = uc.analyze(&png_bytes(80, 80)).unwrap();
        assert_eq!(result.faces_detected, 2);
        assert_eq!(result.results.len(), 1);
        assert!(result.failures[0].reason.contains("expected 7"));
    }

    #[test]
    fn test_out_of_bounds_region_is_skipped_silently() {
        let mut uc = use_case(
            stub_locator(vec![FaceRegion::new(90, 90, 50, 50), FaceRegion::new(5, 5, 30, 30)]),
            vec![Some(HAPPY.to_vec())],
        );
        let result = uc.analyze(&png_bytes(100, 100)).unwrap();
        assert_eq!(result.faces_detected, 2);
        assert_eq!(result.results.len(), 1);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_undecodable_bytes() {
        let mut uc = use_case(stub_locator(vec![FaceRegion::new(0, 0, 1, 1)]), vec![]);
        let err = uc.analyze(b"GIF89a but not really").unwrap_err();
        assert!(matches!(err, UploadError::Decode(_)));
        assert_eq!(err.to_string(), "Invalid image format");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_non_rgb_frame_is_processing_error() {
        let mut uc = AnalyzeUploadUseCase::new(
            Box::new(RgbaDecoder),
            stub_locator(vec![FaceRegion::new(0, 0, 1, 1)]),
            EmotionClassifier::new(
                Box::new(ScriptedModel::new(vec![])),
                ImageNormalizer::default(),
            ),
        );
        let upload = UploadedFile::new("alpha.png", vec![1, 2, 3]);
        let err = uc.process_upload(Some(&upload)).unwrap_err();
        assert!(matches!(err, UploadError::Processing(_)));
        assert_eq!(err.to_string(), "Error processing image");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_no_face_detected() {
        let mut uc = use_case(stub_locator(vec![]), vec![]);
        let err = uc.analyze(&png_bytes(40, 40)).unwrap_err();
        assert!(matches!(err, UploadError::NoFaceDetected));
        assert_eq!(err.to_error_body().error, "No face detected in the image");
    }

    #[test]
    fn test_locator_failure_is_server_error() {
        let mut uc = use_case(Box::new(FailingLocator), vec![]);
        let err = uc.analyze(&png_bytes(40, 40)).unwrap_err();
        assert!(matches!(err, UploadError::Locator(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_missing_field() {
        let mut uc = use_case(stub_locator(vec![]), vec![]);
        let err = uc.process_upload(None).unwrap_err();
        assert_eq!(err.to_string(), "No image provided");
    }

    #[test]
    fn test_empty_filename() {
        let mut uc = use_case(stub_locator(vec![]), vec![]);
        for upload in [
            UploadedFile::new("", png_bytes(4, 4)),
            UploadedFile {
                filename: None,
                bytes: png_bytes(4, 4),
            },
        ] {
            let err = uc.process_upload(Some(&upload)).unwrap_err();
            assert!(matches!(err, UploadError::EmptyFilename));
            assert_eq!(err.to_string(), "No image selected");
        }
    }

    #[test]
    fn test_oversized_upload() {
        let mut uc = use_case(stub_locator(vec![]), vec![]).with_max_bytes(16);
        let upload = UploadedFile::new("big.png", vec![0u8; 17]);
        let err = uc.process_upload(Some(&upload)).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { size: 17, limit: 16 }));
        assert_eq!(err.status_code(), 413);
        assert_eq!(err.to_string(), "File too large");
    }

    #[test]
    fn test_default_size_limit() {
        let uc = use_case(stub_locator(vec![]), vec![]);
        assert_eq!(uc.max_bytes, 16 * 1024 * 1024);
    }
}
