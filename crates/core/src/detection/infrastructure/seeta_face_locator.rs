/// Face locator backed by the `rustface` crate (SeetaFace cascade).
///
/// The cascade model file is found through the resource fallback chain when
/// the locator is built; construction fails only when every candidate fails.
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::GrayImage;

use crate::detection::domain::face_locator::{
    FaceLocator, LocatorConfig, LocatorError, MIN_SUPPORTED_FACE_SIZE,
};
use crate::shared::region::FaceRegion;
use crate::shared::resource_resolver::{resolve_with, LoadError, ResourceCandidate};

/// Cascade score each agreeing neighbor window contributes.
///
/// The detector merges overlapping windows by summing their scores, so the
/// neighbor requirement becomes a threshold on the merged score.
const SCORE_PER_NEIGHBOR: f64 = 0.4;

const SLIDE_WINDOW_STEP: u32 = 4;

pub struct SeetaFaceLocator {
    model: rustface::Model,
    model_path: PathBuf,
    config: LocatorConfig,
}

impl SeetaFaceLocator {
    /// Loads `model_name` from the first candidate that yields a valid model.
    pub fn from_candidates(
        model_name: &str,
        candidates: &[ResourceCandidate],
        config: LocatorConfig,
    ) -> Result<Self, LocatorError> {
        config.validate()?;
        let (model_path, model) = resolve_with(model_name, candidates, load_model)?;
        log::info!("Face locator model loaded from {}", model_path.display());
        Ok(Self {
            model,
            model_path,
            config,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

fn load_model(path: &Path) -> Result<rustface::Model, LoadError> {
    let file = File::open(path)?;
    Ok(rustface::read_model(BufReader::new(file))?)
}

/// Converts a growth factor (`1.1` = each window 10% larger) into the
/// detector's pyramid shrink factor, clamped to the range it accepts.
fn pyramid_scale(scale_factor: f32) -> f32 {
    (1.0 / scale_factor).clamp(0.01, 0.99)
}

fn score_threshold(min_neighbors: u32) -> f64 {
    (min_neighbors.max(1) as f64) * SCORE_PER_NEIGHBOR
}

impl FaceLocator for SeetaFaceLocator {
    fn locate(
        &mut self,
        gray: &GrayImage,
    ) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error + Send + Sync>> {
        let (width, height) = gray.dimensions();
        let min_size = self.config.min_size.max(MIN_SUPPORTED_FACE_SIZE);
        if width.min(height) < min_size {
            log::debug!("{width}x{height} image is smaller than min face size {min_size}");
            return Ok(Vec::new());
        }

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(min_size);
        detector.set_score_thresh(score_threshold(self.config.min_neighbors));
        detector.set_pyramid_scale_factor(pyramid_scale(self.config.scale_factor));
        detector.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));
        let regions: Vec<FaceRegion> = faces
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                FaceRegion::clipped(
                    bbox.x() as i64,
                    bbox.y() as i64,
                    bbox.width() as i64,
                    bbox.height() as i64,
                    width,
                    height,
                )
            })
            .collect();

        log::debug!(
            "Located {} face(s) ({} raw) in {width}x{height} image",
            regions.len(),
            faces.len()
        );
        Ok(regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    #[rstest]
    #[case(1.1, 1.0 / 1.1)]
    #[case(1.25, 0.8)]
    #[case(1.0001, 0.99)]
    #[case(500.0, 0.01)]
    fn test_pyramid_scale(#[case] growth: f32, #[case] expected: f32) {
        assert_relative_eq!(pyramid_scale(growth), expected, epsilon = 1e-4);
    }

    #[test]
    fn test_default_neighbors_threshold() {
        assert_relative_eq!(score_threshold(5), 2.0);
        assert!(score_threshold(0) > 0.0);
    }

    #[test]
    fn test_unavailable_when_every_candidate_fails() {
        let tmp = TempDir::new().unwrap();
        let corrupt_dir = tmp.path().join("corrupt");
        fs::create_dir_all(&corrupt_dir).unwrap();
        fs::write(corrupt_dir.join("cascade.bin"), b"").unwrap();

        let chain = vec![
            ResourceCandidate::RuntimeDir(None),
            ResourceCandidate::WorkingDir(tmp.path().join("missing")),
            ResourceCandidate::SystemDir(corrupt_dir),
        ];
        let err = SeetaFaceLocator::from_candidates("cascade.bin", &chain, LocatorConfig::default())
            .err()
            .unwrap();
        match err {
            LocatorError::Unavailable(e) => {
                let crate::shared::resource_resolver::ResourceResolveError::Exhausted {
                    attempts,
                    ..
                } = e;
                assert_eq!(attempts.len(), 3);
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_config_fails_before_resolving() {
        let config = LocatorConfig {
            min_size: 5,
            ..Default::default()
        };
        let err = SeetaFaceLocator::from_candidates("cascade.bin", &[], config)
            .err()
            .unwrap();
        assert!(matches!(err, LocatorError::InvalidConfig(_)));
    }
}
