use image::GrayImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::region::FaceRegion;
use crate::shared::resource_resolver::ResourceResolveError;

/// Domain interface for the face locating capability.
///
/// Returns zero or more axis-aligned face rectangles in no particular order.
/// Every returned region lies within the input raster.
pub trait FaceLocator {
    fn locate(
        &mut self,
        gray: &GrayImage,
    ) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("face locator unavailable: {0}")]
    Unavailable(#[from] ResourceResolveError),
    #[error("invalid locator configuration: {0}")]
    InvalidConfig(String),
}

/// Sensitivity parameters, fixed when the locator is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Growth factor between successive search window sizes.
    pub scale_factor: f32,
    /// How many overlapping candidate windows must agree on a face.
    pub min_neighbors: u32,
    /// Smallest face side length searched for, in pixels.
    pub min_size: u32,
}

/// Smallest window the cascade can evaluate.
pub const MIN_SUPPORTED_FACE_SIZE: u32 = 20;

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_size: 30,
        }
    }
}

impl LocatorConfig {
    pub fn validate(&self) -> Result<(), LocatorError> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 1.0 || self.scale_factor > 100.0 {
            return Err(LocatorError::InvalidConfig(format!(
                "scale_factor must be in (1.0, 100.0], got {}",
                self.scale_factor
            )));
        }
        if self.min_neighbors == 0 {
            return Err(LocatorError::InvalidConfig(
                "min_neighbors must be at least 1".into(),
            ));
        }
        if self.min_size < MIN_SUPPORTED_FACE_SIZE {
            return Err(LocatorError::InvalidConfig(format!(
                "min_size must be at least {MIN_SUPPORTED_FACE_SIZE}, got {}",
                self.min_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = LocatorConfig::default();
        assert_eq!(config.min_neighbors, 5);
        assert_eq!(config.min_size, 30);
        assert!((config.scale_factor - 1.1).abs() < 1e-6);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::no_growth(LocatorConfig { scale_factor: 1.0, ..Default::default() })]
    #[case::nan_scale(LocatorConfig { scale_factor: f32::NAN, ..Default::default() })]
    #[case::zero_neighbors(LocatorConfig { min_neighbors: 0, ..Default::default() })]
    #[case::tiny_faces(LocatorConfig { min_size: 10, ..Default::default() })]
    fn test_validate_rejects(#[case] config: LocatorConfig) {
        assert!(matches!(
            config.validate(),
            Err(LocatorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: LocatorConfig = serde_json::from_str(r#"{"min_size": 48}"#).unwrap();
        assert_eq!(config.min_size, 48);
        assert_eq!(config.min_neighbors, 5);
    }
}
