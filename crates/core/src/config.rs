use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::infrastructure::ffmpeg_camera::CameraConfig;
use crate::classification::domain::image_normalizer::ChannelOrder;
use crate::detection::domain::face_locator::LocatorConfig;
use crate::shared::constants::{
    APP_DIR_NAME, DEFAULT_JPEG_QUALITY, EMOTION_MODEL_NAME, LOCATOR_MODEL_NAME, MAX_UPLOAD_BYTES,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where data files live and what they are called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Searched before every other location.
    pub data_dir: Option<PathBuf>,
    pub locator_model: String,
    pub emotion_model: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            locator_model: LOCATOR_MODEL_NAME.to_string(),
            emotion_model: EMOTION_MODEL_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Explicit model path; bypasses the resource search when set.
    pub model_path: Option<PathBuf>,
    pub channel_order: ChannelOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub jpeg_quality: u8,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

/// Process configuration. Every field is optional in the JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmoscopeConfig {
    pub locator: LocatorConfig,
    pub resources: ResourceConfig,
    pub classifier: ClassifierConfig,
    pub camera: CameraConfig,
    pub stream: StreamConfig,
    pub upload: UploadConfig,
}

impl EmoscopeConfig {
    /// Per-user config file location.
    ///
    /// - macOS: `~/Library/Application Support/Emoscope/config.json`
    /// - Linux: `~/.config/Emoscope/config.json`
    /// - Windows: `%APPDATA%/Emoscope/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.json"))
    }

    /// Loads `path` if given (it must exist), otherwise the per-user file
    /// when present, otherwise defaults. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.locator
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if !(1..=100).contains(&self.stream.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "stream.jpeg_quality must be in 1..=100, got {}",
                self.stream.jpeg_quality
            )));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid("upload.max_bytes must be positive".into()));
        }
        if self.camera.width == 0 || self.camera.height == 0 || self.camera.fps == 0 {
            return Err(ConfigError::Invalid(
                "camera width, height and fps must be positive".into(),
            ));
        }
        if self.resources.locator_model.is_empty() || self.resources.emotion_model.is_empty() {
            return Err(ConfigError::Invalid("model file names must not be empty".into()));
        }
        Ok(())
    }
}
