pub const APP_DIR_NAME: &str = "Emoscope";

/// Environment variable naming the runtime resource directory.
pub const DATA_DIR_ENV: &str = "EMOSCOPE_DATA_DIR";

pub const LOCATOR_MODEL_NAME: &str = "seeta_fd_frontal_v1.0.bin";
pub const EMOTION_MODEL_NAME: &str = "emotion_model.onnx";

/// Side length of the square classifier input.
pub const CLASSIFIER_INPUT_SIZE: u32 = 64;

pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub const STREAM_BOUNDARY: &str = "frame";
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
