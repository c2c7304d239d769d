use serde::{Deserialize, Serialize};

use crate::capture::domain::frame_source::{CameraProvider, FrameSource};
use crate::shared::frame::Frame;

/// Capture device settings. `driver` and `device` default per platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub driver: Option<String>,
    pub device: Option<String>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            driver: None,
            device: None,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

impl CameraConfig {
    pub fn driver_name(&self) -> &str {
        self.driver.as_deref().unwrap_or(default_driver())
    }

    pub fn device_name(&self) -> &str {
        self.device.as_deref().unwrap_or(default_device())
    }
}

#[cfg(target_os = "linux")]
fn default_driver() -> &'static str {
    "video4linux2"
}
#[cfg(target_os = "macos")]
fn default_driver() -> &'static str {
    "avfoundation"
}
#[cfg(target_os = "windows")]
fn default_driver() -> &'static str {
    "dshow"
}
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn default_driver() -> &'static str {
    "video4linux2"
}

#[cfg(target_os = "macos")]
fn default_device() -> &'static str {
    "0"
}
#[cfg(target_os = "windows")]
fn default_device() -> &'static str {
    "video=Integrated Camera"
}
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn default_device() -> &'static str {
    "/dev/video0"
}

/// Opens capture devices through libavdevice.
pub struct FfmpegCameraProvider {
    config: CameraConfig,
}

impl FfmpegCameraProvider {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }
}

impl CameraProvider for FfmpegCameraProvider {
    fn open(&self) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Box::new(FfmpegCamera::open(&self.config)?))
    }
}

/// A live capture device decoded to RGB24 frames.
pub struct FfmpegCamera {
    input_ctx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    video_stream_index: usize,
    frame_index: usize,
}

// Safety: FfmpegCamera is only used from a single thread at a time (the
// controller's mutex serializes access). The raw pointers inside ffmpeg
// types are not shared across threads.
unsafe impl Send for FfmpegCamera {}

impl FfmpegCamera {
    pub fn open(config: &CameraConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let driver = config.driver_name();
        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == driver)
            .ok_or_else(|| format!("Capture driver '{driver}' is not available"))?;

        let mut options = ffmpeg_next::Dictionary::new();
        options.set("video_size", &format!("{}x{}", config.width, config.height));
        options.set("framerate", &config.fps.to_string());

        let device = config.device_name();
        let input_ctx = ffmpeg_next::format::open_with(&device, &format, options)?.input();

        let stream = input_ctx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("Capture device exposes no video stream")?;
        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        log::info!(
            "Opened {driver} device {device} ({}x{})",
            decoder.width(),
            decoder.height()
        );

        Ok(Self {
            input_ctx,
            decoder,
            scaler: None,
            video_stream_index,
            frame_index: 0,
        })
    }

    fn convert(
        &mut self,
        decoded: &ffmpeg_next::util::frame::video::Video,
    ) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>> {
        let (width, height) = (decoded.width(), decoded.height());
        let stale = self
            .scaler
            .as_ref()
            .map_or(true, |s| s.input().width != width || s.input().height != height);
        if stale {
            self.scaler = Some(ffmpeg_next::software::scaling::Context::get(
                decoded.format(),
                width,
                height,
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )?);
        }
        let scaler = self.scaler.as_mut().ok_or("Scaler not initialized")?;

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        let frame = Frame::new(pixels, width, height, 3, self.frame_index)?;
        self.frame_index += 1;
        Ok(frame)
    }
}

impl FrameSource for FfmpegCamera {
    fn read_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return self.convert(&decoded);
            }
            let (stream, packet) = self
                .input_ctx
                .packets()
                .next()
                .ok_or("Capture device stopped delivering packets")?;
            if stream.index() != self.video_stream_index {
                continue;
            }
            self.decoder.send_packet(&packet)?;
        }
    }

    fn release(&mut self) {
        let _ = self.decoder.send_eof();
        log::debug!("Capture device closed after {} frames", self.frame_index);
    }
}

fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
