use image::{GrayImage, RgbImage};
use ndarray::{s, ArrayView3};
use thiserror::Error;

use crate::shared::region::FaceRegion;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame data length {actual} does not match {width}x{height}x{channels}")]
    DimensionMismatch {
        actual: usize,
        width: u32,
        height: u32,
        channels: u8,
    },
    #[error("expected a 3-channel color frame, got {0} channel(s)")]
    NotColor(u8),
    #[error("region {region:?} lies outside the {width}x{height} frame")]
    RegionOutOfBounds {
        region: FaceRegion,
        width: u32,
        height: u32,
    },
}

/// A single camera or upload frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the pipeline treats
/// pixel data as opaque except where it needs grayscale or a crop.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        index: usize,
    ) -> Result<Self, FrameError> {
        let expected = (width as usize) * (height as usize) * (channels as usize);
        if data.len() != expected {
            return Err(FrameError::DimensionMismatch {
                actual: data.len(),
                width,
                height,
                channels,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            index,
        })
    }

    pub fn from_rgb_image(image: RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            channels: 3,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length is validated on construction")
    }

    /// Hands the pixel buffer to `draw` as an [`RgbImage`] without copying,
    /// then takes it back.
    pub fn draw_rgb<F>(&mut self, draw: F) -> Result<(), FrameError>
    where
        F: FnOnce(&mut RgbImage),
    {
        if self.channels != 3 {
            return Err(FrameError::NotColor(self.channels));
        }
        let data = std::mem::take(&mut self.data);
        let actual = data.len();
        let mut image = RgbImage::from_raw(self.width, self.height, data).ok_or(
            FrameError::DimensionMismatch {
                actual,
                width: self.width,
                height: self.height,
                channels: self.channels,
            },
        )?;
        draw(&mut image);
        self.data = image.into_raw();
        Ok(())
    }

    pub fn to_rgb_image(&self) -> Result<RgbImage, FrameError> {
        if self.channels != 3 {
            return Err(FrameError::NotColor(self.channels));
        }
        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or(
            FrameError::DimensionMismatch {
                actual: self.data.len(),
                width: self.width,
                height: self.height,
                channels: self.channels,
            },
        )
    }

    /// Luma conversion used as face-locator input.
    pub fn to_grayscale(&self) -> Result<GrayImage, FrameError> {
        let rgb = self.to_rgb_image()?;
        Ok(image::imageops::grayscale(&rgb))
    }

    /// Copies the pixels under `region` into a new frame.
    pub fn crop(&self, region: &FaceRegion) -> Result<Frame, FrameError> {
        if !region.fits_within(self.width, self.height) {
            return Err(FrameError::RegionOutOfBounds {
                region: *region,
                width: self.width,
                height: self.height,
            });
        }
        let (x, y) = (region.x as usize, region.y as usize);
        let (w, h) = (region.width as usize, region.height as usize);
        let view = self.as_ndarray();
        let data: Vec<u8> = view.slice(s![y..y + h, x..x + w, ..]).iter().copied().collect();
        Ok(Frame {
            data,
            width: region.width,
            height: region.height,
            channels: self.channels,
            index: self.index,
        })
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
