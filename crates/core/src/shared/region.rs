use serde::{Deserialize, Serialize};

/// Axis-aligned face rectangle in frame pixel coordinates.
///
/// Serializes as `{x, y, w, h}`. Regions from one pass are independent and
/// may overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
}

impl FaceRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clips a signed detector rectangle to a `frame_w × frame_h` raster.
    ///
    /// Returns `None` when nothing of the rectangle remains inside the frame.
    pub fn clipped(x: i64, y: i64, width: i64, height: i64, frame_w: u32, frame_h: u32) -> Option<Self> {
        let x1 = x.max(0);
        let y1 = y.max(0);
        let x2 = (x + width).min(frame_w as i64);
        let y2 = (y + height).min(frame_h as i64);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self::new(
            x1 as u32,
            y1 as u32,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
        ))
    }

    /// True when `x + w ≤ frame_w` and `y + h ≤ frame_h`.
    pub fn fits_within(&self, frame_w: u32, frame_h: u32) -> bool {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        matches!((right, bottom), (Some(r), Some(b)) if r <= frame_w && b <= frame_h)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
