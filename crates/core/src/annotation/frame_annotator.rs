use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::annotation::bitmap_font;
use crate::classification::domain::emotion_label::ClassificationResult;
use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const TEXT_COLOR: Rgb<u8> = Rgb([12, 255, 36]);
pub const BOX_THICKNESS: u32 = 2;
pub const TEXT_SCALE: u32 = 3;

/// Gap between the caption's bottom edge and the box top.
const TEXT_MARGIN: u32 = 4;

/// A located face and, when classification succeeded, its emotion.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub region: FaceRegion,
    pub classification: Option<ClassificationResult>,
}

/// Draws face boxes and emotion captions onto a frame in place.
#[derive(Debug, Clone)]
pub struct FrameAnnotator {
    box_color: Rgb<u8>,
    text_color: Rgb<u8>,
    thickness: u32,
    text_scale: u32,
}

impl Default for FrameAnnotator {
    fn default() -> Self {
        Self {
            box_color: BOX_COLOR,
            text_color: TEXT_COLOR,
            thickness: BOX_THICKNESS,
            text_scale: TEXT_SCALE,
        }
    }
}

impl FrameAnnotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws every detection. Never fails; frames that are not 3-channel
    /// are returned untouched.
    pub fn annotate<'a>(&self, frame: &'a mut Frame, detections: &[Detection]) -> &'a mut Frame {
        if detections.is_empty() {
            return frame;
        }
        let drawn = frame.draw_rgb(|image| {
            for detection in detections {
                self.draw_box(image, &detection.region);
                if let Some(result) = &detection.classification {
                    self.draw_caption(image, &detection.region, &result.caption());
                }
            }
        });
        if let Err(e) = drawn {
            log::warn!("Skipping annotation: {e}");
        }
        frame
    }

    fn draw_box(&self, image: &mut RgbImage, region: &FaceRegion) {
        if region.is_empty() {
            return;
        }
        for inset in 0..self.thickness {
            let w = region.width.saturating_sub(2 * inset);
            let h = region.height.saturating_sub(2 * inset);
            if w == 0 || h == 0 {
                break;
            }
            let rect = Rect::at((region.x + inset) as i32, (region.y + inset) as i32).of_size(w, h);
            draw_hollow_rect_mut(image, rect, self.box_color);
        }
    }

    fn draw_caption(&self, image: &mut RgbImage, region: &FaceRegion, text: &str) {
        let y = region
            .y
            .saturating_sub(bitmap_font::text_height(self.text_scale) + TEXT_MARGIN);
        bitmap_font::draw_text(image, region.x, y, text, self.text_color, self.text_scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::emotion_label::{EmotionLabel, EmotionProbabilities};

    fn black_frame(w: u32, h: u32) -> Frame {
        Frame::new(vec![0u8; (w * h * 3) as usize], w, h, 3, 0).unwrap()
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    fn happy() -> ClassificationResult {
        ClassificationResult {
            label: EmotionLabel::Happy,
            confidence: 0.6,
            probabilities: EmotionProbabilities::new([0.05, 0.05, 0.05, 0.6, 0.1, 0.1, 0.05]),
        }
    }

    fn count_color(frame: &Frame, color: Rgb<u8>) -> usize {
        frame.data().chunks(3).filter(|p| *p == color.0).count()
    }

    #[test]
    fn test_box_is_two_pixels_thick() {
        let mut frame = black_frame(100, 100);
        let detections = vec![Detection {
            region: FaceRegion::new(40, 40, 20, 20),
            classification: None,
        }];
        FrameAnnotator::new().annotate(&mut frame, &detections);
        assert_eq!(pixel(&frame, 40, 40), BOX_COLOR.0);
        assert_eq!(pixel(&frame, 41, 41), BOX_COLOR.0);
        assert_eq!(pixel(&frame, 42, 42), [0, 0, 0]);
        assert_eq!(pixel(&frame, 59, 59), BOX_COLOR.0);
        assert_eq!(pixel(&frame, 50, 50), [0, 0, 0]);
    }

    #[test]
    fn test_caption_drawn_above_box() {
        let mut frame = black_frame(200, 120);
        let detections = vec![Detection {
            region: FaceRegion::new(10, 60, 50, 50),
            classification: Some(happy()),
        }];
        FrameAnnotator::new().annotate(&mut frame, &detections);
        let text_rows = frame
            .data()
            .chunks(3 * 200)
            .enumerate()
            .filter(|(_, row)| row.chunks(3).any(|p| p == TEXT_COLOR.0))
            .map(|(y, _)| y)
            .collect::<Vec<_>>();
        assert!(!text_rows.is_empty());
        assert!(text_rows.iter().all(|&y| y < 60));
    }

    #[test]
    fn test_caption_saturates_at_frame_top() {
        let mut frame = black_frame(200, 80);
        let detections = vec![Detection {
            region: FaceRegion::new(10, 2, 50, 50),
            classification: Some(happy()),
        }];
        FrameAnnotator::new().annotate(&mut frame, &detections);
        assert!(count_color(&frame, TEXT_COLOR) > 0);
    }

    #[test]
    fn test_unclassified_face_gets_box_only() {
        let mut frame = black_frame(120, 120);
        let detections = vec![Detection {
            region: FaceRegion::new(30, 50, 40, 40),
            classification: None,
        }];
        FrameAnnotator::new().annotate(&mut frame, &detections);
        assert!(count_color(&frame, BOX_COLOR) > 0);
        assert_eq!(count_color(&frame, TEXT_COLOR), 0);
    }

    #[test]
    fn test_no_detections_leaves_frame_unchanged() {
        let mut frame = black_frame(30, 30);
        FrameAnnotator::new().annotate(&mut frame, &[]);
        assert!(frame.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_box_at_frame_edge_does_not_panic() {
        let mut frame = black_frame(50, 50);
        let detections = vec![
            Detection {
                region: FaceRegion::new(0, 0, 50, 50),
                classification: Some(happy()),
            },
            Detection {
                region: FaceRegion::new(49, 49, 1, 1),
                classification: None,
            },
        ];
        FrameAnnotator::new().annotate(&mut frame, &detections);
        assert_eq!(pixel(&frame, 49, 49), BOX_COLOR.0);
    }
}
