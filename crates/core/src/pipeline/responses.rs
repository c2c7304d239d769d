use serde::Serialize;

use crate::classification::domain::emotion_label::{
    ClassificationResult, EmotionLabel, EmotionProbabilities,
};
use crate::shared::region::FaceRegion;

/// One classified face in an upload result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRecord {
    pub emotion: EmotionLabel,
    pub confidence: f32,
    pub emotion_probabilities: EmotionProbabilities,
    pub bbox: FaceRegion,
}

impl DetectionRecord {
    pub fn new(bbox: FaceRegion, result: ClassificationResult) -> Self {
        Self {
            emotion: result.label,
            confidence: result.confidence,
            emotion_probabilities: result.probabilities,
            bbox,
        }
    }
}

/// A located face whose classification failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceFailure {
    pub bbox: FaceRegion,
    pub reason: String,
}

/// Success payload of an upload.
///
/// `faces_detected` is the raw locator count, so it can exceed
/// `results.len()` when faces were skipped or failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub faces_detected: usize,
    pub results: Vec<DetectionRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FaceFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
}

impl StatusBody {
    pub fn success() -> Self {
        Self { status: "success" }
    }
}
