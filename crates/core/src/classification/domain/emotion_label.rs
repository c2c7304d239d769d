use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// The seven emotion categories, in classifier output order.
///
/// The declaration order is the index order of the model's output vector;
/// do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Neutral,
    Sad,
    Surprise,
}

impl EmotionLabel {
    pub const COUNT: usize = 7;

    pub const ALL: [EmotionLabel; Self::COUNT] = [
        EmotionLabel::Angry,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Neutral,
        EmotionLabel::Sad,
        EmotionLabel::Surprise,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Angry => "Angry",
            EmotionLabel::Disgust => "Disgust",
            EmotionLabel::Fear => "Fear",
            EmotionLabel::Happy => "Happy",
            EmotionLabel::Neutral => "Neutral",
            EmotionLabel::Sad => "Sad",
            EmotionLabel::Surprise => "Surprise",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-label probabilities as returned by the classifier.
///
/// Serializes as a JSON object keyed by label name, in label order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionProbabilities([f32; EmotionLabel::COUNT]);

impl EmotionProbabilities {
    pub fn new(values: [f32; EmotionLabel::COUNT]) -> Self {
        Self(values)
    }

    pub fn get(&self, label: EmotionLabel) -> f32 {
        self.0[label.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f32)> + '_ {
        EmotionLabel::ALL.iter().copied().zip(self.0.iter().copied())
    }

    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }
}

impl Serialize for EmotionProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(EmotionLabel::COUNT))?;
        for (label, p) in self.iter() {
            map.serialize_entry(label.as_str(), &p)?;
        }
        map.end()
    }
}

/// Outcome of classifying one face.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub label: EmotionLabel,
    /// Equal to the largest entry of `probabilities`.
    pub confidence: f32,
    pub probabilities: EmotionProbabilities,
}

impl ClassificationResult {
    /// Overlay text, e.g. `Happy (0.60)`.
    pub fn caption(&self) -> String {
        format!("{} ({:.2})", self.label, self.confidence)
    }
}
