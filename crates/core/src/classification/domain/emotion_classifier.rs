use thiserror::Error;

use crate::classification::domain::emotion_label::{
    ClassificationResult, EmotionLabel, EmotionProbabilities,
};
use crate::classification::domain::emotion_model::EmotionModel;
use crate::classification::domain::image_normalizer::{ImageNormalizer, NormalizeError};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error(transparent)]
    InvalidInput(#[from] NormalizeError),
    #[error("classifier input has shape {actual:?}, expected {expected:?}")]
    InputShape {
        expected: [usize; 4],
        actual: Vec<usize>,
    },
    #[error("emotion model failed: {0}")]
    Inference(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("emotion model returned {actual} values, expected {expected}")]
    ModelOutputMismatch { expected: usize, actual: usize },
    #[error("emotion model returned non-finite value {value} at index {index}")]
    NonFiniteOutput { index: usize, value: f32 },
    #[error("predicted index {0} has no emotion label")]
    InvalidIndex(usize),
}

impl ClassifyError {
    /// True for every variant that means the model produced an unusable vector.
    pub fn is_output_mismatch(&self) -> bool {
        matches!(
            self,
            ClassifyError::ModelOutputMismatch { .. } | ClassifyError::NonFiniteOutput { .. }
        )
    }
}

/// Wraps an [`EmotionModel`] with input normalization and output checks.
pub struct EmotionClassifier {
    model: Box<dyn EmotionModel>,
    normalizer: ImageNormalizer,
}

impl EmotionClassifier {
    pub fn new(model: Box<dyn EmotionModel>, normalizer: ImageNormalizer) -> Self {
        Self { model, normalizer }
    }

    /// Classifies a cropped face.
    ///
    /// The winning label is the first index holding the maximum probability.
    pub fn classify(&mut self, face: &Frame) -> Result<ClassificationResult, ClassifyError> {
        let tensor = self.normalizer.normalize(face)?;
        let expected = self.normalizer.output_shape();
        if tensor.shape() != expected {
            return Err(ClassifyError::InputShape {
                expected,
                actual: tensor.shape().to_vec(),
            });
        }

        let output = self
            .model
            .predict(tensor.view())
            .map_err(ClassifyError::Inference)?;

        let values: [f32; EmotionLabel::COUNT] =
            output
                .as_slice()
                .try_into()
                .map_err(|_| ClassifyError::ModelOutputMismatch {
                    expected: EmotionLabel::COUNT,
                    actual: output.len(),
                })?;
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ClassifyError::NonFiniteOutput { index, value });
        }

        let (best, confidence) = argmax(&values);
        let label = EmotionLabel::from_index(best).ok_or(ClassifyError::InvalidIndex(best))?;

        Ok(ClassificationResult {
            label,
            confidence,
            probabilities: EmotionProbabilities::new(values),
        })
    }
}

fn argmax(values: &[f32]) -> (usize, f32) {
    let mut best = (0, f32::NEG_INFINITY);
    for (i, &v) in values.iter().enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::ArrayView4;
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    struct StubModel {
        output: Vec<f32>,
        seen_shapes: Arc<Mutex<Vec<Vec<usize>>>>,
    }

    impl StubModel {
        fn new(output: Vec<f32>) -> Self {
            Self {
                output,
                seen_shapes: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl EmotionModel for StubModel {
        fn predict(
            &mut self,
            input: ArrayView4<'_, f32>,
        ) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
            self.seen_shapes.lock().unwrap().push(input.shape().to_vec());
            Ok(self.output.clone())
        }
    }

    struct FailingModel;

    impl EmotionModel for FailingModel {
        fn predict(
            &mut self,
            _input: ArrayView4<'_, f32>,
        ) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
            Err("session crashed".into())
        }
    }

    fn face(w: u32, h: u32) -> Frame {
        Frame::new(vec![90; (w * h * 3) as usize], w, h, 3, 0).unwrap()
    }

    fn classifier(output: Vec<f32>) -> EmotionClassifier {
        EmotionClassifier::new(Box::new(StubModel::new(output)), ImageNormalizer::default())
    }

    #[test]
    fn test_argmax_label_and_confidence() {
        let probs = vec![0.05, 0.05, 0.05, 0.6, 0.1, 0.1, 0.05];
        let result = classifier(probs).classify(&face(50, 50)).unwrap();
        assert_eq!(result.label, EmotionLabel::Happy);
        assert_relative_eq!(result.confidence, 0.6);
        assert!((result.probabilities.sum() - 1.0).abs() < 1e-3);
    }

    #[rstest]
    #[case::first(vec![0.7, 0.05, 0.05, 0.05, 0.05, 0.05, 0.05], EmotionLabel::Angry)]
    #[case::last(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.1, 0.9], EmotionLabel::Surprise)]
    #[case::tie_takes_first(vec![0.0, 0.0, 0.4, 0.0, 0.4, 0.2, 0.0], EmotionLabel::Fear)]
    fn test_label_selection(#[case] probs: Vec<f32>, #[case] expected: EmotionLabel) {
        let result = classifier(probs).classify(&face(20, 20)).unwrap();
        assert_eq!(result.label, expected);
        assert_relative_eq!(
            result.confidence,
            result
                .probabilities
                .iter()
                .map(|(_, p)| p)
                .fold(f32::MIN, f32::max)
        );
    }

    #[rstest]
    #[case::too_short(vec![0.5; 6])]
    #[case::too_long(vec![0.1; 8])]
    #[case::empty(vec![])]
    fn test_wrong_length_is_output_mismatch(#[case] output: Vec<f32>) {
        let len = output.len();
        let err = classifier(output).classify(&face(10, 10)).unwrap_err();
        match err {
            ClassifyError::ModelOutputMismatch { expected, actual } => {
                assert_eq!(expected, 7);
                assert_eq!(actual, len);
            }
            other => panic!("expected ModelOutputMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_nan_output_is_output_mismatch() {
        let err = classifier(vec![0.1, f32::NAN, 0.1, 0.1, 0.1, 0.1, 0.1])
            .classify(&face(10, 10))
            .unwrap_err();
        assert!(err.is_output_mismatch());
        assert!(matches!(err, ClassifyError::NonFiniteOutput { index: 1, .. }));
    }

    #[test]
    fn test_model_receives_fixed_shape() {
        let model = StubModel::new(vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let shapes = model.seen_shapes.clone();
        let mut classifier = EmotionClassifier::new(Box::new(model), ImageNormalizer::default());
        classifier.classify(&face(123, 77)).unwrap();
        assert_eq!(shapes.lock().unwrap()[0], vec![1, 64, 64, 3]);
    }

    #[test]
    fn test_empty_face_is_invalid_input() {
        let empty = Frame::new(Vec::new(), 0, 10, 3, 0).unwrap();
        let err = classifier(vec![0.0; 7]).classify(&empty).unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidInput(_)));
    }

    #[test]
    fn test_model_failure_is_inference_error() {
        let mut classifier =
            EmotionClassifier::new(Box::new(FailingModel), ImageNormalizer::default());
        let err = classifier.classify(&face(10, 10)).unwrap_err();
        assert!(matches!(err, ClassifyError::Inference(_)));
        assert!(err.to_string().contains("session crashed"));
    }
}
