use ndarray::ArrayView4;

/// Domain interface for the emotion classification capability.
///
/// Takes a normalized `(1, 64, 64, 3)` tensor and returns the raw output
/// vector. Shape checks on the output are the caller's job.
pub trait EmotionModel: Send {
    fn predict(
        &mut self,
        input: ArrayView4<'_, f32>,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>>;
}
