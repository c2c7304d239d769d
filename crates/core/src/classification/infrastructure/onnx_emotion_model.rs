use std::path::Path;

use ndarray::ArrayView4;

use crate::classification::domain::emotion_model::EmotionModel;

/// Seven-way emotion classifier backed by an ONNX Runtime session.
///
/// Expects a single NHWC float input of shape `(1, 64, 64, 3)` and a single
/// output holding one score per emotion label.
pub struct OnnxEmotionModel {
    session: ort::session::Session,
}

impl OnnxEmotionModel {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;
        log::info!("Loaded emotion model from {}", model_path.display());
        Ok(Self { session })
    }
}

impl EmotionModel for OnnxEmotionModel {
    fn predict(
        &mut self,
        input: ArrayView4<'_, f32>,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
        let input_value = ort::value::Tensor::from_array(input.to_owned())?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Emotion model produced no outputs".into());
        }
        let scores = outputs[0].try_extract_array::<f32>()?;
        Ok(scores.iter().copied().collect())
    }
}

