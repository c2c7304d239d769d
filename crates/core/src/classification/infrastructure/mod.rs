pub mod onnx_emotion_model;
