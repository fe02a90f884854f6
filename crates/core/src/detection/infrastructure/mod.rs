pub mod model_resolver;
pub mod onnx_arcface_encoder;
pub mod onnx_blazeface_detector;
