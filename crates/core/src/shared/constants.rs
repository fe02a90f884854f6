pub const DETECTOR_MODEL_NAME: &str = "blazeface_short_range.onnx";
pub const DETECTOR_MODEL_URL: &str =
    "https://github.com/facespot/facespot/releases/download/v0.1.0/blazeface_short_range.onnx";

pub const ENCODER_MODEL_NAME: &str = "w600k_r50.onnx";
pub const ENCODER_MODEL_URL: &str =
    "https://github.com/facespot/facespot/releases/download/v0.1.0/w600k_r50.onnx";

/// Max embedding distance at which two faces count as the same person.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.55;

/// Frames advanced between successive face probes (~1 second at 30 fps).
pub const DEFAULT_SAMPLE_INTERVAL: usize = 30;

/// Hard upper bound on frames consumed per scan (~5-6 minutes at 30 fps).
pub const DEFAULT_FRAME_CEILING: usize = 10_000;
