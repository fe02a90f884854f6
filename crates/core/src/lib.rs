//! Core library for scanning a video for the presence of a reference face.
//!
//! The pipeline has two stages: encode a reference image into a single face
//! embedding, then walk sampled video frames comparing every detected face
//! against it until the first match or the frame ceiling.

pub mod detection;
pub mod pipeline;
pub mod shared;
pub mod video;
