use thiserror::Error;

use crate::detection::domain::embedding::Embedding;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_encoder::FaceEncoder;
use crate::shared::constants::{
    DEFAULT_FRAME_CEILING, DEFAULT_MATCH_THRESHOLD, DEFAULT_SAMPLE_INTERVAL,
};
use crate::shared::frame::Frame;
use crate::video::domain::video_reader::VideoReader;

/// Per-request scan parameters. No process-wide defaults exist beyond
/// [`ScanConfig::default`]; every request carries its own copy.
#[derive(Clone, Copy, Debug)]
pub struct ScanConfig {
    /// Max embedding distance at which a probed face counts as the
    /// reference person.
    pub match_threshold: f64,
    /// A frame is probed iff `frame_counter % sample_interval == 0`.
    pub sample_interval: usize,
    /// Hard upper bound on frames consumed, independent of stream length.
    pub frame_ceiling: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            frame_ceiling: DEFAULT_FRAME_CEILING,
        }
    }
}

/// Outcome of one full video scan.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanResult {
    pub face_present: bool,
    pub matched_frame_index: Option<usize>,
    pub distance: Option<f64>,
    /// Frames consumed from the stream, probed or not.
    pub frames_seen: usize,
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("scan cancelled")]
    Cancelled,
}

/// Progress callback, polled at every sampled-frame boundary with the
/// current frame counter. Returning `false` aborts the scan.
pub type ProgressFn = Box<dyn Fn(usize) -> bool + Send>;

/// Walks a video stream looking for the reference face.
///
/// Single linear pass with no backtracking: every `sample_interval`-th
/// frame is probed for faces and each detected face is compared against
/// the reference embedding. The first match ends the scan; remaining
/// frames are never read. A probe failure never aborts the scan — it is
/// logged and the walk continues at the next sampled frame. The frame
/// ceiling bounds total work on arbitrarily long inputs.
pub struct ScanVideoUseCase {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn FaceDetector>,
    encoder: Box<dyn FaceEncoder>,
    config: ScanConfig,
    on_progress: Option<ProgressFn>,
}

impl ScanVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn FaceDetector>,
        encoder: Box<dyn FaceEncoder>,
        config: ScanConfig,
        on_progress: Option<ProgressFn>,
    ) -> Result<Self, &'static str> {
        if config.sample_interval < 1 {
            return Err("sample_interval must be >= 1");
        }
        if config.frame_ceiling < 1 {
            return Err("frame_ceiling must be >= 1");
        }
        Ok(Self {
            reader,
            detector,
            encoder,
            config,
            on_progress,
        })
    }

    /// Runs the scan to completion: first match, end of stream, frame
    /// ceiling, or cancellation. The reader is released on every exit
    /// path.
    pub fn execute(&mut self, reference: &Embedding) -> Result<ScanResult, ScanError> {
        let config = self.config;
        let detector = &mut self.detector;
        let encoder = &mut self.encoder;
        let on_progress = &self.on_progress;

        log::info!(
            "Starting video scan (threshold {}, every {}th frame)",
            config.match_threshold,
            config.sample_interval
        );

        let mut counter: usize = 0;
        let mut matched: Option<(usize, f64)> = None;
        let mut cancelled = false;

        for item in self.reader.frames() {
            match item {
                Ok(frame) => {
                    if counter % config.sample_interval == 0 {
                        if let Some(cb) = on_progress {
                            if !cb(counter) {
                                cancelled = true;
                                break;
                            }
                        }
                        match probe(
                            detector.as_mut(),
                            encoder.as_mut(),
                            &frame,
                            reference,
                            config.match_threshold,
                        ) {
                            Ok(Some(distance)) => {
                                log::info!(
                                    "Match found at frame {counter} with distance {distance:.3}"
                                );
                                matched = Some((counter, distance));
                                counter += 1;
                                break;
                            }
                            Ok(None) => {}
                            Err(e) => {
                                // One bad frame never aborts the scan.
                                log::warn!("Error probing frame {counter}: {e}");
                            }
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Error decoding frame {counter}: {e}");
                }
            }

            counter += 1;
            if counter > config.frame_ceiling {
                log::info!(
                    "Frame ceiling {} reached, stopping scan",
                    config.frame_ceiling
                );
                break;
            }
        }

        self.reader.close();

        if cancelled {
            return Err(ScanError::Cancelled);
        }

        let result = match matched {
            Some((frame_index, distance)) => ScanResult {
                face_present: true,
                matched_frame_index: Some(frame_index),
                distance: Some(distance),
                frames_seen: counter,
            },
            None => ScanResult {
                face_present: false,
                matched_frame_index: None,
                distance: None,
                frames_seen: counter,
            },
        };

        log::info!(
            "Video scan complete: {} frames seen, face present: {}",
            result.frames_seen,
            result.face_present
        );

        Ok(result)
    }
}

/// Detects and matches faces in one sampled frame.
///
/// Returns the distance of the first matching face, `None` when nothing
/// matches. A face matches if EITHER the binary gate fires OR the raw
/// distance is strictly below the threshold; both gates share the same
/// threshold and whichever fires first wins.
fn probe(
    detector: &mut dyn FaceDetector,
    encoder: &mut dyn FaceEncoder,
    frame: &Frame,
    reference: &Embedding,
    threshold: f64,
) -> Result<Option<f64>, Box<dyn std::error::Error>> {
    let regions = detector.detect(frame)?;
    if regions.is_empty() {
        return Ok(None);
    }

    let embeddings = encoder.embed(frame, &regions)?;
    for candidate in &embeddings {
        let distance = reference.distance(candidate);
        log::debug!(
            "Frame {}: face found with distance {distance:.3}",
            frame.index()
        );
        if reference.matches(candidate, threshold) || distance < threshold {
            return Ok(Some(distance));
        }
    }

    Ok(None)
}
