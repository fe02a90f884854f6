use thiserror::Error;

use crate::detection::domain::embedding::Embedding;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_encoder::FaceEncoder;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("reference image must have 3 color channels, got {0}")]
    InvalidReferenceImage(u8),
    #[error("no face found in reference image")]
    NoFaceInReference,
    #[error("could not compute a face embedding from the reference image")]
    UnencodableReference,
    #[error("face detection failed on reference image: {0}")]
    DetectionFailed(String),
}

/// Turns one still image into exactly one reference embedding.
///
/// When the image contains several faces, the first detected region (in
/// the detector's native order) is selected; no ranking by size or
/// confidence is performed.
pub struct EncodeReferenceUseCase {
    detector: Box<dyn FaceDetector>,
    encoder: Box<dyn FaceEncoder>,
}

impl EncodeReferenceUseCase {
    pub fn new(detector: Box<dyn FaceDetector>, encoder: Box<dyn FaceEncoder>) -> Self {
        Self { detector, encoder }
    }

    /// Produces the reference embedding, or fails with a terminal
    /// validation error. Never retried: the caller reports the failure
    /// and the scan does not start.
    pub fn execute(&mut self, image: &Frame) -> Result<Embedding, ReferenceError> {
        if image.channels() != 3 {
            return Err(ReferenceError::InvalidReferenceImage(image.channels()));
        }

        let regions = self
            .detector
            .detect(image)
            .map_err(|e| ReferenceError::DetectionFailed(e.to_string()))?;

        if regions.is_empty() {
            return Err(ReferenceError::NoFaceInReference);
        }

        log::info!("Found {} face(s) in reference image", regions.len());

        let embeddings = match self.encoder.embed(image, &regions) {
            Ok(embeddings) => embeddings,
            Err(e) => {
                log::warn!("Reference embedding failed: {e}");
                return Err(ReferenceError::UnencodableReference);
            }
        };

        embeddings
            .into_iter()
            .next()
            .ok_or(ReferenceError::UnencodableReference)
    }

    /// Releases the model collaborators for reuse by the scan phase.
    pub fn into_parts(self) -> (Box<dyn FaceDetector>, Box<dyn FaceEncoder>) {
        (self.detector, self.encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::region::Region;

    // --- Stubs ---

    struct StubDetector {
        regions: Vec<Region>,
        fail: bool,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            if self.fail {
                return Err("model exploded".into());
            }
            Ok(self.regions.clone())
        }
    }

    struct StubEncoder {
        embeddings: Vec<Embedding>,
        fail: bool,
    }

    impl FaceEncoder for StubEncoder {
        fn embed(
            &mut self,
            _frame: &Frame,
            _regions: &[Region],
        ) -> Result<Vec<Embedding>, Box<dyn std::error::Error>> {
            if self.fail {
                return Err("inference failed".into());
            }
            Ok(self.embeddings.clone())
        }
    }

    // --- Helpers ---

    fn rgb_frame() -> Frame {
        Frame::new(vec![128; 20 * 20 * 3], 20, 20, 3, 0)
    }

    fn use_case(detector: StubDetector, encoder: StubEncoder) -> EncodeReferenceUseCase {
        EncodeReferenceUseCase::new(Box::new(detector), Box::new(encoder))
    }

    fn embedding(seed: f32) -> Embedding {
        Embedding::new(vec![seed, seed + 1.0])
    }

    // --- Tests ---

    #[test]
    fn test_single_face_yields_its_embedding() {
        let mut uc = use_case(
            StubDetector {
                regions: vec![Region::new(5, 5, 10, 10)],
                fail: false,
            },
            StubEncoder {
                embeddings: vec![embedding(0.1)],
                fail: false,
            },
        );

        let result = uc.execute(&rgb_frame()).unwrap();
        assert_eq!(result, embedding(0.1));
    }

    #[test]
    fn test_multiple_faces_selects_first_region() {
        let mut uc = use_case(
            StubDetector {
                regions: vec![Region::new(0, 0, 5, 5), Region::new(10, 10, 9, 9)],
                fail: false,
            },
            StubEncoder {
                embeddings: vec![embedding(0.1), embedding(0.5)],
                fail: false,
            },
        );

        // First detected region wins even though the second is larger.
        let result = uc.execute(&rgb_frame()).unwrap();
        assert_eq!(result, embedding(0.1));
    }

    #[test]
    fn test_wrong_channel_count_is_invalid_image() {
        let mut uc = use_case(
            StubDetector {
                regions: vec![Region::new(5, 5, 10, 10)],
                fail: false,
            },
            StubEncoder {
                embeddings: vec![embedding(0.1)],
                fail: false,
            },
        );

        let gray = Frame::new(vec![128; 20 * 20], 20, 20, 1, 0);
        match uc.execute(&gray) {
            Err(ReferenceError::InvalidReferenceImage(1)) => {}
            other => panic!("expected InvalidReferenceImage, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_detections_is_no_face() {
        let mut uc = use_case(
            StubDetector {
                regions: vec![],
                fail: false,
            },
            StubEncoder {
                embeddings: vec![],
                fail: false,
            },
        );

        match uc.execute(&rgb_frame()) {
            Err(ReferenceError::NoFaceInReference) => {}
            other => panic!("expected NoFaceInReference, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_embeddings_is_unencodable() {
        let mut uc = use_case(
            StubDetector {
                regions: vec![Region::new(5, 5, 10, 10)],
                fail: false,
            },
            StubEncoder {
                embeddings: vec![],
                fail: false,
            },
        );

        match uc.execute(&rgb_frame()) {
            Err(ReferenceError::UnencodableReference) => {}
            other => panic!("expected UnencodableReference, got {other:?}"),
        }
    }

    #[test]
    fn test_encoder_failure_is_unencodable() {
        let mut uc = use_case(
            StubDetector {
                regions: vec![Region::new(5, 5, 10, 10)],
                fail: false,
            },
            StubEncoder {
                embeddings: vec![],
                fail: true,
            },
        );

        match uc.execute(&rgb_frame()) {
            Err(ReferenceError::UnencodableReference) => {}
            other => panic!("expected UnencodableReference, got {other:?}"),
        }
    }

    #[test]
    fn test_detector_failure_is_surfaced() {
        let mut uc = use_case(
            StubDetector {
                regions: vec![],
                fail: true,
            },
            StubEncoder {
                embeddings: vec![],
                fail: false,
            },
        );

        match uc.execute(&rgb_frame()) {
            Err(ReferenceError::DetectionFailed(msg)) => {
                assert!(msg.contains("model exploded"));
            }
            other => panic!("expected DetectionFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_into_parts_returns_collaborators() {
        let uc = use_case(
            StubDetector {
                regions: vec![],
                fail: false,
            },
            StubEncoder {
                embeddings: vec![],
                fail: false,
            },
        );
        let (mut detector, mut encoder) = uc.into_parts();
        assert!(detector.detect(&rgb_frame()).unwrap().is_empty());
        assert!(encoder.embed(&rgb_frame(), &[]).unwrap().is_empty());
    }
}
