use crate::detection::domain::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for face embedding.
///
/// Produces one embedding per input region, positionally aligned with
/// `regions`. An empty region slice yields an empty result without
/// touching the model.
pub trait FaceEncoder: Send {
    fn embed(
        &mut self,
        frame: &Frame,
        regions: &[Region],
    ) -> Result<Vec<Embedding>, Box<dyn std::error::Error>>;
}
