/// A fixed-length feature vector summarizing one face's identity.
///
/// Embeddings of the same person are expected to be close under
/// [`Embedding::distance`]; beyond that the values are opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Euclidean distance to another embedding. Always `>= 0`; smaller
    /// means more similar.
    pub fn distance(&self, other: &Embedding) -> f64 {
        debug_assert_eq!(
            self.0.len(),
            other.0.len(),
            "embeddings must have equal length"
        );
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| {
                let d = (*a as f64) - (*b as f64);
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Binary same-person decision: distance at or below `tolerance`.
    pub fn matches(&self, other: &Embedding, tolerance: f64) -> bool {
        self.distance(other) <= tolerance
    }
}
