//! Distance to similarity normalization

pub mod scorer;

pub use scorer::SimilarityScorer;

use findit_core::DistanceMetric;
use serde::{Deserialize, Serialize};

/// Similarity configuration.
///
/// `max_distance` is the single calibration constant D_max: a distance of
/// D_max or more maps to similarity 0, a distance of 0 maps to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityConfig {
    pub metric: DistanceMetric,
    pub max_distance: f32,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self::whole_image()
    }
}

impl SimilarityConfig {
    /// Unnormalized whole-image embeddings compared by Euclidean distance
    pub fn whole_image() -> Self {
        Self {
            metric: DistanceMetric::Euclidean,
            max_distance: 30.0,
        }
    }

    /// Normalized embeddings compared by cosine distance (range 0..=2)
    pub fn normalized() -> Self {
        Self {
            metric: DistanceMetric::Cosine,
            max_distance: 2.0,
        }
    }
}
