//! Fixed-length embedding and the distance metrics defined over it

use super::FeatureError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable embedding of one image.
///
/// The values are shared, so clones are cheap and a vector can sit in the
/// classifier snapshot and in a candidate list at the same time.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    oracle_version: u16,
    values: Arc<[f32]>,
}

impl FeatureVector {
    /// Create a vector tagged with the version of the oracle that produced it
    pub fn new(oracle_version: u16, values: Vec<f32>) -> Result<Self, FeatureError> {
        if values.is_empty() {
            return Err(FeatureError::Empty);
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(FeatureError::NonFinite { index });
        }

        Ok(Self {
            oracle_version,
            values: values.into(),
        })
    }

    pub fn oracle_version(&self) -> u16 {
        self.oracle_version
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check that two vectors come from the same oracle and have the same shape
    pub fn check_compatible(&self, other: &FeatureVector) -> Result<(), FeatureError> {
        if self.oracle_version != other.oracle_version {
            return Err(FeatureError::OracleMismatch {
                left: self.oracle_version,
                right: other.oracle_version,
            });
        }
        if self.len() != other.len() {
            return Err(FeatureError::DimensionMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(())
    }

    /// L2 norm
    pub fn norm(&self) -> f64 {
        self.values
            .iter()
            .map(|&v| (v as f64) * (v as f64))
            .sum::<f64>()
            .sqrt()
    }
}

/// Dissimilarity metric used to compare two feature vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Straight-line distance, unbounded (whole-image oracle, D_max around 30)
    Euclidean,
    /// One minus cosine similarity, bounded to [0, 2] (normalized oracle)
    Cosine,
}

impl DistanceMetric {
    /// Symmetric, non-negative distance; identical vectors are always 0
    pub fn distance(&self, a: &FeatureVector, b: &FeatureVector) -> Result<f32, FeatureError> {
        a.check_compatible(b)?;

        if a.values == b.values {
            return Ok(0.0);
        }

        let distance = match self {
            DistanceMetric::Euclidean => a
                .values
                .iter()
                .zip(b.values.iter())
                .map(|(&x, &y)| {
                    let d = x as f64 - y as f64;
                    d * d
                })
                .sum::<f64>()
                .sqrt(),
            DistanceMetric::Cosine => {
                let (norm_a, norm_b) = (a.norm(), b.norm());
                if norm_a < f64::EPSILON || norm_b < f64::EPSILON {
                    // A zero vector carries no direction
                    1.0
                } else {
                    let dot: f64 = a
                        .values
                        .iter()
                        .zip(b.values.iter())
                        .map(|(&x, &y)| x as f64 * y as f64)
                        .sum();
                    (1.0 - dot / (norm_a * norm_b)).clamp(0.0, 2.0)
                }
            }
        };

        // Finite inputs can still overflow f32 once squared and summed
        Ok(distance.min(f64::from(f32::MAX)) as f32)
    }
}

impl Default for DistanceMetric {
    fn default() -> Self {
        DistanceMetric::Euclidean
    }
}
