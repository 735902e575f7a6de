//! Pairwise and best-of-references similarity scoring

use super::SimilarityConfig;
use crate::error::VisionError;
use findit_core::FeatureVector;

/// Turns distances into bounded similarity scores
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    config: SimilarityConfig,
}

impl SimilarityScorer {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    pub fn distance(&self, a: &FeatureVector, b: &FeatureVector) -> Result<f32, VisionError> {
        self.config
            .metric
            .distance(a, b)
            .map_err(VisionError::IncompatibleVectors)
    }

    /// Normalize a raw distance into [0, 1]
    pub fn normalize(&self, distance: f32) -> f32 {
        (1.0 - distance / self.config.max_distance).clamp(0.0, 1.0)
    }

    pub fn similarity(&self, a: &FeatureVector, b: &FeatureVector) -> Result<f32, VisionError> {
        Ok(self.normalize(self.distance(a, b)?))
    }

    /// Highest similarity of `query` against any reference.
    ///
    /// No references means nothing can match: the result is 0, not an error.
    /// References that cannot be compared with the query are skipped.
    pub fn best_similarity(&self, query: &FeatureVector, references: &[FeatureVector]) -> f32 {
        references
            .iter()
            .filter_map(|reference| match self.similarity(query, reference) {
                Ok(score) => Some(score),
                Err(e) => {
                    tracing::debug!("skipping reference: {}", e);
                    None
                }
            })
            .fold(0.0, f32::max)
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(SimilarityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(values: &[f32]) -> FeatureVector {
        FeatureVector::new(1, values.to_vec()).unwrap()
    }

    #[test]
    fn identical_vectors_score_one() {
        let scorer = SimilarityScorer::default();
        let v = fv(&[4.0, -2.0, 9.5]);
        assert_eq!(scorer.similarity(&v, &v).unwrap(), 1.0);
    }

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        let scorer = SimilarityScorer::new(SimilarityConfig {
            max_distance: 10.0,
            ..SimilarityConfig::whole_image()
        });
        let a = fv(&[0.0, 0.0]);
        let b = fv(&[3.0, 4.0]);
        let far = fv(&[300.0, 400.0]);

        assert_eq!(scorer.similarity(&a, &b).unwrap(), 0.5);
        assert_eq!(scorer.similarity(&b, &a).unwrap(), 0.5);
        assert_eq!(scorer.similarity(&a, &far).unwrap(), 0.0);
    }

    #[test]
    fn best_similarity_of_no_references_is_zero() {
        let scorer = SimilarityScorer::default();
        assert_eq!(scorer.best_similarity(&fv(&[1.0]), &[]), 0.0);
    }

    #[test]
    fn best_similarity_takes_maximum_and_skips_incompatible() {
        let scorer = SimilarityScorer::new(SimilarityConfig {
            max_distance: 10.0,
            ..SimilarityConfig::whole_image()
        });
        let query = fv(&[0.0, 0.0]);
        let refs = vec![fv(&[6.0, 8.0]), fv(&[1.0, 0.0, 0.0]), fv(&[3.0, 4.0])];
        assert_eq!(scorer.best_similarity(&query, &refs), 0.5);
    }

    #[test]
    fn normalized_preset_uses_cosine_range() {
        let scorer = SimilarityScorer::new(SimilarityConfig::normalized());
        let a = fv(&[1.0, 0.0]);
        let b = fv(&[0.0, 1.0]);
        let s = scorer.similarity(&a, &b).unwrap();
        assert!((s - 0.5).abs() < 1e-6);
    }
}
