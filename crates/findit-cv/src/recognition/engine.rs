//! Hybrid recognition engine combining 1:1 verification and 1:N identification

use super::{HybridWeights, RecognitionResult};
use crate::classifier::{ClassificationResult, KnnClassifier};
use crate::similarity::SimilarityScorer;
use crate::traits::FeatureExtractor;
use findit_core::{FeatureVector, ItemId, ItemReferences};
use image::DynamicImage;
use std::sync::Arc;

/// Scores queries against a target or a set of candidates
pub struct RecognitionEngine {
    classifier: Arc<KnnClassifier>,
    scorer: SimilarityScorer,
    weights: HybridWeights,
}

impl RecognitionEngine {
    pub fn new(
        classifier: Arc<KnnClassifier>,
        scorer: SimilarityScorer,
        weights: HybridWeights,
    ) -> Self {
        Self {
            classifier,
            scorer,
            weights,
        }
    }

    pub fn classifier(&self) -> &Arc<KnnClassifier> {
        &self.classifier
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    pub fn weights(&self) -> HybridWeights {
        self.weights
    }

    /// Combine the two signals.
    ///
    /// Without training data the similarity score is returned alone, so the
    /// maximum reachable score stays 1.0.
    fn combine(&self, fp_score: f32, ml_score: f32, trained: bool) -> f32 {
        let score = if trained {
            fp_score * self.weights.fp_weight + ml_score * self.weights.ml_weight
        } else {
            fp_score
        };
        // clamp passes NaN through
        if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        }
    }

    /// Classifier confidence credited to `target`, 0 when another item wins
    fn ml_score(classification: Option<&ClassificationResult>, target: ItemId) -> f32 {
        match classification {
            Some(result) if result.item_id == target => result.confidence,
            _ => 0.0,
        }
    }

    /// How well `query` matches one specific item, in [0, 1]
    pub fn compute_hybrid_match(
        &self,
        query: &FeatureVector,
        target: ItemId,
        references: &[FeatureVector],
    ) -> f32 {
        let fp_score = self.scorer.best_similarity(query, references);

        let snapshot = self.classifier.snapshot();
        if snapshot.is_empty() {
            return fp_score;
        }

        let classification = self.classifier.classify_in(&snapshot, query);
        let ml_score = Self::ml_score(classification.as_ref(), target);
        let score = self.combine(fp_score, ml_score, true);

        tracing::debug!(target_item = %target, fp_score, ml_score, score, "hybrid match");
        score
    }

    /// Same as [`compute_hybrid_match`](Self::compute_hybrid_match) starting from a frame.
    ///
    /// A frame the extractor cannot handle reads as no match (0).
    pub fn compute_hybrid_match_frame<E: FeatureExtractor + ?Sized>(
        &self,
        extractor: &E,
        frame: &DynamicImage,
        target: ItemId,
        references: &[FeatureVector],
    ) -> f32 {
        match extractor.extract(frame) {
            Ok(query) => self.compute_hybrid_match(&query, target, references),
            Err(e) => {
                tracing::debug!(target_item = %target, "frame scored as no match: {}", e);
                0.0
            }
        }
    }

    /// Score every candidate, best first.
    ///
    /// Candidates without references cannot match and are left out. Equal
    /// scores keep the input order.
    pub fn rank(
        &self,
        query: &FeatureVector,
        candidates: &[ItemReferences],
    ) -> Vec<RecognitionResult> {
        let snapshot = self.classifier.snapshot();
        let trained = !snapshot.is_empty();
        let classification = self.classifier.classify_in(&snapshot, query);

        let score = |candidate: &ItemReferences| -> Option<RecognitionResult> {
            if candidate.references.is_empty() {
                return None;
            }

            let fp_score = self.scorer.best_similarity(query, &candidate.references);
            let ml_score = Self::ml_score(classification.as_ref(), candidate.id);

            Some(RecognitionResult {
                item_id: candidate.id,
                item_name: candidate.name.clone(),
                score: self.combine(fp_score, ml_score, trained),
                fp_score,
                ml_score,
            })
        };

        #[cfg(feature = "parallel")]
        let mut results: Vec<RecognitionResult> = {
            use rayon::prelude::*;
            candidates.par_iter().filter_map(score).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let mut results: Vec<RecognitionResult> = candidates.iter().filter_map(score).collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results
    }

    /// Identify which candidate the query depicts (1:N)
    pub fn recognize(
        &self,
        query: &FeatureVector,
        candidates: &[ItemReferences],
    ) -> Option<RecognitionResult> {
        let best = self.rank(query, candidates).into_iter().next();
        if let Some(result) = &best {
            tracing::debug!(
                item = %result.item_id,
                score = result.score,
                "recognized {}",
                result.item_name
            );
        }
        best
    }
}
