//! Hybrid recognition: direct similarity fused with classifier confidence

pub mod engine;

pub use engine::RecognitionEngine;

use crate::error::VisionError;
use findit_core::ItemId;
use serde::{Deserialize, Serialize};

/// Weights of the two recognition signals, always summing to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridWeights {
    /// Weight of the direct feature similarity against the target's references
    pub fp_weight: f32,
    /// Weight of the classifier confidence
    pub ml_weight: f32,
}

impl HybridWeights {
    /// Build from the similarity weight; the classifier gets the remainder
    pub fn new(fp_weight: f32) -> Result<Self, VisionError> {
        let weights = Self {
            fp_weight,
            ml_weight: 1.0 - fp_weight,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Feature similarity dominates
    pub fn feature_print_heavy() -> Self {
        Self {
            fp_weight: 0.8,
            ml_weight: 0.2,
        }
    }

    pub fn balanced() -> Self {
        Self {
            fp_weight: 0.6,
            ml_weight: 0.4,
        }
    }

    /// Classifier confidence alone once trained
    pub fn classifier_only() -> Self {
        Self {
            fp_weight: 0.0,
            ml_weight: 1.0,
        }
    }

    pub fn validate(&self) -> Result<(), VisionError> {
        for (field, value) in [("fp_weight", self.fp_weight), ("ml_weight", self.ml_weight)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(VisionError::config(field, format!("{} is outside [0, 1]", value)));
            }
        }
        if (self.fp_weight + self.ml_weight - 1.0).abs() > 1e-4 {
            return Err(VisionError::config(
                "hybrid_weights",
                format!("{} + {} must sum to 1", self.fp_weight, self.ml_weight),
            ));
        }
        Ok(())
    }
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self::feature_print_heavy()
    }
}

/// Score of one candidate in a 1:N recognition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionResult {
    pub item_id: ItemId,
    pub item_name: String,
    /// Combined score in [0, 1]
    pub score: f32,
    pub fp_score: f32,
    pub ml_score: f32,
}
