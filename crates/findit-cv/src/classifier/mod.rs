//! Library-wide identification by weighted k-nearest-neighbor voting

pub mod knn;

pub use knn::KnnClassifier;

use findit_core::{FeatureVector, ItemId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// k-NN hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Number of neighbors that vote
    pub k: usize,
    /// Added to every distance so an exact match does not divide by zero
    pub epsilon: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { k: 3, epsilon: 1e-4 }
    }
}

/// One labeled vector derived from a reference photo
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub item_id: ItemId,
    pub item_name: String,
    pub vector: FeatureVector,
}

/// Lifecycle of the classifier's training data
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingStatus {
    Idle,
    Training(f64),
    Ready { samples: usize, duration: Duration },
    Failed(String),
}

impl TrainingStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, TrainingStatus::Ready { .. })
    }
}

/// Accumulated vote of one item among the nearest neighbors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteShare {
    pub item_id: ItemId,
    pub item_name: String,
    pub weight: f32,
    /// Fraction of the total vote, all shares of one call sum to 1
    pub share: f32,
}

/// Outcome of classifying one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub item_id: ItemId,
    pub item_name: String,
    /// Winner's share of the total vote, in (0, 1]
    pub confidence: f32,
    /// Number of neighbors that voted (at most k)
    pub neighbors: usize,
    /// Every voting item, strongest first
    pub votes: Vec<VoteShare>,
}
