//! Game configuration

use crate::Result;
use crate::classifier::{ClassifierConfig, KnnClassifier};
use crate::error::VisionError;
use crate::mask::{Isolator, SegmentationConfig};
use crate::recognition::{HybridWeights, RecognitionEngine};
use crate::session::{FeedbackConfig, MatchSession, Sampler, SessionConfig};
use crate::similarity::{SimilarityConfig, SimilarityScorer};
use anyhow::Context;
use findit_core::ItemReferences;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Every tunable of a game, in one place.
///
/// Thresholds and weights are configuration: presets cover the combinations
/// the game has shipped with, tests build their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub similarity: SimilarityConfig,
    pub classifier: ClassifierConfig,
    pub weights: HybridWeights,
    pub feedback: FeedbackConfig,
    pub session: SessionConfig,
    pub segmentation: SegmentationConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            // The bundled extractor produces unit vectors
            similarity: SimilarityConfig::normalized(),
            classifier: ClassifierConfig::default(),
            weights: HybridWeights::feature_print_heavy(),
            feedback: FeedbackConfig::default(),
            session: SessionConfig::default(),
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl GameConfig {
    /// Higher accept bar with stricter feedback bands
    pub fn strict() -> Self {
        Self {
            feedback: FeedbackConfig::strict(),
            session: SessionConfig {
                accept_threshold: 0.8,
                ..SessionConfig::default()
            },
            ..Self::default()
        }
    }

    /// Classifier confidence alone decides the score once trained
    pub fn knn_only() -> Self {
        Self {
            weights: HybridWeights::classifier_only(),
            ..Self::default()
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "strict" => Some(Self::strict()),
            "knn-only" | "knn_only" => Some(Self::knn_only()),
            _ => None,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), VisionError> {
        if !(self.similarity.max_distance.is_finite() && self.similarity.max_distance > 0.0) {
            return Err(VisionError::config(
                "similarity.max_distance",
                format!("{} must be positive", self.similarity.max_distance),
            ));
        }
        if self.classifier.k == 0 {
            return Err(VisionError::config("classifier.k", "must be at least 1"));
        }
        if !(self.classifier.epsilon.is_finite() && self.classifier.epsilon > 0.0) {
            return Err(VisionError::config("classifier.epsilon", "must be positive"));
        }
        self.weights.validate()?;
        self.feedback.validate()?;
        self.session.validate()?;

        let ratios = [
            ("segmentation.bbox_expand_ratio", self.segmentation.bbox_expand_ratio),
            ("segmentation.boundary_margin", self.segmentation.boundary_margin),
            ("segmentation.touch_expand_ratio", self.segmentation.touch_expand_ratio),
        ];
        for (field, value) in ratios {
            if !(value.is_finite() && value >= 0.0) {
                return Err(VisionError::config(field, format!("{} must not be negative", value)));
            }
        }
        Ok(())
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("Invalid config: {:?}", path))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to: {:?}", path))?;
        Ok(())
    }

    pub fn scorer(&self) -> SimilarityScorer {
        SimilarityScorer::new(self.similarity.clone())
    }

    pub fn classifier(&self) -> KnnClassifier {
        KnnClassifier::new(self.classifier.clone(), self.scorer())
    }

    pub fn engine(&self, classifier: Arc<KnnClassifier>) -> RecognitionEngine {
        RecognitionEngine::new(classifier, self.scorer(), self.weights)
    }

    pub fn isolator(&self) -> Isolator {
        Isolator::new(self.segmentation.clone())
    }

    pub fn sampler(&self) -> std::result::Result<Sampler, VisionError> {
        Sampler::from_config(&self.session)
    }

    pub fn start_session(
        &self,
        target: ItemReferences,
    ) -> std::result::Result<MatchSession, VisionError> {
        MatchSession::start(target, self.feedback.clone(), &self.session)
    }
}
