//! FindIt recognition library
//!
//! Turns noisy per-frame visual similarity into an item identity, a feedback
//! tier and a debounced "found" decision.

pub mod bbox;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extract;
pub mod mask;
pub mod recognition;
pub mod session;
pub mod similarity;
pub mod utils;

// Re-export commonly used types
pub use bbox::BBox;
pub use classifier::{ClassificationResult, ClassifierConfig, KnnClassifier, TrainingStatus};
pub use config::GameConfig;
pub use error::VisionError;
pub use extract::{ForegroundExtractor, ThumbnailExtractor};
pub use mask::{Instance, Mask, MaskCombiner};
pub use recognition::{HybridWeights, RecognitionEngine, RecognitionResult};
pub use session::{FeedbackTier, MatchSession, Sampler, TickOutcome};
pub use similarity::{SimilarityConfig, SimilarityScorer};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Seams to the external collaborators: capture, extraction and segmentation
pub mod traits {
    use crate::error::VisionError;
    use crate::mask::{Instance, Mask};
    use findit_core::FeatureVector;
    use image::DynamicImage;

    /// Produces feature vectors from images.
    ///
    /// Must be deterministic for a fixed input and oracle version.
    pub trait FeatureExtractor: Send + Sync {
        /// Version tag written into every vector this extractor produces
        fn oracle_version(&self) -> u16;

        fn extract(&self, image: &DynamicImage) -> Result<FeatureVector, VisionError>;
    }

    /// Live frames from a camera or any other capture device
    pub trait FrameSource {
        /// Newest frame since the last call; an error means no data this tick
        fn latest_frame(&mut self) -> Result<DynamicImage, VisionError>;

        /// True once the source will never produce another frame
        fn is_closed(&self) -> bool {
            false
        }
    }

    /// Foreground segmentation oracle
    pub trait Segmenter: Send + Sync {
        fn detect_instances(&self, image: &DynamicImage) -> Result<Vec<Instance>, VisionError>;

        /// Mask of the object under `point`, if any
        fn mask_at(
            &self,
            point: (u32, u32),
            image: &DynamicImage,
        ) -> Result<Option<Mask>, VisionError>;

        /// Depth-proximity mask, for devices that have a depth sensor
        fn depth_mask(&self, _image: &DynamicImage) -> Result<Option<Mask>, VisionError> {
            Ok(None)
        }
    }
}
