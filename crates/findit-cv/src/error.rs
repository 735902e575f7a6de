//! Failures surfaced by the recognition core

use findit_core::FeatureError;
use thiserror::Error;

/// Domain errors callers may want to branch on.
///
/// Having no trained data or no references is not an error: those read as
/// `None` from classification and a score of 0 from similarity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VisionError {
    #[error("feature extraction failed: {reason}")]
    ExtractionFailed { reason: String },

    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },

    #[error("stored feature data could not be decoded: {0}")]
    DeserializationFailed(#[source] FeatureError),

    #[error("feature vectors cannot be compared: {0}")]
    IncompatibleVectors(#[source] FeatureError),

    #[error("mask size mismatch: {left:?} vs {right:?}")]
    MaskSizeMismatch { left: (u32, u32), right: (u32, u32) },

    #[error("invalid configuration: {field} - {message}")]
    InvalidConfig { field: String, message: String },

    #[error("item {item} has no usable reference photos")]
    NoUsableReferences { item: String },

    #[error("capture failed: {reason}")]
    CaptureFailed { reason: String },
}

impl VisionError {
    pub fn extraction(reason: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            reason: reason.into(),
        }
    }

    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }

    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn capture(reason: impl Into<String>) -> Self {
        Self::CaptureFailed {
            reason: reason.into(),
        }
    }
}
