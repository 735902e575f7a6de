//! Feature vectors produced by an extraction oracle

pub mod codec;
pub mod vector;

pub use vector::{DistanceMetric, FeatureVector};

use thiserror::Error;

/// Failures constructing, decoding or comparing feature vectors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("feature vector is empty")]
    Empty,

    #[error("feature vector holds a non-finite value at index {index}")]
    NonFinite { index: usize },

    #[error("feature blob does not start with the expected magic bytes")]
    BadMagic,

    #[error("unsupported feature blob codec version {0}")]
    UnsupportedCodecVersion(u8),

    #[error("feature blob truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("feature blob has {0} unexpected trailing bytes")]
    TrailingBytes(usize),

    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("oracle version mismatch: {left} vs {right}")]
    OracleMismatch { left: u16, right: u16 },
}
