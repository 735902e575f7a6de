//! Display tiers derived from the current score

use crate::error::VisionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How close the player is, re-evaluated from scratch every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeedbackTier {
    Cold,
    Warm,
    Hot,
    Match,
}

impl FeedbackTier {
    /// Strength of the cue a caller should play when entering this tier
    pub fn cue(&self) -> FeedbackCue {
        match self {
            FeedbackTier::Cold => FeedbackCue::None,
            FeedbackTier::Warm => FeedbackCue::Light,
            FeedbackTier::Hot => FeedbackCue::Medium,
            FeedbackTier::Match => FeedbackCue::Heavy,
        }
    }
}

impl fmt::Display for FeedbackTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FeedbackTier::Cold => "cold",
            FeedbackTier::Warm => "warm",
            FeedbackTier::Hot => "hot",
            FeedbackTier::Match => "match",
        };
        f.write_str(label)
    }
}

/// Intensity of a haptic or audio cue. Playing it is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackCue {
    None,
    Light,
    Medium,
    Heavy,
}

/// Lower bounds of the Warm, Hot and Match display tiers.
///
/// Kept apart from the accept threshold: the Match tier is what the player
/// sees, the accept threshold is what confirms the find.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    pub warm: f32,
    pub hot: f32,
    pub match_display: f32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            warm: 0.25,
            hot: 0.5,
            match_display: 0.65,
        }
    }
}

impl FeedbackConfig {
    /// Stricter bands used with a higher accept bar
    pub fn strict() -> Self {
        Self {
            warm: 0.3,
            hot: 0.5,
            match_display: 0.7,
        }
    }

    pub fn tier_for(&self, score: f32) -> FeedbackTier {
        if score >= self.match_display {
            FeedbackTier::Match
        } else if score >= self.hot {
            FeedbackTier::Hot
        } else if score >= self.warm {
            FeedbackTier::Warm
        } else {
            FeedbackTier::Cold
        }
    }

    pub fn validate(&self) -> Result<(), VisionError> {
        let ascending = 0.0 <= self.warm
            && self.warm <= self.hot
            && self.hot <= self.match_display
            && self.match_display <= 1.0;
        if !ascending {
            return Err(VisionError::config(
                "feedback",
                format!(
                    "tiers must ascend within [0, 1]: warm {} hot {} match {}",
                    self.warm, self.hot, self.match_display
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_inclusive_below() {
        let config = FeedbackConfig::default();
        assert_eq!(config.tier_for(0.0), FeedbackTier::Cold);
        assert_eq!(config.tier_for(0.2499), FeedbackTier::Cold);
        assert_eq!(config.tier_for(0.25), FeedbackTier::Warm);
        assert_eq!(config.tier_for(0.5), FeedbackTier::Hot);
        assert_eq!(config.tier_for(0.65), FeedbackTier::Match);
        assert_eq!(config.tier_for(1.0), FeedbackTier::Match);
    }

    #[test]
    fn strict_variant_raises_cold_band() {
        assert_eq!(FeedbackConfig::strict().tier_for(0.28), FeedbackTier::Cold);
        assert_eq!(FeedbackConfig::default().tier_for(0.28), FeedbackTier::Warm);
    }

    #[test]
    fn descending_tiers_are_invalid() {
        let config = FeedbackConfig {
            warm: 0.6,
            hot: 0.5,
            match_display: 0.7,
        };
        assert!(config.validate().is_err());
        assert!(FeedbackConfig::default().validate().is_ok());
    }
}
