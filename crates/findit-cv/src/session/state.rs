//! Per-round match confirmation state machine

use super::tier::{FeedbackConfig, FeedbackCue, FeedbackTier};
use crate::error::VisionError;
use findit_core::{FeatureVector, ItemId, ItemReferences};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Accept rule and sampling cadence of a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Score at or above which the hold timer runs
    pub accept_threshold: f32,
    /// Continuous time above the threshold needed to confirm the find
    pub hold_duration_secs: f64,
    /// Time between two sampling ticks
    pub tick_interval_secs: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.65,
            hold_duration_secs: 1.0,
            tick_interval_secs: 0.5,
        }
    }
}

impl SessionConfig {
    pub fn hold_duration(&self) -> Result<Duration, VisionError> {
        Duration::try_from_secs_f64(self.hold_duration_secs)
            .map_err(|e| VisionError::config("hold_duration_secs", e.to_string()))
    }

    pub fn tick_interval(&self) -> Result<Duration, VisionError> {
        let interval = Duration::try_from_secs_f64(self.tick_interval_secs)
            .map_err(|e| VisionError::config("tick_interval_secs", e.to_string()))?;
        if interval.is_zero() {
            return Err(VisionError::config("tick_interval_secs", "must be positive"));
        }
        Ok(interval)
    }

    pub fn validate(&self) -> Result<(), VisionError> {
        if !(0.0..=1.0).contains(&self.accept_threshold) {
            return Err(VisionError::config(
                "accept_threshold",
                format!("{} is outside [0, 1]", self.accept_threshold),
            ));
        }
        self.hold_duration()?;
        self.tick_interval()?;
        Ok(())
    }
}

/// Where a round stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Sampling,
    Found,
    Cancelled,
}

/// Something the caller may want to react to, e.g. with a haptic cue
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TierChanged {
        from: FeedbackTier,
        to: FeedbackTier,
        cue: FeedbackCue,
    },
    HoldStarted,
    Holding { held: Duration },
    HoldReset,
    Found { held: Duration },
}

/// Result of one `advance` call
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub tier: FeedbackTier,
    pub tier_changed: bool,
    pub found: bool,
    /// Latest accepted score
    pub score: f32,
    pub hold: Duration,
    pub events: Vec<SessionEvent>,
}

/// One round of searching for a target item.
///
/// States are `Sampling(tier, hold)` and the terminal `Found` (or
/// `Cancelled`). Hold time is measured from the tick on which the score first
/// reached the accept threshold; any tick below the threshold clears it.
#[derive(Debug, Clone)]
pub struct MatchSession {
    target: ItemId,
    target_name: String,
    references: Vec<FeatureVector>,
    feedback: FeedbackConfig,
    accept_threshold: f32,
    hold_duration: Duration,
    state: SessionState,
    tier: FeedbackTier,
    score: f32,
    hold_started_at: Option<Instant>,
    hold: Duration,
    ticks: u64,
}

impl MatchSession {
    /// Start a round. A target without usable references could never match,
    /// so the round is refused.
    pub fn start(
        target: ItemReferences,
        feedback: FeedbackConfig,
        config: &SessionConfig,
    ) -> Result<Self, VisionError> {
        if target.references.is_empty() {
            return Err(VisionError::NoUsableReferences { item: target.name });
        }
        feedback.validate()?;
        config.validate()?;

        tracing::info!(
            item = %target.id,
            references = target.references.len(),
            "round started for {}",
            target.name
        );

        Ok(Self {
            target: target.id,
            target_name: target.name,
            references: target.references,
            feedback,
            accept_threshold: config.accept_threshold,
            hold_duration: config.hold_duration()?,
            state: SessionState::Sampling,
            tier: FeedbackTier::Cold,
            score: 0.0,
            hold_started_at: None,
            hold: Duration::ZERO,
            ticks: 0,
        })
    }

    pub fn target(&self) -> ItemId {
        self.target
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn references(&self) -> &[FeatureVector] {
        &self.references
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn tier(&self) -> FeedbackTier {
        self.tier
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    /// Ticks that carried a score
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_found(&self) -> bool {
        self.state == SessionState::Found
    }

    pub fn is_terminal(&self) -> bool {
        self.state != SessionState::Sampling
    }

    /// Stop the round. Has no effect once the round is over.
    pub fn cancel(&mut self) {
        if self.state == SessionState::Sampling {
            tracing::info!(item = %self.target, "round cancelled");
            self.state = SessionState::Cancelled;
        }
    }

    fn outcome(&self, tier_changed: bool, events: Vec<SessionEvent>) -> TickOutcome {
        TickOutcome {
            tier: self.tier,
            tier_changed,
            found: self.is_found(),
            score: self.score,
            hold: self.hold,
            events,
        }
    }

    /// Feed one tick.
    ///
    /// `None` (or a non-finite score) means the tick produced no data: nothing
    /// changes, in particular the hold timer is neither reset nor advanced
    /// past what the clock says on the next scored tick. Terminal sessions
    /// ignore every update.
    pub fn advance(&mut self, score: Option<f32>, now: Instant) -> TickOutcome {
        if self.is_terminal() {
            return self.outcome(false, Vec::new());
        }

        let Some(score) = score.filter(|s| s.is_finite()) else {
            tracing::debug!(item = %self.target, "no data this tick");
            return self.outcome(false, Vec::new());
        };

        let score = score.clamp(0.0, 1.0);
        self.score = score;
        self.ticks += 1;

        let mut events = Vec::new();

        let tier = self.feedback.tier_for(score);
        let tier_changed = tier != self.tier;
        if tier_changed {
            events.push(SessionEvent::TierChanged {
                from: self.tier,
                to: tier,
                cue: tier.cue(),
            });
            self.tier = tier;
        }

        if score >= self.accept_threshold {
            match self.hold_started_at {
                None => {
                    self.hold_started_at = Some(now);
                    self.hold = Duration::ZERO;
                    events.push(SessionEvent::HoldStarted);
                }
                Some(started) => {
                    self.hold = now.saturating_duration_since(started);
                }
            }

            if self.hold >= self.hold_duration {
                self.state = SessionState::Found;
                events.push(SessionEvent::Found { held: self.hold });
                tracing::info!(
                    item = %self.target,
                    held = ?self.hold,
                    "found {}",
                    self.target_name
                );
            } else if self.hold > Duration::ZERO {
                events.push(SessionEvent::Holding { held: self.hold });
            }
        } else if self.hold_started_at.take().is_some() {
            self.hold = Duration::ZERO;
            events.push(SessionEvent::HoldReset);
        }

        tracing::debug!(score, tier = %self.tier, hold = ?self.hold, "tick");
        self.outcome(tier_changed, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(500);

    fn session(config: SessionConfig) -> MatchSession {
        let target = ItemReferences {
            id: ItemId::new(),
            name: "mug".into(),
            references: vec![FeatureVector::new(1, vec![1.0]).unwrap()],
        };
        MatchSession::start(target, FeedbackConfig::default(), &config).unwrap()
    }

    /// Feed scores at a fixed cadence, returning each outcome
    fn run(session: &mut MatchSession, scores: &[Option<f32>]) -> Vec<TickOutcome> {
        let start = Instant::now();
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| session.advance(score, start + TICK * (i as u32 + 1)))
            .collect()
    }

    #[test]
    fn round_without_references_is_refused() {
        let target = ItemReferences {
            id: ItemId::new(),
            name: "ghost".into(),
            references: vec![],
        };
        let result =
            MatchSession::start(target, FeedbackConfig::default(), &SessionConfig::default());
        assert!(matches!(result, Err(VisionError::NoUsableReferences { .. })));
    }

    #[test]
    fn initial_state_is_cold_sampling() {
        let session = session(SessionConfig::default());
        assert_eq!(session.state(), SessionState::Sampling);
        assert_eq!(session.tier(), FeedbackTier::Cold);
        assert_eq!(session.hold(), Duration::ZERO);
    }

    #[test]
    fn tier_change_fires_once_per_transition() {
        let mut session = session(SessionConfig::default());
        let outcomes = run(
            &mut session,
            &[Some(0.3), Some(0.3), Some(0.3), Some(0.55), Some(0.1), Some(0.1)],
        );
        let changed: Vec<bool> = outcomes.iter().map(|o| o.tier_changed).collect();
        assert_eq!(changed, vec![true, false, false, true, true, false]);

        let tiers: Vec<FeedbackTier> = outcomes.iter().map(|o| o.tier).collect();
        use FeedbackTier::*;
        assert_eq!(tiers, vec![Warm, Warm, Warm, Hot, Cold, Cold]);
    }

    #[test]
    fn sustained_match_is_found_after_hold_duration() {
        let mut session = session(SessionConfig::default());
        let outcomes = run(&mut session, &[Some(0.7), Some(0.7), Some(0.7)]);

        assert_eq!(outcomes[0].hold, Duration::ZERO);
        assert!(outcomes[0].events.contains(&SessionEvent::HoldStarted));
        assert_eq!(outcomes[1].hold, TICK);
        assert!(!outcomes[1].found);
        assert!(outcomes[2].found);
        assert!(session.is_found());
    }

    #[test]
    fn drop_below_threshold_resets_hold_exactly() {
        let mut session = session(SessionConfig::default());
        let outcomes = run(&mut session, &[Some(0.7), Some(0.7), Some(0.6), Some(0.7), Some(0.7)]);

        assert_eq!(outcomes[1].hold, TICK);
        assert_eq!(outcomes[2].hold, Duration::ZERO);
        assert!(outcomes[2].events.contains(&SessionEvent::HoldReset));
        assert_eq!(outcomes[3].hold, Duration::ZERO);
        assert_eq!(outcomes[4].hold, TICK);
        assert!(outcomes.iter().all(|o| !o.found));
    }

    #[test]
    fn missing_data_leaves_state_untouched() {
        let mut session = session(SessionConfig::default());
        let outcomes = run(&mut session, &[Some(0.7), None, None, Some(0.7)]);

        assert_eq!(outcomes[1].tier, FeedbackTier::Match);
        assert!(!outcomes[1].tier_changed);
        assert_eq!(outcomes[1].hold, Duration::ZERO);
        assert_eq!(outcomes[1].events, vec![]);
        // The clock kept running while frames were missing
        assert!(outcomes[3].found);
        assert_eq!(outcomes[3].hold, TICK * 3);
        assert_eq!(session.ticks(), 2);
    }

    #[test]
    fn found_session_is_terminal() {
        let mut session = session(SessionConfig {
            hold_duration_secs: 0.0,
            ..Default::default()
        });
        let first = session.advance(Some(0.9), Instant::now());
        assert!(first.found);

        let after = session.advance(Some(0.0), Instant::now() + TICK);
        assert!(after.found);
        assert!(!after.tier_changed);
        assert_eq!(after.tier, first.tier);
        assert_eq!(after.hold, first.hold);
        assert_eq!(after.score, first.score);
        assert!(after.events.is_empty());
    }

    #[test]
    fn cancelled_session_ignores_scores() {
        let mut session = session(SessionConfig::default());
        session.cancel();
        let outcome = session.advance(Some(0.9), Instant::now());
        assert_eq!(session.state(), SessionState::Cancelled);
        assert_eq!(outcome.tier, FeedbackTier::Cold);
        assert!(!outcome.found);
    }

    #[test]
    fn accept_threshold_is_independent_of_match_tier() {
        let mut session = session(SessionConfig {
            accept_threshold: 0.8,
            ..Default::default()
        });
        let outcomes = run(&mut session, &[Some(0.7), Some(0.7), Some(0.7), Some(0.7)]);
        assert!(outcomes.iter().all(|o| o.tier == FeedbackTier::Match));
        assert!(outcomes.iter().all(|o| !o.found && o.hold == Duration::ZERO));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SessionConfig {
            tick_interval_secs: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = SessionConfig {
            hold_duration_secs: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
