//! Match confirmation: feedback tiers, the per-round state machine and the
//! periodic sampler that feeds it

pub mod sampler;
pub mod state;
pub mod tier;

pub use sampler::{CancelHandle, ChannelFrameSource, RoundOutcome, Sampler};
pub use state::{MatchSession, SessionConfig, SessionEvent, SessionState, TickOutcome};
pub use tier::{FeedbackConfig, FeedbackCue, FeedbackTier};
