//! Fixed-interval driver for a [`MatchSession`]

use super::state::{MatchSession, SessionConfig, TickOutcome};
use crate::error::VisionError;
use crate::recognition::RecognitionEngine;
use crate::traits::{FeatureExtractor, FrameSource};
use image::DynamicImage;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Stops a running [`Sampler`] at its next tick boundary
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Frames pushed by a capture thread.
///
/// Only the newest frame matters, older ones still queued are dropped.
pub struct ChannelFrameSource {
    frames: Receiver<DynamicImage>,
    closed: bool,
}

impl ChannelFrameSource {
    pub fn new(frames: Receiver<DynamicImage>) -> Self {
        Self {
            frames,
            closed: false,
        }
    }
}

impl FrameSource for ChannelFrameSource {
    fn latest_frame(&mut self) -> Result<DynamicImage, VisionError> {
        let mut latest = None;
        let mut dropped = 0usize;

        loop {
            match self.frames.try_recv() {
                Ok(frame) => {
                    if latest.replace(frame).is_some() {
                        dropped += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }

        if dropped > 0 {
            tracing::trace!(dropped, "skipped stale frames");
        }

        latest.ok_or_else(|| VisionError::capture("no new frame"))
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// How a sampled round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Found { hold: Duration, ticks: u64 },
    Cancelled,
    SourceClosed,
}

pub struct Sampler {
    interval: Duration,
    cancel: CancelHandle,
    skipped: AtomicU64,
}

impl Sampler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cancel: CancelHandle::default(),
            skipped: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, VisionError> {
        Ok(Self::new(config.tick_interval()?))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Ticks dropped so far because an earlier tick overran its interval
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Score the newest frame against the session's target.
    ///
    /// Capture or extraction failures yield `None`, which the session treats
    /// as no data for this tick.
    pub fn sample<S, E>(
        &self,
        session: &MatchSession,
        source: &mut S,
        extractor: &E,
        engine: &RecognitionEngine,
    ) -> Option<f32>
    where
        S: FrameSource + ?Sized,
        E: FeatureExtractor + ?Sized,
    {
        let frame = match source.latest_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("capture: {}", e);
                return None;
            }
        };

        let query = match extractor.extract(&frame) {
            Ok(query) => query,
            Err(e) => {
                tracing::debug!("extraction: {}", e);
                return None;
            }
        };

        Some(engine.compute_hybrid_match(&query, session.target(), session.references()))
    }

    /// One tick: sample and advance the session
    pub fn tick<S, E>(
        &self,
        session: &mut MatchSession,
        source: &mut S,
        extractor: &E,
        engine: &RecognitionEngine,
    ) -> TickOutcome
    where
        S: FrameSource + ?Sized,
        E: FeatureExtractor + ?Sized,
    {
        let score = self.sample(session, source, extractor, engine);
        session.advance(score, Instant::now())
    }

    /// Drive `session` until it is found, cancelled or the source closes.
    ///
    /// Every tick's outcome is sent on `outcomes`; a dropped receiver does not
    /// stop the round. Ticks run back to back on the calling thread, so they
    /// never overlap; deadlines missed while a tick was in flight are skipped.
    pub fn run<S, E>(
        &self,
        session: &mut MatchSession,
        source: &mut S,
        extractor: &E,
        engine: &RecognitionEngine,
        outcomes: &Sender<TickOutcome>,
    ) -> RoundOutcome
    where
        S: FrameSource + ?Sized,
        E: FeatureExtractor + ?Sized,
    {
        let mut deadline = Instant::now();

        loop {
            if self.cancel.is_cancelled() {
                session.cancel();
            }
            if session.is_found() {
                return RoundOutcome::Found {
                    hold: session.hold(),
                    ticks: session.ticks(),
                };
            }
            if session.is_terminal() {
                return RoundOutcome::Cancelled;
            }
            if source.is_closed() {
                tracing::info!(item = %session.target(), "frame source closed");
                return RoundOutcome::SourceClosed;
            }

            let outcome = self.tick(session, source, extractor, engine);
            if outcomes.send(outcome).is_err() {
                tracing::trace!("tick receiver dropped");
            }

            if session.is_terminal() {
                continue;
            }

            deadline += self.interval;
            let now = Instant::now();
            if now > deadline {
                let behind = now - deadline;
                let skipped = (behind.as_nanos() / self.interval.as_nanos().max(1)) as u32 + 1;
                tracing::warn!(skipped, "tick overran the interval, skipping missed ticks");
                self.skipped.fetch_add(u64::from(skipped), Ordering::Relaxed);
                deadline += self.interval * skipped;
            }

            thread::sleep(deadline.saturating_duration_since(Instant::now()));
        }
    }
}
