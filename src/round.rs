//! Plays one round against a sequence of frame images

use anyhow::{Context, Result};
use findit_core::{Item, ItemLibrary};
use findit_cv::session::{ChannelFrameSource, RoundOutcome, SessionEvent, TickOutcome};
use findit_cv::traits::FeatureExtractor;
use findit_cv::utils::ImageUtils;
use findit_cv::{GameConfig, RecognitionEngine};
use rand::Rng;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

/// Summary printed at the end of a round
#[derive(Debug, Serialize)]
pub struct RoundReport {
    pub item: String,
    pub outcome: String,
    pub ticks: usize,
    pub best_score: f32,
    pub hold_secs: f64,
}

/// Pick the round's target: by name, or at random among playable items
pub fn choose_target<'a, R: Rng + ?Sized>(
    library: &'a ItemLibrary,
    name: Option<&str>,
    rng: &mut R,
) -> Result<&'a Item> {
    match name {
        Some(name) => library
            .find_by_name(name)
            .with_context(|| format!("No item named {:?} in the library", name)),
        None => library
            .random_playable(rng)
            .context("The library has no playable items"),
    }
}

fn describe(event: &SessionEvent) -> String {
    match event {
        SessionEvent::TierChanged { from, to, cue } => {
            format!("{} -> {} ({:?} cue)", from, to, cue)
        }
        SessionEvent::HoldStarted => "hold started".to_string(),
        SessionEvent::Holding { held } => format!("holding {:.2}s", held.as_secs_f64()),
        SessionEvent::HoldReset => "hold reset".to_string(),
        SessionEvent::Found { held } => format!("found after holding {:.2}s", held.as_secs_f64()),
    }
}

/// Run a round. Frames are pushed by a capture thread at the tick interval
/// and scored by the sampler on the calling thread.
pub fn play<E: FeatureExtractor>(
    config: &GameConfig,
    library: &ItemLibrary,
    target: &Item,
    extractor: &E,
    frames: Vec<PathBuf>,
) -> Result<RoundReport> {
    let classifier = Arc::new(config.classifier());
    let status = classifier.train(library.items(), |_| {});
    tracing::info!(?status, "classifier trained");

    let engine = RecognitionEngine::new(Arc::clone(&classifier), config.scorer(), config.weights);
    run(config, target, extractor, &engine, frames)
}

fn run<E: FeatureExtractor>(
    config: &GameConfig,
    target: &Item,
    extractor: &E,
    engine: &RecognitionEngine,
    frames: Vec<PathBuf>,
) -> Result<RoundReport> {
    let mut session = config.start_session(target.references())?;
    let sampler = config.sampler()?;
    let interval = sampler.interval();

    let (frame_tx, frame_rx) = mpsc::channel();
    let (tick_tx, tick_rx) = mpsc::channel::<TickOutcome>();
    let mut source = ChannelFrameSource::new(frame_rx);

    let (outcome, ticks) = thread::scope(|scope| {
        let cancel = sampler.cancel_handle();
        scope.spawn(move || {
            for path in frames {
                if cancel.is_cancelled() {
                    break;
                }
                match ImageUtils::load(&path) {
                    Ok(frame) => {
                        if frame_tx.send(frame).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("skipping frame: {:#}", e),
                }
                thread::sleep(interval);
            }
        });

        let printer = scope.spawn(move || {
            let mut ticks = Vec::new();
            for tick in tick_rx {
                for event in &tick.events {
                    println!("[{:>5}] {:.3}  {}", tick.tier, tick.score, describe(event));
                }
                ticks.push(tick);
            }
            ticks
        });

        let outcome = sampler.run(&mut session, &mut source, extractor, engine, &tick_tx);
        sampler.cancel_handle().cancel();
        drop(tick_tx);
        let ticks = printer.join().unwrap_or_default();
        (outcome, ticks)
    });

    let best_score = ticks.iter().map(|t| t.score).fold(0.0f32, f32::max);
    let outcome = match outcome {
        RoundOutcome::Found { .. } => "found",
        RoundOutcome::Cancelled => "cancelled",
        RoundOutcome::SourceClosed => "out of frames",
    };

    Ok(RoundReport {
        item: target.name.clone(),
        outcome: outcome.to_string(),
        ticks: ticks.len(),
        best_score,
        hold_secs: session.hold().as_secs_f64(),
    })
}
