//! Weighted k-NN classifier over a swappable training snapshot

use super::{ClassificationResult, ClassifierConfig, TrainingSample, TrainingStatus, VoteShare};
use crate::similarity::SimilarityScorer;
use findit_core::{FeatureVector, Item, ItemId};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// Classifier shared between sessions.
///
/// Readers clone the current snapshot `Arc` and work on it without holding the
/// lock. Training builds a new sample set off to the side and swaps the `Arc`
/// in one write, so a reader sees either the old set or the new one.
pub struct KnnClassifier {
    config: ClassifierConfig,
    scorer: SimilarityScorer,
    samples: RwLock<Arc<Vec<TrainingSample>>>,
    status: RwLock<TrainingStatus>,
}

impl KnnClassifier {
    pub fn new(config: ClassifierConfig, scorer: SimilarityScorer) -> Self {
        Self {
            config,
            scorer,
            samples: RwLock::new(Arc::new(Vec::new())),
            status: RwLock::new(TrainingStatus::Idle),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Current sample set
    pub fn snapshot(&self) -> Arc<Vec<TrainingSample>> {
        Arc::clone(&self.samples.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn sample_count(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether any training data is loaded
    pub fn is_trained(&self) -> bool {
        !self.snapshot().is_empty()
    }

    pub fn training_status(&self) -> TrainingStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_status(&self, status: TrainingStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    fn swap_samples(&self, samples: Vec<TrainingSample>) {
        *self.samples.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(samples);
    }

    /// Rebuild the sample set from the item library.
    ///
    /// Photos whose stored vector does not decode are skipped. `progress`
    /// receives the fraction of photos processed. An empty result still
    /// replaces the live set, so items removed from the library stop voting.
    pub fn train<F>(&self, items: &[Item], mut progress: F) -> TrainingStatus
    where
        F: FnMut(f64),
    {
        let start = Instant::now();
        self.set_status(TrainingStatus::Training(0.0));
        progress(0.0);

        let total: usize = items.iter().map(|item| item.photos.len()).sum();
        let mut samples = Vec::with_capacity(total);
        let mut processed = 0usize;

        for item in items {
            for photo in &item.photos {
                match photo.feature() {
                    Ok(vector) => samples.push(TrainingSample {
                        item_id: item.id,
                        item_name: item.name.clone(),
                        vector,
                    }),
                    Err(e) => {
                        tracing::warn!(
                            item = %item.id,
                            photo = %photo.id,
                            "skipping training sample: {}",
                            e
                        );
                    }
                }

                processed += 1;
                let fraction = processed as f64 / total as f64;
                self.set_status(TrainingStatus::Training(fraction));
                progress(fraction);
            }
        }

        if total == 0 {
            progress(1.0);
        }

        let count = samples.len();
        self.swap_samples(samples);

        let status = if count == 0 {
            tracing::warn!("training finished without usable samples");
            TrainingStatus::Failed("no valid training data".to_string())
        } else {
            let duration = start.elapsed();
            tracing::info!("Trained on {} samples in {:?}", count, duration);
            TrainingStatus::Ready {
                samples: count,
                duration,
            }
        };

        self.set_status(status.clone());
        status
    }

    /// Identify which item the query most likely depicts.
    ///
    /// Returns `None` when nothing is trained. Samples that cannot be compared
    /// with the query are left out of the vote.
    pub fn classify(&self, query: &FeatureVector) -> Option<ClassificationResult> {
        self.classify_in(&self.snapshot(), query)
    }

    /// Classify against a snapshot the caller already holds
    pub fn classify_in(
        &self,
        snapshot: &[TrainingSample],
        query: &FeatureVector,
    ) -> Option<ClassificationResult> {
        if snapshot.is_empty() {
            return None;
        }

        let mut neighbors = self.distances(query, snapshot);
        if neighbors.is_empty() {
            tracing::debug!("no training sample is comparable with the query");
            return None;
        }

        neighbors.sort_by(|a, b| a.0.total_cmp(&b.0));
        neighbors.truncate(self.config.k.max(1));

        // Weights in f64: 1 / (d + eps) underflows f32 for very distant samples
        let epsilon = f64::from(self.config.epsilon);
        let mut tally: BTreeMap<ItemId, (&str, f64, usize)> = BTreeMap::new();
        for (distance, sample) in &neighbors {
            let weight = 1.0 / (f64::from(*distance) + epsilon);
            let entry = tally
                .entry(sample.item_id)
                .or_insert((sample.item_name.as_str(), 0.0, 0));
            entry.1 += weight;
            entry.2 += 1;
        }

        let total: f64 = tally.values().map(|(_, weight, _)| weight).sum();
        let share = |weight: f64, count: usize| -> f32 {
            if total.is_finite() && total > 0.0 {
                (weight / total) as f32
            } else {
                // Degenerate distances: every neighbor counts the same
                count as f32 / neighbors.len() as f32
            }
        };

        let mut votes: Vec<VoteShare> = tally
            .iter()
            .map(|(item_id, (name, weight, count))| VoteShare {
                item_id: *item_id,
                item_name: name.to_string(),
                weight: *weight as f32,
                share: share(*weight, *count),
            })
            .collect();
        // Stable sort keeps ascending id order among equal shares
        votes.sort_by(|a, b| b.share.total_cmp(&a.share));

        let winner = votes.first()?;

        Some(ClassificationResult {
            item_id: winner.item_id,
            item_name: winner.item_name.clone(),
            confidence: winner.share,
            neighbors: neighbors.len(),
            votes,
        })
    }

    fn distances<'a>(
        &self,
        query: &FeatureVector,
        samples: &'a [TrainingSample],
    ) -> Vec<(f32, &'a TrainingSample)> {
        let measure = |sample: &'a TrainingSample| {
            match self.scorer.distance(query, &sample.vector) {
                Ok(distance) => Some((distance, sample)),
                Err(e) => {
                    tracing::debug!(item = %sample.item_id, "excluding sample: {}", e);
                    None
                }
            }
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            samples.par_iter().filter_map(measure).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            samples.iter().filter_map(measure).collect()
        }
    }
}

impl Default for KnnClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default(), SimilarityScorer::default())
    }
}
