// tests/core_tests.rs
use findit_core::{FeatureVector, Item, ItemId, ItemLibrary, ItemReferences, ReferencePhoto};
use findit_cv::session::{FeedbackConfig, SessionConfig, SessionEvent};
use findit_cv::traits::FeatureExtractor;
use findit_cv::{
    ClassifierConfig, HybridWeights, KnnClassifier, Mask, MaskCombiner, MatchSession,
    RecognitionEngine, SimilarityConfig, SimilarityScorer, ThumbnailExtractor,
};
use image::{DynamicImage, Rgba, RgbaImage};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn fv(values: &[f32]) -> FeatureVector {
    FeatureVector::new(1, values.to_vec()).unwrap()
}

fn euclidean(max_distance: f32) -> SimilarityScorer {
    SimilarityScorer::new(SimilarityConfig {
        max_distance,
        ..SimilarityConfig::whole_image()
    })
}

fn item_at(name: &str, points: &[f32]) -> Item {
    points.iter().fold(Item::new(name), |item, &p| {
        item.with_photo(ReferencePhoto::new(&fv(&[p]), "front"))
    })
}

#[test]
fn test_multi_sample_item_outvotes_closer_single_sample() {
    let x = item_at("x", &[0.1, -0.1, 0.1]);
    let y = item_at("y", &[0.05]);

    for k in [3, 4] {
        let classifier = KnnClassifier::new(ClassifierConfig { k, epsilon: 1e-4 }, euclidean(10.0));
        assert!(classifier.train(&[x.clone(), y.clone()], |_| {}).is_ready());

        let result = classifier.classify(&fv(&[0.0])).unwrap();
        assert_eq!(result.item_id, x.id, "k = {k}");

        let y_weight = 1.0 / (0.05 + 1e-4);
        let x_weight = (k - 1) as f32 / (0.1 + 1e-4);
        let expected = x_weight / (x_weight + y_weight);
        assert!((result.confidence - expected).abs() < 1e-4, "k = {k}");
    }
}

#[test]
fn test_hold_resets_when_score_dips() {
    let target = ItemReferences {
        id: ItemId::new(),
        name: "mug".into(),
        references: vec![fv(&[1.0])],
    };
    let config = SessionConfig {
        accept_threshold: 0.65,
        hold_duration_secs: 1.0,
        tick_interval_secs: 0.5,
    };
    let mut session = MatchSession::start(target, FeedbackConfig::default(), &config).unwrap();

    let start = Instant::now();
    let tick = Duration::from_millis(500);
    let scores = [0.7, 0.7, 0.6, 0.7, 0.7, 0.7];
    let found: Vec<bool> = scores
        .iter()
        .enumerate()
        .map(|(i, &score)| session.advance(Some(score), start + tick * (i as u32 + 1)).found)
        .collect();

    // The dip on the third tick restarts the hold, so the 1s hold is only
    // complete on the sixth tick
    assert_eq!(found, vec![false, false, false, false, false, true]);
}

#[test]
fn test_found_is_terminal() {
    let target = ItemReferences {
        id: ItemId::new(),
        name: "mug".into(),
        references: vec![fv(&[1.0])],
    };
    let config = SessionConfig {
        hold_duration_secs: 0.0,
        ..SessionConfig::default()
    };
    let mut session = MatchSession::start(target, FeedbackConfig::default(), &config).unwrap();

    let now = Instant::now();
    let outcome = session.advance(Some(0.95), now);
    assert!(outcome.found);
    assert!(outcome.events.iter().any(|e| matches!(e, SessionEvent::Found { .. })));

    for (i, score) in [Some(0.0), None, Some(0.5), Some(1.0)].into_iter().enumerate() {
        let later = session.advance(score, now + Duration::from_secs(i as u64 + 1));
        assert!(later.found);
        assert_eq!(later.tier, outcome.tier);
        assert_eq!(later.hold, outcome.hold);
        assert!(later.events.is_empty());
    }
}

#[test]
fn test_recognize_only_scores_candidates_with_references() {
    let classifier = Arc::new(KnnClassifier::new(ClassifierConfig::default(), euclidean(10.0)));
    let engine = RecognitionEngine::new(classifier, euclidean(10.0), HybridWeights::default());

    let usable = ItemReferences {
        id: ItemId::new(),
        name: "lamp".into(),
        references: vec![fv(&[2.0])],
    };
    let candidates = vec![
        ItemReferences {
            id: ItemId::new(),
            name: "empty-1".into(),
            references: vec![],
        },
        usable.clone(),
        ItemReferences {
            id: ItemId::new(),
            name: "empty-2".into(),
            references: vec![],
        },
    ];

    let ranked = engine.rank(&fv(&[0.0]), &candidates);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].item_id, usable.id);

    // Untrained, the hybrid score is the similarity itself
    let best = engine.recognize(&fv(&[0.0]), &candidates).unwrap();
    assert!((best.score - 0.8).abs() < 1e-6);
    assert_eq!(best.score, best.fp_score);
}

#[test]
fn test_mask_intersection_keeps_shared_pixels() {
    // Pixels A, B, C, D laid out left to right
    let first = Mask::from_fn(4, 1, |x, _| x <= 2);
    let second = Mask::from_fn(4, 1, |x, _| x >= 1);

    let combined = MaskCombiner::intersect(&first, &second).unwrap();
    let pixels: Vec<_> = combined.foreground().collect();
    assert_eq!(pixels, vec![(1, 0), (2, 0)]);
}

fn pattern(seed: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(48, 48, |x, y| {
        let v = match seed {
            0 => if (x / 6) % 2 == 0 { 255 } else { 0 },
            1 => if (y / 6) % 2 == 0 { 255 } else { 0 },
            _ => ((x + y) * 255 / 94) as u8,
        };
        Rgba([v, v, v, 255])
    }))
}

#[test]
fn test_library_round_trip_and_identification() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("library.json");
    let extractor = ThumbnailExtractor::new(12);

    let mut library = ItemLibrary::new();
    let names = ["vertical", "horizontal", "ramp"];
    for (seed, name) in names.iter().enumerate() {
        let photo = ReferencePhoto::new(&extractor.extract(&pattern(seed as u32))?, "front");
        library.register(name, "", 2, vec![photo])?;
    }
    library.save(&path)?;

    let library = ItemLibrary::load(&path)?;
    assert_eq!(library.candidates().len(), 3);

    let scorer = SimilarityScorer::new(SimilarityConfig::normalized());
    let classifier = Arc::new(KnnClassifier::new(ClassifierConfig::default(), scorer.clone()));
    assert!(classifier.train(library.items(), |_| {}).is_ready());
    let engine = RecognitionEngine::new(classifier, scorer, HybridWeights::default());

    for (seed, name) in names.iter().enumerate() {
        let query = extractor.extract(&pattern(seed as u32))?;
        let best = engine.recognize(&query, &library.candidates()).unwrap();
        assert_eq!(best.item_name, *name);
        assert!(best.score > 0.9);
    }
    Ok(())
}

#[test]
fn test_corrupt_reference_is_not_playable() {
    let mut library = ItemLibrary::new();
    let broken = Item::new("broken").with_photo(ReferencePhoto::from_blob(vec![1, 2, 3], "front"));
    library.insert(broken);
    library.insert(item_at("fine", &[1.0]));

    let playable: Vec<_> = library.playable_items().iter().map(|item| item.name.clone()).collect();
    assert_eq!(playable, vec!["fine"]);

    let broken = library.find_by_name("broken").unwrap().references();
    let started = MatchSession::start(broken, FeedbackConfig::default(), &SessionConfig::default());
    assert!(started.is_err());
}
