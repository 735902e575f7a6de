use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use findit_core::{ItemLibrary, ReferencePhoto};
use findit_cv::traits::FeatureExtractor;
use findit_cv::utils::ImageUtils;
use findit_cv::{GameConfig, ThumbnailExtractor, TrainingStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod round;

#[derive(Parser, Debug)]
#[command(name = "findit", about = "Find real-world objects with the camera")]
struct Cli {
    /// Path to the game config (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Built-in preset used when no config file is given
    #[arg(long, global = true, default_value = "default")]
    preset: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add an item to the library from reference photos.
    Register {
        #[arg(long)]
        library: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        hint: String,
        #[arg(long, default_value_t = 2)]
        difficulty: u8,
        /// Reference photos, one per angle
        #[arg(required = true)]
        photos: Vec<PathBuf>,
    },

    /// Train the classifier on the library and report the outcome.
    Train {
        #[arg(long)]
        library: PathBuf,
    },

    /// Identify which library item an image shows.
    Identify {
        #[arg(long)]
        library: PathBuf,
        image: PathBuf,
        /// Number of ranked candidates to print
        #[arg(long, default_value_t = 3)]
        top: usize,
    },

    /// Play a round over a directory of frames.
    Play {
        #[arg(long)]
        library: PathBuf,
        /// Directory of frame images, played in name order
        #[arg(long)]
        frames: PathBuf,
        /// Target item; picked at random when omitted
        #[arg(long)]
        item: Option<String>,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), &cli.preset)?;
    let extractor = ThumbnailExtractor::default();

    match cli.command {
        Commands::Register {
            library,
            name,
            hint,
            difficulty,
            photos,
        } => cmd_register(&extractor, &library, &name, &hint, difficulty, &photos),
        Commands::Train { library } => cmd_train(&config, &library),
        Commands::Identify { library, image, top } => {
            cmd_identify(&config, &extractor, &library, &image, top)
        }
        Commands::Play { library, frames, item } => {
            cmd_play(&config, &extractor, &library, &frames, item.as_deref())
        }
    }
}

fn load_config(path: Option<&Path>, preset: &str) -> Result<GameConfig> {
    match path {
        Some(path) => GameConfig::load(path),
        None => GameConfig::preset(preset).with_context(|| format!("Unknown preset: {}", preset)),
    }
}

fn load_library(path: &Path) -> Result<ItemLibrary> {
    if path.exists() {
        ItemLibrary::load(path)
    } else {
        Ok(ItemLibrary::new())
    }
}

fn cmd_register(
    extractor: &ThumbnailExtractor,
    library_path: &Path,
    name: &str,
    hint: &str,
    difficulty: u8,
    photos: &[PathBuf],
) -> Result<()> {
    let mut library = load_library(library_path)?;

    let mut references = Vec::with_capacity(photos.len());
    for (i, path) in photos.iter().enumerate() {
        let image = ImageUtils::load(path)?;
        let feature = extractor
            .extract(&image)
            .with_context(|| format!("Failed to extract features from {:?}", path))?;
        references.push(ReferencePhoto::new(&feature, format!("angle-{}", i + 1)));
    }

    let id = library.register(name, hint, difficulty, references)?;
    library.save(library_path)?;
    println!("Registered {} as {}", name, id);
    Ok(())
}

fn cmd_train(config: &GameConfig, library_path: &Path) -> Result<()> {
    let library = ItemLibrary::load(library_path)?;
    let classifier = config.classifier();

    match classifier.train(library.items(), |progress| {
        tracing::debug!("training {:.0}%", progress * 100.0);
    }) {
        TrainingStatus::Ready { samples, duration } => {
            println!("Trained on {} samples in {:?}", samples, duration);
            Ok(())
        }
        TrainingStatus::Failed(reason) => bail!("Training failed: {}", reason),
        status => bail!("Unexpected training status: {:?}", status),
    }
}

fn cmd_identify(
    config: &GameConfig,
    extractor: &ThumbnailExtractor,
    library_path: &Path,
    image_path: &Path,
    top: usize,
) -> Result<()> {
    let library = ItemLibrary::load(library_path)?;
    let classifier = Arc::new(config.classifier());
    classifier.train(library.items(), |_| {});
    let engine = config.engine(classifier);

    let image = ImageUtils::load(image_path)?;
    let query = extractor.extract(&image)?;

    let ranked = engine.rank(&query, &library.candidates());
    if ranked.is_empty() {
        bail!("The library has no playable items");
    }

    let ranked: Vec<_> = ranked.into_iter().take(top.max(1)).collect();
    println!("{}", serde_json::to_string_pretty(&ranked)?);
    Ok(())
}

fn cmd_play(
    config: &GameConfig,
    extractor: &ThumbnailExtractor,
    library_path: &Path,
    frames_dir: &Path,
    item: Option<&str>,
) -> Result<()> {
    let library = ItemLibrary::load(library_path)?;
    let target = round::choose_target(&library, item, &mut rand::thread_rng())?;
    if target.hint.is_empty() {
        println!("Find: {}", target.name);
    } else {
        println!("Find: {} (hint: {})", target.name, target.hint);
    }

    let frames = ImageUtils::list_images(frames_dir)?;
    if frames.is_empty() {
        bail!("No frames found in {:?}", frames_dir);
    }

    let report = round::play(config, &library, target, extractor, frames)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
