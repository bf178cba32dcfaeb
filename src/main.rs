//! Conditional glyph generator trainer.
//!
//! Usage:
//!   glyph-trainer [OPTIONS]
//!
//! Examples:
//!   # Fresh run, epochs 0..10, checkpoint to ./trainer.json
//!   glyph-trainer --train-data data/train.json --valid-data data/valid.json
//!
//!   # Continue the same run for ten more epochs
//!   glyph-trainer --resume -e 10 20

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use glyph_trainer::data::{GlyphDataset, GlyphLoader};
use glyph_trainer::sink::{JsonlSink, MetricSink, NoopSink};
use glyph_trainer::{DenseGenerator, GridRenderer, TrainConfig, Trainer};

#[derive(Parser)]
#[command(name = "glyph-trainer")]
#[command(about = "Train a conditional font-glyph generator with resumable checkpoints")]
#[command(version)]
struct Args {
    /// Learning rate
    #[arg(short = 'l', long)]
    learning_rate: Option<f64>,

    /// Training batch size
    #[arg(long)]
    train_batch_size: Option<usize>,

    /// Validation batch size
    #[arg(long)]
    valid_batch_size: Option<usize>,

    /// Multiplier on the MSE before backprop and reporting
    #[arg(long)]
    mse_penalty: Option<f64>,

    /// Half-open epoch range: START END
    #[arg(short = 'e', long, num_args = 2, value_names = ["START", "END"])]
    epochs: Option<Vec<usize>>,

    /// TOML file with training settings; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Training dataset (JSON)
    #[arg(long, default_value = "./data/train.json")]
    train_data: PathBuf,

    /// Validation dataset (JSON)
    #[arg(long, default_value = "./data/valid.json")]
    valid_data: PathBuf,

    /// Checkpoint file, overwritten after every epoch
    #[arg(long, default_value = "./trainer.json")]
    checkpoint: PathBuf,

    /// Load the checkpoint before training
    #[arg(long)]
    resume: bool,

    /// On resume, skip re-sending restored history to the metric sink; the
    /// metrics directory then only holds the new epochs
    #[arg(long)]
    no_replay: bool,

    /// Directory for the file-backed metric tracker
    #[arg(long)]
    metrics_dir: Option<PathBuf>,

    /// Seed for weight init and batch shuffling
    #[arg(long)]
    seed: Option<u64>,

    /// Write the best generator snapshot to this JSON file after the run
    #[arg(long)]
    export_best: Option<PathBuf>,
}

impl Args {
    fn train_config(&self) -> anyhow::Result<TrainConfig> {
        let mut config = match &self.config {
            Some(path) => TrainConfig::from_toml_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => TrainConfig::default(),
        };

        if let Some(lr) = self.learning_rate {
            config.learning_rate = lr;
        }
        if let Some(n) = self.train_batch_size {
            config.train_batch_size = n;
        }
        if let Some(n) = self.valid_batch_size {
            config.valid_batch_size = n;
        }
        if let Some(p) = self.mse_penalty {
            config.mse_penalty = p;
        }
        if let Some(range) = &self.epochs {
            config.epochs = (range[0], range[1]);
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = args.train_config()?;

    let train_set = GlyphDataset::load_json(&args.train_data)
        .with_context(|| format!("loading training data {}", args.train_data.display()))?;
    let valid_set = GlyphDataset::load_json(&args.valid_data)
        .with_context(|| format!("loading validation data {}", args.valid_data.display()))?;
    if train_set.dims() != valid_set.dims() || train_set.num_styles != valid_set.num_styles {
        bail!("training and validation datasets disagree on glyph size or style count");
    }

    let glyph = train_set.dims();
    let num_styles = train_set.num_styles;
    info!(
        train = train_set.len(),
        valid = valid_set.len(),
        width = glyph.width,
        height = glyph.height,
        num_styles,
        "datasets loaded"
    );

    let train_loader = GlyphLoader::new(train_set, config.train_batch_size, config.seed)?;
    let valid_loader = GlyphLoader::new(valid_set, config.valid_batch_size, config.seed.wrapping_add(1))?;
    let generator = DenseGenerator::with_activation(
        glyph,
        num_styles,
        &config.hidden_layers,
        config.hidden_activation,
        config.seed,
    );
    let renderer = GridRenderer::new(glyph, config.grid_nrow);
    let sink: Box<dyn MetricSink> = match &args.metrics_dir {
        Some(dir) => Box::new(JsonlSink::create(dir)?),
        None => Box::new(NoopSink),
    };

    let (start, end) = config.epochs;
    let mut trainer = Trainer::new(generator, train_loader, valid_loader, renderer, sink, config)?;

    if args.resume {
        trainer
            .load(&args.checkpoint, !args.no_replay)
            .with_context(|| format!("resuming from {}", args.checkpoint.display()))?;
    }

    let stats = trainer.run(start..end, &args.checkpoint)?;
    if let Some(last) = stats.last() {
        info!(
            epochs = stats.len(),
            train_loss = last.train_loss,
            valid_loss = last.valid_loss,
            best_loss = last.best_loss,
            "training finished"
        );
    }

    if let Some(path) = &args.export_best {
        match trainer.best_parameters() {
            Some(best) => {
                best.save_json(path)
                    .with_context(|| format!("exporting best snapshot to {}", path.display()))?;
                info!(path = %path.display(), "best snapshot exported");
            }
            None => bail!("no validation epoch has run yet, nothing to export"),
        }
    }

    Ok(())
}
