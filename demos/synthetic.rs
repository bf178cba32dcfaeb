//! Trains the dense generator on a tiny synthetic alphabet.
//!
//! Each "character" is a pattern of strokes. Each style either keeps it,
//! thickens it or inverts it, so the generator has to learn the style
//! from the one-hot label.
//!
//!   cargo run --example synthetic

use std::path::Path;

use glyph_trainer::data::{GlyphDataset, GlyphLoader, GlyphSample};
use glyph_trainer::sink::JsonlSink;
use glyph_trainer::{DenseGenerator, GlyphDims, GridRenderer, OptimizerKind, TrainConfig, Trainer};
use tracing_subscriber::EnvFilter;

const SIDE: u32 = 6;
const STYLES: usize = 3;

fn character(code: usize) -> Vec<u8> {
    let side = SIDE as usize;
    let mut px = vec![0u8; side * side];
    let row = code % side;
    let col = (code / side) % side;
    for i in 0..side {
        px[row * side + i] = 255;
        px[i * side + col] = 255;
    }
    px
}

fn stylise(content: &[u8], style: usize) -> Vec<u8> {
    let side = SIDE as usize;
    match style {
        0 => content.to_vec(),
        1 => (0..content.len())
            .map(|i| {
                let right = i % side + 1 < side && content[i + 1] > 0;
                if content[i] > 0 || right { 255 } else { 0 }
            })
            .collect(),
        _ => content.iter().map(|&p| 255 - p).collect(),
    }
}

fn dataset(codes: std::ops::Range<usize>) -> GlyphDataset {
    let samples = codes
        .flat_map(|code| {
            let content = character(code);
            (0..STYLES).map(move |style| GlyphSample {
                target: stylise(&content, style),
                content: content.clone(),
                style,
            })
        })
        .collect();
    GlyphDataset { width: SIDE, height: SIDE, num_styles: STYLES, samples }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let glyph = GlyphDims { width: SIDE, height: SIDE };
    let config = TrainConfig {
        learning_rate: 0.002,
        train_batch_size: 8,
        valid_batch_size: 12,
        sample_size: 9,
        grid_nrow: 3,
        hidden_layers: vec![64],
        optimizer: OptimizerKind::default(),
        ..TrainConfig::default()
    };

    let run_dir = Path::new("demo_run");
    let train = GlyphLoader::new(dataset(0..24), config.train_batch_size, config.seed)?;
    let valid = GlyphLoader::new(dataset(24..36), config.valid_batch_size, config.seed + 1)?;
    let generator = DenseGenerator::new(glyph, STYLES, &config.hidden_layers, config.seed);
    let renderer = GridRenderer::new(glyph, config.grid_nrow);
    let sink = Box::new(JsonlSink::create(run_dir.join("metrics"))?);

    let checkpoint = run_dir.join("trainer.json");
    let mut trainer = Trainer::new(generator, train, valid, renderer, sink, config)?;
    let stats = trainer.run(0..5, &checkpoint)?;

    for s in &stats {
        println!(
            "Epoch {}/{}: train = {:.4}, valid = {:.4}, best = {:.4}{}",
            s.epoch,
            s.total_epochs,
            s.train_loss,
            s.valid_loss,
            s.best_loss,
            if s.improved { " *" } else { "" }
        );
    }

    if let Some(last) = trainer.state().sample_image_history().last() {
        last.save_png(run_dir.join("last_sample.png"))?;
    }
    println!("Checkpoint written to {}", checkpoint.display());
    Ok(())
}
