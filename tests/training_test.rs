use std::fs;

use glyph_trainer::checkpoint::{self, Checkpoint};
use glyph_trainer::data::{GlyphDataset, GlyphLoader, GlyphSample};
use glyph_trainer::network::NetworkParams;
use glyph_trainer::sink::{JsonlSink, NoopSink};
use glyph_trainer::{
    BatchSource, DenseGenerator, Error, Generator, GlyphDims, GridRenderer, TrainConfig, Trainer,
};

const GLYPH: GlyphDims = GlyphDims { width: 4, height: 4 };
const STYLES: usize = 2;

fn dataset(n: usize, offset: usize) -> GlyphDataset {
    let samples = (0..n)
        .map(|i| {
            let code = i + offset;
            let content: Vec<u8> = (0..16).map(|p| if (p + code) % 3 == 0 { 255 } else { 0 }).collect();
            let style = code % STYLES;
            let target = if style == 0 {
                content.clone()
            } else {
                content.iter().map(|&p| 255 - p).collect()
            };
            GlyphSample { content, target, style }
        })
        .collect();
    GlyphDataset { width: GLYPH.width, height: GLYPH.height, num_styles: STYLES, samples }
}

fn config() -> TrainConfig {
    TrainConfig {
        learning_rate: 0.005,
        train_batch_size: 4,
        valid_batch_size: 10,
        hidden_layers: vec![8],
        ..TrainConfig::default()
    }
}

type GlyphTrainer = Trainer<DenseGenerator, GlyphLoader, GridRenderer>;

fn trainer(seed: u64) -> GlyphTrainer {
    let config = config();
    let train = GlyphLoader::new(dataset(10, 0), config.train_batch_size, seed).unwrap();
    let valid = GlyphLoader::new(dataset(30, 100), config.valid_batch_size, seed + 1).unwrap();
    let generator = DenseGenerator::new(GLYPH, STYLES, &config.hidden_layers, seed);
    let renderer = GridRenderer::new(GLYPH, config.grid_nrow);
    Trainer::new(generator, train, valid, renderer, Box::new(NoopSink), config).unwrap()
}

#[test]
fn histories_follow_loader_lengths() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trainer.json");
    let mut t = trainer(7);

    t.run(0..3, &path).unwrap();

    // 10 samples / batch 4 -> 3 batches; 30 samples / batch 10 -> 3 batches.
    assert_eq!(t.state().train_loss_history().len(), 3 * 3);
    assert_eq!(t.state().valid_loss_history().len(), 3 * 3);
    assert_eq!(t.optimizer_steps(), 9);

    let image = &t.state().sample_image_history()[0];
    assert_eq!((image.width, image.height), (5 * 6 + 2, 5 * 6 + 2));
}

#[test]
fn best_loss_is_the_running_minimum_of_epoch_means() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trainer.json");
    let mut t = trainer(11);

    let stats = t.run(0..5, &path).unwrap();

    let mut minimum = f64::INFINITY;
    for s in &stats {
        minimum = minimum.min(s.valid_loss);
        assert_eq!(s.best_loss, minimum);
    }
    assert_eq!(t.state().best_loss(), minimum);
}

#[test]
fn best_snapshot_reproduces_its_validation_mean() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trainer.json");
    let mut t = trainer(3);
    t.run(0..4, &path).unwrap();

    let best: NetworkParams = t.best_parameters().unwrap().clone();
    let mut replica = DenseGenerator::new(GLYPH, STYLES, &[8], 999);
    replica.load_state_dict(&best).unwrap();

    let mut valid = GlyphLoader::new(dataset(30, 100), 10, 4).unwrap();
    let mut losses = Vec::new();
    for _ in 0..valid.len() {
        let batch = valid.next_batch().unwrap();
        losses.push(glyph_trainer::train::eval_batch(&mut replica, &batch, config().mse_penalty).unwrap());
    }
    // Equal-sized batches, so the mean over one pass does not depend on the
    // shuffle order beyond rounding.
    let mean = losses.iter().sum::<f64>() / losses.len() as f64;
    assert!((mean - t.state().best_loss()).abs() < 1e-9);
}

#[test]
fn restart_restores_state_exactly_and_keeps_appending() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trainer.json");
    let mut first = trainer(5);
    first.run(0..2, &path).unwrap();

    let mut second = trainer(77);
    second.load(&path, true).unwrap();
    assert_eq!(second.state(), first.state());
    assert_eq!(second.generator().state_dict(), first.generator().state_dict());
    assert_eq!(second.state().fixed_eval_batch().len(), 25);

    second.run(2..4, &path).unwrap();
    assert_eq!(second.state().train_loss_history().len(), 4 * 3);
    assert_eq!(
        &second.state().train_loss_history()[..6],
        first.state().train_loss_history()
    );
    assert_eq!(second.state().sample_image_history().len(), 4);

    let on_disk: Checkpoint<NetworkParams> = checkpoint::load(&path).unwrap();
    assert_eq!(on_disk.train_loss, second.state().train_loss_history());
    assert_eq!(on_disk.test_images.len(), 4);
}

#[test]
fn corrupt_checkpoint_is_rejected_and_state_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trainer.json");
    let mut t = trainer(1);
    t.run(0..1, &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, &text[..text.len() / 2]).unwrap();

    let mut fresh = trainer(2);
    let err = fresh.load(&path, false).unwrap_err();
    assert!(matches!(err, Error::Checkpoint { .. }));
    assert!(fresh.state().train_loss_history().is_empty());
}

#[test]
fn checkpoint_with_a_ragged_weight_matrix_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trainer.json");
    trainer(4).run(0..1, &path).unwrap();

    let mut record: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    record["generator_params"]["layers"][0]["weights"]["data"]
        .as_array_mut()
        .unwrap()
        .pop();
    fs::write(&path, serde_json::to_vec(&record).unwrap()).unwrap();

    let mut fresh = trainer(9);
    let err = fresh.load(&path, false).unwrap_err();
    assert!(matches!(err, Error::Checkpoint { .. }), "{err}");

    // The untouched trainer keeps working.
    let stats = fresh.run(0..1, &dir.path().join("other.json")).unwrap();
    assert_eq!(stats.len(), 1);
}

#[test]
fn resume_with_replay_rebuilds_the_metrics_log_once() {
    let dir = tempfile::tempdir().unwrap();
    let metrics = dir.path().join("metrics");
    let path = dir.path().join("trainer.json");
    let build = |sink: JsonlSink| {
        let config = config();
        let train = GlyphLoader::new(dataset(10, 0), config.train_batch_size, 0).unwrap();
        let valid = GlyphLoader::new(dataset(30, 100), config.valid_batch_size, 1).unwrap();
        let generator = DenseGenerator::new(GLYPH, STYLES, &config.hidden_layers, 0);
        let renderer = GridRenderer::new(GLYPH, config.grid_nrow);
        Trainer::new(generator, train, valid, renderer, Box::new(sink), config).unwrap()
    };

    let mut first = build(JsonlSink::create(&metrics).unwrap());
    first.run(0..2, &path).unwrap();
    drop(first);

    let mut resumed = build(JsonlSink::create(&metrics).unwrap());
    resumed.load(&path, true).unwrap();
    let history = resumed.state().train_loss_history().len();
    drop(resumed);

    let log = fs::read_to_string(metrics.join("metrics.jsonl")).unwrap();
    let events: Vec<serde_json::Value> = log.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    let train_events = events.iter().filter(|e| e["name"] == "train_loss").count();
    assert_eq!(train_events, history);

    let steps: Vec<u64> = events.iter().map(|e| e["step"].as_u64().unwrap()).collect();
    assert_eq!(steps, (1..=events.len() as u64).collect::<Vec<_>>());

    let pngs = fs::read_dir(&metrics)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path().extension().is_some_and(|x| x == "png"))
        .count();
    assert_eq!(pngs, 2);
}

#[test]
fn undersized_validation_set_cannot_supply_the_fixed_batch() {
    let config = config();
    let train = GlyphLoader::new(dataset(10, 0), 4, 0).unwrap();
    let valid = GlyphLoader::new(dataset(10, 100), 10, 1).unwrap();
    let generator = DenseGenerator::new(GLYPH, STYLES, &[8], 0);
    let renderer = GridRenderer::new(GLYPH, 5);
    let result = Trainer::new(generator, train, valid, renderer, Box::new(NoopSink), config);
    assert!(matches!(result, Err(Error::DataContract(_))));
}

#[test]
fn jsonl_sink_records_every_epoch() {
    let dir = tempfile::tempdir().unwrap();
    let metrics = dir.path().join("metrics");
    let config = config();
    let train = GlyphLoader::new(dataset(10, 0), config.train_batch_size, 0).unwrap();
    let valid = GlyphLoader::new(dataset(30, 100), config.valid_batch_size, 1).unwrap();
    let generator = DenseGenerator::new(GLYPH, STYLES, &config.hidden_layers, 0);
    let renderer = GridRenderer::new(GLYPH, config.grid_nrow);
    let sink = Box::new(JsonlSink::create(&metrics).unwrap());
    let mut t = Trainer::new(generator, train, valid, renderer, sink, config).unwrap();

    t.run(0..2, &dir.path().join("trainer.json")).unwrap();
    drop(t);

    let log = fs::read_to_string(metrics.join("metrics.jsonl")).unwrap();
    let events: Vec<serde_json::Value> = log.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    let named = |name: &str| events.iter().filter(|e| e["name"] == name).count();
    assert_eq!(named("train_loss"), 2 * 3);
    assert_eq!(named("valid_loss"), 2 * 3);
    assert_eq!(named("pred_image"), 2);

    let pngs = fs::read_dir(&metrics)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path().extension().is_some_and(|x| x == "png"))
        .count();
    assert_eq!(pngs, 2);
    assert!(metrics.join("summary.json").exists());
}
