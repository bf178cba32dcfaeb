use std::ops::Range;
use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::checkpoint::{self, Checkpoint};
use crate::data::BatchSource;
use crate::error::Result;
use crate::generator::Generator;
use crate::optim::Optimizer;
use crate::render::SampleRenderer;
use crate::sink::{emit, MetricSink};
use crate::train::epoch_stats::EpochStats;
use crate::train::run_state::RunState;
use crate::train::steps::{eval_epoch, render_sample, train_epoch};
use crate::train::train_config::TrainConfig;

/// Where the epoch state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Train,
    Eval,
    Sample,
    Checkpoint,
    Done,
}

/// Owns a generator, its optimizer, both batch sources and the run state,
/// and drives `train → eval → sample → checkpoint` once per epoch.
pub struct Trainer<G: Generator, S, R> {
    generator: G,
    optimizer: Box<dyn Optimizer>,
    train_source: S,
    valid_source: S,
    renderer: R,
    sink: Box<dyn MetricSink>,
    state: RunState<G::Params>,
    config: TrainConfig,
    phase: Phase,
}

impl<G, S, R> Trainer<G, S, R>
where
    G: Generator,
    S: BatchSource,
    R: SampleRenderer,
{
    /// Builds a trainer with a fresh optimizer and draws the fixed
    /// evaluation batch from `valid_source`.
    pub fn new(
        generator: G,
        train_source: S,
        mut valid_source: S,
        renderer: R,
        sink: Box<dyn MetricSink>,
        config: TrainConfig,
    ) -> Result<Trainer<G, S, R>> {
        config.validate()?;
        let fixed_eval_batch = valid_source.sample(config.sample_size)?;
        fixed_eval_batch.validate()?;

        Ok(Trainer {
            optimizer: config.optimizer.build(config.learning_rate),
            generator,
            train_source,
            valid_source,
            renderer,
            sink,
            state: RunState::new(fixed_eval_batch),
            config,
            phase: Phase::Idle,
        })
    }

    pub fn state(&self) -> &RunState<G::Params> {
        &self.state
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut G {
        &mut self.generator
    }

    pub fn best_parameters(&self) -> Option<&G::Params> {
        self.state.best_parameters()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Optimizer steps applied since the optimizer was last (re)built.
    pub fn optimizer_steps(&self) -> u64 {
        self.optimizer.steps()
    }

    /// Runs every epoch in `epochs`, overwriting the checkpoint at
    /// `checkpoint_path` after each one.
    ///
    /// Any error aborts the run; the last successfully written checkpoint
    /// remains the recovery point.
    pub fn run(&mut self, epochs: Range<usize>, checkpoint_path: &Path) -> Result<Vec<EpochStats>> {
        let total_epochs = epochs.end;
        let penalty = self.config.mse_penalty;
        let mut history = Vec::with_capacity(epochs.len());

        for epoch in epochs {
            let started = Instant::now();
            info!("{} EPOCH: [{}/{}] {}", "-".repeat(50), epoch + 1, total_epochs, "-".repeat(50));

            self.phase = Phase::Train;
            let train_loss = train_epoch(
                &mut self.generator,
                self.optimizer.as_mut(),
                &mut self.train_source,
                &mut self.state,
                self.sink.as_mut(),
                penalty,
            )?;
            info!(train_loss, "TRAIN");

            self.phase = Phase::Eval;
            let best_before = self.state.best_loss();
            let valid_loss = eval_epoch(
                &mut self.generator,
                &mut self.valid_source,
                &mut self.state,
                self.sink.as_mut(),
                penalty,
            )?;
            let improved = valid_loss <= best_before;
            info!(valid_loss, best_loss = self.state.best_loss(), "VALID");

            self.phase = Phase::Sample;
            let image = render_sample(&mut self.generator, &self.renderer, self.state.fixed_eval_batch())?;
            emit(self.sink.as_mut(), "pred_image", |s| s.log_image("pred_image", &image));
            self.state.push_sample(image);

            self.phase = Phase::Checkpoint;
            self.save_checkpoint(checkpoint_path)?;
            let best_loss = self.state.best_loss();
            emit(self.sink.as_mut(), "best_loss", |s| s.update_summary("best_loss", best_loss));

            history.push(EpochStats {
                epoch: epoch + 1,
                total_epochs,
                train_loss,
                valid_loss,
                best_loss,
                improved,
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
        }

        self.phase = Phase::Done;
        Ok(history)
    }

    /// Writes the full run state and the live weights to `path`.
    pub fn save_checkpoint(&self, path: &Path) -> Result<()> {
        let record = Checkpoint::capture(self.generator.state_dict(), &self.state);
        checkpoint::save(path, &record)
    }

    /// Restores a run from `path`.
    ///
    /// Generator weights, best loss and snapshot, the fixed evaluation batch,
    /// both loss histories and the sample history are taken verbatim from
    /// the file. The optimizer is rebuilt from scratch, so moment estimates
    /// from before the restart are lost. With `replay`, the restored history
    /// is re-sent to the metric sink.
    pub fn load(&mut self, path: &Path, replay: bool) -> Result<()> {
        let record: Checkpoint<G::Params> = checkpoint::load(path)?;
        let (params, state) = record.into_parts()?;

        self.generator.load_state_dict(&params)?;
        self.state = state;
        self.optimizer = self.config.optimizer.build(self.config.learning_rate);
        self.phase = Phase::Idle;

        info!(
            path = %path.display(),
            epochs_completed = self.state.epochs_completed(),
            best_loss = self.state.best_loss(),
            "resumed from checkpoint"
        );

        if replay {
            self.replay_history();
        }
        Ok(())
    }

    /// Re-emits the best loss summary, every recorded loss and every sample
    /// image, in that order. Read-only with respect to the run state.
    pub fn replay_history(&mut self) {
        let sink = self.sink.as_mut();
        let state = &self.state;

        let best_loss = state.best_loss();
        emit(sink, "best_loss", |s| s.update_summary("best_loss", best_loss));
        for &loss in state.train_loss_history() {
            emit(sink, "train_loss", |s| s.log_scalar("train_loss", loss));
        }
        for &loss in state.valid_loss_history() {
            emit(sink, "valid_loss", |s| s.log_scalar("valid_loss", loss));
        }
        for image in state.sample_image_history() {
            emit(sink, "pred_image", |s| s.log_image("pred_image", image));
        }
    }
}
