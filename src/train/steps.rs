use tracing::debug;

use crate::data::{Batch, BatchSource};
use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::loss::MseLoss;
use crate::optim::Optimizer;
use crate::render::{SampleImage, SampleRenderer};
use crate::sink::{emit, MetricSink};
use crate::train::run_state::RunState;

// ---------------------------------------------------------------------------
// Single-batch steps
// ---------------------------------------------------------------------------

/// One optimisation step on one batch; returns `penalty * mse`.
///
/// Gradients are zeroed, the penalised loss is backpropagated and the
/// optimizer steps exactly once.
pub fn train_batch<G: Generator>(
    generator: &mut G,
    optimizer: &mut dyn Optimizer,
    batch: &Batch,
    penalty: f64,
) -> Result<f64> {
    batch.validate()?;
    let prediction = generator.forward(&batch.content, &batch.labels)?;
    let loss = penalty * MseLoss::loss(&prediction, &batch.target)?;
    let grad = MseLoss::derivative(&prediction, &batch.target)?.map(|g| penalty * g);

    generator.zero_grad();
    generator.backward(&grad)?;
    optimizer.step(&mut generator.parameters());

    Ok(loss)
}

/// Penalised loss on one batch under frozen parameters.
pub fn eval_batch<G: Generator>(generator: &mut G, batch: &Batch, penalty: f64) -> Result<f64> {
    batch.validate()?;
    let prediction = generator.forward(&batch.content, &batch.labels)?;
    Ok(penalty * MseLoss::loss(&prediction, &batch.target)?)
}

// ---------------------------------------------------------------------------
// Epochs
// ---------------------------------------------------------------------------

/// Runs one training epoch: exactly `source.len()` batches, one optimizer
/// step each. Every batch loss is appended to the train history and sent
/// to the sink. Returns the mean batch loss.
pub fn train_epoch<G, S>(
    generator: &mut G,
    optimizer: &mut dyn Optimizer,
    source: &mut S,
    state: &mut RunState<G::Params>,
    sink: &mut dyn MetricSink,
    penalty: f64,
) -> Result<f64>
where
    G: Generator,
    S: BatchSource + ?Sized,
{
    generator.set_training(true);
    let batches = epoch_len(source, "training")?;

    let mut total = 0.0;
    for i in 0..batches {
        let batch = source.next_batch()?;
        let loss = train_batch(generator, optimizer, &batch, penalty)?;
        debug!(batch = i, loss, "train step");

        total += loss;
        state.record_train_loss(loss);
        emit(sink, "train_loss", |s| s.log_scalar("train_loss", loss));
    }

    Ok(total / batches as f64)
}

/// Runs one validation epoch and applies the best-model policy to the
/// resulting mean. No gradients, no optimizer.
pub fn eval_epoch<G, S>(
    generator: &mut G,
    source: &mut S,
    state: &mut RunState<G::Params>,
    sink: &mut dyn MetricSink,
    penalty: f64,
) -> Result<f64>
where
    G: Generator,
    S: BatchSource + ?Sized,
{
    generator.set_training(false);
    let batches = epoch_len(source, "validation")?;

    let mut total = 0.0;
    for i in 0..batches {
        let batch = source.next_batch()?;
        let loss = eval_batch(generator, &batch, penalty)?;
        debug!(batch = i, loss, "valid step");

        total += loss;
        state.record_valid_loss(loss);
        emit(sink, "valid_loss", |s| s.log_scalar("valid_loss", loss));
    }

    let mean = total / batches as f64;
    if state.observe_validation(mean, || generator.state_dict()) {
        debug!(best_loss = mean, "new best model");
    }
    Ok(mean)
}

/// Predicts the fixed evaluation batch (target withheld) and composes the
/// predictions into one image.
pub fn render_sample<G, R>(generator: &mut G, renderer: &R, fixed: &Batch) -> Result<SampleImage>
where
    G: Generator,
    R: SampleRenderer + ?Sized,
{
    generator.set_training(false);
    let prediction = generator.forward(&fixed.content, &fixed.labels)?;
    renderer.render(&prediction)
}

fn epoch_len<S: BatchSource + ?Sized>(source: &S, phase: &str) -> Result<usize> {
    match source.len() {
        0 => Err(Error::data_contract(format!("{phase} source reports zero batches"))),
        n => Ok(n),
    }
}
