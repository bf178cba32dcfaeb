use serde::{Serialize, Deserialize};

/// Per-epoch summary returned by `Trainer::run`, one per completed epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Exclusive end of the requested epoch range.
    pub total_epochs: usize,
    /// Mean penalised training loss over this epoch's batches.
    pub train_loss: f64,
    /// Mean penalised validation loss over this epoch's batches.
    pub valid_loss: f64,
    /// Best validation mean so far, this epoch included.
    pub best_loss: f64,
    /// Whether this epoch's weights became the new best snapshot.
    pub improved: bool,
    /// Wall-clock duration of the epoch including the checkpoint write.
    pub elapsed_ms: u64,
}
