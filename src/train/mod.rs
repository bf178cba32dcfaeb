pub mod run_state;
pub mod steps;
pub mod trainer;
pub mod epoch_stats;
pub mod train_config;

#[cfg(test)]
pub(crate) mod testing;

pub use run_state::{RunState, BEST_LOSS_SENTINEL};
pub use steps::{eval_batch, eval_epoch, render_sample, train_batch, train_epoch};
pub use trainer::{Phase, Trainer};
pub use epoch_stats::EpochStats;
pub use train_config::TrainConfig;
