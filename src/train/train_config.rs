use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::optim::OptimizerKind;

/// Hyperparameters and run settings.
///
/// Every field has a default, so a TOML file only needs the values it
/// changes:
///
/// ```toml
/// learning_rate = 0.0005
/// epochs = [10, 20]
///
/// [optimizer]
/// type = "adam"
/// beta1 = 0.5
/// beta2 = 0.999
/// eps = 1e-8
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub train_batch_size: usize,
    pub valid_batch_size: usize,
    /// Multiplier applied to the raw MSE before backprop and reporting.
    pub mse_penalty: f64,
    /// Half-open epoch range `[start, end)`.
    pub epochs: (usize, usize),
    /// Size of the fixed evaluation batch rendered every epoch.
    pub sample_size: usize,
    /// Glyphs per row in the rendered sample grid.
    pub grid_nrow: usize,
    pub optimizer: OptimizerKind,
    pub hidden_layers: Vec<usize>,
    /// Activation of every hidden layer; the output layer is always sigmoid.
    pub hidden_activation: ActivationFunction,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            learning_rate: 0.0008,
            train_batch_size: 16,
            valid_batch_size: 32,
            mse_penalty: 5.0,
            epochs: (0, 10),
            sample_size: 25,
            grid_nrow: 5,
            optimizer: OptimizerKind::default(),
            hidden_layers: vec![512, 512],
            hidden_activation: ActivationFunction::ReLU,
            seed: 42,
        }
    }
}

impl TrainConfig {
    pub fn from_toml_str(contents: &str) -> Result<TrainConfig> {
        let config: TrainConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<TrainConfig> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        TrainConfig::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(Error::config(format!("learning_rate must be positive, got {}", self.learning_rate)));
        }
        if !(self.mse_penalty > 0.0 && self.mse_penalty.is_finite()) {
            return Err(Error::config(format!("mse_penalty must be positive, got {}", self.mse_penalty)));
        }
        if self.train_batch_size == 0 || self.valid_batch_size == 0 {
            return Err(Error::config("batch sizes must be at least 1"));
        }
        if self.sample_size == 0 || self.grid_nrow == 0 {
            return Err(Error::config("sample_size and grid_nrow must be at least 1"));
        }
        if self.epochs.0 > self.epochs.1 {
            return Err(Error::config(format!(
                "epoch range start {} is after end {}",
                self.epochs.0, self.epochs.1
            )));
        }
        if self.hidden_layers.iter().any(|&n| n == 0) {
            return Err(Error::config("hidden layer sizes must be positive"));
        }
        if let ActivationFunction::LeakyReLU { alpha } = self.hidden_activation {
            if !(0.0..1.0).contains(&alpha) {
                return Err(Error::config(format!("leaky ReLU alpha must be in [0, 1), got {alpha}")));
            }
        }
        Ok(())
    }
}
