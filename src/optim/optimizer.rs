use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;
use crate::optim::{adam::Adam, sgd::Sgd};

/// A trainable tensor borrowed together with its accumulated gradient.
pub struct Param<'a> {
    pub value: &'a mut Matrix,
    pub grad: &'a Matrix,
}

/// Applies one update to every parameter from its current gradient.
///
/// Parameters are identified by position, so callers must pass them in the
/// same order on every step.
pub trait Optimizer {
    fn step(&mut self, params: &mut [Param<'_>]);

    /// Number of `step` calls applied so far.
    fn steps(&self) -> u64;
}

/// Serializable optimizer choice; the learning rate is configured separately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerKind {
    Sgd,
    Adam { beta1: f64, beta2: f64, eps: f64 },
}

impl Default for OptimizerKind {
    fn default() -> Self {
        OptimizerKind::Adam { beta1: 0.5, beta2: 0.999, eps: 1e-8 }
    }
}

impl OptimizerKind {
    /// Builds a fresh optimizer with no accumulated state.
    pub fn build(&self, learning_rate: f64) -> Box<dyn Optimizer> {
        match *self {
            OptimizerKind::Sgd => Box::new(Sgd::new(learning_rate)),
            OptimizerKind::Adam { beta1, beta2, eps } => {
                Box::new(Adam::new(learning_rate, beta1, beta2, eps))
            }
        }
    }
}
