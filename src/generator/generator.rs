use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::optim::Param;

/// A conditional image generator: `prediction = G(content, style_label)`.
///
/// The trainer drives it through a torch-like protocol: `forward` caches
/// whatever `backward` needs, `backward` accumulates gradients for the
/// most recent forward pass, and `parameters` exposes the tensors an
/// `Optimizer` updates. Gradients accumulate until `zero_grad`.
pub trait Generator {
    /// Serializable weight snapshot. Opaque to the trainer.
    type Params: Clone + Serialize + DeserializeOwned;

    /// Switches between training and evaluation behaviour.
    fn set_training(&mut self, training: bool);

    fn is_training(&self) -> bool;

    /// Predicts one output row per input row.
    fn forward(&mut self, content: &Matrix, labels: &Matrix) -> Result<Matrix>;

    fn zero_grad(&mut self);

    /// Accumulates parameter gradients given `∂L/∂prediction` of the last
    /// forward pass.
    fn backward(&mut self, grad_output: &Matrix) -> Result<()>;

    fn parameters(&mut self) -> Vec<Param<'_>>;

    fn state_dict(&self) -> Self::Params;

    fn load_state_dict(&mut self, params: &Self::Params) -> Result<()>;
}
