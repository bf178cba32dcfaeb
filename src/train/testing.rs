//! Deterministic stand-ins for the generator, optimizer and batch source.

use serde::{Deserialize, Serialize};

use crate::data::{Batch, BatchSource};
use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::math::matrix::Matrix;
use crate::optim::{Optimizer, Param};

/// `prediction = content + bias`, with one scalar trainable bias.
pub(crate) struct EchoGenerator {
    bias: Matrix,
    grad: Matrix,
    pub backward_calls: u64,
    training: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct EchoParams {
    pub bias: f64,
    pub backward_calls: u64,
}

impl EchoGenerator {
    pub fn new() -> EchoGenerator {
        EchoGenerator {
            bias: Matrix::zeros(1, 1),
            grad: Matrix::zeros(1, 1),
            backward_calls: 0,
            training: false,
        }
    }

    pub fn grad_value(&self) -> f64 {
        self.grad.data[0][0]
    }
}

impl Generator for EchoGenerator {
    type Params = EchoParams;

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    fn is_training(&self) -> bool {
        self.training
    }

    fn forward(&mut self, content: &Matrix, labels: &Matrix) -> Result<Matrix> {
        if content.rows != labels.rows {
            return Err(Error::shape("content and labels disagree"));
        }
        let b = self.bias.data[0][0];
        Ok(content.map(|x| x + b))
    }

    fn zero_grad(&mut self) {
        self.grad = Matrix::zeros(1, 1);
    }

    fn backward(&mut self, grad_output: &Matrix) -> Result<()> {
        self.grad.data[0][0] += grad_output.sum();
        self.backward_calls += 1;
        Ok(())
    }

    fn parameters(&mut self) -> Vec<Param<'_>> {
        vec![Param { value: &mut self.bias, grad: &self.grad }]
    }

    fn state_dict(&self) -> EchoParams {
        EchoParams { bias: self.bias.data[0][0], backward_calls: self.backward_calls }
    }

    fn load_state_dict(&mut self, params: &EchoParams) -> Result<()> {
        self.bias.data[0][0] = params.bias;
        self.backward_calls = params.backward_calls;
        Ok(())
    }
}

/// Counts steps without changing any parameter.
#[derive(Default)]
pub(crate) struct CountingOptimizer {
    steps: u64,
}

impl Optimizer for CountingOptimizer {
    fn step(&mut self, _params: &mut [Param<'_>]) {
        self.steps += 1;
    }

    fn steps(&self) -> u64 {
        self.steps
    }
}

/// Replays a fixed list of batches in order, wrapping around.
pub(crate) struct ScriptedSource {
    batches: Vec<Batch>,
    cursor: usize,
    per_epoch: usize,
}

impl ScriptedSource {
    /// One epoch is the whole list.
    pub fn new(batches: Vec<Batch>) -> ScriptedSource {
        let per_epoch = batches.len();
        ScriptedSource { batches, cursor: 0, per_epoch }
    }

    /// One epoch is `per_epoch` batches, so successive epochs walk the list.
    pub fn cycling(batches: Vec<Batch>, per_epoch: usize) -> ScriptedSource {
        ScriptedSource { batches, cursor: 0, per_epoch }
    }
}

impl BatchSource for ScriptedSource {
    fn len(&self) -> usize {
        self.per_epoch
    }

    fn next_batch(&mut self) -> Result<Batch> {
        let batch = self.batches[self.cursor % self.batches.len()].clone();
        self.cursor += 1;
        Ok(batch)
    }

    fn sample(&mut self, size: usize) -> Result<Batch> {
        Ok(Batch {
            content: Matrix::filled(size, 1, 0.5),
            target: Matrix::zeros(size, 1),
            labels: Matrix::filled(size, 1, 1.0),
        })
    }
}

/// Single-example batch: content `value`, target 0, so raw MSE is `value²`
/// under a zero bias.
pub(crate) fn scalar_batch(value: f64) -> Batch {
    Batch {
        content: Matrix::from_data(vec![vec![value]]),
        target: Matrix::zeros(1, 1),
        labels: Matrix::from_data(vec![vec![1.0]]),
    }
}
