use rand::Rng;

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction, optim::Param};

/// Fully connected layer operating on batches (one example per row).
///
/// The layer caches the inputs and pre-activations of the most recent
/// `forward` call; `backward` consumes them and accumulates gradients until
/// the next `zero_grad`.
#[derive(Debug, Clone)]
pub struct Layer{
    pub size: usize,
    pub weights: Matrix,  // (input_size, size)
    pub biases: Matrix,   // (1, size)
    pub activator: ActivationFunction,
    inputs: Matrix,
    pre_neurons: Matrix,  // z = xW + b, needed for the activation derivative
    weights_grad: Matrix,
    biases_grad: Matrix,
}

impl Layer {
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        let weights = if activation.prefers_he_init() {
            Matrix::he(input_size, size, rng)
        } else {
            Matrix::xavier(input_size, size, rng)
        };
        Layer::from_parts(weights, Matrix::zeros(1, size), activation)
    }

    pub fn from_parts(weights: Matrix, biases: Matrix, activation: ActivationFunction) -> Layer {
        let (input_size, size) = weights.shape();
        Layer {
            size,
            weights_grad: Matrix::zeros(input_size, size),
            biases_grad: Matrix::zeros(1, size),
            weights,
            biases,
            activator: activation,
            inputs: Matrix::default(),
            pre_neurons: Matrix::default(),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Batched forward pass: `a = σ(xW + b)`.
    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        let z = (input * &self.weights).add_row(&self.biases);
        let a = z.map(|x| self.activator.function(x));
        self.inputs = input.clone();
        self.pre_neurons = z;
        a
    }

    /// Backpropagates `∂L/∂a` for the cached batch.
    ///
    /// Adds `∂L/∂W` and `∂L/∂b` into the gradient accumulators and returns
    /// `∂L/∂x`, the error for the previous layer.
    pub fn backward(&mut self, grad_output: &Matrix) -> Matrix {
        // δ = ∂L/∂a ⊙ σ'(z)
        let act_derivative = self.pre_neurons.map(|x| self.activator.derivative(x));
        let delta = grad_output.hadamard(&act_derivative);

        let weights_adjustment = &self.inputs.transpose() * &delta;
        let biases_adjustment = delta.sum_rows();
        self.weights_grad = &self.weights_grad + &weights_adjustment;
        self.biases_grad = &self.biases_grad + &biases_adjustment;

        &delta * &self.weights.transpose()
    }

    pub fn zero_grad(&mut self) {
        self.weights_grad = Matrix::zeros(self.weights.rows, self.weights.cols);
        self.biases_grad = Matrix::zeros(1, self.size);
    }

    /// Trainable tensors paired with their accumulated gradients.
    pub fn params_mut(&mut self) -> [Param<'_>; 2] {
        [
            Param { value: &mut self.weights, grad: &self.weights_grad },
            Param { value: &mut self.biases, grad: &self.biases_grad },
        ]
    }
}
