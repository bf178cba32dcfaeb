use rand::Rng;

use crate::{activation::activation::ActivationFunction, layers::dense::Layer};
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::params::{LayerParams, NetworkParams};
use crate::optim::Param;

pub struct Network {
    pub layers: Vec<Layer>,
    last_output: Option<(usize, usize)>,
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples.
    pub fn new<R: Rng + ?Sized>(
        layer_specs: Vec<(usize, usize, ActivationFunction)>,
        rng: &mut R,
    ) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation, &mut *rng))
            .collect();
        Network { layers, last_output: None }
    }

    /// Rebuilds a network from a parameter snapshot, checking that
    /// consecutive layers fit together.
    pub fn from_params(params: &NetworkParams) -> Result<Network> {
        let mut layers = Vec::with_capacity(params.layers.len());
        for (i, lp) in params.layers.iter().enumerate() {
            if lp.biases.shape() != (1, lp.weights.cols) {
                return Err(Error::shape(format!(
                    "layer {i}: biases {:?} do not match weights {:?}",
                    lp.biases.shape(), lp.weights.shape()
                )));
            }
            if let Some(prev) = layers.last().map(|l: &Layer| l.size) {
                if prev != lp.weights.rows {
                    return Err(Error::shape(format!(
                        "layer {i}: expects {} inputs but previous layer has {prev} outputs",
                        lp.weights.rows
                    )));
                }
            }
            layers.push(Layer::from_parts(lp.weights.clone(), lp.biases.clone(), lp.activation));
        }
        Ok(Network { layers, last_output: None })
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size())
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size)
    }

    /// Batched forward pass; caches activations in each layer for backprop.
    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        if input.cols != self.input_size() {
            return Err(Error::shape(format!(
                "network expects {} input features, got {}",
                self.input_size(), input.cols
            )));
        }
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current);
        }
        self.last_output = Some(current.shape());
        Ok(current)
    }

    /// Backpropagates `∂L/∂output` of the last forward pass through every
    /// layer, accumulating gradients.
    pub fn backward(&mut self, grad_output: &Matrix) -> Result<()> {
        match self.last_output {
            Some(shape) if shape == grad_output.shape() => {}
            Some(shape) => {
                return Err(Error::shape(format!(
                    "output gradient {:?} does not match last output {:?}",
                    grad_output.shape(), shape
                )));
            }
            None => return Err(Error::shape("backward called before forward")),
        }

        let mut delta = grad_output.clone();
        for layer in self.layers.iter_mut().rev() {
            delta = layer.backward(&delta);
        }
        Ok(())
    }

    pub fn zero_grad(&mut self) {
        for layer in &mut self.layers {
            layer.zero_grad();
        }
    }

    /// All trainable tensors, input layer first, weights before biases.
    pub fn parameters(&mut self) -> Vec<Param<'_>> {
        self.layers.iter_mut().flat_map(|l| l.params_mut()).collect()
    }

    pub fn params(&self) -> NetworkParams {
        NetworkParams {
            layers: self.layers.iter()
                .map(|l| LayerParams {
                    weights: l.weights.clone(),
                    biases: l.biases.clone(),
                    activation: l.activator,
                })
                .collect(),
        }
    }

    /// Overwrites the weights in place. The snapshot must have exactly this
    /// network's architecture.
    pub fn load_params(&mut self, params: &NetworkParams) -> Result<()> {
        if params.layers.len() != self.layers.len() {
            return Err(Error::shape(format!(
                "snapshot has {} layers, network has {}",
                params.layers.len(), self.layers.len()
            )));
        }
        for (i, (layer, lp)) in self.layers.iter().zip(params.layers.iter()).enumerate() {
            if layer.weights.shape() != lp.weights.shape()
                || layer.biases.shape() != lp.biases.shape()
                || layer.activator != lp.activation
            {
                return Err(Error::shape(format!(
                    "layer {i}: snapshot {:?} {:?} does not match network {:?} {:?}",
                    lp.weights.shape(), lp.activation, layer.weights.shape(), layer.activator
                )));
            }
        }
        for (layer, lp) in self.layers.iter_mut().zip(params.layers.iter()) {
            layer.weights = lp.weights.clone();
            layer.biases = lp.biases.clone();
            layer.zero_grad();
        }
        self.last_output = None;
        Ok(())
    }
}
