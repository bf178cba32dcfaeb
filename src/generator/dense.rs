use rand::{rngs::StdRng, SeedableRng};

use crate::activation::activation::ActivationFunction;
use crate::data::GlyphDims;
use crate::error::{Error, Result};
use crate::generator::generator::Generator;
use crate::math::matrix::Matrix;
use crate::network::{Network, NetworkParams};
use crate::optim::Param;

/// Dense style-transfer generator.
///
/// Architecture: `[content pixels ‖ one-hot style] → hidden… → pixels (Sigmoid)`.
/// Outputs lie in `[0, 1]`, the same range as the loader's pixel values.
pub struct DenseGenerator {
    network: Network,
    glyph: GlyphDims,
    num_styles: usize,
    training: bool,
}

impl DenseGenerator {
    /// ReLU hidden layers.
    pub fn new(glyph: GlyphDims, num_styles: usize, hidden: &[usize], seed: u64) -> DenseGenerator {
        DenseGenerator::with_activation(glyph, num_styles, hidden, ActivationFunction::ReLU, seed)
    }

    /// Hidden layers use `activation`; the output layer is always sigmoid.
    pub fn with_activation(
        glyph: GlyphDims,
        num_styles: usize,
        hidden: &[usize],
        activation: ActivationFunction,
        seed: u64,
    ) -> DenseGenerator {
        let mut rng = StdRng::seed_from_u64(seed);
        let pixels = glyph.pixels();

        let mut specs = Vec::with_capacity(hidden.len() + 1);
        let mut fan_in = pixels + num_styles;
        for &size in hidden {
            specs.push((size, fan_in, activation));
            fan_in = size;
        }
        specs.push((pixels, fan_in, ActivationFunction::Sigmoid));

        DenseGenerator {
            network: Network::new(specs, &mut rng),
            glyph,
            num_styles,
            training: true,
        }
    }

    pub fn glyph(&self) -> GlyphDims {
        self.glyph
    }

    pub fn num_styles(&self) -> usize {
        self.num_styles
    }
}

impl Generator for DenseGenerator {
    type Params = NetworkParams;

    // Dense layers have no train-only behaviour; the flag is tracked so
    // callers can assert on the mode.
    fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    fn is_training(&self) -> bool {
        self.training
    }

    fn forward(&mut self, content: &Matrix, labels: &Matrix) -> Result<Matrix> {
        if content.cols != self.glyph.pixels() || labels.cols != self.num_styles {
            return Err(Error::shape(format!(
                "generator expects {} content pixels and {} style columns, got {} and {}",
                self.glyph.pixels(), self.num_styles, content.cols, labels.cols
            )));
        }
        if content.rows != labels.rows {
            return Err(Error::shape(format!(
                "{} content rows but {} label rows",
                content.rows, labels.rows
            )));
        }
        self.network.forward(&content.hstack(labels))
    }

    fn zero_grad(&mut self) {
        self.network.zero_grad();
    }

    fn backward(&mut self, grad_output: &Matrix) -> Result<()> {
        self.network.backward(grad_output)
    }

    fn parameters(&mut self) -> Vec<Param<'_>> {
        self.network.parameters()
    }

    fn state_dict(&self) -> NetworkParams {
        self.network.params()
    }

    fn load_state_dict(&mut self, params: &NetworkParams) -> Result<()> {
        self.network.load_params(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::MseLoss;
    use crate::optim::OptimizerKind;

    fn dims() -> GlyphDims {
        GlyphDims { width: 2, height: 2 }
    }

    #[test]
    fn output_matches_glyph_size_and_range() {
        let mut g = DenseGenerator::new(dims(), 3, &[8], 0);
        let content = Matrix::filled(5, 4, 0.5);
        let labels = Matrix::from_data(vec![vec![1.0, 0.0, 0.0]; 5]);
        let out = g.forward(&content, &labels).unwrap();
        assert_eq!(out.shape(), (5, 4));
        assert!(out.iter().all(|x| (0.0..=1.0).contains(&x)));
    }

    #[test]
    fn rejects_wrong_label_width() {
        let mut g = DenseGenerator::new(dims(), 3, &[8], 0);
        let err = g.forward(&Matrix::zeros(1, 4), &Matrix::zeros(1, 2)).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn same_seed_gives_same_weights() {
        let a = DenseGenerator::new(dims(), 2, &[6, 6], 11);
        let b = DenseGenerator::new(dims(), 2, &[6, 6], 11);
        assert_eq!(a.state_dict(), b.state_dict());
    }

    #[test]
    fn a_few_adam_steps_fit_a_single_example() {
        let mut g = DenseGenerator::new(dims(), 2, &[16], 3);
        let content = Matrix::from_data(vec![vec![1.0, 0.0, 0.0, 1.0]]);
        let labels = Matrix::from_data(vec![vec![0.0, 1.0]]);
        let target = Matrix::from_data(vec![vec![0.0, 1.0, 1.0, 0.0]]);
        let mut optim = OptimizerKind::default().build(0.02);

        let before = MseLoss::loss(&g.forward(&content, &labels).unwrap(), &target).unwrap();
        for _ in 0..300 {
            let pred = g.forward(&content, &labels).unwrap();
            g.zero_grad();
            g.backward(&MseLoss::derivative(&pred, &target).unwrap()).unwrap();
            optim.step(&mut g.parameters());
        }
        let after = MseLoss::loss(&g.forward(&content, &labels).unwrap(), &target).unwrap();
        assert!(after < before * 0.25, "loss went from {before} to {after}");
    }

    #[test]
    fn hidden_activation_is_configurable() {
        let leaky = ActivationFunction::LeakyReLU { alpha: 0.1 };
        let g = DenseGenerator::with_activation(dims(), 2, &[6, 6], leaky, 5);
        let activations: Vec<_> = g.state_dict().layers.iter().map(|l| l.activation).collect();
        assert_eq!(activations, vec![leaky, leaky, ActivationFunction::Sigmoid]);

        let mut snapshot_target = DenseGenerator::new(dims(), 2, &[6, 6], 5);
        assert!(matches!(snapshot_target.load_state_dict(&g.state_dict()), Err(Error::Shape(_))));
    }
}
