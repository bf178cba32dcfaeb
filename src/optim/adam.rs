use crate::math::matrix::Matrix;
use crate::optim::optimizer::{Optimizer, Param};

/// Adam with bias correction.
///
/// Moment buffers are allocated lazily on the first step and are never
/// persisted: a resumed run starts from fresh moments.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    t: u64,
    first_moments: Vec<Matrix>,
    second_moments: Vec<Matrix>,
}

impl Adam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, eps: f64) -> Adam {
        Adam {
            learning_rate,
            beta1,
            beta2,
            eps,
            t: 0,
            first_moments: Vec::new(),
            second_moments: Vec::new(),
        }
    }

    fn ensure_moments(&mut self, params: &[Param<'_>]) {
        let matches = self.first_moments.len() == params.len()
            && self.first_moments.iter().zip(params.iter())
                .all(|(m, p)| m.shape() == p.value.shape());
        if !matches {
            self.first_moments = params.iter()
                .map(|p| Matrix::zeros(p.value.rows, p.value.cols))
                .collect();
            self.second_moments = self.first_moments.clone();
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [Param<'_>]) {
        self.ensure_moments(params);
        self.t += 1;

        let (b1, b2, eps) = (self.beta1, self.beta2, self.eps);
        let bias_c1 = 1.0 - b1.powi(self.t as i32);
        let bias_c2_sqrt = (1.0 - b2.powi(self.t as i32)).sqrt();
        let step_size = self.learning_rate / bias_c1;

        for (i, param) in params.iter_mut().enumerate() {
            let m = self.first_moments[i].zip_map(param.grad, |m, g| b1 * m + (1.0 - b1) * g);
            let v = self.second_moments[i].zip_map(param.grad, |v, g| b2 * v + (1.0 - b2) * g * g);

            let update = m.zip_map(&v, |m, v| step_size * m / (v.sqrt() / bias_c2_sqrt + eps));
            *param.value = &*param.value - &update;

            self.first_moments[i] = m;
            self.second_moments[i] = v;
        }
    }

    fn steps(&self) -> u64 {
        self.t
    }
}
