use crate::optim::optimizer::{Optimizer, Param};

pub struct Sgd {
    pub learning_rate: f64,
    steps: u64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate, steps: 0 }
    }
}

impl Optimizer for Sgd {
    /// Plain gradient descent: `w ← w − lr·g`.
    fn step(&mut self, params: &mut [Param<'_>]) {
        let lr = self.learning_rate;
        for param in params.iter_mut() {
            *param.value = param.value.zip_map(param.grad, |w, g| w - lr * g);
        }
        self.steps += 1;
    }

    fn steps(&self) -> u64 {
        self.steps
    }
}
