pub mod optimizer;
pub mod sgd;
pub mod adam;

pub use optimizer::{Optimizer, OptimizerKind, Param};
pub use sgd::Sgd;
pub use adam::Adam;
