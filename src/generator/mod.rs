pub mod generator;
pub mod dense;

pub use generator::Generator;
pub use dense::DenseGenerator;
