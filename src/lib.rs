pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod generator;
pub mod data;
pub mod render;
pub mod sink;
pub mod checkpoint;
pub mod train;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use loss::mse::MseLoss;
pub use optim::{Adam, Optimizer, OptimizerKind, Sgd};
pub use generator::{DenseGenerator, Generator};
pub use data::{Batch, BatchSource, GlyphDataset, GlyphDims, GlyphLoader};
pub use render::{GridRenderer, SampleImage, SampleRenderer};
pub use sink::{JsonlSink, MetricSink, NoopSink};
pub use checkpoint::Checkpoint;
pub use train::{EpochStats, Phase, RunState, TrainConfig, Trainer};
pub use error::{Error, Result};
