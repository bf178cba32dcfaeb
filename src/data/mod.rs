pub mod batch;
pub mod dataset;
pub mod loader;

pub use batch::{Batch, BatchSource, GlyphDims};
pub use dataset::{GlyphDataset, GlyphSample};
pub use loader::GlyphLoader;
