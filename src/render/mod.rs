pub mod sample_image;
pub mod grid;

pub use sample_image::SampleImage;
pub use grid::{GridRenderer, SampleRenderer};
