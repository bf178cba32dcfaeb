use std::path::Path;

use image::GrayImage;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// An 8-bit grayscale composite image, stored verbatim in checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleImage {
    pub width: u32,
    pub height: u32,
    /// Row-major luma values, `width * height` bytes.
    pub pixels: Vec<u8>,
}

impl SampleImage {
    pub fn to_gray_image(&self) -> Result<GrayImage> {
        GrayImage::from_raw(self.width, self.height, self.pixels.clone()).ok_or_else(|| {
            Error::shape(format!(
                "{} pixel bytes do not fill a {}x{} image",
                self.pixels.len(), self.width, self.height
            ))
        })
    }

    pub fn from_gray_image(image: GrayImage) -> SampleImage {
        SampleImage {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        }
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_gray_image()?.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}
