use image::{GrayImage, Luma};

use crate::data::GlyphDims;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::render::sample_image::SampleImage;

/// Composes a batch of predictions into one displayable image.
pub trait SampleRenderer {
    fn render(&self, predictions: &Matrix) -> Result<SampleImage>;
}

/// Tiles glyphs into a grid, `nrow` glyphs per row, separated and framed by
/// `padding` black pixels.
///
/// With `normalize` set, values are min-max scaled over the whole batch
/// before quantisation; otherwise they are clamped to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct GridRenderer {
    pub glyph: GlyphDims,
    pub nrow: usize,
    pub padding: u32,
    pub normalize: bool,
}

impl GridRenderer {
    pub fn new(glyph: GlyphDims, nrow: usize) -> GridRenderer {
        GridRenderer { glyph, nrow, padding: 2, normalize: true }
    }

    /// Canvas size in pixels for `n` glyphs.
    pub fn canvas_size(&self, n: usize) -> (u32, u32) {
        let xmaps = self.nrow.min(n).max(1) as u32;
        let ymaps = n.div_ceil(xmaps as usize) as u32;
        let cell_w = self.glyph.width + self.padding;
        let cell_h = self.glyph.height + self.padding;
        (xmaps * cell_w + self.padding, ymaps * cell_h + self.padding)
    }
}

impl SampleRenderer for GridRenderer {
    fn render(&self, predictions: &Matrix) -> Result<SampleImage> {
        if self.nrow == 0 {
            return Err(Error::config("grid nrow must be at least 1"));
        }
        if predictions.rows == 0 {
            return Err(Error::shape("cannot render an empty batch"));
        }
        if predictions.cols != self.glyph.pixels() {
            return Err(Error::shape(format!(
                "predictions have {} values per glyph, expected {}x{}",
                predictions.cols, self.glyph.width, self.glyph.height
            )));
        }

        let (lo, hi) = if self.normalize {
            predictions.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            })
        } else {
            (0.0, 1.0)
        };
        let span = (hi - lo).max(1e-5);

        let (width, height) = self.canvas_size(predictions.rows);
        let mut canvas = GrayImage::new(width, height);
        let xmaps = self.nrow.min(predictions.rows);

        for (k, glyph) in predictions.data.iter().enumerate() {
            let x0 = (k % xmaps) as u32 * (self.glyph.width + self.padding) + self.padding;
            let y0 = (k / xmaps) as u32 * (self.glyph.height + self.padding) + self.padding;
            for (p, &v) in glyph.iter().enumerate() {
                let px = p as u32 % self.glyph.width;
                let py = p as u32 / self.glyph.width;
                let unit = ((v - lo) / span).clamp(0.0, 1.0);
                canvas.put_pixel(x0 + px, y0 + py, Luma([(unit * 255.0).round() as u8]));
            }
        }

        Ok(SampleImage::from_gray_image(canvas))
    }
}
