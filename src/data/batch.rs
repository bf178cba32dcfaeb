use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Width and height of one glyph image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphDims {
    pub width: u32,
    pub height: u32,
}

impl GlyphDims {
    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// One mini-batch of `(content_input, target_output, condition_label)`,
/// one example per row in each matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub content: Matrix,
    pub target: Matrix,
    pub labels: Matrix,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.content.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that the three tensors describe the same, non-empty set of
    /// examples.
    pub fn validate(&self) -> Result<()> {
        let rows = self.content.rows;
        if rows == 0 {
            return Err(Error::data_contract("batch is empty"));
        }
        if self.target.rows != rows || self.labels.rows != rows {
            return Err(Error::data_contract(format!(
                "batch rows disagree: content {}, target {}, labels {}",
                rows, self.target.rows, self.labels.rows
            )));
        }
        Ok(())
    }
}

/// A finite, enumerable stream of batches.
///
/// `len` is the number of batches that make up one epoch; the trainer pulls
/// exactly that many through `next_batch` per pass and trusts the count.
pub trait BatchSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_batch(&mut self) -> Result<Batch>;

    /// Draws one batch of exactly `size` examples outside the epoch stream.
    fn sample(&mut self, size: usize) -> Result<Batch>;
}
