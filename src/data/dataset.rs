use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::data::batch::GlyphDims;
use crate::error::{Error, Result};

/// One training example: a content glyph, the same character rendered in
/// the target style, and the style index. Pixels are 8-bit grayscale,
/// row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphSample {
    pub content: Vec<u8>,
    pub target: Vec<u8>,
    pub style: usize,
}

/// A glyph dataset as stored on disk (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphDataset {
    pub width: u32,
    pub height: u32,
    pub num_styles: usize,
    pub samples: Vec<GlyphSample>,
}

impl GlyphDataset {
    pub fn dims(&self) -> GlyphDims {
        GlyphDims { width: self.width, height: self.height }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Checks every sample against the declared glyph size and style count.
    pub fn validate(&self) -> Result<()> {
        let pixels = self.dims().pixels();
        if pixels == 0 {
            return Err(Error::data_contract("glyph width and height must be positive"));
        }
        if self.num_styles == 0 {
            return Err(Error::data_contract("dataset declares zero styles"));
        }
        for (i, s) in self.samples.iter().enumerate() {
            if s.content.len() != pixels || s.target.len() != pixels {
                return Err(Error::data_contract(format!(
                    "sample {i}: expected {pixels} pixels, got content {} and target {}",
                    s.content.len(), s.target.len()
                )));
            }
            if s.style >= self.num_styles {
                return Err(Error::data_contract(format!(
                    "sample {i}: style {} out of range (num_styles = {})",
                    s.style, self.num_styles
                )));
            }
        }
        Ok(())
    }

    /// Reads and validates a dataset from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<GlyphDataset> {
        let file = File::open(path.as_ref())?;
        let dataset: GlyphDataset = serde_json::from_reader(BufReader::new(file))?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }
}
