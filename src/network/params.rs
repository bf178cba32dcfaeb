use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::math::matrix::Matrix;

/// Trainable state of one dense layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerParams {
    pub weights: Matrix,
    pub biases: Matrix,
    pub activation: ActivationFunction,
}

/// Snapshot of every trainable tensor of a `Network`, input → output.
///
/// This is the weight blob stored in checkpoints (both the live parameters
/// and the best-so-far snapshot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub layers: Vec<LayerParams>,
}

impl NetworkParams {
    /// Serializes the parameters to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(std::io::Error::other)
    }

    /// Deserializes parameters from a JSON file previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> std::io::Result<NetworkParams> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
