use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²) over every element of the batch.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        check_shapes(predicted, expected)?;
        Ok(predicted.zip_map(expected, |a, b| (a - b).powi(2)).mean())
    }

    /// Gradient of `loss` w.r.t. `predicted`: 2·(predicted - expected) / N.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        check_shapes(predicted, expected)?;
        let scale = 2.0 / predicted.len().max(1) as f64;
        Ok(predicted.zip_map(expected, |a, b| scale * (a - b)))
    }
}

fn check_shapes(predicted: &Matrix, expected: &Matrix) -> Result<()> {
    if predicted.shape() != expected.shape() {
        return Err(Error::shape(format!(
            "prediction {:?} and target {:?} differ",
            predicted.shape(), expected.shape()
        )));
    }
    Ok(())
}
