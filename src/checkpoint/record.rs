use serde::{Serialize, Deserialize};

use crate::data::Batch;
use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::render::SampleImage;
use crate::train::run_state::RunState;

/// Bumped whenever the record layout changes incompatibly.
pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;

/// The single persisted record of a run, written once per epoch.
///
/// All fields are required on load. `best_params` may be `null` (no
/// validation epoch yet) but must be present. Unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Checkpoint<P> {
    pub format_version: u32,
    pub generator_params: P,
    pub best_loss: f64,
    #[serde(deserialize_with = "Option::deserialize")]
    pub best_params: Option<P>,
    pub test_content_letters: Matrix,
    pub test_style_letters: Matrix,
    pub test_style_labels: Matrix,
    pub test_images: Vec<SampleImage>,
    pub train_loss: Vec<f64>,
    pub valid_loss: Vec<f64>,
}

impl<P: Clone> Checkpoint<P> {
    pub fn capture(generator_params: P, state: &RunState<P>) -> Checkpoint<P> {
        let fixed = state.fixed_eval_batch();
        Checkpoint {
            format_version: CHECKPOINT_FORMAT_VERSION,
            generator_params,
            best_loss: state.best_loss(),
            best_params: state.best_parameters().cloned(),
            test_content_letters: fixed.content.clone(),
            test_style_letters: fixed.target.clone(),
            test_style_labels: fixed.labels.clone(),
            test_images: state.sample_image_history().to_vec(),
            train_loss: state.train_loss_history().to_vec(),
            valid_loss: state.valid_loss_history().to_vec(),
        }
    }
}

impl<P> Checkpoint<P> {
    /// Splits the record into live generator weights and the run state.
    ///
    /// Fails if the stored evaluation batch is internally inconsistent.
    pub fn into_parts(self) -> Result<(P, RunState<P>)> {
        let fixed = Batch {
            content: self.test_content_letters,
            target: self.test_style_letters,
            labels: self.test_style_labels,
        };
        fixed.validate()?;

        let state = RunState::from_parts(
            self.best_loss,
            self.best_params,
            fixed,
            self.train_loss,
            self.valid_loss,
            self.test_images,
        );
        Ok((self.generator_params, state))
    }
}
