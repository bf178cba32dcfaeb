use crate::data::Batch;
use crate::render::SampleImage;

/// Initial best loss; larger than any loss a sane run produces.
pub const BEST_LOSS_SENTINEL: f64 = 1e5;

/// All mutable bookkeeping of a training run: everything a checkpoint needs
/// besides the live generator weights.
///
/// Histories are append-only and `best_loss` never increases. The fixed
/// evaluation batch is set once at construction (or restored from a
/// checkpoint) and never redrawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState<P> {
    best_loss: f64,
    best_parameters: Option<P>,
    fixed_eval_batch: Batch,
    train_loss_history: Vec<f64>,
    valid_loss_history: Vec<f64>,
    sample_image_history: Vec<SampleImage>,
}

impl<P> RunState<P> {
    pub fn new(fixed_eval_batch: Batch) -> RunState<P> {
        RunState {
            best_loss: BEST_LOSS_SENTINEL,
            best_parameters: None,
            fixed_eval_batch,
            train_loss_history: Vec::new(),
            valid_loss_history: Vec::new(),
            sample_image_history: Vec::new(),
        }
    }

    /// Reassembles a state read back from storage.
    pub(crate) fn from_parts(
        best_loss: f64,
        best_parameters: Option<P>,
        fixed_eval_batch: Batch,
        train_loss_history: Vec<f64>,
        valid_loss_history: Vec<f64>,
        sample_image_history: Vec<SampleImage>,
    ) -> RunState<P> {
        RunState {
            best_loss,
            best_parameters,
            fixed_eval_batch,
            train_loss_history,
            valid_loss_history,
            sample_image_history,
        }
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    pub fn best_parameters(&self) -> Option<&P> {
        self.best_parameters.as_ref()
    }

    pub fn fixed_eval_batch(&self) -> &Batch {
        &self.fixed_eval_batch
    }

    pub fn train_loss_history(&self) -> &[f64] {
        &self.train_loss_history
    }

    pub fn valid_loss_history(&self) -> &[f64] {
        &self.valid_loss_history
    }

    pub fn sample_image_history(&self) -> &[SampleImage] {
        &self.sample_image_history
    }

    /// Completed epochs, counted by rendered samples (one per epoch).
    pub fn epochs_completed(&self) -> usize {
        self.sample_image_history.len()
    }

    pub fn record_train_loss(&mut self, loss: f64) {
        self.train_loss_history.push(loss);
    }

    pub fn record_valid_loss(&mut self, loss: f64) {
        self.valid_loss_history.push(loss);
    }

    pub fn push_sample(&mut self, image: SampleImage) {
        self.sample_image_history.push(image);
    }

    /// Best-model policy. Promotes when `mean <= best_loss`, so a tie hands
    /// the slot to the most recent epoch. A NaN mean never promotes.
    ///
    /// `snapshot` is only invoked on promotion.
    pub fn observe_validation<F>(&mut self, mean: f64, snapshot: F) -> bool
    where
        F: FnOnce() -> P,
    {
        if mean <= self.best_loss {
            self.best_loss = mean;
            self.best_parameters = Some(snapshot());
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;

    fn state() -> RunState<u32> {
        RunState::new(Batch {
            content: Matrix::zeros(1, 1),
            target: Matrix::zeros(1, 1),
            labels: Matrix::zeros(1, 1),
        })
    }

    #[test]
    fn starts_at_sentinel_without_snapshot() {
        let s = state();
        assert_eq!(s.best_loss(), BEST_LOSS_SENTINEL);
        assert!(s.best_parameters().is_none());
        assert_eq!(s.epochs_completed(), 0);
    }

    #[test]
    fn best_loss_tracks_running_minimum() {
        let mut s = state();
        let mut seen = Vec::new();
        for (epoch, mean) in [0.9, 0.7, 0.8].into_iter().enumerate() {
            s.observe_validation(mean, || epoch as u32 + 1);
            seen.push(s.best_loss());
        }
        assert_eq!(seen, vec![0.9, 0.7, 0.7]);
        assert_eq!(s.best_parameters(), Some(&2));
    }

    #[test]
    fn ties_promote_the_most_recent_snapshot() {
        let mut s = state();
        assert!(s.observe_validation(0.5, || 1));
        assert!(s.observe_validation(0.5, || 2));
        assert_eq!(s.best_parameters(), Some(&2));
    }

    #[test]
    fn snapshot_is_skipped_when_not_improving() {
        let mut s = state();
        s.observe_validation(0.3, || 1);
        let promoted = s.observe_validation(0.4, || panic!("must not snapshot"));
        assert!(!promoted);
    }

    #[test]
    fn nan_never_promotes() {
        let mut s = state();
        assert!(!s.observe_validation(f64::NAN, || 1));
        assert_eq!(s.best_loss(), BEST_LOSS_SENTINEL);
        assert!(s.best_parameters().is_none());
    }
}
