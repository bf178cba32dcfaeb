use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::warn;

use crate::render::SampleImage;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink encoding error: {0}")]
    Encode(String),
}

/// Best-effort destination for training metrics (an experiment tracker).
///
/// Nothing the trainer computes depends on a sink call succeeding; every
/// call goes through [`emit`].
pub trait MetricSink {
    fn log_scalar(&mut self, name: &str, value: f64) -> Result<(), SinkError>;

    fn log_image(&mut self, name: &str, image: &SampleImage) -> Result<(), SinkError>;

    /// Sets a run-level summary value, overwriting any previous value.
    fn update_summary(&mut self, key: &str, value: f64) -> Result<(), SinkError>;
}

/// Sink that discards everything. The default when no tracker is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MetricSink for NoopSink {
    fn log_scalar(&mut self, _name: &str, _value: f64) -> Result<(), SinkError> {
        Ok(())
    }

    fn log_image(&mut self, _name: &str, _image: &SampleImage) -> Result<(), SinkError> {
        Ok(())
    }

    fn update_summary(&mut self, _key: &str, _value: f64) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Runs one sink call in isolation. Errors and panics are logged and
/// swallowed.
pub fn emit<F>(sink: &mut dyn MetricSink, event: &str, call: F)
where
    F: FnOnce(&mut dyn MetricSink) -> Result<(), SinkError>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| call(sink))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(event, error = %e, "metric sink call failed, continuing"),
        Err(_) => warn!(event, "metric sink panicked, continuing"),
    }
}
