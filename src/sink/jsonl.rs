use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::render::SampleImage;
use crate::sink::sink::{MetricSink, SinkError};

/// File-backed experiment tracker.
///
/// Layout inside `dir`:
/// - `metrics.jsonl`: one JSON object per event, with a running `step`
/// - `<name>_<step>.png`: one file per logged image
/// - `summary.json`: latest summary values
///
/// The directory always describes a single run. A resumed run rebuilds it
/// through `Trainer::replay_history`.
pub struct JsonlSink {
    dir: PathBuf,
    writer: BufWriter<File>,
    step: u64,
    summary: Map<String, Value>,
}

impl JsonlSink {
    /// Opens (or creates) the tracker directory and starts an empty log.
    ///
    /// Events, images and the summary left by an earlier session are
    /// removed, so the step counter restarts from a clean slate.
    pub fn create(dir: impl AsRef<Path>) -> Result<JsonlSink> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let stale = path.file_name().and_then(|n| n.to_str()).is_some_and(|name| {
                name == "summary.json" || is_logged_image(name)
            });
            if stale {
                fs::remove_file(&path)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(dir.join("metrics.jsonl"))?;
        Ok(JsonlSink {
            dir,
            writer: BufWriter::new(file),
            step: 0,
            summary: Map::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_event(&mut self, event: Value) -> std::result::Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, &event)
            .map_err(|e| SinkError::Encode(e.to_string()))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Matches the `<name>_<step>.png` files written by `log_image`.
fn is_logged_image(file_name: &str) -> bool {
    file_name
        .strip_suffix(".png")
        .and_then(|stem| stem.rsplit_once('_'))
        .is_some_and(|(_, step)| step.len() >= 6 && step.bytes().all(|b| b.is_ascii_digit()))
}

impl MetricSink for JsonlSink {
    fn log_scalar(&mut self, name: &str, value: f64) -> std::result::Result<(), SinkError> {
        self.step += 1;
        let event = json!({ "step": self.step, "kind": "scalar", "name": name, "value": value });
        self.write_event(event)
    }

    fn log_image(&mut self, name: &str, image: &SampleImage) -> std::result::Result<(), SinkError> {
        self.step += 1;
        let file_name = format!("{name}_{:06}.png", self.step);
        image
            .save_png(self.dir.join(&file_name))
            .map_err(|e| SinkError::Encode(e.to_string()))?;
        let event = json!({ "step": self.step, "kind": "image", "name": name, "file": file_name });
        self.write_event(event)
    }

    fn update_summary(&mut self, key: &str, value: f64) -> std::result::Result<(), SinkError> {
        self.summary.insert(key.to_owned(), json!(value));
        let body = serde_json::to_vec_pretty(&self.summary)
            .map_err(|e| SinkError::Encode(e.to_string()))?;
        fs::write(self.dir.join("summary.json"), body)?;
        Ok(())
    }
}
