use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::checkpoint::record::{Checkpoint, CHECKPOINT_FORMAT_VERSION};
use crate::error::{Error, Result};

/// Writes `checkpoint` to `path`, replacing any previous file.
///
/// The record is written to a temporary sibling, synced, then renamed over
/// the target, so a crash mid-write leaves the previous checkpoint intact.
/// A record holding a NaN or infinite number is refused and the previous
/// file is left untouched.
pub fn save<P: Serialize>(path: &Path, checkpoint: &Checkpoint<P>) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // JSON has no NaN or infinity; serde_json writes them as null, which
    // would replace a loadable checkpoint with one that fails to parse.
    let value = serde_json::to_value(checkpoint)?;
    if let Some(field) = non_finite_field(&value) {
        return Err(Error::Checkpoint {
            path: path.to_path_buf(),
            reason: format!("refusing to write a non-finite value at `{field}`"),
        });
    }

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut writer, &value)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), "checkpoint written");
    Ok(())
}

/// Reads a checkpoint written by [`save`].
///
/// Truncated or corrupt files, missing or unknown fields and foreign format
/// versions are all reported as errors; nothing is recovered partially.
pub fn load<P: DeserializeOwned>(path: &Path) -> Result<Checkpoint<P>> {
    let file = File::open(path)?;
    let invalid = |reason: String| Error::Checkpoint { path: path.to_path_buf(), reason };

    let value: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| invalid(format!("not a readable checkpoint: {e}")))?;

    let found = value
        .get("format_version")
        .ok_or_else(|| invalid("missing field `format_version`".to_owned()))?
        .as_u64()
        .ok_or_else(|| invalid("`format_version` is not an unsigned integer".to_owned()))?;
    if found != u64::from(CHECKPOINT_FORMAT_VERSION) {
        return Err(Error::CheckpointVersion {
            found: u32::try_from(found).unwrap_or(u32::MAX),
            expected: CHECKPOINT_FORMAT_VERSION,
        });
    }

    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

/// Path of the first `null` standing in for a number, skipping the
/// top-level `best_params` slot, whose `null` means "no snapshot yet".
fn non_finite_field(record: &Value) -> Option<String> {
    fn walk(value: &Value, at: String) -> Option<String> {
        match value {
            Value::Null => Some(at),
            Value::Array(items) => items.iter().enumerate().find_map(|(i, v)| walk(v, format!("{at}[{i}]"))),
            Value::Object(fields) => fields.iter().find_map(|(k, v)| walk(v, format!("{at}.{k}"))),
            _ => None,
        }
    }

    let fields = record.as_object()?;
    fields
        .iter()
        .filter(|(key, value)| !(key.as_str() == "best_params" && value.is_null()))
        .find_map(|(key, value)| walk(value, key.clone()))
}
