use std::path::{Path, PathBuf};

use serde_json::Value;

/// Buffers tagged JSON records and turns them into live objects on demand
pub trait Manager {
    fn add_json_object(&mut self, object: Value);

    fn json_objects(&self) -> &[Value];

    /// Builds objects from every buffered record, replacing those of any
    /// earlier call. Records that fail to convert are logged and skipped.
    fn create_objects(&mut self);
}

/// Joins relative `path` onto `base_dir`; absolute paths pass through
pub(crate) fn resolve_path(base_dir: Option<&Path>, path: &Path) -> PathBuf {
    match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

/// Deserializes one record, logging and returning `None` when it doesn't fit
pub(crate) fn parse_record<T: serde::de::DeserializeOwned>(kind: &str, value: Value) -> Option<T> {
    match serde_json::from_value::<T>(value) {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!("Skipping {} record: {}", kind, e);
            None
        }
    }
}
