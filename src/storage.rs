//! JSON-file persistence helpers shared by the event and user stores
//!
//! Each record lives in its own pretty-printed `<id>.json` file. Writes go to
//! a temporary sibling first and are renamed into place.

use crate::error::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// Load all JSON files from a directory into a Vec
///
/// Unreadable or unparsable files are skipped with a warning.
pub fn load_json_files<T: DeserializeOwned>(dir: &Path) -> Vec<T> {
    let mut items = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read directory {}: {}", dir.display(), e);
            }
            return items;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
            }
        }
    }

    items
}

fn record_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.json", id))
}

/// Write a record to `<dir>/<id>.json`
pub async fn write_json_file<T: Serialize>(dir: &Path, id: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let path = record_path(dir, id);
    let tmp = dir.join(format!(".{}.json.tmp", id));

    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| Error::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
    tokio::fs::rename(&tmp, &path)
        .await
        .map_err(|e| Error::Storage(format!("Failed to persist {}: {}", path.display(), e)))?;
    Ok(())
}

/// Remove `<dir>/<id>.json`; a missing file is not an error
pub async fn remove_json_file(dir: &Path, id: &str) -> Result<()> {
    let path = record_path(dir, id);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Storage(format!(
            "Failed to remove {}: {}",
            path.display(),
            e
        ))),
    }
}
