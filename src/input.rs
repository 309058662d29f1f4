//! Snapshot files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use kubemap_graph::{Snapshot, SnapshotError};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read snapshot {0}: {1}")]
    ReadError(PathBuf, std::io::Error),

    #[error("Failed to parse snapshot {0}: {1}")]
    ParseError(PathBuf, SnapshotError),

    #[error("Failed to walk snapshot directory {0}: {1}")]
    WalkError(PathBuf, walkdir::Error),

    #[error("No snapshot files (*.json) found in {0}")]
    NoSnapshotFiles(PathBuf),
}

/// Load a snapshot file, or merge every `*.json` below a directory.
///
/// Directory entries are visited in file name order, one file per source.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, InputError> {
    if !path.is_dir() {
        return read_snapshot(path);
    }

    let mut parts = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| InputError::WalkError(path.to_path_buf(), e))?;
        let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
        if entry.file_type().is_file() && is_json {
            parts.push(read_snapshot(entry.path())?);
        }
    }

    if parts.is_empty() {
        return Err(InputError::NoSnapshotFiles(path.to_path_buf()));
    }

    debug!(files = parts.len(), "merging snapshot directory {}", path.display());
    Ok(Snapshot::merge(parts))
}

fn read_snapshot(path: &Path) -> Result<Snapshot, InputError> {
    let content = fs::read_to_string(path).map_err(|e| InputError::ReadError(path.to_path_buf(), e))?;
    Snapshot::from_json(&content).map_err(|e| InputError::ParseError(path.to_path_buf(), e))
}
