//! JSON snapshots of a session.
//!
//! Nothing is written implicitly: a session only survives a restart when it
//! was exported and the server is started again with `--restore`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::tracker::SessionState;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Load a session from a snapshot file.
pub fn load(path: &Path) -> Result<SessionState, SnapshotError> {
    let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a session to a snapshot file, creating parent directories.
pub fn save(state: &SessionState, path: &Path) -> Result<(), SnapshotError> {
    let json = serde_json::to_string_pretty(state)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SnapshotError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, json).map_err(|source| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    })
}
