//! Durable ladder snapshots.
//!
//! The whole state is one JSON document, replaced atomically on every
//! commit: write a sibling temp file, fsync, rename over the target, fsync
//! the directory.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::LadderState;
use crate::error::Transience;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("snapshot at {path:?} is not valid ladder json: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("snapshot at {path:?} is inconsistent: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

impl SnapshotError {
    pub fn transience(&self) -> Transience {
        match self {
            SnapshotError::Io { .. } => Transience::Retryable,
            SnapshotError::Json { .. } | SnapshotError::Invalid { .. } => Transience::Permanent,
        }
    }

    fn is_corrupt(&self) -> bool {
        matches!(
            self,
            SnapshotError::Json { .. } | SnapshotError::Invalid { .. }
        )
    }
}

/// Where committed state goes. The processor only needs `save`.
pub trait SnapshotSink: Send {
    fn save(&mut self, state: &LadderState) -> Result<(), SnapshotError>;
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    /// Reads the snapshot. A missing file is an empty ladder.
    pub fn load(&self) -> Result<LadderState, SnapshotError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(LadderState::new()),
            Err(source) => return Err(self.io_err(source)),
        };
        let state: LadderState =
            serde_json::from_slice(&bytes).map_err(|source| SnapshotError::Json {
                path: self.path.clone(),
                source,
            })?;
        state
            .check_invariants()
            .map_err(|reason| SnapshotError::Invalid {
                path: self.path.clone(),
                reason,
            })?;
        Ok(state)
    }

    /// Like [`load`](Self::load), but never refuses to start: a corrupt
    /// snapshot is moved to `<file>.corrupt` and the ladder starts empty.
    pub fn load_or_recover(&self) -> LadderState {
        match self.load() {
            Ok(state) => state,
            Err(err) if err.is_corrupt() => {
                let aside = self.corrupt_path();
                match fs::rename(&self.path, &aside) {
                    Ok(()) => tracing::warn!(
                        error = %err,
                        moved_to = %aside.display(),
                        "unreadable snapshot moved aside; starting empty"
                    ),
                    Err(rename_err) => tracing::error!(
                        error = %err,
                        rename_error = %rename_err,
                        "unreadable snapshot could not be moved aside; starting empty"
                    ),
                }
                LadderState::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "snapshot unreadable; starting empty");
                LadderState::new()
            }
        }
    }

    pub fn write(&self, state: &LadderState) -> Result<(), SnapshotError> {
        let mut bytes =
            serde_json::to_vec_pretty(state).map_err(|source| SnapshotError::Json {
                path: self.path.clone(),
                source,
            })?;
        bytes.push(b'\n');

        let dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(dir).map_err(|source| self.io_err(source))?;

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|source| self.io_err(source))?;
        temp.write_all(&bytes).map_err(|source| self.io_err(source))?;
        temp.as_file()
            .sync_all()
            .map_err(|source| self.io_err(source))?;
        temp.persist(&self.path)
            .map_err(|err| self.io_err(err.error))?;
        fsync_dir(dir).map_err(|source| self.io_err(source))?;
        Ok(())
    }

    fn io_err(&self, source: io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotSink for SnapshotStore {
    fn save(&mut self, state: &LadderState) -> Result<(), SnapshotError> {
        self.write(state)
    }
}

#[cfg(unix)]
fn fsync_dir(path: &Path) -> io::Result<()> {
    File::open(path)?.sync_all()
}

#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}
