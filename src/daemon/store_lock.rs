//! Exclusive ownership of a ladder snapshot file.
//!
//! A `<snapshot>.lock` file created with `create_new` marks the snapshot as
//! owned by one process; it holds JSON metadata about the owner. A lock
//! left behind by a process that no longer exists is taken over.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLockMeta {
    pub pid: u32,
    pub started_at_ms: u64,
    pub version: String,
}

impl StoreLockMeta {
    pub fn new(started_at_ms: u64) -> Self {
        Self {
            pid: std::process::id(),
            started_at_ms,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    meta: StoreLockMeta,
    released: bool,
}

pub fn lock_path(snapshot: &Path) -> PathBuf {
    let mut name = snapshot.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

impl StoreLock {
    pub fn acquire(snapshot: &Path, started_at_ms: u64) -> Result<Self, StoreLockError> {
        if let Some(dir) = snapshot.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let path = lock_path(snapshot);
        reject_symlink(&path)?;

        let meta = StoreLockMeta::new(started_at_ms);
        let mut file = match open_new_lock_file(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                let holder = read_metadata(&path).ok();
                match holder {
                    Some(stale) if !process_alive(stale.pid) => {
                        warn!(
                            path = %path.display(),
                            pid = stale.pid,
                            started_at_ms = stale.started_at_ms,
                            "taking over stale ladder lock"
                        );
                        fs::remove_file(&path)?;
                        open_new_lock_file(&path).map_err(|err| held_or_io(err, &path))?
                    }
                    holder => {
                        return Err(StoreLockError::Held {
                            path: Box::new(path),
                            holder: holder.map(Box::new),
                        });
                    }
                }
            }
            Err(err) => return Err(err.into()),
        };

        serde_json::to_writer(&mut file, &meta).map_err(|source| {
            StoreLockError::MetadataCorrupt {
                path: path.clone(),
                source,
            }
        })?;
        file.sync_all()?;

        Ok(Self {
            path,
            meta,
            released: false,
        })
    }

    pub fn meta(&self) -> &StoreLockMeta {
        &self.meta
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(mut self) -> Result<(), StoreLockError> {
        if !self.released {
            fs::remove_file(&self.path)?;
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreLockError {
    #[error("ladder state at {path:?} is locked by another process{}", holder_suffix(.holder))]
    Held {
        path: Box<PathBuf>,
        holder: Option<Box<StoreLockMeta>>,
    },
    #[error("lock path is a symlink: {path:?}")]
    Symlink { path: PathBuf },
    #[error("lock metadata corrupted at {path:?}: {source}")]
    MetadataCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

fn holder_suffix(holder: &Option<Box<StoreLockMeta>>) -> String {
    match holder {
        Some(meta) => format!(" (pid {})", meta.pid),
        None => String::new(),
    }
}

fn reject_symlink(path: &Path) -> Result<(), StoreLockError> {
    if let Ok(meta) = fs::symlink_metadata(path)
        && meta.file_type().is_symlink()
    {
        return Err(StoreLockError::Symlink {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Another process won the race to replace a stale lock.
fn held_or_io(err: io::Error, path: &Path) -> StoreLockError {
    if err.kind() == io::ErrorKind::AlreadyExists {
        StoreLockError::Held {
            path: Box::new(path.to_path_buf()),
            holder: read_metadata(path).ok().map(Box::new),
        }
    } else {
        err.into()
    }
}

/// Whether `pid` names a live process. Without procfs there is no way to
/// tell, so the holder is assumed alive.
fn process_alive(pid: u32) -> bool {
    if pid == std::process::id() {
        return true;
    }
    let procfs = Path::new("/proc");
    if !procfs.join("self").exists() {
        return true;
    }
    procfs.join(pid.to_string()).exists()
}

fn read_metadata(path: &Path) -> Result<StoreLockMeta, StoreLockError> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|source| StoreLockError::MetadataCorrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn open_new_lock_file(path: &Path) -> io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_reports_holder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshot = dir.path().join("ladder.json");

        let lock = StoreLock::acquire(&snapshot, 42).expect("first acquire");
        assert_eq!(lock.path(), dir.path().join("ladder.json.lock"));
        assert_eq!(lock.meta().pid, std::process::id());

        match StoreLock::acquire(&snapshot, 43) {
            Err(StoreLockError::Held { holder, .. }) => {
                let holder = holder.expect("holder metadata");
                assert_eq!(holder.started_at_ms, 42);
            }
            other => panic!("expected Held, got {other:?}"),
        }

        lock.release().expect("release");
        let again = StoreLock::acquire(&snapshot, 44).expect("reacquire");
        drop(again);
        assert!(!dir.path().join("ladder.json.lock").exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn lock_from_dead_process_is_taken_over() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshot = dir.path().join("ladder.json");
        let path = lock_path(&snapshot);
        // Above the kernel's pid_max ceiling, so never a live process.
        let dead = StoreLockMeta {
            pid: 4_194_305,
            started_at_ms: 7,
            version: "0.0.0".into(),
        };
        fs::write(&path, serde_json::to_vec(&dead).expect("encode")).expect("write lock");

        let lock = StoreLock::acquire(&snapshot, 8).expect("take over stale lock");
        assert_eq!(lock.meta().pid, std::process::id());
        let on_disk = read_metadata(&path).expect("metadata");
        assert_eq!(on_disk.started_at_ms, 8);
        lock.release().expect("release");
    }

    #[test]
    fn unreadable_lock_metadata_still_blocks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshot = dir.path().join("ladder.json");
        fs::write(lock_path(&snapshot), "garbage").expect("write lock");

        match StoreLock::acquire(&snapshot, 1) {
            Err(StoreLockError::Held { holder, .. }) => assert!(holder.is_none()),
            other => panic!("expected Held, got {other:?}"),
        }
    }
}
