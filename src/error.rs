use thiserror::Error;

use crate::config::ConfigError;
use crate::daemon::{SnapshotError, StoreLockError};
use crate::irc::IrcError;

/// Whether retrying this operation may succeed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// Retry will never help without changing inputs/state.
    Permanent,
    /// Retry may help (transient contention/outage).
    Retryable,
    /// Unknown if retry will help.
    Unknown,
}

/// Crate-level convenience error.
///
/// A thin wrapper over the per-capability errors. Ladder refusals never
/// show up here; they become chat replies.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    StoreLock(#[from] StoreLockError),

    #[error(transparent)]
    Irc(#[from] IrcError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
