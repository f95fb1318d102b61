//! XDG directory helpers for config/data locations.

use std::path::PathBuf;

const APP_DIR: &str = "elobot";

/// Base directory for persistent data (snapshot, lock, logs).
///
/// Uses `ELOBOT_DATA_DIR` if set, otherwise `$XDG_DATA_HOME/elobot` or
/// `~/.local/share/elobot`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = env_dir("ELOBOT_DATA_DIR") {
        return dir;
    }

    env_dir("XDG_DATA_HOME")
        .unwrap_or_else(|| home().join(".local").join("share"))
        .join(APP_DIR)
}

/// Base directory for configuration files.
///
/// Uses `ELOBOT_CONFIG_DIR` if set, otherwise `$XDG_CONFIG_HOME/elobot` or
/// `~/.config/elobot`.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = env_dir("ELOBOT_CONFIG_DIR") {
        return dir;
    }

    env_dir("XDG_CONFIG_HOME")
        .unwrap_or_else(|| home().join(".config"))
        .join(APP_DIR)
}

/// Default ladder snapshot path.
pub fn state_path() -> PathBuf {
    data_dir().join("ladder.json")
}

/// Default directory for rolling log files.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

fn env_dir(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"))
}
