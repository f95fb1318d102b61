use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::merge::{apply_env_overrides, merge_layers};
use super::{Config, ConfigLayer};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub fn config_path() -> PathBuf {
    crate::paths::config_dir().join("config.toml")
}

/// Reads one config layer; a missing file is not an error.
pub fn load_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

pub fn load_user_config() -> Result<Option<ConfigLayer>, ConfigError> {
    load_layer(&config_path())
}

/// Defaults, then the user file, then `extra`, then the environment.
pub fn load(extra: Option<&Path>) -> Result<Config, ConfigError> {
    let user = load_user_config()?;
    let explicit = match extra {
        Some(path) => Some(load_layer(path)?.ok_or_else(|| ConfigError::Read {
            path: path.to_path_buf(),
            source: std::io::ErrorKind::NotFound.into(),
        })?),
        None => None,
    };
    let mut config = merge_layers(user, explicit);
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Like [`load`], and writes a default user config on first use. Runs
/// before tracing is up, so problems go to stderr.
pub fn load_or_init(extra: Option<&Path>) -> Result<Config, ConfigError> {
    let path = config_path();
    let had_user_config = path.exists();

    let config = load(extra)?;

    if !had_user_config && let Err(e) = write_config(&path, &Config::default()) {
        eprintln!("failed to write default config: {e}");
    }

    Ok(config)
}

/// Rejects ladder settings that would break rating or command parsing.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let ladder = &config.ladder;
    if ladder.k_factor < 1 {
        return Err(ConfigError::Invalid {
            field: "ladder.k_factor",
            reason: format!("must be at least 1, got {}", ladder.k_factor),
        });
    }
    if ladder.command_prefix.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "ladder.command_prefix",
            reason: "must not be empty".into(),
        });
    }
    if ladder.command_prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid {
            field: "ladder.command_prefix",
            reason: format!("must not contain whitespace, got {:?}", ladder.command_prefix),
        });
    }
    if ladder.top_count == 0 {
        return Err(ConfigError::Invalid {
            field: "ladder.top_count",
            reason: "must be at least 1".into(),
        });
    }
    Ok(())
}

pub fn write_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(cfg)?;
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(write_err)?;
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(contents.as_bytes()).map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
