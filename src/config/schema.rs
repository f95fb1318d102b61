use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::{INITIAL_RATING, K_FACTOR, RatingPolicy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ladder: LadderConfig,
    pub irc: IrcConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Snapshot path, falling back to the data dir.
    pub fn state_file(&self) -> PathBuf {
        self.storage
            .state_file
            .clone()
            .unwrap_or_else(crate::paths::state_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderConfig {
    pub initial_rating: i64,
    pub k_factor: i64,
    pub command_prefix: String,
    pub top_count: usize,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            initial_rating: INITIAL_RATING,
            k_factor: K_FACTOR,
            command_prefix: ".".to_string(),
            top_count: 10,
        }
    }
}

impl LadderConfig {
    pub fn rating_policy(&self) -> RatingPolicy {
        RatingPolicy {
            initial_rating: self.initial_rating,
            k_factor: self.k_factor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrcConfig {
    pub server: String,
    pub port: u16,
    pub nickname: String,
    pub channel: String,
    pub reconnect_delay_ms: u64,
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            server: "irc.libera.chat".to_string(),
            port: 6667,
            nickname: "elobot".to_string(),
            channel: "#openra".to_string(),
            reconnect_delay_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub state_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Tree,
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    Daily,
    Hourly,
    Minutely,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stdout: bool,
    pub stdout_format: LogFormat,
    pub filter: Option<String>,
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            stdout_format: LogFormat::Compact,
            filter: None,
            file: FileLoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub rotation: LogRotation,
    pub retention_max_age_days: Option<u64>,
    pub retention_max_files: Option<usize>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            format: LogFormat::Json,
            rotation: LogRotation::Daily,
            retention_max_age_days: Some(14),
            retention_max_files: Some(14),
        }
    }
}

/// A partial config file. Absent keys leave the base untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigLayer {
    pub ladder: LadderConfigOverride,
    pub irc: IrcConfigOverride,
    pub storage: StorageConfig,
    pub logging: LoggingConfigOverride,
}

impl ConfigLayer {
    pub fn apply_to(&self, base: &mut Config) {
        self.ladder.apply_to(&mut base.ladder);
        self.irc.apply_to(&mut base.irc);
        if let Some(path) = self.storage.state_file.as_ref() {
            base.storage.state_file = Some(path.clone());
        }
        self.logging.apply_to(&mut base.logging);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LadderConfigOverride {
    pub initial_rating: Option<i64>,
    pub k_factor: Option<i64>,
    pub command_prefix: Option<String>,
    pub top_count: Option<usize>,
}

impl LadderConfigOverride {
    pub fn apply_to(&self, target: &mut LadderConfig) {
        if let Some(rating) = self.initial_rating {
            target.initial_rating = rating;
        }
        if let Some(k) = self.k_factor {
            target.k_factor = k;
        }
        if let Some(prefix) = self.command_prefix.as_ref() {
            target.command_prefix = prefix.clone();
        }
        if let Some(count) = self.top_count {
            target.top_count = count;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IrcConfigOverride {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub nickname: Option<String>,
    pub channel: Option<String>,
    pub reconnect_delay_ms: Option<u64>,
}

impl IrcConfigOverride {
    pub fn apply_to(&self, target: &mut IrcConfig) {
        if let Some(server) = self.server.as_ref() {
            target.server = server.clone();
        }
        if let Some(port) = self.port {
            target.port = port;
        }
        if let Some(nickname) = self.nickname.as_ref() {
            target.nickname = nickname.clone();
        }
        if let Some(channel) = self.channel.as_ref() {
            target.channel = channel.clone();
        }
        if let Some(delay) = self.reconnect_delay_ms {
            target.reconnect_delay_ms = delay;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfigOverride {
    pub stdout: Option<bool>,
    pub stdout_format: Option<LogFormat>,
    pub filter: Option<String>,
    pub file: Option<FileLoggingConfigOverride>,
}

impl LoggingConfigOverride {
    pub fn apply_to(&self, target: &mut LoggingConfig) {
        if let Some(stdout) = self.stdout {
            target.stdout = stdout;
        }
        if let Some(format) = self.stdout_format {
            target.stdout_format = format;
        }
        if let Some(filter) = self.filter.as_ref() {
            target.filter = Some(filter.clone());
        }
        if let Some(file) = self.file.as_ref() {
            file.apply_to(&mut target.file);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoggingConfigOverride {
    pub enabled: Option<bool>,
    pub dir: Option<PathBuf>,
    pub format: Option<LogFormat>,
    pub rotation: Option<LogRotation>,
    pub retention_max_age_days: Option<u64>,
    pub retention_max_files: Option<usize>,
}

impl FileLoggingConfigOverride {
    pub fn apply_to(&self, target: &mut FileLoggingConfig) {
        if let Some(enabled) = self.enabled {
            target.enabled = enabled;
        }
        if let Some(dir) = self.dir.as_ref() {
            target.dir = Some(dir.clone());
        }
        if let Some(format) = self.format {
            target.format = format;
        }
        if let Some(rotation) = self.rotation {
            target.rotation = rotation;
        }
        if let Some(days) = self.retention_max_age_days {
            target.retention_max_age_days = Some(days);
        }
        if let Some(files) = self.retention_max_files {
            target.retention_max_files = Some(files);
        }
    }
}
