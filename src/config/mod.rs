//! Config loading and persistence.

mod load;
mod merge;
mod schema;

pub use load::{
    ConfigError, config_path, load, load_layer, load_or_init, load_user_config, validate,
    write_config,
};
pub use merge::{apply_env_overrides, apply_overrides_from, merge_layers};
pub use schema::{
    Config, ConfigLayer, FileLoggingConfig, FileLoggingConfigOverride, IrcConfig,
    IrcConfigOverride, LadderConfig, LadderConfigOverride, LogFormat, LogRotation, LoggingConfig,
    LoggingConfigOverride, StorageConfig,
};
