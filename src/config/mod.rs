//! Configuration module.
//!
//! Handles the TOML settings file, environment variable expansion and
//! dialect selection.

mod settings;

pub use settings::{
    expand_env_vars, DatabaseSettings, ExtractionSettings, LogFormat, LoggingSettings,
    MetadataSettings, Settings, SettingsError,
};
