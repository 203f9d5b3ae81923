//! TOML-based configuration.
//!
//! Supports a config file (sumaris.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [database]
//! dialect = "postgres"
//! url = "${SUMARIS_DB_URL}"
//! query_timeout_seconds = 30
//!
//! [extraction]
//! table_name_prefix = "EXT_"
//! product_table_prefix = "P_"
//! template_dir = "./templates"
//! adagio_optimization = false
//! adagio_schema = "SIH2_ADAGIO_DBA"
//!
//! [metadata]
//! cache_enabled = true
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sql::Dialect;

static TABLE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid prefix regex"));

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub extraction: ExtractionSettings,
    pub metadata: MetadataSettings,
    pub logging: LoggingSettings,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQL dialect (postgres, oracle, hsqldb, sqlite).
    pub dialect: String,

    /// Database location (supports ${ENV_VAR} expansion).
    pub url: Option<String>,

    /// Per-statement timeout; 0 disables it.
    pub query_timeout_seconds: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            dialect: "postgres".to_string(),
            url: None,
            query_timeout_seconds: 0,
        }
    }
}

impl DatabaseSettings {
    pub fn dialect(&self) -> Result<Dialect, SettingsError> {
        self.dialect
            .parse()
            .map_err(|_| SettingsError::UnsupportedDialect(self.dialect.clone()))
    }

    /// Statement timeout, if any.
    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_seconds > 0).then(|| Duration::from_secs(self.query_timeout_seconds))
    }

    /// Database url with environment variables expanded.
    pub fn resolved_url(&self) -> Result<Option<String>, SettingsError> {
        self.url.as_deref().map(expand_env_vars).transpose()
    }
}

/// Extraction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Prefix of the tables created by a run.
    pub table_name_prefix: String,

    /// Prefix of saved product tables.
    pub product_table_prefix: String,

    /// Directory overriding the builtin templates.
    pub template_dir: Option<String>,

    /// Read some referential tables from `adagio_schema`.
    pub adagio_optimization: bool,

    pub adagio_schema: Option<String>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            table_name_prefix: "EXT_".to_string(),
            product_table_prefix: "P_".to_string(),
            template_dir: None,
            adagio_optimization: false,
            adagio_schema: None,
        }
    }
}

impl ExtractionSettings {
    /// Template directory with environment variables expanded.
    pub fn template_dir(&self) -> Result<Option<PathBuf>, SettingsError> {
        Ok(self
            .template_dir
            .as_deref()
            .map(expand_env_vars)
            .transpose()?
            .map(PathBuf::from))
    }

    /// Schema of the adagio tables, when the optimization is on.
    pub fn adagio_schema(&self) -> Option<&str> {
        if !self.adagio_optimization {
            return None;
        }
        self.adagio_schema.as_deref().filter(|s| !s.is_empty())
    }
}

/// Metadata configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataSettings {
    /// Enable metadata caching.
    pub cache_enabled: bool,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Logging configuration, overridden by `RUST_LOG`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SUMARIS_CONFIG`
    /// 2. `./sumaris.toml`
    /// 3. `~/.config/sumaris/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SUMARIS_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("sumaris.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sumaris").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.database.dialect()?;

        for (key, prefix) in [
            ("extraction.table_name_prefix", &self.extraction.table_name_prefix),
            ("extraction.product_table_prefix", &self.extraction.product_table_prefix),
        ] {
            if !TABLE_PREFIX.is_match(prefix) {
                return Err(SettingsError::InvalidConfig(format!(
                    "{key} must match [A-Za-z][A-Za-z0-9_]*, got '{prefix}'"
                )));
            }
        }

        if self.extraction.table_name_prefix.eq_ignore_ascii_case(&self.extraction.product_table_prefix) {
            return Err(SettingsError::InvalidConfig(
                "extraction table and product prefixes must differ".to_string(),
            ));
        }

        if self.extraction.adagio_optimization && self.extraction.adagio_schema().is_none() {
            return Err(SettingsError::InvalidConfig(
                "extraction.adagio_schema is required when adagio_optimization is on".to_string(),
            ));
        }

        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                var_name.push(ch);
                chars.next();
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
