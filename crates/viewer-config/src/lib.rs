//! Viewer configuration
//!
//! Settings are resolved in three layers: built-in defaults, an optional JSON
//! file, then `FOLIO_*` environment variables.

use directories::ProjectDirs;
use doc_model::{ViewMode, DEFAULT_ZOOM_INDEX};
use log::LevelFilter;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use viewer_core::{SessionLimits, DEFAULT_CACHE_CAPACITY, DEFAULT_RANGE_RETENTION};

const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const ENV_CACHE_CAPACITY: &str = "FOLIO_CACHE_CAPACITY";
pub const ENV_RANGE_RETENTION: &str = "FOLIO_RANGE_RETENTION";
pub const ENV_VIEW_MODE: &str = "FOLIO_VIEW_MODE";
pub const ENV_ZOOM_INDEX: &str = "FOLIO_ZOOM_INDEX";
pub const ENV_LOG_LEVEL: &str = "FOLIO_LOG_LEVEL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to resolve configuration directory")]
    NoConfigDirectory,
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("unsupported configuration version {0}")]
    UnsupportedVersion(u32),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ConfigError {
    fn invalid(key: &str, value: &str) -> Self {
        Self::InvalidValue { key: key.to_owned(), value: value.to_owned() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Bitmaps kept per open document.
    pub cache_capacity: usize,
    /// Requested page ranges remembered per open document.
    pub range_retention: usize,
    #[serde(deserialize_with = "lenient_view_mode")]
    pub default_view_mode: ViewMode,
    pub default_zoom_index: usize,
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            range_retention: DEFAULT_RANGE_RETENTION,
            default_view_mode: ViewMode::Single,
            default_zoom_index: DEFAULT_ZOOM_INDEX,
            log_level: "warn".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigEnvelope {
    version: u32,
    config: ViewerConfig,
}

fn lenient_view_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ViewMode, D::Error> {
    let name = String::deserialize(deserializer)?;
    Ok(ViewMode::from_name(&name))
}

impl ViewerConfig {
    /// `<platform config dir>/config.json`, e.g. `~/.config/folio/config.json`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("dev", "Folio", "folio")
            .ok_or(ConfigError::NoConfigDirectory)?;
        Ok(dirs.config_dir().join("config.json"))
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and skipped otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Ok(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)?;
        let envelope: ConfigEnvelope = serde_json::from_slice(&bytes)?;

        if envelope.version != CONFIG_SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedVersion(envelope.version));
        }

        log::debug!("loaded configuration from {}", path.display());
        Ok(envelope.config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let envelope = ConfigEnvelope { version: CONFIG_SCHEMA_VERSION, config: self.clone() };
        fs::write(path, serde_json::to_vec_pretty(&envelope)?)?;
        Ok(())
    }

    /// Override fields from `FOLIO_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = env_value(ENV_CACHE_CAPACITY) {
            self.cache_capacity = parse_count(ENV_CACHE_CAPACITY, &value)?;
        }

        if let Some(value) = env_value(ENV_RANGE_RETENTION) {
            self.range_retention = parse_count(ENV_RANGE_RETENTION, &value)?;
        }

        if let Some(value) = env_value(ENV_VIEW_MODE) {
            self.default_view_mode = ViewMode::from_name(&value);
        }

        if let Some(value) = env_value(ENV_ZOOM_INDEX) {
            self.default_zoom_index = parse_count(ENV_ZOOM_INDEX, &value)?;
        }

        if let Some(value) = env_value(ENV_LOG_LEVEL) {
            self.log_level = value;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level_filter().map(|_| ())
    }

    pub fn log_level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level.parse().map_err(|_| ConfigError::invalid("log_level", &self.log_level))
    }

    /// Session limits, with zero capacities raised to one.
    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            cache_capacity: self.cache_capacity.max(1),
            range_retention: self.range_retention.max(1),
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_range_retention(mut self, retention: usize) -> Self {
        self.range_retention = retention;
        self
    }

    pub fn with_view_mode(mut self, mode: ViewMode) -> Self {
        self.default_view_mode = mode;
        self
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_count(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::invalid(key, value))
}
