//! Codec configuration and path discovery.
//!
//! Resolution order: explicit path → `SR_DUMP_CONFIG` → user config dir → defaults.

use crate::error::{ConfigError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Sample rate assumed when neither the caller nor the metadata supplies one.
pub const DEFAULT_SAMPLE_RATE_HZ: u64 = 100_000_000;

/// Environment variable pointing at a config file.
const ENV_CONFIG_PATH: &str = "SR_DUMP_CONFIG";

/// Application name for the user config directory.
const APP_NAME: &str = "sr-dump";

/// Standard config file name.
const CONFIG_FILENAME: &str = "config.json";

/// Driver names are written verbatim into the metadata, so they are kept
/// to characters that cannot form a `key = value` pair.
static RE_DRIVER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.-]+$").unwrap());

/// Compression applied to archive entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    /// Entries stored as-is.
    Stored,
    /// Entries compressed with DEFLATE.
    #[default]
    Deflated,
}

/// Settings for writing and reading session dumps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Rate used when the metadata has no `samplerate` line.
    pub default_sample_rate_hz: u64,

    /// Device descriptor written as `driver = ...`.
    pub driver: String,

    /// Compression for archive entries.
    pub compression: ArchiveCompression,

    /// Parent directory for staging. `None` stages next to the archive.
    pub staging_dir: Option<PathBuf>,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            default_sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            driver: APP_NAME.to_string(),
            compression: ArchiveCompression::default(),
            staging_dir: None,
        }
    }
}

impl DumpConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DumpConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Check that every value is usable by the codec.
    pub fn validate(&self) -> Result<()> {
        if self.default_sample_rate_hz == 0 {
            return Err(ConfigError::Invalid(
                "default_sample_rate_hz must be positive".to_string(),
            ));
        }
        if !RE_DRIVER.is_match(&self.driver) {
            return Err(ConfigError::Invalid(format!(
                "driver {:?} must be non-empty and use only word characters, '.' or '-'",
                self.driver
            )));
        }
        Ok(())
    }

    /// Set the fallback sample rate.
    pub fn with_default_sample_rate(mut self, rate_hz: u64) -> Self {
        self.default_sample_rate_hz = rate_hz;
        self
    }

    /// Set the driver descriptor.
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    /// Set the entry compression.
    pub fn with_compression(mut self, compression: ArchiveCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Stage archives under `dir` instead of next to the archive.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }
}

/// Where the config was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided path.
    Explicit,

    /// Set via `SR_DUMP_CONFIG`.
    Environment,

    /// Found in the user config directory.
    UserConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit => write!(f, "explicit path"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::UserConfig => write!(f, "user config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Resolve the config file path using the standard resolution order.
///
/// 1. Explicit path (if it exists)
/// 2. `SR_DUMP_CONFIG` environment variable (if it points at a file)
/// 3. `<config dir>/sr-dump/config.json`
/// 4. None (built-in defaults)
pub fn resolve_config_path(explicit: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    resolve_from(
        explicit,
        std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from),
        dirs::config_dir(),
    )
}

fn resolve_from(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = explicit {
        if path.exists() {
            return (Some(path.to_path_buf()), ConfigSource::Explicit);
        }
    }

    if let Some(path) = env_path {
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Some(dir) = config_dir {
        let path = dir.join(APP_NAME).join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::UserConfig);
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Load the resolved config, falling back to defaults when none is found.
pub fn load_config(explicit: Option<&Path>) -> Result<(DumpConfig, ConfigSource)> {
    match resolve_config_path(explicit) {
        (Some(path), source) => Ok((DumpConfig::load(&path)?, source)),
        (None, source) => Ok((DumpConfig::default(), source)),
    }
}
