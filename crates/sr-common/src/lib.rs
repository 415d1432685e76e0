//! Shared types for sigrok session dumps.
//!
//! This crate holds the in-memory capture model handed between capture
//! producers and the `.sr` codec, plus the configuration used by the codec:
//! - `capture`: named 1-bit channels and the capture that groups them
//! - `config`: codec defaults, JSON loading and path resolution

pub mod capture;
pub mod config;
pub mod error;

pub use capture::{Capture, Channel, MAX_CHANNELS, PROBE_BIT_WIDTH};
pub use config::{
    load_config, resolve_config_path, ArchiveCompression, ConfigSource, DumpConfig,
    DEFAULT_SAMPLE_RATE_HZ,
};
pub use error::{ConfigError, Result};
