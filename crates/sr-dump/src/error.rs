//! Error types for session dump operations.

use thiserror::Error;

/// Errors that can occur while writing or reading a session dump.
#[derive(Error, Debug)]
pub enum DumpError {
    /// Too many channels to pack into one sample word.
    #[error("unsupported channel count: {count} (at most {max} channels)")]
    UnsupportedChannelCount { count: usize, max: usize },

    /// Channel is wider than one bit.
    #[error("channel '{channel}' has unsupported bit width {width} (only 1-bit probes)")]
    UnsupportedBitWidth { channel: String, width: u32 },

    /// Two channels share a name.
    #[error("duplicate channel name: {0}")]
    DuplicateChannelName(String),

    /// Name cannot be written as a probe name.
    #[error("invalid channel name: {0:?} (expected word characters only)")]
    InvalidChannelName(String),

    /// Archive could not be opened or is missing required entries.
    #[error("archive format error: {0}")]
    ArchiveFormat(#[from] ArchiveFormatError),

    /// Config could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] sr_common::ConfigError),

    /// I/O error while staging or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error while packaging.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Decode-side archive failures, each naming its cause.
#[derive(Error, Debug)]
pub enum ArchiveFormatError {
    /// The archive file could not be opened.
    #[error("cannot open archive {}: {source}", path.display())]
    Open {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The container is not a readable ZIP archive.
    #[error("unreadable archive: {0}")]
    Unreadable(#[source] zip::result::ZipError),

    /// A required entry is absent.
    #[error("missing required entry '{0}'")]
    MissingEntry(String),

    /// A required entry exists but could not be read.
    #[error("failed to read entry '{entry}': {source}")]
    UnreadableEntry {
        entry: String,
        #[source]
        source: std::io::Error,
    },

    /// A text entry is not valid UTF-8.
    #[error("entry '{entry}' is not valid UTF-8 text")]
    InvalidText { entry: String },
}

/// Result type alias for dump operations.
pub type Result<T> = std::result::Result<T, DumpError>;
