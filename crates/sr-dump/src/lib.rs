//! Sigrok session dump writer/reader.
//!
//! Converts an in-memory logic [`Capture`] into a `.sr` session archive and
//! back. Up to seven 1-bit channels are supported.
//!
//! # Archive Format
//!
//! Archives are ZIP files containing three entries, stored by bare name:
//! - `version`: the marker `1`
//! - `metadata`: INI-like text with probe names and the sample rate
//! - `dump`: one big-endian sample word per timestep, first channel in bit 0
//!
//! # Sample Rate
//!
//! The metadata stores `rate_hz / 1000 * 2` labelled `KHz`, while reading
//! interprets `N kHz` as `N * 1000` Hz. A round trip therefore doubles the
//! rate and drops sub-kHz precision.
//!
//! # Example
//!
//! ```no_run
//! use sr_dump::{Capture, Channel, DumpConverter};
//! use std::path::Path;
//!
//! let mut capture = Capture::new(1_000_000);
//! capture.add(Channel::new("clk", vec![0, 1, 0, 1]));
//! capture.add(Channel::new("data", vec![1, 1, 0, 0]));
//!
//! let converter = DumpConverter::default();
//! converter.write(&capture, Path::new("capture.sr")).unwrap();
//!
//! let read = converter.read(Path::new("capture.sr")).unwrap();
//! assert_eq!(read.names(), vec!["clk", "data"]);
//! ```

pub mod archive;
pub mod converter;
pub mod error;
pub mod metadata;
pub mod sample;

pub use archive::{ArchiveCodec, ArchiveContents, DUMP_ENTRY, METADATA_ENTRY, VERSION_ENTRY};
pub use converter::{DumpConverter, ARCHIVE_EXTENSION, ARCHIVE_VERSION};
pub use error::{ArchiveFormatError, DumpError, Result};
pub use metadata::{Metadata, ProbeMap};
pub use sr_common::{ArchiveCompression, Capture, Channel, DumpConfig, MAX_CHANNELS};
