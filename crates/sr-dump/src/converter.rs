//! Capture ⇄ `.sr` archive conversion.
//!
//! Writing validates the capture, renders the metadata, packs the samples
//! and hands the three entries to [`ArchiveCodec`]. Reading reverses this:
//! the metadata gives probe names, indices and the sample rate, and each
//! probe's samples are pulled out of the packed stream by index.

use crate::archive::{ArchiveCodec, ArchiveContents};
use crate::{metadata, sample, DumpError, Result};
use sr_common::{load_config, Capture, Channel, DumpConfig};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Version marker stored in the `version` entry.
pub const ARCHIVE_VERSION: &str = "1";

/// Conventional archive extension.
pub const ARCHIVE_EXTENSION: &str = "sr";

/// Writes captures to session archives and reads them back.
#[derive(Debug, Clone, Default)]
pub struct DumpConverter {
    config: DumpConfig,
    codec: ArchiveCodec,
}

impl DumpConverter {
    /// Create a converter with an explicit config.
    pub fn new(config: DumpConfig) -> Self {
        let codec = ArchiveCodec::new(config.compression);
        Self { config, codec }
    }

    /// Create a converter from the resolved config file, if any.
    pub fn from_resolved_config(explicit: Option<&Path>) -> Result<Self> {
        let (config, source) = load_config(explicit)?;
        config.validate()?;
        info!(source = %source, "Loaded dump config");
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Scratch directory used while writing or reading `archive`.
    ///
    /// This is the archive path with its extension stripped, placed under
    /// the configured staging directory if one is set. An archive without
    /// an extension stages in `<name>.staging` so the archive itself is
    /// never the staging target.
    pub fn staging_path(&self, archive: &Path) -> PathBuf {
        let mut stem = archive.with_extension("");
        if stem == archive {
            stem = archive.with_extension("staging");
        }

        match (&self.config.staging_dir, stem.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => stem,
        }
    }

    /// Check everything that would stop a capture from round-tripping.
    ///
    /// Runs before any file is touched.
    pub fn validate(&self, capture: &Capture) -> Result<()> {
        sample::check_packable(&capture.channels)?;
        self.config.validate()?;

        let mut seen = HashSet::new();
        for channel in &capture.channels {
            if !metadata::is_probe_name(&channel.name) {
                return Err(DumpError::InvalidChannelName(channel.name.clone()));
            }
            if !seen.insert(channel.name.as_str()) {
                return Err(DumpError::DuplicateChannelName(channel.name.clone()));
            }
        }

        Ok(())
    }

    fn build_contents(&self, capture: &Capture) -> Result<ArchiveContents> {
        self.validate(capture)?;

        Ok(ArchiveContents {
            version: ARCHIVE_VERSION.to_string(),
            metadata: metadata::serialize(
                &capture.channels,
                capture.sample_rate_hz,
                &self.config.driver,
            ),
            dump: sample::encode(&capture.channels)?,
        })
    }

    /// Write `capture` as a session archive at `path`.
    pub fn write(&self, capture: &Capture, path: &Path) -> Result<()> {
        let contents = self.build_contents(capture)?;
        self.codec
            .pack(&contents, path, &self.staging_path(path))?;

        info!(
            path = %path.display(),
            channels = capture.channel_count(),
            samples = capture.timeline_len(),
            "Capture written"
        );

        Ok(())
    }

    /// Write `capture` as an in-memory session archive.
    pub fn write_to_vec(&self, capture: &Capture) -> Result<Vec<u8>> {
        let contents = self.build_contents(capture)?;
        self.codec.pack_to_vec(&contents)
    }

    /// Read the session archive at `path`.
    pub fn read(&self, path: &Path) -> Result<Capture> {
        let contents = self.codec.unpack(path, &self.staging_path(path))?;
        let capture = self.assemble(&contents);

        info!(
            path = %path.display(),
            channels = capture.channel_count(),
            samples = capture.timeline_len(),
            sample_rate_hz = capture.sample_rate_hz,
            "Capture read"
        );

        Ok(capture)
    }

    /// Read an in-memory session archive.
    pub fn read_from_bytes(&self, bytes: Vec<u8>) -> Result<Capture> {
        let contents = self.codec.unpack_from_bytes(bytes)?;
        Ok(self.assemble(&contents))
    }

    fn assemble(&self, contents: &ArchiveContents) -> Capture {
        if contents.version.trim() != ARCHIVE_VERSION {
            warn!(
                version = %contents.version,
                supported = ARCHIVE_VERSION,
                "Archive version mismatch"
            );
        }

        let meta = metadata::parse(&contents.metadata, self.config.default_sample_rate_hz);
        let probe_count = meta.probes.len();

        let channels = meta
            .probes
            .iter()
            .map(|(name, index)| {
                Channel::new(name, sample::decode_probe(&contents.dump, probe_count, index))
            })
            .collect();

        Capture::with_channels(channels, meta.sample_rate_hz)
    }
}
