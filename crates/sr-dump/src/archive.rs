//! ZIP packaging of the `version`, `metadata` and `dump` entries.
//!
//! File-based packing stages the three entries in a scratch directory,
//! zips them by bare name and removes the directory again. Unpacking
//! extracts only those three entries into a scratch directory and reads
//! them back; other entries are never written to disk. Any file or
//! directory already at the staging path is destroyed first.

use crate::error::ArchiveFormatError;
use crate::{DumpError, Result};
use sr_common::ArchiveCompression;
use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

/// Entry holding the archive version marker.
pub const VERSION_ENTRY: &str = "version";

/// Entry holding the session metadata.
pub const METADATA_ENTRY: &str = "metadata";

/// Entry holding the packed sample stream.
pub const DUMP_ENTRY: &str = "dump";

/// Entries every archive carries, in write order.
pub const ENTRY_NAMES: [&str; 3] = [VERSION_ENTRY, METADATA_ENTRY, DUMP_ENTRY];

/// The three logical artifacts of a session archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveContents {
    pub version: String,
    pub metadata: String,
    pub dump: Vec<u8>,
}

impl ArchiveContents {
    fn entries(&self) -> [(&'static str, &[u8]); 3] {
        [
            (VERSION_ENTRY, self.version.as_bytes()),
            (METADATA_ENTRY, self.metadata.as_bytes()),
            (DUMP_ENTRY, self.dump.as_slice()),
        ]
    }
}

/// Remove whatever is at `path` and create an empty directory there.
///
/// This is destructive: an existing directory is deleted recursively.
pub fn prepare_staging(path: &Path) -> std::io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(path)
}

/// Removes the staging directory when dropped, on success and error alike.
struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    fn create(path: &Path) -> std::io::Result<Self> {
        prepare_staging(path)?;
        debug!(path = %path.display(), "Staging directory created");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove staging directory");
        }
    }
}

/// Writer/reader for session archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveCodec {
    compression: ArchiveCompression,
}

impl ArchiveCodec {
    /// Create a codec writing entries with `compression`.
    pub fn new(compression: ArchiveCompression) -> Self {
        Self { compression }
    }

    /// Entry compression used when packing.
    pub fn compression(&self) -> ArchiveCompression {
        self.compression
    }

    fn options(&self) -> SimpleFileOptions {
        let method = match self.compression {
            ArchiveCompression::Stored => CompressionMethod::Stored,
            ArchiveCompression::Deflated => CompressionMethod::Deflated,
        };
        SimpleFileOptions::default()
            .compression_method(method)
            .unix_permissions(0o644)
    }

    fn write_zip<W: Write + Seek>(&self, sink: W, entries: &[(&str, &[u8])]) -> Result<W> {
        let mut zip = ZipWriter::new(sink);
        let options = self.options();

        for (name, data) in entries {
            zip.start_file(*name, options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?)
    }

    /// Package `contents` into a ZIP archive at `destination`.
    ///
    /// The entries are staged under `staging` first; the staging directory
    /// is recreated from scratch and removed afterwards. A failed pack
    /// leaves no archive behind.
    pub fn pack(&self, contents: &ArchiveContents, destination: &Path, staging: &Path) -> Result<()> {
        let staging = StagingDir::create(staging)?;

        for (name, data) in contents.entries() {
            fs::write(staging.path().join(name), data)?;
            debug!(entry = name, bytes = data.len(), "Staged archive entry");
        }

        let mut staged = Vec::with_capacity(ENTRY_NAMES.len());
        for name in ENTRY_NAMES {
            staged.push((name, fs::read(staging.path().join(name))?));
        }
        let entries: Vec<(&str, &[u8])> = staged
            .iter()
            .map(|(name, data)| (*name, data.as_slice()))
            .collect();

        let written = File::create(destination)
            .map_err(DumpError::from)
            .and_then(|file| self.write_zip(file, &entries));
        if let Err(e) = written {
            let _ = fs::remove_file(destination);
            return Err(e);
        }

        info!(
            path = %destination.display(),
            dump_bytes = contents.dump.len(),
            "Archive written"
        );

        Ok(())
    }

    /// Package `contents` into an in-memory ZIP archive.
    pub fn pack_to_vec(&self, contents: &ArchiveContents) -> Result<Vec<u8>> {
        let cursor = self.write_zip(Cursor::new(Vec::new()), &contents.entries())?;
        let bytes = cursor.into_inner();

        debug!(bytes = bytes.len(), "Archive written to memory");

        Ok(bytes)
    }

    /// Extract the three named entries of `archive` via `staging` and read
    /// them back.
    ///
    /// Extra entries are ignored, whatever their names; any of the three named entries missing is
    /// an [`ArchiveFormatError::MissingEntry`].
    pub fn unpack(&self, archive: &Path, staging: &Path) -> Result<ArchiveContents> {
        let file = File::open(archive).map_err(|e| ArchiveFormatError::Open {
            path: archive.to_path_buf(),
            source: e,
        })?;
        let mut zip = ZipArchive::new(file).map_err(ArchiveFormatError::Unreadable)?;
        warn_on_extra_entries(&zip);

        let staging = StagingDir::create(staging)?;
        for name in ENTRY_NAMES {
            let data = read_entry(&mut zip, name)?;
            fs::write(staging.path().join(name), &data)?;
            debug!(entry = name, bytes = data.len(), "Extracted archive entry");
        }

        let read = |name: &str| -> Result<Vec<u8>> {
            fs::read(staging.path().join(name)).map_err(|e| {
                ArchiveFormatError::UnreadableEntry {
                    entry: name.to_string(),
                    source: e,
                }
                .into()
            })
        };

        let contents = ArchiveContents {
            version: into_text(VERSION_ENTRY, read(VERSION_ENTRY)?)?,
            metadata: into_text(METADATA_ENTRY, read(METADATA_ENTRY)?)?,
            dump: read(DUMP_ENTRY)?,
        };

        info!(
            path = %archive.display(),
            dump_bytes = contents.dump.len(),
            "Archive read"
        );

        Ok(contents)
    }

    /// Read the entries of an in-memory archive.
    pub fn unpack_from_bytes(&self, bytes: Vec<u8>) -> Result<ArchiveContents> {
        let mut zip =
            ZipArchive::new(Cursor::new(bytes)).map_err(ArchiveFormatError::Unreadable)?;
        warn_on_extra_entries(&zip);

        Ok(ArchiveContents {
            version: into_text(VERSION_ENTRY, read_entry(&mut zip, VERSION_ENTRY)?)?,
            metadata: into_text(METADATA_ENTRY, read_entry(&mut zip, METADATA_ENTRY)?)?,
            dump: read_entry(&mut zip, DUMP_ENTRY)?,
        })
    }
}

fn read_entry<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut entry = zip
        .by_name(name)
        .map_err(|_| ArchiveFormatError::MissingEntry(name.to_string()))?;

    let mut data = Vec::new();
    entry
        .read_to_end(&mut data)
        .map_err(|e| ArchiveFormatError::UnreadableEntry {
            entry: name.to_string(),
            source: e,
        })?;

    Ok(data)
}

fn into_text(name: &str, data: Vec<u8>) -> Result<String> {
    String::from_utf8(data).map_err(|_| {
        ArchiveFormatError::InvalidText {
            entry: name.to_string(),
        }
        .into()
    })
}

fn warn_on_extra_entries<R: Read + Seek>(zip: &ZipArchive<R>) {
    let extra: Vec<&str> = zip
        .file_names()
        .filter(|name| !ENTRY_NAMES.contains(name))
        .collect();
    if !extra.is_empty() {
        warn!(extra = ?extra, "Ignoring unexpected archive entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn contents() -> ArchiveContents {
        ArchiveContents {
            version: "1".to_string(),
            metadata: "probe1 = a\n".to_string(),
            dump: vec![0x01, 0x00, 0x01],
        }
    }

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        ArchiveCodec::default()
            .write_zip(Cursor::new(Vec::new()), entries)
            .unwrap()
            .into_inner()
    }

    #[test]
    fn test_pack_writes_exactly_three_entries() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("capture.sr");
        let staging = dir.path().join("capture");

        ArchiveCodec::default()
            .pack(&contents(), &dest, &staging)
            .unwrap();

        assert!(dest.exists());
        assert!(!staging.exists(), "staging directory left behind");

        let zip = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mut names: Vec<&str> = zip.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["dump", "metadata", "version"]);
    }

    #[test]
    fn test_pack_replaces_existing_staging() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("capture.sr");
        let staging = dir.path().join("capture");
        fs::create_dir_all(staging.join("nested")).unwrap();
        fs::write(staging.join("nested/old.txt"), b"stale").unwrap();

        ArchiveCodec::default()
            .pack(&contents(), &dest, &staging)
            .unwrap();

        assert!(!staging.exists());
        let zip = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(zip.len(), 3);
    }

    #[test]
    fn test_prepare_staging_replaces_file() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().join("capture");
        fs::write(&staging, b"not a directory").unwrap();

        prepare_staging(&staging).unwrap();
        assert!(staging.is_dir());
    }

    #[test]
    fn test_unpack_roundtrip() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("capture.sr");
        let staging = dir.path().join("capture");
        let codec = ArchiveCodec::new(ArchiveCompression::Stored);

        codec.pack(&contents(), &dest, &staging).unwrap();
        let read = codec.unpack(&dest, &staging).unwrap();

        assert_eq!(read, contents());
        assert!(!staging.exists());
    }

    #[test]
    fn test_unpack_from_bytes_roundtrip() {
        let codec = ArchiveCodec::default();
        let bytes = codec.pack_to_vec(&contents()).unwrap();
        assert_eq!(&bytes[0..2], b"PK");

        assert_eq!(codec.unpack_from_bytes(bytes).unwrap(), contents());
    }

    #[test]
    fn test_unpack_missing_dump() {
        let bytes = zip_with(&[("version", b"1"), ("metadata", b"probe1 = a\n")]);
        let result = ArchiveCodec::default().unpack_from_bytes(bytes);

        assert!(matches!(
            result,
            Err(DumpError::ArchiveFormat(ArchiveFormatError::MissingEntry(ref name))) if name == "dump"
        ));
    }

    #[test]
    fn test_unpack_file_missing_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.sr");
        fs::write(&path, zip_with(&[("version", b"1"), ("dump", b"\x01")])).unwrap();
        let staging = dir.path().join("broken");

        let result = ArchiveCodec::default().unpack(&path, &staging);

        assert!(matches!(
            result,
            Err(DumpError::ArchiveFormat(ArchiveFormatError::MissingEntry(ref name))) if name == "metadata"
        ));
        assert!(!staging.exists());
    }

    #[test]
    fn test_unpack_ignores_extra_entries() {
        let bytes = zip_with(&[
            ("version", b"1"),
            ("metadata", b"probe1 = a\n"),
            ("dump", b"\x01"),
            ("analog-1-1-1", b"\x00\x00"),
        ]);

        let read = ArchiveCodec::default().unpack_from_bytes(bytes).unwrap();
        assert_eq!(read.dump, vec![0x01]);
    }

    #[test]
    fn test_unpack_file_ignores_unextractable_extra_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("capture.sr");
        fs::write(
            &path,
            zip_with(&[
                ("version", b"1"),
                ("metadata", b"probe1 = a\n"),
                ("dump", b"\x01\x00"),
                ("../escape", b"outside"),
            ]),
        )
        .unwrap();
        let staging = dir.path().join("capture");

        let read = ArchiveCodec::default().unpack(&path, &staging).unwrap();

        assert_eq!(read.metadata, "probe1 = a\n");
        assert_eq!(read.dump, vec![0x01, 0x00]);
        assert!(!staging.exists());
        assert!(!dir.path().join("escape").exists());
    }

    #[test]
    fn test_unpack_not_a_zip() {
        let result = ArchiveCodec::default().unpack_from_bytes(b"definitely not a zip".to_vec());
        assert!(matches!(
            result,
            Err(DumpError::ArchiveFormat(ArchiveFormatError::Unreadable(_)))
        ));
    }

    #[test]
    fn test_unpack_non_utf8_metadata() {
        let bytes = zip_with(&[("version", b"1"), ("metadata", b"\xff\xfe"), ("dump", b"")]);
        let result = ArchiveCodec::default().unpack_from_bytes(bytes);

        assert!(matches!(
            result,
            Err(DumpError::ArchiveFormat(ArchiveFormatError::InvalidText { ref entry })) if entry == "metadata"
        ));
    }
}
