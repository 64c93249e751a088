//! # OVA Archive Format
//!
//! An OVA is a plain (uncompressed) tar stream. The OVF descriptor is always the
//! first entry so consumers can find it without scanning; every referenced file
//! follows in caller order. Entries are flat: only the base name of each source
//! is stored, with the source's size, permission bits and mtime.
//!
//! [`build`] drives a whole archive from a [`ResolvedRequest`]. [`ArchiveBuilder`]
//! exposes the per-entry steps over any `Write` sink.

use crate::error::{OvaError, Result};
use crate::fsx;
use crate::request::{not_a_file, ArchiveRequest, ResolvedRequest};
use std::ffi::OsString;
use std::fs::{File, Metadata};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tar::{EntryType, Header};
use tracing::{debug, info, warn};

/// Header fields for a single archive entry, taken from one stat of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Base name of the source. No directory components.
    pub name: OsString,
    /// Exact byte length of the body.
    pub size: u64,
    /// Permission bits (`mode & 0o7777`).
    pub mode: u32,
    /// Modification time, seconds since the Unix epoch.
    pub mtime: u64,
}

impl EntryMetadata {
    /// Builds entry metadata for `path` from an already captured stat.
    pub fn from_metadata(path: &Path, meta: &Metadata) -> Result<Self> {
        if !meta.is_file() {
            return Err(OvaError::file_access(path, not_a_file()));
        }
        let name = entry_name(path)?;
        let mtime = fsx::mtime_secs(meta).unwrap_or_else(|| {
            warn!(
                path = %path.display(),
                "modification time unavailable or before 1970; storing 0"
            );
            0
        });
        Ok(Self {
            name,
            size: meta.len(),
            mode: fsx::permission_bits(meta),
            mtime,
        })
    }

    fn header(&self) -> Header {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(self.size);
        header.set_mode(self.mode);
        header.set_mtime(self.mtime);
        header.set_uid(0);
        header.set_gid(0);
        header
    }
}

/// The flat name a source is stored under: its final path component.
pub fn entry_name(path: &Path) -> Result<OsString> {
    path.file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| OvaError::Configuration(format!("'{}' has no file name", path.display())))
}

/// Writes OVA entries into a tar stream, in call order.
pub struct ArchiveBuilder<W: Write> {
    tar: tar::Builder<W>,
    entries: usize,
    bytes: u64,
}

impl<W: Write> ArchiveBuilder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            tar: tar::Builder::new(writer),
            entries: 0,
            bytes: 0,
        }
    }

    /// Appends the descriptor using the metadata captured during validation, so
    /// the header matches the stat that also decided the output's mode.
    pub fn append_descriptor(&mut self, path: &Path, meta: &Metadata) -> Result<EntryMetadata> {
        self.append_with_metadata(path, meta)
    }

    /// Stats `path` and appends it as the next entry.
    pub fn append_file(&mut self, path: &Path) -> Result<EntryMetadata> {
        let meta = std::fs::metadata(path).map_err(|e| OvaError::file_access(path, e))?;
        self.append_with_metadata(path, &meta)
    }

    fn append_with_metadata(&mut self, path: &Path, meta: &Metadata) -> Result<EntryMetadata> {
        let entry = EntryMetadata::from_metadata(path, meta)?;
        // Source handle lives only for this entry.
        let source = File::open(path).map_err(|e| OvaError::file_access(path, e))?;

        let mut header = entry.header();
        let body = ExactReader::new(source, entry.size);
        self.tar
            .append_data(&mut header, Path::new(&entry.name), body)
            .map_err(|e| OvaError::write(path, e))?;

        self.entries += 1;
        self.bytes += entry.size;
        let mode = format!("{:o}", entry.mode);
        debug!(
            name = %entry.name.to_string_lossy(),
            size = entry.size,
            mode = %mode,
            mtime = entry.mtime,
            "appended entry"
        );
        Ok(entry)
    }

    pub fn entries_written(&self) -> usize {
        self.entries
    }

    /// Total body bytes written so far, excluding headers and padding.
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Writes the end-of-archive blocks and hands back the sink.
    pub fn finish(self) -> io::Result<W> {
        self.tar.into_inner()
    }
}

/// Reads at most `remaining` bytes and fails if the source ends sooner, so the
/// body always agrees with the size already written in the header.
struct ExactReader<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> ExactReader<R> {
    fn new(inner: R, len: u64) -> Self {
        Self { inner, remaining: len }
    }
}

impl<R: Read> Read for ExactReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = usize::try_from(self.remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = self.inner.read(&mut buf[..max])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("source ended {} bytes short of its recorded size", self.remaining),
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Writes the archive described by `request` to its output path.
///
/// Fails fast: the first entry that cannot be written aborts the build and
/// the partially written output is left on disk.
pub fn build(request: &ResolvedRequest) -> Result<()> {
    let output = request.output_path();
    let mode = format!("{:o}", request.output_mode());
    info!(
        output = %output.display(),
        entries = request.entry_count(),
        mode = %mode,
        "building OVA"
    );

    let file = fsx::create_output(output, request.output_mode())
        .map_err(|e| OvaError::file_access(output, e))?;
    let mut builder = ArchiveBuilder::new(BufWriter::new(file));

    builder.append_descriptor(request.descriptor_path(), request.descriptor_metadata())?;
    for member in request.member_paths() {
        builder.append_file(member)?;
    }

    let entries = builder.entries_written();
    let bytes = builder.bytes_written();
    let writer = builder.finish().map_err(|e| OvaError::write(output, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| OvaError::write(output, e.into_error()))?;
    file.sync_all().map_err(|e| OvaError::write(output, e))?;

    info!(output = %output.display(), entries, bytes, "OVA written");
    Ok(())
}

/// Validates `request` and builds the archive. Returns the output path.
pub fn create_ova(request: ArchiveRequest) -> Result<PathBuf> {
    let resolved = request.validate()?;
    build(&resolved)?;
    Ok(resolved.output_path().to_path_buf())
}
