//! # Archive Requests
//!
//! An [`ArchiveRequest`] is what a caller asks for: a descriptor, the files that
//! follow it, and where to put the result. [`ArchiveRequest::validate`] turns it
//! into a [`ResolvedRequest`], which is what the builder actually consumes. The
//! split keeps defaulting out of the builder: by the time an archive is opened,
//! every field has its final value and the descriptor has been stat'ed once.

use crate::archive::entry_name;
use crate::error::{OvaError, Result};
use crate::fsx;
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Describes one archive-build operation.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ArchiveRequest {
    /// The OVF descriptor. Always written as the first entry.
    pub descriptor_path: PathBuf,
    /// Files appended after the descriptor, in this order.
    pub member_paths: Vec<PathBuf>,
    /// Where the archive is written. Created or truncated.
    pub output_path: PathBuf,
    /// Permission bits for the output. `None` inherits the descriptor's bits.
    #[serde(default)]
    pub output_permissions: Option<u32>,
}

impl ArchiveRequest {
    pub fn new(descriptor_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            descriptor_path: descriptor_path.into(),
            member_paths: Vec::new(),
            output_path: output_path.into(),
            output_permissions: None,
        }
    }

    /// Append one member file.
    pub fn member(mut self, path: impl Into<PathBuf>) -> Self {
        self.member_paths.push(path.into());
        self
    }

    /// Append several member files, keeping their order.
    pub fn members<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.member_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Set explicit permission bits for the output file.
    pub fn output_permissions(mut self, mode: u32) -> Self {
        self.output_permissions = Some(mode);
        self
    }

    /// Loads a request from a JSON file whose keys match the field names.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| OvaError::file_access(path, e))?;
        serde_json::from_slice(&bytes).map_err(|source| OvaError::RequestFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks every required field, then stats the descriptor and derives the
    /// effective output mode.
    ///
    /// The emptiness and base-name checks run before the filesystem is touched,
    /// and an output that is also one of the inputs is refused, so a rejected
    /// request never creates or modifies anything.
    pub fn validate(self) -> Result<ResolvedRequest> {
        if self.descriptor_path.as_os_str().is_empty() {
            return Err(OvaError::Configuration("an OVF descriptor path is required".into()));
        }
        if self.member_paths.is_empty() {
            return Err(OvaError::Configuration(
                "at least one file to include in the OVA is required".into(),
            ));
        }
        if let Some(pos) = self.member_paths.iter().position(|p| p.as_os_str().is_empty()) {
            return Err(OvaError::Configuration(format!("member path #{} is empty", pos + 1)));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(OvaError::Configuration("an output path for the OVA is required".into()));
        }
        entry_name(&self.descriptor_path)?;
        for member in &self.member_paths {
            entry_name(member)?;
        }

        // Truncating the output must never destroy one of the sources.
        for source in std::iter::once(&self.descriptor_path).chain(&self.member_paths) {
            if fsx::same_file(&self.output_path, source) {
                return Err(OvaError::Configuration(format!(
                    "output '{}' is also an input",
                    self.output_path.display()
                )));
            }
        }

        let descriptor_meta = std::fs::metadata(&self.descriptor_path)
            .map_err(|e| OvaError::file_access(&self.descriptor_path, e))?;
        if !descriptor_meta.is_file() {
            return Err(OvaError::file_access(&self.descriptor_path, not_a_file()));
        }

        let output_mode = self
            .output_permissions
            .unwrap_or_else(|| fsx::permission_bits(&descriptor_meta));

        Ok(ResolvedRequest {
            descriptor_path: self.descriptor_path,
            descriptor_meta,
            member_paths: self.member_paths,
            output_path: self.output_path,
            output_mode,
        })
    }
}

pub(crate) fn not_a_file() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file")
}

/// A validated request with every default applied. Immutable.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    descriptor_path: PathBuf,
    descriptor_meta: Metadata,
    member_paths: Vec<PathBuf>,
    output_path: PathBuf,
    output_mode: u32,
}

impl ResolvedRequest {
    pub fn descriptor_path(&self) -> &Path {
        &self.descriptor_path
    }

    /// Descriptor metadata as captured during validation.
    pub fn descriptor_metadata(&self) -> &Metadata {
        &self.descriptor_meta
    }

    pub fn member_paths(&self) -> &[PathBuf] {
        &self.member_paths
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Effective permission bits for the output file.
    pub fn output_mode(&self) -> u32 {
        self.output_mode
    }

    /// Number of entries the archive will hold.
    pub fn entry_count(&self) -> usize {
        1 + self.member_paths.len()
    }
}
