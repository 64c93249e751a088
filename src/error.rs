use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all operations in the `ovaify` crate.
#[derive(Error, Debug)]
pub enum OvaError {
    /// A required request field is missing or empty. Raised before any I/O.
    #[error("Invalid request: {0}")]
    Configuration(String),

    /// A referenced file could not be stat'ed or opened, or is not a regular file.
    #[error("Cannot access '{}': {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive stream rejected a header or body write, or could not be finished.
    #[error("Failed writing '{}' to archive: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON request file could not be parsed.
    #[error("Malformed request file '{}': {source}", path.display())]
    RequestFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Coarse category of an [`OvaError`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    FileAccess,
    Write,
    RequestFile,
}

impl OvaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OvaError::Configuration(_) => ErrorKind::Configuration,
            OvaError::FileAccess { .. } => ErrorKind::FileAccess,
            OvaError::Write { .. } => ErrorKind::Write,
            OvaError::RequestFile { .. } => ErrorKind::RequestFile,
        }
    }

    pub(crate) fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OvaError::FileAccess { path: path.into(), source }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OvaError::Write { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, OvaError>;
