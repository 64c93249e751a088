//! # ovaify Core Library
//!
//! This crate packages an OVF descriptor and the disk/resource files it
//! references into a single OVA: a plain tar stream whose first entry is the
//! descriptor, followed by every other file in caller order. Entries are flat
//! (base names only) and carry each source's size, permission bits and mtime.
//!
//! It backs the `ovaify` command-line application, and its public API can be
//! used directly to build appliances programmatically.
//!
//! ## Key Modules
//!
//! - [`request`]: The [`ArchiveRequest`] value object and its validation.
//! - [`archive`]: The archive builder and the per-file entry procedure.
//! - [`error`]: The [`OvaError`] taxonomy.
//! - [`fsx`]: Platform shims for permission bits and timestamps.
//!
//! ## Examples
//!
//! ```no_run
//! use ovaify::{create_ova, ArchiveRequest};
//!
//! let request = ArchiveRequest::new("appliance/vm.ovf", "vm.ova")
//!     .member("appliance/disk1.vmdk")
//!     .member("appliance/vm.mf");
//! create_ova(request)?;
//! # Ok::<(), ovaify::OvaError>(())
//! ```

pub mod archive;
pub mod cli;
pub mod cli_runner;
pub mod error;
pub mod request;

// Cross-platform filesystem wrapper
pub mod fsx;

pub use archive::{build, create_ova, ArchiveBuilder, EntryMetadata};
pub use error::{ErrorKind, OvaError};
pub use request::{ArchiveRequest, ResolvedRequest};
