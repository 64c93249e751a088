//! Cross-platform filesystem wrapper.
//!
//! On Unix, permission bits come straight from `st_mode` and are applied to the
//! output file with `PermissionsExt`. Elsewhere only the read-only flag exists,
//! so it is mapped onto `0o444`/`0o644` and applying a mode is a best effort.
//!
//! The rest of the crate goes through these helpers instead of touching
//! `std::os::unix` directly, keeping the call-sites identical across OSes.

use std::fs::{File, Metadata, OpenOptions};
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Mask covering the permission, setuid/setgid and sticky bits of a mode.
pub const MODE_MASK: u32 = 0o7777;

/// Permission bits of a file, without the file-type bits.
#[cfg(unix)]
pub fn permission_bits(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & MODE_MASK
}

/// Permission bits of a file, synthesised from the read-only flag.
#[cfg(not(unix))]
pub fn permission_bits(meta: &Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// Opens `path` write-only, creating or truncating it. New files are created
/// with `mode`; the same bits are then applied explicitly so the process umask
/// and any pre-existing mode do not leak into the result.
pub fn create_output(path: &Path, mode: u32) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(mode & MODE_MASK);
    }
    let file = opts.open(path)?;
    set_unix_permissions(&file, mode)?;
    Ok(file)
}

/// Set POSIX permission bits on an open file.
#[cfg(unix)]
pub fn set_unix_permissions(file: &File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(mode & MODE_MASK))
}

/// Maps the owner write bit onto the read-only flag.
#[cfg(not(unix))]
pub fn set_unix_permissions(file: &File, mode: u32) -> io::Result<()> {
    let mut perms = file.metadata()?.permissions();
    perms.set_readonly(mode & 0o200 == 0);
    file.set_permissions(perms)
}

/// Whether `a` and `b` name the same existing file. Missing paths never match.
pub fn same_file(a: &Path, b: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        match (std::fs::metadata(a), std::fs::metadata(b)) {
            (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
            _ => false,
        }
    }
    #[cfg(not(unix))]
    {
        match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
            (Ok(ca), Ok(cb)) => ca == cb,
            _ => false,
        }
    }
}

/// Modification time in whole seconds since the Unix epoch. `None` when the
/// platform cannot report it or the timestamp predates the epoch.
pub fn mtime_secs(meta: &Metadata) -> Option<u64> {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}
