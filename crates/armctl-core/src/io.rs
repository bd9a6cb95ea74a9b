//! Crash-safe writes for `arm.yaml` and instruction files.

use crate::error::Result;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Replaces `path` with `data`. Readers see the old contents or the new, never a mix.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    staged(path, data)?.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Creates `path` with `data` unless something is already there. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    match staged(path, data)?.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error.into()),
    }
}

/// Synced temp file next to `path`, ready to be moved into place.
fn staged(path: &Path, data: &[u8]) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}
