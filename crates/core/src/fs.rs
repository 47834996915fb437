//! File helpers shared by the build and publish steps.

use crate::{Error, Result};
use filetime::FileTime;
use std::path::Path;

/// Copy `src` to `dst`, keeping permissions and the modification time.
///
/// Parent directories of `dst` are created. An existing `dst` is
/// overwritten.
///
/// # Errors
///
/// Returns an error if the source cannot be read or the destination
/// cannot be written.
pub fn copy_preserving(src: &Path, dst: &Path) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(e, "create", Some(parent)))?;
    }

    let bytes = std::fs::copy(src, dst).map_err(|e| Error::io(e, "copy", Some(src)))?;

    // std::fs::copy already carries permission bits over; mtime needs filetime.
    let metadata = std::fs::metadata(src).map_err(|e| Error::io(e, "stat", Some(src)))?;
    let mtime = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_mtime(dst, mtime).map_err(|e| Error::io(e, "set mtime", Some(dst)))?;

    Ok(bytes)
}

/// List the regular files of a directory by name, sorted.
///
/// A missing directory yields an empty listing.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(e, "read directory", Some(dir)))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(e, "read directory", Some(dir)))?;
        if entry.path().is_file()
            && let Some(name) = entry.file_name().to_str()
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// List the subdirectories of a directory by name, sorted.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_dirs(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(e, "read directory", Some(dir)))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(e, "read directory", Some(dir)))?;
        if entry.path().is_dir()
            && let Some(name) = entry.file_name().to_str()
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
