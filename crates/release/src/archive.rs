//! Archive writers.
//!
//! ZIP and the three tar flavours are written in-process. 7z is delegated to
//! an external `7z` executable; [`resolve_format`] decides whether it can be
//! used or the archive falls back to ZIP.

use crate::error::{Error, Result};
use bzip2::write::BzEncoder;
use crateforge_core::ArchiveFormat;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use xz2::write::XzEncoder;
use zip::write::SimpleFileOptions;

/// Executable names probed for 7z support.
const SEVEN_ZIP_NAMES: &[&str] = &["7z", "7za", "7zz"];

/// Locate a 7z executable on `PATH`.
#[must_use]
pub fn find_seven_zip() -> Option<PathBuf> {
    SEVEN_ZIP_NAMES
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// The format that will actually be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFormat {
    /// Format asked for.
    pub requested: ArchiveFormat,
    /// Format used.
    pub actual: ArchiveFormat,
    /// Why `actual` differs from `requested`.
    pub fallback_reason: Option<String>,
}

impl ResolvedFormat {
    /// Whether a fallback happened.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Decide the format to write given the available 7z executable.
#[must_use]
pub fn resolve_format(requested: ArchiveFormat, seven_zip: Option<&Path>) -> ResolvedFormat {
    if requested == ArchiveFormat::SevenZ && seven_zip.is_none() {
        return ResolvedFormat {
            requested,
            actual: ArchiveFormat::Zip,
            fallback_reason: Some("7z executable not found on PATH".to_string()),
        };
    }
    ResolvedFormat {
        requested,
        actual: requested,
        fallback_reason: None,
    }
}

/// Name of a tool's archive for a format.
#[must_use]
pub fn archive_name(tool: &str, format: ArchiveFormat) -> String {
    format!("{tool}.{}", format.extension())
}

/// Write `files` (names relative to `dir`) into `output`.
///
/// `seven_zip` must be set for [`ArchiveFormat::SevenZ`]; resolve the format
/// with [`resolve_format`] first.
///
/// # Errors
///
/// Returns an error if a file cannot be read, the archive cannot be written,
/// or 7z is requested without an executable.
pub fn create_archive(
    format: ArchiveFormat,
    dir: &Path,
    files: &[String],
    output: &Path,
    seven_zip: Option<&Path>,
) -> Result<()> {
    match format {
        ArchiveFormat::Zip => write_zip(dir, files, output),
        ArchiveFormat::TarGz => {
            let encoder = GzEncoder::new(create(output)?, Compression::default());
            write_tar(encoder, dir, files)?.finish()?;
            Ok(())
        }
        ArchiveFormat::TarXz => {
            let encoder = XzEncoder::new(create(output)?, 6);
            write_tar(encoder, dir, files)?.finish()?;
            Ok(())
        }
        ArchiveFormat::TarBz2 => {
            let encoder = BzEncoder::new(create(output)?, bzip2::Compression::default());
            write_tar(encoder, dir, files)?.finish()?;
            Ok(())
        }
        ArchiveFormat::SevenZ => {
            let exe = seven_zip.ok_or_else(|| {
                Error::archive("7z requested but no 7z executable is available", None)
            })?;
            write_seven_zip(exe, dir, files, output)
        }
    }
}

fn create(output: &Path) -> Result<File> {
    File::create(output).map_err(|e| {
        Error::archive(
            format!("Failed to create archive: {e}"),
            Some(output.to_path_buf()),
        )
    })
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        Error::archive(
            format!("Failed to open {}: {e}", path.display()),
            Some(path.to_path_buf()),
        )
    })
}

/// Write a ZIP with Deflate compression.
fn write_zip(dir: &Path, files: &[String], output: &Path) -> Result<()> {
    let mut zip = zip::ZipWriter::new(create(output)?);

    for name in files {
        let path = dir.join(name);
        let mut options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        if let Some(mode) = unix_mode(&path) {
            options = options.unix_permissions(mode);
        }
        zip.start_file(name.as_str(), options)?;
        io::copy(&mut open(&path)?, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}

/// Append files to a tar stream and hand back the encoder.
fn write_tar<W: Write>(writer: W, dir: &Path, files: &[String]) -> Result<W> {
    let mut archive = tar::Builder::new(writer);

    for name in files {
        let path = dir.join(name);
        let file = open(&path)?;
        let metadata = file.metadata()?;

        let mut header = tar::Header::new_gnu();
        header.set_metadata(&metadata);
        header.set_path(name)?;
        header.set_cksum();

        archive.append(&header, &file)?;
    }

    Ok(archive.into_inner()?)
}

fn write_seven_zip(exe: &Path, dir: &Path, files: &[String], output: &Path) -> Result<()> {
    // 7z appends to an existing archive; start from scratch every run.
    if output.exists() {
        std::fs::remove_file(output)?;
    }
    let output = std::path::absolute(output)?;

    let result = Command::new(exe)
        .current_dir(dir)
        .arg("a")
        .arg("-t7z")
        .arg("-bd")
        .arg(&output)
        .args(files)
        .output()
        .map_err(|e| Error::archive(format!("Failed to run 7z: {e}"), Some(output.clone())))?;

    if !result.status.success() {
        return Err(Error::SevenZip {
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        });
    }
    Ok(())
}

#[cfg(unix)]
fn unix_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .ok()
        .map(|m| m.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn unix_mode(_path: &Path) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Vec<String>) {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("tool"), b"#!/bin/sh\necho tool\n").unwrap();
        std::fs::write(temp.path().join("cargo-tool"), b"binary").unwrap();
        (temp, vec!["tool".to_string(), "cargo-tool".to_string()])
    }

    #[test]
    fn test_resolve_format_fallback() {
        let resolved = resolve_format(ArchiveFormat::SevenZ, None);
        assert_eq!(resolved.actual, ArchiveFormat::Zip);
        assert!(resolved.is_fallback());

        let resolved = resolve_format(ArchiveFormat::SevenZ, Some(Path::new("/usr/bin/7z")));
        assert_eq!(resolved.actual, ArchiveFormat::SevenZ);
        assert!(!resolved.is_fallback());

        let resolved = resolve_format(ArchiveFormat::TarXz, None);
        assert_eq!(resolved.actual, ArchiveFormat::TarXz);
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(archive_name("bat", ArchiveFormat::TarBz2), "bat.tar.bz2");
        assert_eq!(archive_name("bat", ArchiveFormat::SevenZ), "bat.7z");
    }

    #[test]
    fn test_zip_contents() {
        let (temp, files) = fixture();
        let output = temp.path().join("tool.zip");
        create_archive(ArchiveFormat::Zip, temp.path(), &files, &output, None).unwrap();

        let mut zip = zip::ZipArchive::new(File::open(&output).unwrap()).unwrap();
        assert_eq!(zip.len(), 2);
        let mut content = String::new();
        zip.by_name("cargo-tool")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "binary");
    }

    #[test]
    fn test_tar_gz_contents() {
        let (temp, files) = fixture();
        let output = temp.path().join("tool.tar.gz");
        create_archive(ArchiveFormat::TarGz, temp.path(), &files, &output, None).unwrap();

        let decoder = flate2::read::GzDecoder::new(File::open(&output).unwrap());
        let mut archive = tar::Archive::new(decoder);
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["tool", "cargo-tool"]);
    }

    #[test]
    fn test_tar_xz_and_bz2_are_readable() {
        let (temp, files) = fixture();

        let xz = temp.path().join("tool.tar.xz");
        create_archive(ArchiveFormat::TarXz, temp.path(), &files, &xz, None).unwrap();
        let mut archive = tar::Archive::new(xz2::read::XzDecoder::new(File::open(&xz).unwrap()));
        assert_eq!(archive.entries().unwrap().count(), 2);

        let bz2 = temp.path().join("tool.tar.bz2");
        create_archive(ArchiveFormat::TarBz2, temp.path(), &files, &bz2, None).unwrap();
        let mut archive =
            tar::Archive::new(bzip2::read::BzDecoder::new(File::open(&bz2).unwrap()));
        assert_eq!(archive.entries().unwrap().count(), 2);
    }

    #[test]
    fn test_seven_zip_without_executable_errors() {
        let (temp, files) = fixture();
        let output = temp.path().join("tool.7z");
        let err =
            create_archive(ArchiveFormat::SevenZ, temp.path(), &files, &output, None).unwrap_err();
        assert!(matches!(err, Error::Archive { .. }));
    }
}
