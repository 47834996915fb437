//! Archive creation and manifest generation over the output tree.

use crate::archive::{archive_name, create_archive, find_seven_zip, resolve_format};
use crate::error::{Error, Result};
use crate::manifest::{ArchiveInfo, FileEntry, Manifest, SOURCE, TargetFiles, ToolManifest};
use crate::select::select_files;
use crateforge_core::fs::{list_dirs, list_files};
use crateforge_core::{Settings, Target, ToolsConfig};
use crateforge_events::{
    emit_archive_created, emit_format_fallback, emit_manifest_written, emit_tool_packaged,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Version recorded when neither the sidecar nor the config has one.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Walks `dist/<tool>/<platform>` and writes archives plus `manifest.json`.
pub struct Packager<'a> {
    settings: &'a Settings,
    tools: &'a ToolsConfig,
    seven_zip: Option<PathBuf>,
}

impl<'a> Packager<'a> {
    /// Create a packager, probing `PATH` for a 7z executable.
    #[must_use]
    pub fn new(settings: &'a Settings, tools: &'a ToolsConfig) -> Self {
        let seven_zip = find_seven_zip();
        tracing::debug!(seven_zip = ?seven_zip, "Probed for 7z");
        Self {
            settings,
            tools,
            seven_zip,
        }
    }

    /// Override the 7z executable (`None` forces the zip fallback).
    #[must_use]
    pub fn with_seven_zip(mut self, seven_zip: Option<PathBuf>) -> Self {
        self.seven_zip = seven_zip;
        self
    }

    /// Package every tool directory and write the manifest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoOutput`] when the output root is missing, or the
    /// first archive or filesystem error encountered.
    pub fn run(&self) -> Result<Manifest> {
        let dist = self.settings.dist_dir();
        if !dist.is_dir() {
            return Err(Error::NoOutput {
                path: dist.to_path_buf(),
            });
        }

        let mut tools = Vec::new();
        for tool in list_dirs(dist)? {
            tools.push(self.process_tool(&tool)?);
        }

        let manifest = Manifest::new(tools);
        let path = self.settings.manifest_path();
        manifest.write(&path)?;
        emit_manifest_written!(path.display(), manifest.tools.len());
        Ok(manifest)
    }

    /// Archive (if configured) and inventory one tool's platform directories.
    ///
    /// Missing platform directories are created so every tool lists all
    /// four platforms.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created or read, or an
    /// archive cannot be written.
    pub fn process_tool(&self, tool: &str) -> Result<ToolManifest> {
        let entry = self.tools.tools.get(tool);
        let compress = entry.is_some_and(|e| e.compress);

        let mut targets = BTreeMap::new();
        for &target in Target::all() {
            let dir = self.settings.target_dir(tool, target);
            std::fs::create_dir_all(&dir)
                .map_err(|e| crateforge_core::Error::io(e, "create", Some(dir.as_path())))?;

            let archive = match entry {
                Some(entry) if compress => {
                    self.archive_target(tool, target, entry.format_for(target.class()), &dir)?
                }
                _ => None,
            };

            targets.insert(
                target.rust_triple().to_string(),
                TargetFiles {
                    files: inventory(&dir)?,
                    archive,
                },
            );
        }

        let version = self.resolve_version(tool);
        let count: usize = targets.values().map(|t| t.files.len()).sum();
        emit_tool_packaged!(tool, version, count);

        Ok(ToolManifest {
            crate_name: tool.to_string(),
            version,
            source: SOURCE.to_string(),
            targets,
        })
    }

    fn archive_target(
        &self,
        tool: &str,
        target: Target,
        requested: crateforge_core::ArchiveFormat,
        dir: &Path,
    ) -> Result<Option<ArchiveInfo>> {
        let listing = list_files(dir)?;
        let selected = select_files(&listing, tool, self.tools.is_prefix_filtered(tool));
        if selected.is_empty() {
            tracing::warn!(tool, platform = %target, "No files to archive");
            return Ok(None);
        }

        let resolved = resolve_format(requested, self.seven_zip.as_deref());
        if let Some(reason) = &resolved.fallback_reason {
            emit_format_fallback!(tool, resolved.requested, resolved.actual, reason);
        }

        let name = archive_name(tool, resolved.actual);
        create_archive(
            resolved.actual,
            dir,
            &selected,
            &dir.join(&name),
            self.seven_zip.as_deref(),
        )?;
        emit_archive_created!(tool, target, name, selected.len());

        Ok(Some(ArchiveInfo {
            requested_format: resolved.is_fallback().then_some(resolved.requested),
            name,
            format: resolved.actual,
        }))
    }

    fn resolve_version(&self, tool: &str) -> String {
        let sidecar = std::fs::read_to_string(self.settings.version_file(tool))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        sidecar
            .or_else(|| self.tools.tools.get(tool).map(|t| t.version.clone()))
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
    }
}

/// Every regular file in `dir` with its size, sorted by name.
fn inventory(dir: &Path) -> Result<Vec<FileEntry>> {
    list_files(dir)?
        .into_iter()
        .map(|name| {
            let path = dir.join(&name);
            let size = std::fs::metadata(&path)
                .map_err(|e| crateforge_core::Error::io(e, "stat", Some(path.as_path())))?
                .len();
            Ok(FileEntry { name, size })
        })
        .collect()
}
