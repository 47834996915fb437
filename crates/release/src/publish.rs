//! Mirrors the output tree into the publish-facing tree.

use crate::archive::{archive_name, create_archive};
use crate::error::{Error, Result};
use crate::select::select_files;
use crateforge_core::fs::{copy_preserving, list_dirs, list_files};
use crateforge_core::{ArchiveFormat, Settings, ToolsConfig};
use crateforge_events::emit_published;
use std::path::Path;
use walkdir::WalkDir;

/// What was published for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedTool {
    /// Tool name.
    pub tool: String,
    /// Files copied across all platform directories.
    pub files: usize,
    /// Zip archives written into the publish tree.
    pub archives: Vec<String>,
}

/// Copies `dist/<tool>/<platform>` to `<publish>/<tool>/<platform>`.
pub struct Publisher<'a> {
    settings: &'a Settings,
    tools: &'a ToolsConfig,
}

impl<'a> Publisher<'a> {
    /// Create a publisher over the output tree.
    #[must_use]
    pub const fn new(settings: &'a Settings, tools: &'a ToolsConfig) -> Self {
        Self { settings, tools }
    }

    /// Mirror every tool directory.
    ///
    /// Tools on the `publish_zip` allow-list additionally get `<tool>.zip`
    /// in each published platform directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoOutput`] when the output root is missing, or the
    /// first copy or archive error.
    pub fn run(&self) -> Result<Vec<PublishedTool>> {
        let dist = self.settings.dist_dir();
        if !dist.is_dir() {
            return Err(Error::NoOutput {
                path: dist.to_path_buf(),
            });
        }

        list_dirs(dist)?
            .iter()
            .map(|tool| self.publish_tool(tool))
            .collect()
    }

    /// Mirror one tool directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be copied or the zip cannot be
    /// written.
    pub fn publish_tool(&self, tool: &str) -> Result<PublishedTool> {
        let src_root = self.settings.tool_dir(tool);
        let dst_root = self.settings.publish_dir.join(tool);
        let zipped = self.tools.is_publish_zipped(tool);

        let mut published = PublishedTool {
            tool: tool.to_string(),
            files: 0,
            archives: Vec::new(),
        };

        for platform in list_dirs(&src_root)? {
            let src = src_root.join(&platform);
            let dst = dst_root.join(&platform);
            published.files += mirror(&src, &dst)?;

            if zipped {
                let selected = select_files(&list_files(&src)?, tool, true);
                if selected.is_empty() {
                    tracing::warn!(tool, platform, "No files to zip for publishing");
                    continue;
                }
                let output = dst.join(archive_name(tool, ArchiveFormat::Zip));
                create_archive(ArchiveFormat::Zip, &src, &selected, &output, None)?;
                published.archives.push(output.display().to_string());
            }
        }

        emit_published!(tool, dst_root.display(), published.files);
        Ok(published)
    }
}

/// Recursively copy `src` into `dst`, returning the number of files copied.
fn mirror(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::archive(e.to_string(), Some(entry.path().to_path_buf())))?;
        copy_preserving(entry.path(), &dst.join(relative))?;
        copied += 1;
    }
    Ok(copied)
}
