//! The `manifest.json` inventory of the output tree.
//!
//! The manifest is derived entirely from the tree at generation time and is
//! rewritten in full on every run. Ordering is deterministic (tools and
//! platforms by name, files by name) so two runs over an unchanged tree only
//! differ in `generated_at`.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use crateforge_core::ArchiveFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Registry the tools are installed from.
pub const SOURCE: &str = "crates.io";

/// One file in a platform directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// The archive written into a platform directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    /// Archive file name.
    pub name: String,
    /// Format actually written.
    pub format: ArchiveFormat,
    /// Configured format, present only when it could not be honoured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_format: Option<ArchiveFormat>,
}

/// Contents of one platform directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFiles {
    /// Every file in the directory, sorted by name.
    pub files: Vec<FileEntry>,
    /// Archive created in this run, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveInfo>,
}

/// One tool in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolManifest {
    /// Crate name.
    pub crate_name: String,
    /// Resolved version (`v1.2.3`, configured version, or `unknown`).
    pub version: String,
    /// Registry.
    pub source: String,
    /// Platform triple to directory contents.
    pub targets: BTreeMap<String, TargetFiles>,
}

/// The complete manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// When the manifest was generated.
    pub generated_at: DateTime<Utc>,
    /// Registry.
    pub source: String,
    /// Tools, sorted by crate name.
    pub tools: Vec<ToolManifest>,
}

impl Manifest {
    /// Create a manifest stamped with the current time.
    #[must_use]
    pub fn new(mut tools: Vec<ToolManifest>) -> Self {
        tools.sort_by(|a, b| a.crate_name.cmp(&b.crate_name));
        Self {
            generated_at: Utc::now(),
            source: SOURCE.to_string(),
            tools,
        }
    }

    /// Look up a tool by crate name.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&ToolManifest> {
        self.tools.iter().find(|t| t.crate_name == name)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the manifest to `path`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json + "\n").map_err(|e| {
            Error::from(crateforge_core::Error::io(e, "write", Some(path)))
        })
    }

    /// Read a manifest back from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crateforge_core::Error::io(e, "read", Some(path)))?;
        Ok(serde_json::from_str(&content)?)
    }
}
