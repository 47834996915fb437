//! Immutable run settings and the output tree layout.
//!
//! A [`Settings`] value is built once by the CLI and handed to every
//! component. It owns the directory names the components agree on:
//!
//! ```text
//! <dist_dir>/
//! ├── manifest.json
//! └── <tool>/
//!     ├── version
//!     └── <target triple>/
//!         ├── <binaries>
//!         └── <tool>.<archive ext>
//! ```

use crate::target::Target;
use std::path::{Path, PathBuf};

/// File name of the generated manifest inside the output root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// File name of the per-tool version sidecar.
pub const VERSION_FILE: &str = "version";

/// Paths shared by the build, package and publish steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding `tools.toml` and `downloads.toml`.
    pub config_dir: PathBuf,
    /// Output root of the build tree.
    pub dist_dir: PathBuf,
    /// Root of the publish-facing mirror.
    pub publish_dir: PathBuf,
    /// Directory `cargo install` writes binaries to.
    pub cargo_bin_dir: PathBuf,
}

impl Settings {
    /// Creates settings with the conventional relative directories.
    #[must_use]
    pub fn new(cargo_bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            dist_dir: PathBuf::from("dist"),
            publish_dir: PathBuf::from("artifacts"),
            cargo_bin_dir: cargo_bin_dir.into(),
        }
    }

    /// Sets the configuration directory.
    #[must_use]
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Sets the output root.
    #[must_use]
    pub fn with_dist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dist_dir = dir.into();
        self
    }

    /// Sets the publish root.
    #[must_use]
    pub fn with_publish_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.publish_dir = dir.into();
        self
    }

    /// Path of `tools.toml`.
    #[must_use]
    pub fn tools_config_path(&self) -> PathBuf {
        self.config_dir.join("tools.toml")
    }

    /// Path of `downloads.toml`.
    #[must_use]
    pub fn downloads_config_path(&self) -> PathBuf {
        self.config_dir.join("downloads.toml")
    }

    /// `<dist>/<tool>`
    #[must_use]
    pub fn tool_dir(&self, tool: &str) -> PathBuf {
        self.dist_dir.join(tool)
    }

    /// `<dist>/<tool>/<triple>`
    #[must_use]
    pub fn target_dir(&self, tool: &str, target: Target) -> PathBuf {
        self.tool_dir(tool).join(target.rust_triple())
    }

    /// `<dist>/<tool>/version`
    #[must_use]
    pub fn version_file(&self, tool: &str) -> PathBuf {
        self.tool_dir(tool).join(VERSION_FILE)
    }

    /// `<dist>/manifest.json`
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.dist_dir.join(MANIFEST_FILE)
    }

    /// The output root.
    #[must_use]
    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }
}
