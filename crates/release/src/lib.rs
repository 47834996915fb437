//! Packaging and publishing for the crateforge output tree.
//!
//! Operates on the tree the build step leaves behind:
//!
//! - [`Packager`] optionally archives each `dist/<tool>/<platform>` directory
//!   and writes `dist/manifest.json`
//! - [`Publisher`] mirrors the tree into the publish directory, adding a
//!   prefix-filtered zip for allow-listed tools
//!
//! Archive formats are ZIP, tar.gz, tar.xz and tar.bz2 in-process, and 7z via
//! an external executable with a ZIP fallback.

pub mod archive;
pub mod error;
pub mod manifest;
pub mod packager;
pub mod publish;
pub mod select;

pub use error::{Error, Result};
pub use manifest::{ArchiveInfo, FileEntry, Manifest, TargetFiles, ToolManifest};
pub use packager::Packager;
pub use publish::{PublishedTool, Publisher};
