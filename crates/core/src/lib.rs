//! Core types for crateforge.
//!
//! Holds everything the build, download, package and publish components
//! agree on: the supported [`Target`]s, the two configuration tables,
//! the output tree layout ([`Settings`]) and the shared [`Error`] type.

pub mod batch;
pub mod config;
pub mod error;
pub mod fs;
pub mod paths;
pub mod settings;
pub mod target;

pub use batch::{BatchFailure, BatchReport};
pub use config::{
    ArchiveFormat, DownloadItem, DownloadsConfig, LATEST, ReleaseSelector, SelectionMethod,
    ToolEntry, ToolSettings, ToolsConfig,
};
pub use error::{Error, Result};
pub use settings::Settings;
pub use target::{PlatformClass, Target};
