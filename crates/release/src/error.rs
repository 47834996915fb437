//! Error types for packaging and publishing.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while packaging or publishing the output tree.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Configuration or filesystem error from the core crate.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] crateforge_core::Error),

    /// Archive creation failed.
    #[error("Archive error: {message}")]
    #[diagnostic(code(crateforge::release::archive))]
    Archive {
        /// The error message
        message: String,
        /// The archive being written
        path: Option<PathBuf>,
    },

    /// The external 7z executable failed.
    #[error("7z failed: {stderr}")]
    #[diagnostic(
        code(crateforge::release::seven_zip),
        help("Check the 7z installation or switch the tool to format \"zip\"")
    )]
    SevenZip {
        /// Captured standard error
        stderr: String,
    },

    /// The output root does not exist.
    #[error("Output directory not found: {}", .path.display())]
    #[diagnostic(
        code(crateforge::release::no_output),
        help("Run a build first or point --dist-dir at the output tree")
    )]
    NoOutput {
        /// The missing directory
        path: PathBuf,
    },

    /// Wrapped I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(crateforge::release::io))]
    Io(#[from] std::io::Error),

    /// Wrapped ZIP error.
    #[error("ZIP error: {0}")]
    #[diagnostic(code(crateforge::release::zip))]
    Zip(#[from] zip::result::ZipError),

    /// Wrapped JSON error.
    #[error("JSON error: {0}")]
    #[diagnostic(code(crateforge::release::json))]
    Json(#[from] serde_json::Error),

    /// Directory traversal failed.
    #[error("Walk error: {0}")]
    #[diagnostic(code(crateforge::release::walk))]
    Walk(#[from] walkdir::Error),
}

impl Error {
    /// Create an archive error.
    #[must_use]
    pub fn archive(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Archive {
            message: message.into(),
            path,
        }
    }
}
