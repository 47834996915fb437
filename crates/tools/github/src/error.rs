//! Error types for release lookup and downloads.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for GitHub operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or downloading a release asset.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Configuration or filesystem error from the core crate.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] crateforge_core::Error),

    /// The HTTP request could not be made or its body not read.
    #[error("Request to {url} failed: {message}")]
    #[diagnostic(
        code(crateforge::github::http),
        help("Check network connectivity; set GITHUB_TOKEN if you are rate limited")
    )]
    Http {
        /// Requested URL
        url: String,
        /// Transport error message
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    #[diagnostic(code(crateforge::github::status))]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// No release matched the selector.
    #[error("No release of {repo} matches {selector}")]
    #[diagnostic(code(crateforge::github::release_not_found))]
    ReleaseNotFound {
        /// `owner/name`
        repo: String,
        /// Selector description
        selector: String,
    },

    /// No release was published on the requested date.
    #[error("No release of {repo} was published on {date}{}", format_candidates(.candidates))]
    #[diagnostic(
        code(crateforge::github::no_release_on_date),
        help("Pick one of the listed dates or switch the item to method = \"tag\"")
    )]
    NoReleaseOnDate {
        /// `owner/name`
        repo: String,
        /// Requested date
        date: String,
        /// Recent releases as `tag (date)`, at most ten
        candidates: Vec<String>,
    },

    /// The release has no asset with the requested name.
    #[error("Release {tag} has no asset named {file}{}", format_available(.available))]
    #[diagnostic(code(crateforge::github::asset_not_found))]
    AssetNotFound {
        /// Release tag
        tag: String,
        /// Requested asset name
        file: String,
        /// Asset names the release does have
        available: Vec<String>,
    },

    /// The date is not `YYYY-MM-DD`.
    #[error("Invalid release date '{date}'")]
    #[diagnostic(
        code(crateforge::github::invalid_date),
        help("Dates are written as YYYY-MM-DD")
    )]
    InvalidDate {
        /// The rejected value
        date: String,
    },

    /// Writing the downloaded asset failed.
    #[error("Failed to write {}: {source}", .path.display())]
    #[diagnostic(code(crateforge::github::write))]
    Write {
        /// Underlying error
        #[source]
        source: std::io::Error,
        /// Destination file
        path: PathBuf,
    },
}

fn format_candidates(candidates: &[String]) -> String {
    if candidates.is_empty() {
        String::new()
    } else {
        format!("; recent releases: {}", candidates.join(", "))
    }
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "; the release has no assets".to_string()
    } else {
        format!("; available: {}", available.join(", "))
    }
}

impl Error {
    /// Create a transport error.
    #[must_use]
    pub fn http(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Http {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a release-not-found error.
    #[must_use]
    pub fn release_not_found(repo: impl Into<String>, selector: impl std::fmt::Display) -> Self {
        Self::ReleaseNotFound {
            repo: repo.into(),
            selector: selector.to_string(),
        }
    }

    /// Create a write error.
    #[must_use]
    pub fn write(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Write {
            source,
            path: path.into(),
        }
    }
}
