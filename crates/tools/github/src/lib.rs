//! GitHub Releases lookup and asset download.
//!
//! A release is chosen by tag, as the latest, or by UTC publish date; its
//! asset is matched by exact file name and streamed to disk with progress
//! events. Network access goes through the [`ReleaseHost`] trait so the
//! selection and download logic can be exercised without a server.

pub mod client;
pub mod downloader;
pub mod error;
pub mod release;

pub use client::{AssetBody, DEFAULT_API_URL, GitHubClient, ReleaseHost};
pub use downloader::{Downloaded, Downloader};
pub use error::{Error, Result};
pub use release::{Asset, Release};
