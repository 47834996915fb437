//! Release metadata as returned by the GitHub API, and date matching.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// Most candidate releases listed when a date lookup misses.
pub const MAX_CANDIDATES: usize = 10;

/// A GitHub release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// Release tag.
    pub tag_name: String,
    /// Publication time; drafts have none.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Downloadable assets.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A release asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    /// File name.
    pub name: String,
    /// Direct download URL.
    pub browser_download_url: String,
    /// Size in bytes as reported by the API.
    #[serde(default)]
    pub size: u64,
}

impl Release {
    /// UTC publication date.
    #[must_use]
    pub fn published_on(&self) -> Option<NaiveDate> {
        self.published_at.map(|at| at.date_naive())
    }

    /// Find an asset by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AssetNotFound`] listing the available asset names.
    pub fn asset(&self, file: &str) -> Result<&Asset> {
        self.assets
            .iter()
            .find(|a| a.name == file)
            .ok_or_else(|| Error::AssetNotFound {
                tag: self.tag_name.clone(),
                file: file.to_string(),
                available: self.assets.iter().map(|a| a.name.clone()).collect(),
            })
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] for anything else.
pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| Error::InvalidDate {
        date: date.to_string(),
    })
}

/// First release, in listing order, published on `date` (UTC).
#[must_use]
pub fn select_by_date(releases: &[Release], date: NaiveDate) -> Option<&Release> {
    releases.iter().find(|r| r.published_on() == Some(date))
}

/// Up to [`MAX_CANDIDATES`] releases formatted as `tag (YYYY-MM-DD)`.
#[must_use]
pub fn candidates(releases: &[Release]) -> Vec<String> {
    releases
        .iter()
        .take(MAX_CANDIDATES)
        .map(|r| match r.published_on() {
            Some(date) => format!("{} ({date})", r.tag_name),
            None => format!("{} (unpublished)", r.tag_name),
        })
        .collect()
}
