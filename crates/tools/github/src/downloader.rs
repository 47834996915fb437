//! Release resolution and streaming downloads.

use crate::client::ReleaseHost;
use crate::error::{Error, Result};
use crate::release::{Release, candidates, parse_date, select_by_date};
use crateforge_core::{BatchReport, DownloadItem, DownloadsConfig, ReleaseSelector};
use crateforge_events::{
    emit_batch_completed, emit_batch_item_failed, emit_download_completed,
    emit_download_progress, emit_download_started, emit_release_resolved,
};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Chunk size used when streaming asset bodies.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Progress is reported every this many bytes when the size is unknown.
const UNKNOWN_SIZE_STEP: u64 = 1024 * 1024;

/// What a completed download wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    /// Release tag the asset came from.
    pub tag: String,
    /// Written file.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: u64,
}

/// Resolves releases and downloads their assets through a [`ReleaseHost`].
pub struct Downloader<H> {
    host: H,
}

impl<H: ReleaseHost> Downloader<H> {
    /// Create a downloader over a host.
    pub const fn new(host: H) -> Self {
        Self { host }
    }

    /// Resolve a release of `repo`.
    ///
    /// Date lookups scan the first page of releases for the first one
    /// published on that UTC date.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoReleaseOnDate`] with recent candidates on a date
    /// miss, [`Error::ReleaseNotFound`] on a tag or latest miss, or a
    /// transport error.
    pub fn resolve(&self, repo: &str, selector: &ReleaseSelector) -> Result<Release> {
        let release = match selector {
            ReleaseSelector::Latest => self.host.latest_release(repo)?,
            ReleaseSelector::Tag(tag) => self.host.release_by_tag(repo, tag)?,
            ReleaseSelector::Date(date) => {
                let day = parse_date(date)?;
                let releases = self.host.releases(repo)?;
                match select_by_date(&releases, day) {
                    Some(release) => release.clone(),
                    None => {
                        return Err(Error::NoReleaseOnDate {
                            repo: repo.to_string(),
                            date: date.clone(),
                            candidates: candidates(&releases),
                        });
                    }
                }
            }
        };
        emit_release_resolved!(repo, release.tag_name, selector);
        Ok(release)
    }

    /// Stream `url` into `destination`, creating parent directories.
    ///
    /// Returns the number of bytes written. No checksum is verified.
    ///
    /// # Errors
    ///
    /// Returns a transport error or [`Error::Write`].
    pub fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::write(e, parent))?;
        }

        let file_name = destination
            .file_name()
            .map_or_else(|| url.to_string(), |n| n.to_string_lossy().into_owned());

        let body = self.host.open_asset(url)?;
        emit_download_started!(file_name, body.total_bytes.unwrap_or(0));

        let file = File::create(destination).map_err(|e| Error::write(e, destination))?;
        let total_bytes = body.total_bytes.unwrap_or(0);
        let bytes = copy_with_progress(body.reader, BufWriter::new(file), body.total_bytes, |n| {
            emit_download_progress!(file_name, n, total_bytes);
        })
        .map_err(|e| match e {
            CopyError::Read(e) => Error::http(url, e),
            CopyError::Write(e) => Error::write(e, destination),
        })?;

        emit_download_completed!(file_name, destination.display(), bytes);
        Ok(bytes)
    }

    /// Resolve, locate the asset and download it into `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns the first resolution, lookup or download error.
    pub fn fetch(
        &self,
        repo: &str,
        file: &str,
        output_dir: &Path,
        selector: &ReleaseSelector,
    ) -> Result<Downloaded> {
        let release = self.resolve(repo, selector)?;
        let asset = release.asset(file)?;
        let path = output_dir.join(file);
        let bytes = self.download(&asset.browser_download_url, &path)?;
        Ok(Downloaded {
            tag: release.tag_name.clone(),
            path,
            bytes,
        })
    }

    /// Fetch one configured download item.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the item's selector is incomplete,
    /// otherwise as [`Downloader::fetch`].
    pub fn fetch_item(&self, item: &DownloadItem) -> Result<Downloaded> {
        let selector = item.selector()?;
        self.fetch(&item.repo, &item.file, &item.output_dir, &selector)
    }

    /// Fetch every configured item, isolating failures.
    pub fn fetch_all(&self, config: &DownloadsConfig) -> BatchReport {
        const OPERATION: &str = "download";

        let mut report = BatchReport::new(OPERATION);
        for (name, item) in &config.downloads {
            match self.fetch_item(item) {
                Ok(_) => report.record_success(name.clone()),
                Err(e) => {
                    emit_batch_item_failed!(OPERATION, name, e);
                    report.record_failure(name.clone(), e.to_string());
                }
            }
        }
        emit_batch_completed!(OPERATION, report.succeeded.len(), report.failed.len());
        report
    }
}

enum CopyError {
    Read(std::io::Error),
    Write(std::io::Error),
}

/// Copy in [`CHUNK_SIZE`] chunks, calling `progress` with the running total
/// at each whole percent (or every MiB when `total` is unknown).
fn copy_with_progress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    total: Option<u64>,
    mut progress: impl FnMut(u64),
) -> std::result::Result<u64, CopyError> {
    let mut buf = vec![0_u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    let mut last_step: u64 = 0;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
        written += n as u64;

        let step = match total {
            Some(total) if total > 0 => written.saturating_mul(100) / total,
            _ => written / UNKNOWN_SIZE_STEP,
        };
        if step != last_step {
            last_step = step;
            progress(written);
        }
    }

    writer.flush().map_err(CopyError::Write)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AssetBody;
    use crate::release::Asset;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::io::Cursor;
    use tempfile::TempDir;

    const REPO: &str = "rust-lang/rust-analyzer";
    const FILE: &str = "rust-analyzer-win32-x64.vsix";

    struct FakeHost {
        releases: Vec<Release>,
        opened: RefCell<Vec<String>>,
    }

    impl FakeHost {
        fn new() -> Self {
            let release = |tag: &str, at| Release {
                tag_name: tag.to_string(),
                published_at: Some(at),
                assets: vec![Asset {
                    name: FILE.to_string(),
                    browser_download_url: format!("https://example.invalid/{tag}/{FILE}"),
                    size: 20_000,
                }],
            };
            Self {
                releases: vec![
                    release("2024-12-15", Utc.with_ymd_and_hms(2024, 12, 15, 8, 30, 0).unwrap()),
                    release("2024-12-01", Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()),
                ],
                opened: RefCell::new(Vec::new()),
            }
        }
    }

    impl ReleaseHost for FakeHost {
        fn latest_release(&self, _repo: &str) -> Result<Release> {
            Ok(self.releases[0].clone())
        }

        fn release_by_tag(&self, repo: &str, tag: &str) -> Result<Release> {
            self.releases
                .iter()
                .find(|r| r.tag_name == tag)
                .cloned()
                .ok_or_else(|| Error::release_not_found(repo, format!("tag {tag}")))
        }

        fn releases(&self, _repo: &str) -> Result<Vec<Release>> {
            Ok(self.releases.clone())
        }

        fn open_asset(&self, url: &str) -> Result<AssetBody> {
            self.opened.borrow_mut().push(url.to_string());
            Ok(AssetBody {
                total_bytes: Some(20_000),
                reader: Box::new(Cursor::new(vec![7_u8; 20_000])),
            })
        }
    }

    #[test]
    fn test_resolve_by_date() {
        let host = FakeHost::new();
        let downloader = Downloader::new(&host);

        let release = downloader
            .resolve(REPO, &ReleaseSelector::Date("2024-12-15".to_string()))
            .unwrap();
        assert_eq!(release.tag_name, "2024-12-15");

        let err = downloader
            .resolve(REPO, &ReleaseSelector::Date("2024-12-02".to_string()))
            .unwrap_err();
        match err {
            Error::NoReleaseOnDate { candidates, .. } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates.len() <= 10);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_latest_and_tag() {
        let host = FakeHost::new();
        let downloader = Downloader::new(&host);
        assert_eq!(
            downloader
                .resolve(REPO, &ReleaseSelector::Latest)
                .unwrap()
                .tag_name,
            "2024-12-15"
        );
        assert!(matches!(
            downloader.resolve(REPO, &ReleaseSelector::Tag("nightly".to_string())),
            Err(Error::ReleaseNotFound { .. })
        ));
    }

    #[test]
    fn test_fetch_writes_file() {
        let temp = TempDir::new().unwrap();
        let host = FakeHost::new();
        let downloader = Downloader::new(&host);
        let out = temp.path().join("artifacts").join("rust-analyzer");

        let downloaded = downloader
            .fetch(
                REPO,
                FILE,
                &out,
                &ReleaseSelector::Tag("2024-12-01".to_string()),
            )
            .unwrap();

        assert_eq!(downloaded.bytes, 20_000);
        assert_eq!(downloaded.tag, "2024-12-01");
        assert_eq!(std::fs::metadata(out.join(FILE)).unwrap().len(), 20_000);
        assert_eq!(
            host.opened.borrow().as_slice(),
            [format!("https://example.invalid/2024-12-01/{FILE}")]
        );
    }

    #[test]
    fn test_fetch_all_isolates_failures() {
        let temp = TempDir::new().unwrap();
        let host = FakeHost::new();
        let downloader = Downloader::new(&host);
        let toml = format!(
            r#"
[downloads.good]
repo = "{REPO}"
file = "{FILE}"
output_dir = '{out}'
method = "latest"

[downloads.missing-asset]
repo = "{REPO}"
file = "nope.vsix"
output_dir = '{out}'

[downloads.no-date]
repo = "{REPO}"
file = "{FILE}"
output_dir = '{out}'
method = "date"
"#,
            out = temp.path().display()
        );
        let config: DownloadsConfig = toml::from_str(&toml).unwrap();

        let report = downloader.fetch_all(&config);
        assert_eq!(report.succeeded, vec!["good"]);
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed[0].error.contains("available"));
    }

    #[test]
    fn test_progress_reports_whole_percents() {
        let mut seen = Vec::new();
        let written = copy_with_progress(
            Cursor::new(vec![0_u8; 100 * 1024]),
            Vec::new(),
            Some(100 * 1024),
            |n| seen.push(n),
        )
        .ok()
        .unwrap();
        assert_eq!(written, 100 * 1024);
        assert!(!seen.is_empty());
        assert!(seen.len() <= 100);
        assert_eq!(seen.last().copied(), Some(100 * 1024));
    }
}
