//! The release host seam and its GitHub implementation.

use crate::error::{Error, Result};
use crate::release::Release;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::io::Read;

/// Default GitHub REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("crateforge/", env!("CARGO_PKG_VERSION"));

/// Media type of GitHub REST API responses.
const API_MEDIA_TYPE: &str = "application/vnd.github+json";

/// An asset body ready to be streamed.
pub struct AssetBody {
    /// `Content-Length`, when the server sent one.
    pub total_bytes: Option<u64>,
    /// The response body.
    pub reader: Box<dyn Read>,
}

impl std::fmt::Debug for AssetBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetBody")
            .field("total_bytes", &self.total_bytes)
            .finish_non_exhaustive()
    }
}

/// Source of release metadata and asset bodies.
pub trait ReleaseHost {
    /// `GET /repos/{repo}/releases/latest`
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReleaseNotFound`] when the repository has no
    /// release, or a transport error.
    fn latest_release(&self, repo: &str) -> Result<Release>;

    /// `GET /repos/{repo}/releases/tags/{tag}`
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReleaseNotFound`] when the tag does not exist, or a
    /// transport error.
    fn release_by_tag(&self, repo: &str, tag: &str) -> Result<Release>;

    /// `GET /repos/{repo}/releases`, first page only, newest first.
    ///
    /// # Errors
    ///
    /// Returns a transport error.
    fn releases(&self, repo: &str) -> Result<Vec<Release>>;

    /// Open an asset download.
    ///
    /// # Errors
    ///
    /// Returns a transport error or [`Error::Status`].
    fn open_asset(&self, url: &str) -> Result<AssetBody>;
}

impl<H: ReleaseHost + ?Sized> ReleaseHost for &H {
    fn latest_release(&self, repo: &str) -> Result<Release> {
        (**self).latest_release(repo)
    }

    fn release_by_tag(&self, repo: &str, tag: &str) -> Result<Release> {
        (**self).release_by_tag(repo, tag)
    }

    fn releases(&self, repo: &str) -> Result<Vec<Release>> {
        (**self).releases(repo)
    }

    fn open_asset(&self, url: &str) -> Result<AssetBody> {
        (**self).open_asset(url)
    }
}

/// [`ReleaseHost`] backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client against `api_url` (or [`DEFAULT_API_URL`]).
    ///
    /// `GITHUB_TOKEN`, then `GH_TOKEN`, is sent as a bearer token when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialised.
    pub fn new(api_url: Option<&str>) -> Result<Self> {
        let api_url = api_url
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::http(&api_url, e))?;
        let token = std::env::var("GITHUB_TOKEN")
            .or_else(|_| std::env::var("GH_TOKEN"))
            .ok()
            .filter(|t| !t.is_empty());

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn api_request(&self, url: &str) -> RequestBuilder {
        self.request(url).header(ACCEPT, API_MEDIA_TYPE)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<(StatusCode, Option<T>)> {
        let url = format!("{}{path}", self.api_url);
        tracing::debug!(%url, "GET");
        let response = self
            .api_request(&url)
            .send()
            .map_err(|e| Error::http(&url, e))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok((status, None));
        }
        if !status.is_success() {
            return Err(Error::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.json().map_err(|e| Error::http(&url, e))?;
        Ok((status, Some(body)))
    }
}

impl ReleaseHost for GitHubClient {
    fn latest_release(&self, repo: &str) -> Result<Release> {
        self.get_json(&format!("/repos/{repo}/releases/latest"))?
            .1
            .ok_or_else(|| Error::release_not_found(repo, "latest"))
    }

    fn release_by_tag(&self, repo: &str, tag: &str) -> Result<Release> {
        self.get_json(&format!("/repos/{repo}/releases/tags/{tag}"))?
            .1
            .ok_or_else(|| Error::release_not_found(repo, format!("tag {tag}")))
    }

    fn releases(&self, repo: &str) -> Result<Vec<Release>> {
        let path = format!("/repos/{repo}/releases");
        match self.get_json(&path)? {
            (_, Some(releases)) => Ok(releases),
            (status, None) => Err(Error::Status {
                url: format!("{}{path}", self.api_url),
                status: status.as_u16(),
            }),
        }
    }

    fn open_asset(&self, url: &str) -> Result<AssetBody> {
        tracing::debug!(%url, "GET");
        let response = self.request(url).send().map_err(|e| Error::http(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(AssetBody {
            total_bytes: response.content_length(),
            reader: Box::new(response),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_trimmed() {
        let client = GitHubClient::new(Some("http://localhost:9999/")).unwrap();
        assert_eq!(client.api_url, "http://localhost:9999");
        let client = GitHubClient::new(None).unwrap();
        assert_eq!(client.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_api_requests_ask_for_github_json() {
        let client = GitHubClient::new(Some("http://localhost:9999")).unwrap();
        let request = client
            .api_request("http://localhost:9999/repos/o/r/releases")
            .build()
            .unwrap();
        assert_eq!(request.headers()[ACCEPT], API_MEDIA_TYPE);

        let asset = client
            .request("http://localhost:9999/o/r/a.bin")
            .build()
            .unwrap();
        assert!(asset.headers().get(ACCEPT).is_none());
    }
}
