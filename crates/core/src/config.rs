//! Configuration tables.
//!
//! Two TOML files drive every command:
//!
//! - `tools.toml`: tool name → version pin, compression flag and archive
//!   formats, plus an optional `[settings]` table.
//! - `downloads.toml`: download item → repository, asset name, output
//!   directory and release selection method.
//!
//! Both are loaded with a single typed deserialization. A missing file is
//! [`Error::ConfigNotFound`], a malformed one [`Error::ConfigParse`].

use crate::error::{Error, Result};
use crate::target::PlatformClass;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use toml_edit::DocumentMut;

/// Version string meaning "whatever crates.io currently has".
pub const LATEST: &str = "latest";

/// Archive format used when compressing a platform directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// ZIP with Deflate compression.
    #[serde(rename = "zip")]
    Zip,
    /// 7z, produced by the external `7z` executable.
    #[serde(rename = "7z")]
    SevenZ,
    /// gzip-compressed tar.
    #[serde(rename = "tar.gz")]
    TarGz,
    /// xz-compressed tar.
    #[serde(rename = "tar.xz")]
    TarXz,
    /// bzip2-compressed tar.
    #[serde(rename = "tar.bz2")]
    TarBz2,
}

impl ArchiveFormat {
    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::SevenZ => "7z",
            Self::TarGz => "tar.gz",
            Self::TarXz => "tar.xz",
            Self::TarBz2 => "tar.bz2",
        }
    }

    /// All known formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Zip,
            Self::SevenZ,
            Self::TarGz,
            Self::TarXz,
            Self::TarBz2,
        ]
    }

    /// Whether a file name carries one of the archive extensions.
    #[must_use]
    pub fn is_archive_name(name: &str) -> bool {
        Self::all()
            .iter()
            .any(|f| name.ends_with(&format!(".{}", f.extension())))
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArchiveFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|f| f.extension() == s)
            .ok_or_else(|| Error::UnknownArchiveFormat { name: s.to_string() })
    }
}

fn default_version() -> String {
    LATEST.to_string()
}

const fn default_windows_format() -> ArchiveFormat {
    ArchiveFormat::Zip
}

const fn default_non_windows_format() -> ArchiveFormat {
    ArchiveFormat::TarGz
}

/// One entry of the tool table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEntry {
    /// Version pin, or `latest`.
    #[serde(default = "default_version")]
    pub version: String,
    /// Whether the packager archives this tool's platform directories.
    #[serde(default)]
    pub compress: bool,
    /// Archive format for Windows targets.
    #[serde(default = "default_windows_format")]
    pub windows_format: ArchiveFormat,
    /// Archive format for non-Windows targets.
    #[serde(default = "default_non_windows_format")]
    pub non_windows_format: ArchiveFormat,
}

impl Default for ToolEntry {
    fn default() -> Self {
        Self {
            version: default_version(),
            compress: false,
            windows_format: default_windows_format(),
            non_windows_format: default_non_windows_format(),
        }
    }
}

impl ToolEntry {
    /// The `--version` argument for `cargo install`, if any.
    #[must_use]
    pub fn version_pin(&self) -> Option<&str> {
        (self.version != LATEST).then_some(self.version.as_str())
    }

    /// Archive format configured for a platform class.
    #[must_use]
    pub const fn format_for(&self, class: PlatformClass) -> ArchiveFormat {
        match class {
            PlatformClass::Windows => self.windows_format,
            PlatformClass::NonWindows => self.non_windows_format,
        }
    }
}

fn default_prefix_filtered() -> Vec<String> {
    vec!["flamegraph".to_string()]
}

fn default_publish_zip() -> Vec<String> {
    vec!["flamegraph".to_string(), "cargo-audit".to_string()]
}

/// `[settings]` table of `tools.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Tools whose archives only take files named after the tool.
    #[serde(default = "default_prefix_filtered")]
    pub prefix_filtered: Vec<String>,
    /// Tools that get an extra zip in the publish tree.
    #[serde(default = "default_publish_zip")]
    pub publish_zip: Vec<String>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            prefix_filtered: default_prefix_filtered(),
            publish_zip: default_publish_zip(),
        }
    }
}

/// The full `tools.toml` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Optional settings table.
    #[serde(default)]
    pub settings: ToolSettings,
    /// Tool table, in file order.
    #[serde(default)]
    pub tools: IndexMap<String, ToolEntry>,
}

impl ToolsConfig {
    /// Load the tool table from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] when the file is absent and
    /// [`Error::ConfigParse`] when it is not valid.
    pub fn load(path: &Path) -> Result<Self> {
        load_toml(path)
    }

    /// Parse the tool table from a string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] when the document is not valid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config_parse(Path::new("<inline>"), e.to_string()))
    }

    /// Tool names, in file order.
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Whether the tool is configured.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Look up a tool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTool`] when the name is not a key.
    pub fn tool(&self, name: &str) -> Result<&ToolEntry> {
        self.tools.get(name).ok_or_else(|| Error::unknown_tool(name))
    }

    /// Configured version of a tool, `latest` when unset.
    #[must_use]
    pub fn version_of(&self, name: &str) -> &str {
        self.tools.get(name).map_or(LATEST, |t| t.version.as_str())
    }

    /// Whether archives for this tool use the name-prefix file filter.
    #[must_use]
    pub fn is_prefix_filtered(&self, name: &str) -> bool {
        self.settings.prefix_filtered.iter().any(|t| t == name)
    }

    /// Whether the publish step zips this tool.
    #[must_use]
    pub fn is_publish_zipped(&self, name: &str) -> bool {
        self.settings.publish_zip.iter().any(|t| t == name)
    }
}

/// Append a tool with default settings to `tools.toml`.
///
/// The file is edited in place so comments and formatting survive. A missing
/// file is created. Returns `false` when the tool already exists.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or written.
pub fn add_tool(path: &Path, name: &str) -> Result<bool> {
    let content = if path.exists() {
        std::fs::read_to_string(path).map_err(|e| Error::io(e, "read", Some(path)))?
    } else {
        String::new()
    };

    let mut doc = content
        .parse::<DocumentMut>()
        .map_err(|e| Error::config_parse(path, e.to_string()))?;

    if doc.get("tools").and_then(|t| t.get(name)).is_some() {
        return Ok(false);
    }

    let tools = doc
        .entry("tools")
        .or_insert_with(|| {
            let mut table = toml_edit::Table::new();
            table.set_implicit(true);
            toml_edit::Item::Table(table)
        })
        .as_table_mut()
        .ok_or_else(|| Error::config_parse(path, "'tools' is not a table"))?;

    // A standalone [tools.<name>] section lands after every existing one.
    let mut entry = toml_edit::Table::new();
    entry.insert("version", toml_edit::value(LATEST));
    tools.insert(name, toml_edit::Item::Table(entry));

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(e, "create", Some(parent)))?;
    }
    std::fs::write(path, doc.to_string()).map_err(|e| Error::io(e, "write", Some(path)))?;

    tracing::debug!(tool = name, path = %path.display(), "Added tool entry");
    Ok(true)
}

/// Release selection method of a download item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMethod {
    /// Release published on an exact date.
    Date,
    /// Release with an exact tag.
    Tag,
    /// The latest release.
    #[default]
    Latest,
}

/// A resolved release selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseSelector {
    /// The latest release.
    Latest,
    /// The release with this tag.
    Tag(String),
    /// The first release published on this date (`YYYY-MM-DD`).
    Date(String),
}

impl fmt::Display for ReleaseSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Tag(tag) => write!(f, "tag {tag}"),
            Self::Date(date) => write!(f, "date {date}"),
        }
    }
}

/// One entry of the download table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadItem {
    /// `owner/name` of the repository.
    pub repo: String,
    /// Exact asset file name.
    pub file: String,
    /// Directory the asset is written to.
    pub output_dir: PathBuf,
    /// How the release is chosen.
    #[serde(default)]
    pub method: SelectionMethod,
    /// Publish date for [`SelectionMethod::Date`].
    #[serde(default)]
    pub date: Option<String>,
    /// Tag for [`SelectionMethod::Tag`].
    #[serde(default)]
    pub tag: Option<String>,
}

impl DownloadItem {
    /// Build the release selector for this item.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the method needs a `date` or `tag`
    /// field that is missing.
    pub fn selector(&self) -> Result<ReleaseSelector> {
        match self.method {
            SelectionMethod::Latest => Ok(ReleaseSelector::Latest),
            SelectionMethod::Tag => self.tag.clone().map(ReleaseSelector::Tag).ok_or_else(|| {
                Error::configuration_with_help(
                    format!("download of {} uses method 'tag' without a tag", self.file),
                    "Add `tag = \"...\"` to the item",
                )
            }),
            SelectionMethod::Date => {
                self.date.clone().map(ReleaseSelector::Date).ok_or_else(|| {
                    Error::configuration_with_help(
                        format!("download of {} uses method 'date' without a date", self.file),
                        "Add `date = \"YYYY-MM-DD\"` to the item",
                    )
                })
            }
        }
    }

    /// Full path the asset is written to.
    #[must_use]
    pub fn destination(&self) -> PathBuf {
        self.output_dir.join(&self.file)
    }
}

/// The full `downloads.toml` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadsConfig {
    /// Download table, in file order.
    #[serde(default)]
    pub downloads: IndexMap<String, DownloadItem>,
}

impl DownloadsConfig {
    /// Load the download table from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] when the file is absent and
    /// [`Error::ConfigParse`] when it is not valid.
    pub fn load(path: &Path) -> Result<Self> {
        load_toml(path)
    }

    /// Look up a download item.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the key is missing.
    pub fn item(&self, name: &str) -> Result<&DownloadItem> {
        self.downloads.get(name).ok_or_else(|| {
            Error::configuration_with_help(
                format!("download item '{name}' is not defined"),
                "Run `crateforge download --list` to see the configured items",
            )
        })
    }
}

fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(e, "read", Some(path)))?;
    toml::from_str(&content).map_err(|e| Error::config_parse(path, e.to_string()))
}
