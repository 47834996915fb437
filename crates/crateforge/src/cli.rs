use crate::tracing::LogLevel;
use clap::{Args, Parser, Subcommand};
use miette::{Diagnostic, Report};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Any fatal failure
pub const EXIT_FAILURE: i32 = 1;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Missing or malformed configuration
    #[error("Configuration error: {message}")]
    #[diagnostic(code(crateforge::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// A build, download, package or publish step failed
    #[error("{message}")]
    #[diagnostic(code(crateforge::cli::operation))]
    Operation {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new operation error
    #[must_use]
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
            help: None,
        }
    }

    /// Classify any library diagnostic, keeping its help text.
    fn from_diagnostic(err: &dyn Diagnostic, is_config: bool) -> Self {
        let message = err.to_string();
        let help = err.help().map(|h| h.to_string());
        if is_config {
            Self::Config { message, help }
        } else {
            Self::Operation { message, help }
        }
    }
}

impl From<crateforge_core::Error> for CliError {
    fn from(err: crateforge_core::Error) -> Self {
        let is_config = err.is_configuration();
        Self::from_diagnostic(&err, is_config)
    }
}

impl From<crateforge_build::Error> for CliError {
    fn from(err: crateforge_build::Error) -> Self {
        let is_config = matches!(&err, crateforge_build::Error::Core(e) if e.is_configuration());
        Self::from_diagnostic(&err, is_config)
    }
}

impl From<crateforge_release::Error> for CliError {
    fn from(err: crateforge_release::Error) -> Self {
        let is_config = matches!(&err, crateforge_release::Error::Core(e) if e.is_configuration());
        Self::from_diagnostic(&err, is_config)
    }
}

impl From<crateforge_github::Error> for CliError {
    fn from(err: crateforge_github::Error) -> Self {
        let is_config = matches!(&err, crateforge_github::Error::Core(e) if e.is_configuration());
        Self::from_diagnostic(&err, is_config)
    }
}

/// Exit code for an error. Every fatal failure exits with 1.
#[must_use]
pub const fn exit_code_for(_err: &CliError) -> i32 {
    EXIT_FAILURE
}

/// Print an error as a miette report, or as a JSON envelope on stdout.
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": match err {
                CliError::Config { .. } => "config",
                CliError::Operation { .. } => "operation",
            },
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Cross-compile crates.io tools, fetch GitHub release assets and package
/// the results.
#[derive(Parser, Debug)]
#[command(name = "crateforge")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Emit JSON events and a JSON result envelope.
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,

    /// Directory and API locations.
    #[command(flatten)]
    pub paths: PathArgs,
}

/// Locations shared by every command.
#[derive(Args, Debug, Clone)]
pub struct PathArgs {
    /// Directory holding tools.toml and downloads.toml.
    #[arg(long, global = true, env = "CRATEFORGE_CONFIG_DIR", default_value = "config")]
    pub config_dir: PathBuf,

    /// Output root of the build tree.
    #[arg(long, global = true, env = "CRATEFORGE_DIST_DIR", default_value = "dist")]
    pub dist_dir: PathBuf,

    /// Root of the publish-facing mirror.
    #[arg(long, global = true, env = "CRATEFORGE_PUBLISH_DIR", default_value = "artifacts")]
    pub publish_dir: PathBuf,

    /// GitHub REST API root.
    #[arg(long, global = true, env = "CRATEFORGE_GITHUB_API")]
    pub github_api: Option<String>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build one tool for one platform
    Build {
        /// Tool name from tools.toml
        tool: String,
        /// Target triple
        platform: String,
    },
    /// Build every tool for every platform
    BuildAll,
    /// Build every tool for the Windows platforms
    BuildWindows,
    /// Build every tool for the non-Windows platforms
    BuildNonWindows,
    /// Build one tool for every platform
    BuildTool {
        /// Tool name from tools.toml
        tool: String,
    },
    /// Build every tool for one platform
    BuildTarget {
        /// Target triple
        platform: String,
    },
    /// List configured tools and supported platforms
    List,
    /// Remove the output tree
    Clean,
    /// Add a tool with default settings to tools.toml
    AddTool {
        /// Crate name
        name: String,
    },
    /// Add the rustup targets for every platform
    InstallTargets,
    /// Download configured release assets
    Download {
        /// Item from downloads.toml; all items when omitted
        item: Option<String>,
        /// List the configured items instead of downloading
        #[arg(long, conflicts_with = "item")]
        list: bool,
    },
    /// Download one release asset without a config entry
    Fetch(FetchArgs),
    /// Archive platform directories and write manifest.json
    Package,
    /// Mirror the output tree into the publish directory
    Publish,
}

/// Arguments of `fetch`.
#[derive(Args, Debug, Clone)]
#[command(group = clap::ArgGroup::new("selector").multiple(false))]
pub struct FetchArgs {
    /// Repository as owner/name
    #[arg(long, default_value = "rust-lang/rust-analyzer")]
    pub repo: String,

    /// Exact asset file name
    #[arg(long, default_value = "rust-analyzer-win32-x64.vsix")]
    pub file: String,

    /// Directory the asset is written to
    #[arg(long, default_value = "artifacts/rust-analyzer")]
    pub output_dir: PathBuf,

    /// Release published on this date (YYYY-MM-DD)
    #[arg(long, group = "selector")]
    pub date: Option<String>,

    /// Release with this tag
    #[arg(long, group = "selector")]
    pub tag: Option<String>,

    /// The latest release (default)
    #[arg(long, group = "selector")]
    pub latest: bool,
}

/// Parse the process arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["crateforge", "list"]).unwrap();

        assert!(matches!(cli.level, LogLevel::Warn));
        assert!(!cli.json);
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_build_arguments() {
        let cli = Cli::try_parse_from([
            "crateforge",
            "--json",
            "build",
            "flamegraph",
            "x86_64-pc-windows-msvc",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Build { tool, platform } => {
                assert_eq!(tool, "flamegraph");
                assert_eq!(platform, "x86_64-pc-windows-msvc");
            }
            other => panic!("Expected Build command, got {other:?}"),
        }
    }

    #[test]
    fn test_global_paths_after_subcommand() {
        let cli = Cli::try_parse_from(["crateforge", "package", "--dist-dir", "/tmp/out"]).unwrap();
        assert_eq!(cli.paths.dist_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_fetch_defaults_and_selector_group() {
        let cli = Cli::try_parse_from(["crateforge", "fetch"]).unwrap();
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.repo, "rust-lang/rust-analyzer");
                assert_eq!(args.file, "rust-analyzer-win32-x64.vsix");
                assert_eq!(args.output_dir, PathBuf::from("artifacts/rust-analyzer"));
                assert!(args.date.is_none() && args.tag.is_none() && !args.latest);
            }
            other => panic!("Expected Fetch command, got {other:?}"),
        }

        assert!(
            Cli::try_parse_from(["crateforge", "fetch", "--date", "2024-12-15", "--tag", "x"])
                .is_err()
        );
    }

    #[test]
    fn test_download_list_conflicts_with_item() {
        assert!(Cli::try_parse_from(["crateforge", "download", "ra", "--list"]).is_err());
        let cli = Cli::try_parse_from(["crateforge", "download", "--list"]).unwrap();
        assert!(matches!(cli.command, Commands::Download { list: true, .. }));
    }

    #[test]
    fn test_core_error_classification() {
        let err: CliError = crateforge_core::Error::configuration("bad").into();
        assert!(matches!(err, CliError::Config { .. }));

        let err: CliError = crateforge_core::Error::unknown_tool("rg").into();
        assert!(matches!(err, CliError::Operation { .. }));
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
    }
}
