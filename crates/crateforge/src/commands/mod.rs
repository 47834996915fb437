//! Command implementations.
//!
//! Every command returns an [`Outcome`]: a human-readable text for the
//! terminal and a JSON value for `--json`. Progress is reported through
//! events while the command runs.

pub mod build;
pub mod download;
pub mod package;
pub mod tools;

use crate::cli::{CliError, Commands, PathArgs};
use crateforge_core::{BatchReport, DownloadsConfig, Settings, ToolsConfig};
use serde_json::json;

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Text printed on stdout.
    pub text: String,
    /// Payload of the JSON envelope.
    pub data: serde_json::Value,
}

impl Outcome {
    /// Outcome with a plain message.
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            data: json!({ "message": text }),
            text,
        }
    }

    /// Outcome of a batch: the summary line, plus the report as data.
    #[must_use]
    pub fn batch(report: &BatchReport) -> Self {
        Self {
            text: report.summary(),
            data: serde_json::to_value(report).unwrap_or_else(|_| json!({})),
        }
    }
}

/// What every command needs to run.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory layout.
    pub settings: Settings,
    /// GitHub API root override.
    pub github_api: Option<String>,
}

impl Context {
    /// Build the context from the global path arguments.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the cargo bin directory cannot be
    /// determined.
    pub fn from_paths(paths: &PathArgs) -> Result<Self, CliError> {
        let settings = Settings::new(crateforge_core::paths::cargo_bin_dir()?)
            .with_config_dir(&paths.config_dir)
            .with_dist_dir(&paths.dist_dir)
            .with_publish_dir(&paths.publish_dir);
        Ok(Self {
            settings,
            github_api: paths.github_api.clone(),
        })
    }

    /// Load `tools.toml`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file is missing or malformed.
    pub fn tools(&self) -> Result<ToolsConfig, CliError> {
        Ok(ToolsConfig::load(&self.settings.tools_config_path())?)
    }

    /// Load `downloads.toml`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file is missing or malformed.
    pub fn downloads(&self) -> Result<DownloadsConfig, CliError> {
        Ok(DownloadsConfig::load(
            &self.settings.downloads_config_path(),
        )?)
    }
}

/// Run a parsed command.
///
/// # Errors
///
/// Returns the command's fatal error; per-item failures of batch commands
/// are part of the outcome instead.
pub fn execute(command: &Commands, ctx: &Context) -> Result<Outcome, CliError> {
    tracing::debug!(?command, "Executing command");
    match command {
        Commands::Build { tool, platform } => build::execute_build(ctx, tool, platform),
        Commands::BuildAll => build::execute_build_all(ctx),
        Commands::BuildWindows => {
            build::execute_build_class(ctx, crateforge_core::PlatformClass::Windows)
        }
        Commands::BuildNonWindows => {
            build::execute_build_class(ctx, crateforge_core::PlatformClass::NonWindows)
        }
        Commands::BuildTool { tool } => build::execute_build_tool(ctx, tool),
        Commands::BuildTarget { platform } => build::execute_build_target(ctx, platform),
        Commands::List => tools::execute_list(ctx),
        Commands::Clean => tools::execute_clean(ctx),
        Commands::AddTool { name } => tools::execute_add_tool(ctx, name),
        Commands::InstallTargets => Ok(tools::execute_install_targets()),
        Commands::Download { item, list } => {
            download::execute_download(ctx, item.as_deref(), *list)
        }
        Commands::Fetch(args) => download::execute_fetch(ctx, args),
        Commands::Package => package::execute_package(ctx),
        Commands::Publish => package::execute_publish(ctx),
    }
}
