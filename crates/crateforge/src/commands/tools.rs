//! Tool table and output tree housekeeping: `list`, `clean`, `add-tool`,
//! `install-targets`.

use super::{Context, Outcome};
use crate::cli::CliError;
use crateforge_build::{SystemRunner, install_all_targets};
use crateforge_core::Target;
use serde_json::json;
use std::fmt::Write as _;

/// `list`: configured tools with their versions, then the platforms.
///
/// # Errors
///
/// Returns an error if `tools.toml` cannot be loaded.
pub fn execute_list(ctx: &Context) -> Result<Outcome, CliError> {
    let tools = ctx.tools()?;

    let mut text = String::from("Tools:\n");
    for (name, entry) in &tools.tools {
        let _ = writeln!(text, "  - {name} (version: {})", entry.version);
    }
    text.push_str("\nPlatforms:\n");
    for target in Target::all() {
        let _ = writeln!(text, "  - {target}");
    }

    let data = json!({
        "tools": tools
            .tools
            .iter()
            .map(|(name, entry)| json!({ "name": name, "version": entry.version }))
            .collect::<Vec<_>>(),
        "platforms": Target::all().iter().map(|t| t.rust_triple()).collect::<Vec<_>>(),
    });
    Ok(Outcome {
        text: text.trim_end().to_string(),
        data,
    })
}

/// `clean`: remove the output root.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be removed.
pub fn execute_clean(ctx: &Context) -> Result<Outcome, CliError> {
    let dist = ctx.settings.dist_dir();
    if !dist.exists() {
        return Ok(Outcome::message(format!(
            "{} does not exist, nothing to clean",
            dist.display()
        )));
    }

    std::fs::remove_dir_all(dist)
        .map_err(|e| crateforge_core::Error::io(e, "remove", Some(dist)))?;
    tracing::debug!(path = %dist.display(), "Removed output root");
    Ok(Outcome::message(format!("Removed {}", dist.display())))
}

/// `add-tool <name>`: append a default entry to `tools.toml`.
///
/// # Errors
///
/// Returns an error if `tools.toml` cannot be read, parsed or written.
pub fn execute_add_tool(ctx: &Context, name: &str) -> Result<Outcome, CliError> {
    let path = ctx.settings.tools_config_path();
    let added = crateforge_core::config::add_tool(&path, name)?;

    let text = if added {
        format!("Added '{name}' to {}", path.display())
    } else {
        format!("'{name}' is already in {}", path.display())
    };
    Ok(Outcome {
        data: json!({ "tool": name, "added": added, "message": text }),
        text,
    })
}

/// `install-targets`: best-effort `rustup target add` for every platform.
///
/// Failed targets are reported in the outcome, never as an error.
#[must_use]
pub fn execute_install_targets() -> Outcome {
    let installed = install_all_targets(&SystemRunner);
    let missing: Vec<&str> = Target::all()
        .iter()
        .filter(|t| !installed.contains(*t))
        .map(|t| t.rust_triple())
        .collect();

    let mut text = format!(
        "Installed {} of {} targets",
        installed.len(),
        Target::all().len()
    );
    if !missing.is_empty() {
        let _ = write!(text, " (failed: {})", missing.join(", "));
    }
    Outcome {
        text,
        data: json!({
            "installed": installed.iter().map(|t| t.rust_triple()).collect::<Vec<_>>(),
            "failed": missing,
        }),
    }
}
