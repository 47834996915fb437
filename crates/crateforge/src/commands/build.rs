//! `build` and its fan-out variants.

use super::{Context, Outcome};
use crate::cli::CliError;
use crateforge_build::{Builder, SystemRunner};
use crateforge_core::PlatformClass;
use serde_json::json;

/// `build <tool> <platform>`: a single pair, fatal on failure.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the build fails.
pub fn execute_build(ctx: &Context, tool: &str, platform: &str) -> Result<Outcome, CliError> {
    let tools = ctx.tools()?;
    let outcome = Builder::new(&ctx.settings, &tools, SystemRunner).build(tool, platform)?;

    let dir = ctx.settings.target_dir(&outcome.tool, outcome.target);
    Ok(Outcome {
        text: format!(
            "Built {} {} for {}: {}",
            outcome.tool,
            outcome.version,
            outcome.target,
            outcome.binaries.join(", ")
        ),
        data: json!({
            "tool": outcome.tool,
            "platform": outcome.target.rust_triple(),
            "version": outcome.version,
            "binaries": outcome.binaries,
            "output_dir": dir.display().to_string(),
        }),
    })
}

/// `build-all`
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn execute_build_all(ctx: &Context) -> Result<Outcome, CliError> {
    let tools = ctx.tools()?;
    let report = Builder::new(&ctx.settings, &tools, SystemRunner).build_all();
    Ok(Outcome::batch(&report))
}

/// `build-windows` / `build-non-windows`
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn execute_build_class(ctx: &Context, class: PlatformClass) -> Result<Outcome, CliError> {
    let tools = ctx.tools()?;
    let report = Builder::new(&ctx.settings, &tools, SystemRunner).build_class(class);
    Ok(Outcome::batch(&report))
}

/// `build-tool <tool>`
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the tool is
/// not configured.
pub fn execute_build_tool(ctx: &Context, tool: &str) -> Result<Outcome, CliError> {
    let tools = ctx.tools()?;
    let report = Builder::new(&ctx.settings, &tools, SystemRunner).build_tool(tool)?;
    Ok(Outcome::batch(&report))
}

/// `build-target <platform>`
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the platform
/// is not supported.
pub fn execute_build_target(ctx: &Context, platform: &str) -> Result<Outcome, CliError> {
    let tools = ctx.tools()?;
    let report = Builder::new(&ctx.settings, &tools, SystemRunner).build_target(platform)?;
    Ok(Outcome::batch(&report))
}
