//! `package` and `publish`.

use super::{Context, Outcome};
use crate::cli::CliError;
use crateforge_release::{Packager, Publisher};
use serde_json::json;

/// `package`: archive platform directories and write `manifest.json`.
///
/// # Errors
///
/// Returns an error if `tools.toml` cannot be loaded, the output root is
/// missing, or an archive cannot be written.
pub fn execute_package(ctx: &Context) -> Result<Outcome, CliError> {
    let tools = ctx.tools()?;
    let manifest = Packager::new(&ctx.settings, &tools).run()?;

    let path = ctx.settings.manifest_path();
    Ok(Outcome {
        text: format!(
            "Packaged {} tools, manifest written to {}",
            manifest.tools.len(),
            path.display()
        ),
        data: json!({
            "manifest": path.display().to_string(),
            "tools": manifest.tools.iter().map(|t| &t.crate_name).collect::<Vec<_>>(),
        }),
    })
}

/// `publish`: mirror the output tree into the publish directory.
///
/// # Errors
///
/// Returns an error if `tools.toml` cannot be loaded, the output root is
/// missing, or a copy fails.
pub fn execute_publish(ctx: &Context) -> Result<Outcome, CliError> {
    let tools = ctx.tools()?;
    let published = Publisher::new(&ctx.settings, &tools).run()?;

    let files: usize = published.iter().map(|p| p.files).sum();
    Ok(Outcome {
        text: format!(
            "Published {} tools ({files} files) to {}",
            published.len(),
            ctx.settings.publish_dir.display()
        ),
        data: json!({
            "publish_dir": ctx.settings.publish_dir.display().to_string(),
            "tools": published
                .iter()
                .map(|p| json!({ "tool": p.tool, "files": p.files, "archives": p.archives }))
                .collect::<Vec<_>>(),
        }),
    })
}
