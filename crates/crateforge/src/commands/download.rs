//! `download` and `fetch`.

use super::{Context, Outcome};
use crate::cli::{CliError, FetchArgs};
use crateforge_core::ReleaseSelector;
use crateforge_github::{Downloaded, Downloader, GitHubClient};
use serde_json::json;
use std::fmt::Write as _;

fn downloader(ctx: &Context) -> Result<Downloader<GitHubClient>, CliError> {
    Ok(Downloader::new(GitHubClient::new(ctx.github_api.as_deref())?))
}

fn downloaded(name: &str, result: &Downloaded) -> Outcome {
    Outcome {
        text: format!(
            "Downloaded {name} ({}, {} bytes) to {}",
            result.tag,
            result.bytes,
            result.path.display()
        ),
        data: json!({
            "item": name,
            "tag": result.tag,
            "path": result.path.display().to_string(),
            "bytes": result.bytes,
        }),
    }
}

/// `download [item] [--list]`
///
/// Without an item every configured download runs and failures are tallied.
///
/// # Errors
///
/// Returns an error if `downloads.toml` cannot be loaded, the item is not
/// defined, or the single requested item fails.
pub fn execute_download(
    ctx: &Context,
    item: Option<&str>,
    list: bool,
) -> Result<Outcome, CliError> {
    let config = ctx.downloads()?;

    if list {
        let mut text = String::from("Downloads:");
        for (name, entry) in &config.downloads {
            let selector = entry
                .selector()
                .map_or_else(|e| format!("invalid: {e}"), |s| s.to_string());
            let _ = write!(text, "\n  - {name}: {} {} ({selector})", entry.repo, entry.file);
        }
        let names: Vec<&String> = config.downloads.keys().collect();
        return Ok(Outcome {
            text,
            data: json!({ "downloads": names }),
        });
    }

    match item {
        Some(name) => {
            let entry = config.item(name)?;
            let result = downloader(ctx)?.fetch_item(entry)?;
            Ok(downloaded(name, &result))
        }
        None => Ok(Outcome::batch(&downloader(ctx)?.fetch_all(&config))),
    }
}

/// `fetch --repo --file --output-dir (--date | --tag | --latest)`
///
/// # Errors
///
/// Returns an error if the release or asset cannot be found or the download
/// fails.
pub fn execute_fetch(ctx: &Context, args: &FetchArgs) -> Result<Outcome, CliError> {
    let selector = match (&args.date, &args.tag) {
        (Some(date), _) => ReleaseSelector::Date(date.clone()),
        (None, Some(tag)) => ReleaseSelector::Tag(tag.clone()),
        (None, None) => ReleaseSelector::Latest,
    };

    let result =
        downloader(ctx)?.fetch(&args.repo, &args.file, &args.output_dir, &selector)?;
    Ok(downloaded(&args.file, &result))
}
