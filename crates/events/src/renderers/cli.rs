//! CLI renderer for crateforge events.
//!
//! Renders events to stdout/stderr for terminal display. Download transfers
//! drive an indicatif progress bar when stderr is a terminal.
//! This module is allowed to use println!/eprintln! as it's the output layer.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use crate::EventSink;
use crate::event::{
    BatchEvent, BuildEvent, DownloadEvent, EventCategory, ForgeEvent, OutputEvent, PackageEvent,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::sync::Mutex;

const BAR_TEMPLATE: &str =
    "{msg}\n[{elapsed_precise}] [{wide_bar:.cyan/blue}] {percent}% {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

/// CLI renderer configuration.
#[derive(Debug, Clone)]
pub struct CliRendererConfig {
    /// Whether to draw download progress bars.
    pub progress: bool,
    /// Whether to show per-binary and per-archive detail.
    pub verbose: bool,
}

impl Default for CliRendererConfig {
    fn default() -> Self {
        Self {
            progress: io::stderr().is_terminal(),
            verbose: false,
        }
    }
}

/// CLI renderer that outputs events to stdout/stderr.
pub struct CliRenderer {
    config: CliRendererConfig,
    bar: Mutex<Option<ProgressBar>>,
}

impl CliRenderer {
    /// Create a new CLI renderer with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CliRendererConfig::default())
    }

    /// Create a new CLI renderer with the given configuration.
    #[must_use]
    pub fn with_config(config: CliRendererConfig) -> Self {
        Self {
            config,
            bar: Mutex::new(None),
        }
    }

    /// Render a single event.
    pub fn render(&self, event: &ForgeEvent) {
        match &event.category {
            EventCategory::Build(build_event) => self.render_build(build_event),
            EventCategory::Download(download_event) => self.render_download(download_event),
            EventCategory::Package(package_event) => self.render_package(package_event),
            EventCategory::Batch(batch_event) => Self::render_batch(batch_event),
            EventCategory::Output(output_event) => Self::render_output(output_event),
        }
    }

    fn render_build(&self, event: &BuildEvent) {
        match event {
            BuildEvent::Started {
                tool,
                target,
                version,
            } => {
                eprintln!("> Building {tool} ({version}) for {target}");
            }
            BuildEvent::TargetInstalled { target, success } => {
                if !success {
                    eprintln!("> rustup could not add {target}, continuing");
                } else if self.config.verbose {
                    eprintln!("> rustup target {target} ready");
                }
            }
            BuildEvent::BinaryCopied { file, target, .. } => {
                if self.config.verbose {
                    eprintln!("  copied {file} -> {target}/");
                }
            }
            BuildEvent::Completed {
                tool,
                target,
                success,
                count,
                duration_ms,
                error,
            } => {
                if *success {
                    eprintln!("> [{tool}] {target}: {count} binaries in {duration_ms}ms");
                } else {
                    let reason = error.as_deref().unwrap_or("unknown error");
                    eprintln!("> [{tool}] {target} failed: {reason}");
                }
            }
        }
    }

    fn render_download(&self, event: &DownloadEvent) {
        match event {
            DownloadEvent::ReleaseResolved {
                repo,
                tag,
                selector,
            } => {
                eprintln!("> {repo}: using release {tag} ({selector})");
            }
            DownloadEvent::Started { file, total_bytes } => {
                if !self.config.progress {
                    eprintln!("> Downloading {file}");
                    return;
                }
                let bar = if *total_bytes > 0 {
                    let bar = ProgressBar::new(*total_bytes);
                    bar.set_style(ProgressStyle::with_template(BAR_TEMPLATE).map_or_else(
                        |_| ProgressStyle::default_bar(),
                        |style| style.progress_chars("#>-"),
                    ));
                    bar
                } else {
                    ProgressBar::new_spinner()
                };
                bar.set_message(format!("Downloading {file}"));
                if let Ok(mut slot) = self.bar.lock() {
                    *slot = Some(bar);
                }
            }
            DownloadEvent::Progress {
                downloaded,
                total_bytes,
                percent,
                ..
            } => {
                if !self.config.progress {
                    eprintln!("{}", progress_line(*downloaded, *total_bytes, *percent));
                    return;
                }
                if let Ok(slot) = self.bar.lock()
                    && let Some(bar) = slot.as_ref()
                {
                    bar.set_position(*downloaded);
                }
            }
            DownloadEvent::Completed { file, path, bytes } => {
                let bar = self.bar.lock().ok().and_then(|mut slot| slot.take());
                if let Some(bar) = bar {
                    bar.finish_with_message(format!("Downloaded {file}"));
                } else {
                    eprintln!("> Downloaded {file} ({bytes} bytes) to {path}");
                }
            }
        }
    }

    fn render_package(&self, event: &PackageEvent) {
        match event {
            PackageEvent::ArchiveCreated {
                tool,
                target,
                archive,
                count,
            } => {
                if self.config.verbose {
                    eprintln!("  [{tool}] {target}/{archive} ({count} files)");
                }
            }
            PackageEvent::FormatFallback {
                tool,
                requested,
                format,
                reason,
            } => {
                eprintln!("> [{tool}] {requested} unavailable ({reason}), using {format}");
            }
            PackageEvent::ToolPackaged {
                tool,
                version,
                count,
            } => {
                eprintln!("> Packaged {tool} {version} ({count} files)");
            }
            PackageEvent::ManifestWritten { path, count } => {
                eprintln!("> Manifest for {count} tools written to {path}");
            }
            PackageEvent::Published { tool, path, count } => {
                eprintln!("> Published {tool} ({count} files) to {path}");
            }
        }
    }

    fn render_batch(event: &BatchEvent) {
        match event {
            BatchEvent::ItemFailed {
                operation,
                item,
                error,
            } => {
                eprintln!("> {operation}: {item} failed: {error}");
            }
            BatchEvent::Completed {
                operation,
                succeeded,
                failed,
            } => {
                eprintln!("> {operation}: {succeeded} succeeded, {failed} failed");
            }
        }
    }

    fn render_output(event: &OutputEvent) {
        match event {
            OutputEvent::Stdout { content } => {
                println!("{content}");
            }
        }
    }
}

impl std::fmt::Debug for CliRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliRenderer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for CliRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for CliRenderer {
    fn handle(&self, event: &ForgeEvent) {
        self.render(event);
    }
}

/// Plain progress line for non-terminal stderr.
fn progress_line(downloaded: u64, total_bytes: u64, percent: Option<u64>) -> String {
    percent.map_or_else(
        || format!("  {downloaded} bytes"),
        |percent| format!("  {percent}% ({downloaded}/{total_bytes})"),
    )
}
