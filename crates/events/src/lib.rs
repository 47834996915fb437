//! Structured event system for crateforge.
//!
//! Components emit events with the tracing macros below. A
//! [`ForgeEventLayer`] installed in the subscriber turns them into typed
//! [`ForgeEvent`]s and hands each one to an [`EventSink`]: the terminal
//! [`CliRenderer`] or the line-oriented [`JsonRenderer`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use crateforge_events::{CliRenderer, ForgeEventLayer, emit_build_started};
//! use std::sync::Arc;
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! tracing_subscriber::registry()
//!     .with(ForgeEventLayer::new(Arc::new(CliRenderer::new())))
//!     .init();
//!
//! emit_build_started!("flamegraph", "x86_64-unknown-linux-gnu", "latest");
//! ```

pub mod event;
pub mod layer;
pub mod renderers;

pub use event::{
    BatchEvent, BuildEvent, DownloadEvent, EventCategory, EventSource, ForgeEvent, OutputEvent,
    PackageEvent,
};
pub use layer::ForgeEventLayer;
pub use renderers::{CliRenderer, CliRendererConfig, JsonRenderer};

/// Receiver of captured events.
///
/// Called synchronously on the thread that emitted the event.
pub trait EventSink: Send + Sync {
    /// Handle one event.
    fn handle(&self, event: &ForgeEvent);
}

// ============================================================================
// Emit Macros
// ============================================================================

/// Emit a build started event.
///
/// # Example
/// ```rust,ignore
/// emit_build_started!("flamegraph", "x86_64-pc-windows-msvc", "latest");
/// ```
#[macro_export]
macro_rules! emit_build_started {
    ($tool:expr, $target:expr, $version:expr) => {
        ::tracing::info!(
            target: "crateforge::build",
            event_type = "build.started",
            tool = %$tool,
            platform = %$target,
            version = %$version,
        )
    };
}

/// Emit the outcome of `rustup target add`.
#[macro_export]
macro_rules! emit_target_installed {
    ($target:expr, $success:expr) => {
        ::tracing::info!(
            target: "crateforge::build",
            event_type = "build.target_installed",
            platform = %$target,
            success = $success,
        )
    };
}

/// Emit a binary copied event.
#[macro_export]
macro_rules! emit_binary_copied {
    ($tool:expr, $target:expr, $file:expr) => {
        ::tracing::info!(
            target: "crateforge::build",
            event_type = "build.binary_copied",
            tool = %$tool,
            platform = %$target,
            file = %$file,
        )
    };
}

/// Emit a build completed event.
///
/// # Example
/// ```rust,ignore
/// emit_build_completed!("flamegraph", triple, true, 2_usize, 1200_u64);
/// emit_build_completed!("flamegraph", triple, false, 0_usize, 40_u64, err);
/// ```
#[macro_export]
macro_rules! emit_build_completed {
    ($tool:expr, $target:expr, $success:expr, $count:expr, $duration_ms:expr) => {
        ::tracing::info!(
            target: "crateforge::build",
            event_type = "build.completed",
            tool = %$tool,
            platform = %$target,
            success = $success,
            count = $count,
            duration_ms = $duration_ms,
        )
    };
    ($tool:expr, $target:expr, $success:expr, $count:expr, $duration_ms:expr, $error:expr) => {
        ::tracing::info!(
            target: "crateforge::build",
            event_type = "build.completed",
            tool = %$tool,
            platform = %$target,
            success = $success,
            count = $count,
            duration_ms = $duration_ms,
            error = %$error,
        )
    };
}

/// Emit a release resolved event.
#[macro_export]
macro_rules! emit_release_resolved {
    ($repo:expr, $tag:expr, $selector:expr) => {
        ::tracing::info!(
            target: "crateforge::download",
            event_type = "download.release_resolved",
            repo = %$repo,
            tag = %$tag,
            selector = %$selector,
        )
    };
}

/// Emit a download started event. `total_bytes` is 0 when unknown.
#[macro_export]
macro_rules! emit_download_started {
    ($file:expr, $total_bytes:expr) => {
        ::tracing::info!(
            target: "crateforge::download",
            event_type = "download.started",
            file = %$file,
            total_bytes = $total_bytes,
        )
    };
}

/// Emit a download progress event. `total_bytes` is 0 when unknown.
#[macro_export]
macro_rules! emit_download_progress {
    ($file:expr, $downloaded:expr, $total_bytes:expr) => {
        ::tracing::trace!(
            target: "crateforge::download",
            event_type = "download.progress",
            file = %$file,
            downloaded = $downloaded,
            total_bytes = $total_bytes,
        )
    };
}

/// Emit a download completed event.
#[macro_export]
macro_rules! emit_download_completed {
    ($file:expr, $path:expr, $bytes:expr) => {
        ::tracing::info!(
            target: "crateforge::download",
            event_type = "download.completed",
            file = %$file,
            path = %$path,
            bytes = $bytes,
        )
    };
}

/// Emit an archive created event.
#[macro_export]
macro_rules! emit_archive_created {
    ($tool:expr, $target:expr, $archive:expr, $count:expr) => {
        ::tracing::info!(
            target: "crateforge::package",
            event_type = "package.archive_created",
            tool = %$tool,
            platform = %$target,
            archive = %$archive,
            count = $count,
        )
    };
}

/// Emit an archive format fallback warning.
#[macro_export]
macro_rules! emit_format_fallback {
    ($tool:expr, $requested:expr, $format:expr, $reason:expr) => {
        ::tracing::warn!(
            target: "crateforge::package",
            event_type = "package.format_fallback",
            tool = %$tool,
            requested = %$requested,
            format = %$format,
            reason = %$reason,
        )
    };
}

/// Emit a tool packaged event.
#[macro_export]
macro_rules! emit_tool_packaged {
    ($tool:expr, $version:expr, $count:expr) => {
        ::tracing::info!(
            target: "crateforge::package",
            event_type = "package.tool_packaged",
            tool = %$tool,
            version = %$version,
            count = $count,
        )
    };
}

/// Emit a manifest written event.
#[macro_export]
macro_rules! emit_manifest_written {
    ($path:expr, $count:expr) => {
        ::tracing::info!(
            target: "crateforge::package",
            event_type = "package.manifest_written",
            path = %$path,
            count = $count,
        )
    };
}

/// Emit a published event.
#[macro_export]
macro_rules! emit_published {
    ($tool:expr, $path:expr, $count:expr) => {
        ::tracing::info!(
            target: "crateforge::package",
            event_type = "package.published",
            tool = %$tool,
            path = %$path,
            count = $count,
        )
    };
}

/// Emit a batch item failure.
#[macro_export]
macro_rules! emit_batch_item_failed {
    ($operation:expr, $item:expr, $error:expr) => {
        ::tracing::warn!(
            target: "crateforge::batch",
            event_type = "batch.item_failed",
            operation = %$operation,
            item = %$item,
            error = %$error,
        )
    };
}

/// Emit a batch summary.
#[macro_export]
macro_rules! emit_batch_completed {
    ($operation:expr, $succeeded:expr, $failed:expr) => {
        ::tracing::info!(
            target: "crateforge::batch",
            event_type = "batch.completed",
            operation = %$operation,
            succeeded = $succeeded,
            failed = $failed,
        )
    };
}

/// Emit a stdout output event.
#[macro_export]
macro_rules! emit_stdout {
    ($content:expr) => {
        ::tracing::info!(
            target: "crateforge::output",
            event_type = "output.stdout",
            content = %$content,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct Collect(Mutex<Vec<ForgeEvent>>);

    impl EventSink for Collect {
        fn handle(&self, event: &ForgeEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn with_collector(f: impl FnOnce()) -> Vec<ForgeEvent> {
        let sink = Arc::new(Collect::default());
        let subscriber = tracing_subscriber::registry().with(ForgeEventLayer::new(sink.clone()));
        tracing::subscriber::with_default(subscriber, f);
        let events = sink.0.lock().unwrap().clone();
        events
    }

    #[test]
    fn test_build_macros_produce_events() {
        let events = with_collector(|| {
            emit_build_started!("flamegraph", "x86_64-unknown-linux-gnu", "0.6.5");
            emit_target_installed!("x86_64-unknown-linux-gnu", true);
            emit_binary_copied!("flamegraph", "x86_64-unknown-linux-gnu", "flamegraph");
            emit_build_completed!("flamegraph", "x86_64-unknown-linux-gnu", true, 1_usize, 10_u64);
            emit_build_completed!(
                "flamegraph",
                "x86_64-pc-windows-msvc",
                false,
                0_usize,
                10_u64,
                "linker not found"
            );
        });
        assert_eq!(events.len(), 5);
        assert!(matches!(
            &events[0].category,
            EventCategory::Build(BuildEvent::Started { version, .. }) if version == "0.6.5"
        ));
        assert!(matches!(
            &events[4].category,
            EventCategory::Build(BuildEvent::Completed { success: false, error: Some(_), .. })
        ));
    }

    #[test]
    fn test_download_macros_produce_events() {
        let events = with_collector(|| {
            emit_release_resolved!("rust-lang/rust-analyzer", "2024-12-16", "date 2024-12-15");
            emit_download_started!("a.vsix", 10_u64);
            emit_download_progress!("a.vsix", 5_u64, 10_u64);
            emit_download_progress!("a.vsix", 3_u64, 0_u64);
            emit_download_completed!("a.vsix", "out/a.vsix", 10_u64);
        });
        assert_eq!(events.len(), 5);
        assert!(matches!(
            &events[2].category,
            EventCategory::Download(DownloadEvent::Progress {
                downloaded: 5,
                total_bytes: 10,
                percent: Some(50),
                ..
            })
        ));
        assert!(matches!(
            &events[3].category,
            EventCategory::Download(DownloadEvent::Progress { percent: None, .. })
        ));
    }

    #[test]
    fn test_package_and_batch_macros_produce_events() {
        let events = with_collector(|| {
            emit_archive_created!("flamegraph", "x86_64-pc-windows-msvc", "flamegraph.zip", 2_usize);
            emit_format_fallback!("flamegraph", "7z", "zip", "7z executable not found");
            emit_tool_packaged!("flamegraph", "0.6.5", 4_usize);
            emit_manifest_written!("dist/manifest.json", 1_usize);
            emit_published!("flamegraph", "artifacts/flamegraph", 8_usize);
            emit_batch_item_failed!("build-all", "flamegraph@riscv", "invalid target");
            emit_batch_completed!("build-all", 3_usize, 1_usize);
            emit_stdout!("hello");
        });
        assert_eq!(events.len(), 8);
        assert!(matches!(
            &events[6].category,
            EventCategory::Batch(BatchEvent::Completed {
                succeeded: 3,
                failed: 1,
                ..
            })
        ));
    }
}
