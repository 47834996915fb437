//! Custom tracing Layer for capturing crateforge events.
//!
//! This layer intercepts tracing events whose target starts with
//! `crateforge::`, converts them to [`ForgeEvent`] values and hands them to
//! an [`EventSink`] on the emitting thread.

// Field values come from the emit macros in this crate.
#![allow(clippy::cast_possible_truncation)]

use crate::EventSink;
use crate::event::{
    BatchEvent, BuildEvent, DownloadEvent, EventCategory, EventSource, ForgeEvent, OutputEvent,
    PackageEvent,
};
use std::sync::Arc;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Prefix every event target starts with.
pub const TARGET_PREFIX: &str = "crateforge::";

/// A tracing Layer that captures crateforge events.
///
/// Events are identified by their `target` and an `event_type` field naming
/// the event kind.
pub struct ForgeEventLayer {
    sink: Arc<dyn EventSink>,
}

impl ForgeEventLayer {
    /// Create a layer that forwards events to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }
}

impl<S> Layer<S> for ForgeEventLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let target = event.metadata().target();
        if !target.starts_with(TARGET_PREFIX) {
            return;
        }

        let mut visitor = ForgeEventVisitor::new(target);
        event.record(&mut visitor);

        if let Some(forge_event) = visitor.build() {
            self.sink.handle(&forge_event);
        }
    }
}

/// Visitor for extracting typed fields from tracing events.
#[derive(Default)]
struct ForgeEventVisitor {
    target: String,
    event_type: Option<String>,

    tool: Option<String>,
    platform: Option<String>,
    version: Option<String>,
    file: Option<String>,
    path: Option<String>,
    error: Option<String>,
    success: Option<bool>,
    count: Option<usize>,
    duration_ms: Option<u64>,

    repo: Option<String>,
    tag: Option<String>,
    selector: Option<String>,
    total_bytes: Option<u64>,
    downloaded: Option<u64>,
    bytes: Option<u64>,

    archive: Option<String>,
    requested: Option<String>,
    format: Option<String>,
    reason: Option<String>,

    operation: Option<String>,
    item: Option<String>,
    succeeded: Option<usize>,
    failed: Option<usize>,

    content: Option<String>,
}

impl ForgeEventVisitor {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            ..Self::default()
        }
    }

    fn build(self) -> Option<ForgeEvent> {
        let event_type = self.event_type.as_deref()?;
        let source = EventSource::new(&self.target);

        let category = match event_type {
            "build.started" => EventCategory::Build(BuildEvent::Started {
                tool: self.tool?,
                target: self.platform?,
                version: self.version.unwrap_or_else(|| "latest".to_string()),
            }),
            "build.target_installed" => EventCategory::Build(BuildEvent::TargetInstalled {
                target: self.platform?,
                success: self.success?,
            }),
            "build.binary_copied" => EventCategory::Build(BuildEvent::BinaryCopied {
                tool: self.tool?,
                target: self.platform?,
                file: self.file?,
            }),
            "build.completed" => EventCategory::Build(BuildEvent::Completed {
                tool: self.tool?,
                target: self.platform?,
                success: self.success?,
                count: self.count.unwrap_or(0),
                duration_ms: self.duration_ms.unwrap_or(0),
                error: self.error,
            }),

            "download.release_resolved" => {
                EventCategory::Download(DownloadEvent::ReleaseResolved {
                    repo: self.repo?,
                    tag: self.tag?,
                    selector: self.selector?,
                })
            }
            "download.started" => EventCategory::Download(DownloadEvent::Started {
                file: self.file?,
                total_bytes: self.total_bytes.unwrap_or(0),
            }),
            "download.progress" => {
                let downloaded = self.downloaded?;
                let total_bytes = self.total_bytes.unwrap_or(0);
                EventCategory::Download(DownloadEvent::Progress {
                    file: self.file?,
                    downloaded,
                    total_bytes,
                    percent: DownloadEvent::percent(downloaded, total_bytes),
                })
            }
            "download.completed" => EventCategory::Download(DownloadEvent::Completed {
                file: self.file?,
                path: self.path?,
                bytes: self.bytes.unwrap_or(0),
            }),

            "package.archive_created" => EventCategory::Package(PackageEvent::ArchiveCreated {
                tool: self.tool?,
                target: self.platform?,
                archive: self.archive?,
                count: self.count.unwrap_or(0),
            }),
            "package.format_fallback" => EventCategory::Package(PackageEvent::FormatFallback {
                tool: self.tool?,
                requested: self.requested?,
                format: self.format?,
                reason: self.reason?,
            }),
            "package.tool_packaged" => EventCategory::Package(PackageEvent::ToolPackaged {
                tool: self.tool?,
                version: self.version?,
                count: self.count.unwrap_or(0),
            }),
            "package.manifest_written" => {
                EventCategory::Package(PackageEvent::ManifestWritten {
                    path: self.path?,
                    count: self.count.unwrap_or(0),
                })
            }
            "package.published" => EventCategory::Package(PackageEvent::Published {
                tool: self.tool?,
                path: self.path?,
                count: self.count.unwrap_or(0),
            }),

            "batch.item_failed" => EventCategory::Batch(BatchEvent::ItemFailed {
                operation: self.operation?,
                item: self.item?,
                error: self.error?,
            }),
            "batch.completed" => EventCategory::Batch(BatchEvent::Completed {
                operation: self.operation?,
                succeeded: self.succeeded.unwrap_or(0),
                failed: self.failed.unwrap_or(0),
            }),

            "output.stdout" => EventCategory::Output(OutputEvent::Stdout {
                content: self.content?,
            }),

            _ => return None,
        };

        Some(ForgeEvent::new(source, category))
    }

    fn record_number(&mut self, name: &str, value: u64) {
        match name {
            "count" => self.count = Some(value as usize),
            "succeeded" => self.succeeded = Some(value as usize),
            "failed" => self.failed = Some(value as usize),
            "duration_ms" => self.duration_ms = Some(value),
            "total_bytes" => self.total_bytes = Some(value),
            "downloaded" => self.downloaded = Some(value),
            "bytes" => self.bytes = Some(value),
            _ => {}
        }
    }
}

impl Visit for ForgeEventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        let value = Some(value.to_string());
        match field.name() {
            "event_type" => self.event_type = value,
            "tool" => self.tool = value,
            "platform" => self.platform = value,
            "version" => self.version = value,
            "file" => self.file = value,
            "path" => self.path = value,
            "error" => self.error = value,
            "repo" => self.repo = value,
            "tag" => self.tag = value,
            "selector" => self.selector = value,
            "archive" => self.archive = value,
            "requested" => self.requested = value,
            "format" => self.format = value,
            "reason" => self.reason = value,
            "operation" => self.operation = value,
            "item" => self.item = value,
            "content" => self.content = value,
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if let Ok(value) = u64::try_from(value) {
            self.record_number(field.name(), value);
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_number(field.name(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "success" {
            self.success = Some(value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `%value` fields arrive here as Display wrappers.
        self.record_str(field, &format!("{value:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct Collect(Mutex<Vec<ForgeEvent>>);

    impl EventSink for Collect {
        fn handle(&self, event: &ForgeEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<ForgeEvent> {
        let sink = Arc::new(Collect::default());
        let subscriber = tracing_subscriber::registry().with(ForgeEventLayer::new(sink.clone()));
        tracing::subscriber::with_default(subscriber, f);
        let events = sink.0.lock().unwrap().clone();
        events
    }

    #[test]
    fn test_layer_captures_output_events() {
        let events = capture(|| {
            tracing::info!(
                target: "crateforge::output",
                event_type = "output.stdout",
                content = "test output",
                "Test event"
            );
        });

        assert_eq!(events.len(), 1);
        match &events[0].category {
            EventCategory::Output(OutputEvent::Stdout { content }) => {
                assert_eq!(content, "test output");
            }
            other => panic!("Expected stdout output event, got {other:?}"),
        }
    }

    #[test]
    fn test_layer_ignores_other_targets() {
        let events = capture(|| {
            tracing::info!(
                target: "other::target",
                event_type = "output.stdout",
                content = "should be ignored",
            );
        });
        assert!(events.is_empty());
    }

    #[test]
    fn test_layer_captures_build_completed() {
        let events = capture(|| {
            tracing::info!(
                target: "crateforge::build",
                event_type = "build.completed",
                tool = %"flamegraph",
                platform = %"x86_64-unknown-linux-gnu",
                success = false,
                count = 0_usize,
                duration_ms = 12_u64,
                error = %"cargo install exited with status 101",
            );
        });

        match &events[0].category {
            EventCategory::Build(BuildEvent::Completed {
                tool,
                target,
                success,
                error,
                duration_ms,
                ..
            }) => {
                assert_eq!(tool, "flamegraph");
                assert_eq!(target, "x86_64-unknown-linux-gnu");
                assert!(!success);
                assert_eq!(*duration_ms, 12);
                assert!(error.as_deref().unwrap().contains("101"));
            }
            other => panic!("Expected build completed event, got {other:?}"),
        }
    }

    #[test]
    fn test_layer_drops_incomplete_events() {
        let events = capture(|| {
            tracing::info!(
                target: "crateforge::download",
                event_type = "download.progress",
                file = "a.bin",
            );
        });
        assert!(events.is_empty());
    }
}
