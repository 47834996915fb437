//! Event type definitions for structured crateforge events.
//!
//! Events are grouped by the pipeline step that emits them (build, download,
//! package, batch) and carry an id, a timestamp and the tracing target they
//! were captured from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A structured crateforge event with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Source information for the event.
    pub source: EventSource,
    /// The event category and data.
    pub category: EventCategory,
}

impl ForgeEvent {
    /// Create a new event with the given category.
    #[must_use]
    pub fn new(source: EventSource, category: EventCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source,
            category,
        }
    }
}

/// Source information for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSource {
    /// The tracing target (e.g. `crateforge::build`).
    pub target: String,
}

impl EventSource {
    /// Create a new event source.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// Event categories organized by pipeline step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventCategory {
    /// Cross-compilation events.
    Build(BuildEvent),
    /// Release asset download events.
    Download(DownloadEvent),
    /// Archive, manifest and publish events.
    Package(PackageEvent),
    /// Fan-out progress over several items.
    Batch(BatchEvent),
    /// Plain output lines.
    Output(OutputEvent),
}

/// Cross-compilation events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum BuildEvent {
    /// `cargo install` is about to run for a tool/target pair.
    Started {
        /// Tool name.
        tool: String,
        /// Target triple.
        target: String,
        /// Requested version or `latest`.
        version: String,
    },
    /// A target's standard library was installed through rustup.
    TargetInstalled {
        /// Target triple.
        target: String,
        /// Whether rustup succeeded.
        success: bool,
    },
    /// A binary was copied into the output tree.
    BinaryCopied {
        /// Tool name.
        tool: String,
        /// Target triple.
        target: String,
        /// Binary file name.
        file: String,
    },
    /// The tool/target pair finished.
    Completed {
        /// Tool name.
        tool: String,
        /// Target triple.
        target: String,
        /// Whether the pair built.
        success: bool,
        /// Number of binaries copied.
        count: usize,
        /// Duration in milliseconds.
        duration_ms: u64,
        /// Failure message, if any.
        error: Option<String>,
    },
}

/// Release asset download events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum DownloadEvent {
    /// A release was chosen.
    ReleaseResolved {
        /// `owner/name` of the repository.
        repo: String,
        /// Tag of the chosen release.
        tag: String,
        /// How it was chosen.
        selector: String,
    },
    /// The transfer started.
    Started {
        /// Asset file name.
        file: String,
        /// Announced size, 0 when unknown.
        total_bytes: u64,
    },
    /// Bytes written so far.
    Progress {
        /// Asset file name.
        file: String,
        /// Bytes written.
        downloaded: u64,
        /// Announced size, 0 when unknown.
        total_bytes: u64,
        /// Whole percent done, present when the size is known.
        percent: Option<u64>,
    },
    /// The asset is on disk.
    Completed {
        /// Asset file name.
        file: String,
        /// Destination path.
        path: String,
        /// Final size in bytes.
        bytes: u64,
    },
}

impl DownloadEvent {
    /// Whole percent of `total_bytes` written, `None` when the size is unknown.
    #[must_use]
    pub fn percent(downloaded: u64, total_bytes: u64) -> Option<u64> {
        (total_bytes > 0).then(|| (downloaded.saturating_mul(100) / total_bytes).min(100))
    }
}

/// Archive, manifest and publish events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PackageEvent {
    /// An archive was written into a platform directory.
    ArchiveCreated {
        /// Tool name.
        tool: String,
        /// Target triple.
        target: String,
        /// Archive file name.
        archive: String,
        /// Number of files inside.
        count: usize,
    },
    /// The configured archive format was not available.
    FormatFallback {
        /// Tool name.
        tool: String,
        /// Format asked for in configuration.
        requested: String,
        /// Format used instead.
        format: String,
        /// Why the fallback happened.
        reason: String,
    },
    /// A tool finished packaging.
    ToolPackaged {
        /// Tool name.
        tool: String,
        /// Version recorded in the manifest.
        version: String,
        /// Number of platform directories.
        count: usize,
    },
    /// The manifest was written.
    ManifestWritten {
        /// Manifest path.
        path: String,
        /// Number of tools recorded.
        count: usize,
    },
    /// A tool was mirrored into the publish tree.
    Published {
        /// Tool name.
        tool: String,
        /// Destination directory or archive.
        path: String,
        /// Number of files mirrored.
        count: usize,
    },
}

/// Fan-out progress over several items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum BatchEvent {
    /// One item failed and the batch moves on.
    ItemFailed {
        /// Batch operation name.
        operation: String,
        /// The failed item.
        item: String,
        /// Failure message.
        error: String,
    },
    /// The batch finished.
    Completed {
        /// Batch operation name.
        operation: String,
        /// Items that succeeded.
        succeeded: usize,
        /// Items that failed.
        failed: usize,
    },
}

/// Plain output lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum OutputEvent {
    /// Line for stdout.
    Stdout {
        /// Line content.
        content: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = ForgeEvent::new(
            EventSource::new("crateforge::output"),
            EventCategory::Output(OutputEvent::Stdout {
                content: "test".to_string(),
            }),
        );

        assert!(!event.id.is_nil());
        assert_eq!(event.source.target, "crateforge::output");
    }

    #[test]
    fn test_event_serialization() {
        let event = ForgeEvent::new(
            EventSource::new("crateforge::build"),
            EventCategory::Build(BuildEvent::Started {
                tool: "flamegraph".to_string(),
                target: "x86_64-unknown-linux-gnu".to_string(),
                version: "latest".to_string(),
            }),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Build\""));
        assert!(json.contains("\"event\":\"Started\""));
        assert!(json.contains("flamegraph"));

        let parsed: ForgeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, event.id);
    }

    #[test]
    fn test_batch_event_serialization() {
        let event = BatchEvent::Completed {
            operation: "build-all".to_string(),
            succeeded: 3,
            failed: 1,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"succeeded\":3"));
        assert!(json.contains("\"failed\":1"));
    }
}
