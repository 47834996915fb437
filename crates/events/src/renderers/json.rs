//! JSON renderer for crateforge events.
//!
//! Renders events as JSON lines for machine consumption.
//! This module is allowed to use eprintln! as it's the output layer.

#![allow(clippy::print_stderr)]

use crate::EventSink;
use crate::event::ForgeEvent;

/// JSON renderer that outputs events as JSON lines on stderr.
///
/// Stdout stays reserved for the command's result envelope.
#[derive(Debug, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    /// Create a new JSON renderer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Serialize a single event as one compact line.
    #[must_use]
    pub fn to_line(event: &ForgeEvent) -> Option<String> {
        serde_json::to_string(event).ok()
    }
}

impl EventSink for JsonRenderer {
    fn handle(&self, event: &ForgeEvent) {
        if let Some(json) = Self::to_line(event) {
            eprintln!("{json}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{BatchEvent, DownloadEvent, EventCategory, EventSource};

    #[test]
    fn test_compact_line_is_single_line() {
        let event = ForgeEvent::new(
            EventSource::new("crateforge::batch"),
            EventCategory::Batch(BatchEvent::Completed {
                operation: "download".to_string(),
                succeeded: 2,
                failed: 0,
            }),
        );
        let line = JsonRenderer::to_line(&event).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains("\"operation\":\"download\""));
    }

    #[test]
    fn test_progress_line_carries_percent() {
        let event = ForgeEvent::new(
            EventSource::new("crateforge::download"),
            EventCategory::Download(DownloadEvent::Progress {
                file: "a.vsix".to_string(),
                downloaded: 30,
                total_bytes: 120,
                percent: DownloadEvent::percent(30, 120),
            }),
        );
        let line = JsonRenderer::to_line(&event).unwrap();
        assert!(line.contains("\"percent\":25"));
        assert!(line.contains("\"total_bytes\":120"));
    }
}
