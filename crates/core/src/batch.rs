//! Outcome of a fan-out over several independent items.

use serde::Serialize;

/// A failed batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Item label, e.g. `flamegraph@x86_64-pc-windows-msvc`.
    pub item: String,
    /// Rendered error.
    pub error: String,
}

/// Successes and failures of one batch run.
///
/// A batch never aborts on an item failure; the report is how callers learn
/// what went wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Name of the batch operation.
    pub operation: String,
    /// Labels of items that succeeded.
    pub succeeded: Vec<String>,
    /// Items that failed.
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    /// Start an empty report.
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    /// Record a success.
    pub fn record_success(&mut self, item: impl Into<String>) {
        self.succeeded.push(item.into());
    }

    /// Record a failure.
    pub fn record_failure(&mut self, item: impl Into<String>, error: impl Into<String>) {
        self.failed.push(BatchFailure {
            item: item.into(),
            error: error.into(),
        });
    }

    /// Total number of items attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// One-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {} succeeded, {} failed ({} total)",
            self.operation,
            self.succeeded.len(),
            self.failed.len(),
            self.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let mut report = BatchReport::new("build-all");
        report.record_success("bat@x86_64-unknown-linux-gnu");
        report.record_failure("bat@x86_64-pc-windows-msvc", "linker not found");
        assert_eq!(report.total(), 2);
        assert_eq!(
            report.summary(),
            "build-all: 1 succeeded, 1 failed (2 total)"
        );
    }
}
