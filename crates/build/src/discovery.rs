//! Binary discovery in the cargo bin directory.
//!
//! [`discover_binaries`] is a pure function over a directory listing so the
//! matching rules can be tested without touching the filesystem.

use crateforge_core::Target;
use std::path::Path;

/// Extensions that are never binaries.
const SKIPPED_EXTENSIONS: &[&str] = &["d", "pdb"];

/// The cargo-prefixed name of a tool (`cargo-<tool>`).
#[must_use]
pub fn cargo_prefixed(tool: &str) -> String {
    format!("cargo-{tool}")
}

/// Pick the binaries `cargo install` produced for `tool`.
///
/// Exact names (`<tool><suffix>`, `cargo-<tool><suffix>`) win. When neither
/// is present, any file that equals one of the two names once the target's
/// own executable suffix is stripped is taken, skipping `.d` and `.pdb`
/// files. Results keep listing order for the
/// fallback and exact-name order otherwise.
#[must_use]
pub fn discover_binaries(listing: &[String], tool: &str, target: Target) -> Vec<String> {
    let suffix = target.exe_suffix();
    let prefixed = cargo_prefixed(tool);

    let exact: Vec<String> = [format!("{tool}{suffix}"), format!("{prefixed}{suffix}")]
        .into_iter()
        .filter(|name| listing.contains(name))
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    listing
        .iter()
        .filter(|name| {
            let path = Path::new(name.as_str());
            let skipped = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| SKIPPED_EXTENSIONS.contains(&ext));
            if skipped {
                return false;
            }
            let base = name.strip_suffix(suffix).unwrap_or(name.as_str());
            base == tool || base == prefixed
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_exact_names_for_windows() {
        let files = listing(&[
            "cargo-flamegraph.exe",
            "flamegraph.exe",
            "flamegraph.pdb",
            "rg",
        ]);
        assert_eq!(
            discover_binaries(&files, "flamegraph", Target::WindowsMsvcX64),
            vec!["flamegraph.exe", "cargo-flamegraph.exe"]
        );
    }

    #[test]
    fn test_exact_names_for_linux() {
        let files = listing(&["flamegraph", "flamegraph.exe", "cargo-audit"]);
        assert_eq!(
            discover_binaries(&files, "flamegraph", Target::LinuxX64),
            vec!["flamegraph"]
        );
        assert_eq!(
            discover_binaries(&files, "audit", Target::LinuxArm64),
            vec!["cargo-audit"]
        );
    }

    #[test]
    fn test_fallback_strips_only_target_suffix() {
        let files = listing(&["bat.d", "bat.exe", "bat.pdb", "batcat"]);
        assert!(discover_binaries(&files, "bat", Target::LinuxX64).is_empty());
        assert_eq!(
            discover_binaries(&files, "bat", Target::WindowsGnuX64),
            vec!["bat.exe"]
        );
    }

    #[test]
    fn test_nothing_found() {
        let files = listing(&["rg", "fd"]);
        assert!(discover_binaries(&files, "bat", Target::LinuxX64).is_empty());
    }
}
