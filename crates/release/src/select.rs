//! File selection for archives.

use crateforge_core::ArchiveFormat;

/// Whether `name` belongs to `tool` under the name-prefix rule.
///
/// Matches files starting with `<tool>` or `cargo-<tool>`.
#[must_use]
pub fn matches_prefix(name: &str, tool: &str) -> bool {
    name.starts_with(tool) || name.starts_with(&format!("cargo-{tool}"))
}

/// Pick the files of a platform directory that go into an archive.
///
/// Existing archives are never selected. With `prefix_filtered`, only files
/// named after the tool are kept. Listing order is preserved.
#[must_use]
pub fn select_files(listing: &[String], tool: &str, prefix_filtered: bool) -> Vec<String> {
    listing
        .iter()
        .filter(|name| !ArchiveFormat::is_archive_name(name))
        .filter(|name| !prefix_filtered || matches_prefix(name, tool))
        .cloned()
        .collect()
}
