//! `cargo install` invocation and installed-version probing.

use crate::Result;
use crate::discovery::cargo_prefixed;
use crate::runner::CommandRunner;
use crateforge_core::Target;
use std::path::Path;

/// Version reported when no probe succeeds.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Arguments for `cargo install --target <triple> [--version <v>] <tool> --force`.
#[must_use]
pub fn install_args(tool: &str, target: Target, version_pin: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "install".to_string(),
        "--target".to_string(),
        target.rust_triple().to_string(),
    ];
    if let Some(version) = version_pin {
        args.push("--version".to_string());
        args.push(version.to_string());
    }
    args.push(tool.to_string());
    args.push("--force".to_string());
    args
}

/// Run `cargo install` for one tool/target pair.
///
/// # Errors
///
/// Returns an error when cargo cannot be started or exits unsuccessfully.
pub fn install<R: CommandRunner>(
    runner: &R,
    tool: &str,
    target: Target,
    version_pin: Option<&str>,
) -> Result<()> {
    let args = install_args(tool, target, version_pin);
    runner.run("cargo", &args)?.check("cargo", &args)?;
    Ok(())
}

/// Prefix `v` unless already present.
#[must_use]
pub fn normalize_version(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// Find a tool's version in `cargo install --list` output.
///
/// Package lines look like `flamegraph v0.6.5:`; binary lines underneath are
/// indented and ignored.
#[must_use]
pub fn parse_install_list(listing: &str, tool: &str) -> Option<String> {
    let plain = format!("{tool} ");
    let prefixed = format!("{} ", cargo_prefixed(tool));

    listing
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(&plain) || line.starts_with(&prefixed))
        .and_then(|line| line.split_whitespace().nth(1))
        .map(|version| normalize_version(version.trim_end_matches(':')))
}

/// Take the version from `<binary> --version` output (last token).
#[must_use]
pub fn parse_version_output(output: &str) -> Option<String> {
    let parts: Vec<&str> = output.split_whitespace().collect();
    if parts.len() < 2 {
        return None;
    }
    parts.last().map(|v| normalize_version(v))
}

/// Determine the version that was actually installed.
///
/// Tries `cargo install --list` first, then runs the installed binary with
/// `--version` (Windows name first). Falls back to [`UNKNOWN_VERSION`].
pub fn installed_version<R: CommandRunner>(runner: &R, bin_dir: &Path, tool: &str) -> String {
    let list_args = vec!["install".to_string(), "--list".to_string()];
    if let Ok(output) = runner.run("cargo", &list_args)
        && output.success
        && let Some(version) = parse_install_list(&output.stdout, tool)
    {
        return version;
    }

    let prefixed = cargo_prefixed(tool);
    for suffix in [".exe", ""] {
        let plain = bin_dir.join(format!("{tool}{suffix}"));
        let binary = if plain.exists() {
            plain
        } else {
            bin_dir.join(format!("{prefixed}{suffix}"))
        };
        if !binary.exists() {
            continue;
        }

        let program = binary.to_string_lossy();
        match runner.run(&program, &["--version".to_string()]) {
            Ok(output) if output.success => {
                if let Some(version) = parse_version_output(&output.stdout) {
                    return version;
                }
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(binary = %program, error = %e, "Version probe failed"),
        }
    }

    UNKNOWN_VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use tempfile::TempDir;

    const LISTING: &str = "\
cargo-audit v0.21.0:
    cargo-audit
flamegraph v0.6.5:
    cargo-flamegraph
    flamegraph
ripgrep 14.1.0:
    rg
";

    #[test]
    fn test_install_args_latest() {
        assert_eq!(
            install_args("bat", Target::LinuxX64, None),
            vec!["install", "--target", "x86_64-unknown-linux-gnu", "bat", "--force"]
        );
    }

    #[test]
    fn test_install_args_pinned() {
        assert_eq!(
            install_args("bat", Target::WindowsGnuX64, Some("0.24.0")),
            vec![
                "install",
                "--target",
                "x86_64-pc-windows-gnu",
                "--version",
                "0.24.0",
                "bat",
                "--force"
            ]
        );
    }

    #[test]
    fn test_parse_install_list() {
        assert_eq!(
            parse_install_list(LISTING, "flamegraph").as_deref(),
            Some("v0.6.5")
        );
        assert_eq!(
            parse_install_list(LISTING, "audit").as_deref(),
            Some("v0.21.0")
        );
        assert_eq!(
            parse_install_list(LISTING, "ripgrep").as_deref(),
            Some("v14.1.0")
        );
        assert_eq!(parse_install_list(LISTING, "rg"), None);
    }

    #[test]
    fn test_parse_version_output() {
        assert_eq!(
            parse_version_output("bat 0.24.0\n").as_deref(),
            Some("v0.24.0")
        );
        assert_eq!(parse_version_output("0.24.0"), None);
    }

    struct ListFails;

    impl CommandRunner for ListFails {
        fn run(&self, program: &str, _args: &[String]) -> Result<CommandOutput> {
            if program == "cargo" {
                return Ok(CommandOutput::default());
            }
            Ok(CommandOutput {
                success: true,
                code: Some(0),
                stdout: "tool v1.2.3".to_string(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn test_installed_version_falls_back_to_binary() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("cargo-tool"), "").unwrap();
        assert_eq!(installed_version(&ListFails, temp.path(), "tool"), "v1.2.3");
    }

    #[test]
    fn test_installed_version_unknown() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            installed_version(&ListFails, temp.path(), "tool"),
            UNKNOWN_VERSION
        );
    }
}
