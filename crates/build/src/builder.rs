//! The build primitive and its fan-outs.
//!
//! [`Builder::build`] handles one tool/target pair end to end. The fan-out
//! methods iterate it with per-pair isolation: a failing pair is reported
//! and the batch moves on.

use crate::cargo::{install, installed_version};
use crate::discovery::discover_binaries;
use crate::runner::CommandRunner;
use crate::toolchain::ensure_target;
use crate::{Error, Result};
use crateforge_core::{BatchReport, PlatformClass, Settings, Target, ToolsConfig};
use crateforge_events::{
    emit_batch_completed, emit_batch_item_failed, emit_binary_copied, emit_build_completed,
    emit_build_started,
};
use std::time::Instant;

/// What a successful build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Tool name.
    pub tool: String,
    /// Target built for.
    pub target: Target,
    /// Binary file names copied into the output tree.
    pub binaries: Vec<String>,
    /// Version written to the sidecar file.
    pub version: String,
}

/// Builds configured tools for the supported targets.
pub struct Builder<'a, R> {
    settings: &'a Settings,
    tools: &'a ToolsConfig,
    runner: R,
}

impl<'a, R: CommandRunner> Builder<'a, R> {
    /// Create a builder over a loaded tool table.
    pub fn new(settings: &'a Settings, tools: &'a ToolsConfig, runner: R) -> Self {
        Self {
            settings,
            tools,
            runner,
        }
    }

    /// Build one tool for one platform given by its triple.
    ///
    /// # Errors
    ///
    /// Returns an error when the tool is not configured, the platform is not
    /// supported, `cargo install` fails, no binary is found or copying fails.
    pub fn build(&self, tool: &str, platform: &str) -> Result<BuildOutcome> {
        let entry = self.tools.tool(tool)?;
        let target: Target = platform.parse()?;

        emit_build_started!(tool, target, entry.version);
        let started = Instant::now();

        let result = self.build_pair(tool, target, entry.version_pin());
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(outcome) => {
                emit_build_completed!(tool, target, true, outcome.binaries.len(), duration_ms);
            }
            Err(e) => emit_build_completed!(tool, target, false, 0_usize, duration_ms, e),
        }
        result
    }

    fn build_pair(
        &self,
        tool: &str,
        target: Target,
        version_pin: Option<&str>,
    ) -> Result<BuildOutcome> {
        // Best effort; cargo install reports an unusable target itself.
        ensure_target(&self.runner, target);

        install(&self.runner, tool, target, version_pin)?;

        let bin_dir = &self.settings.cargo_bin_dir;
        let listing = crateforge_core::fs::list_files(bin_dir)?;
        let binaries = discover_binaries(&listing, tool, target);
        if binaries.is_empty() {
            return Err(Error::no_binaries(tool, bin_dir));
        }

        let out_dir = self.settings.target_dir(tool, target);
        for binary in &binaries {
            crateforge_core::fs::copy_preserving(&bin_dir.join(binary), &out_dir.join(binary))?;
            emit_binary_copied!(tool, target, binary);
        }

        let version = installed_version(&self.runner, bin_dir, tool);
        let version_file = self.settings.version_file(tool);
        std::fs::write(&version_file, &version).map_err(|e| {
            crateforge_core::Error::io(e, "write", Some(version_file.as_path()))
        })?;
        tracing::debug!(tool, %target, %version, "Recorded installed version");

        Ok(BuildOutcome {
            tool: tool.to_string(),
            target,
            binaries,
            version,
        })
    }

    /// Build arbitrary tool/platform pairs, isolating failures.
    pub fn build_pairs<I, T, P>(&self, operation: &str, pairs: I) -> BatchReport
    where
        I: IntoIterator<Item = (T, P)>,
        T: AsRef<str>,
        P: AsRef<str>,
    {
        let mut report = BatchReport::new(operation);
        for (tool, platform) in pairs {
            let (tool, platform) = (tool.as_ref(), platform.as_ref());
            let label = format!("{tool}@{platform}");
            match self.build(tool, platform) {
                Ok(_) => report.record_success(label),
                Err(e) => {
                    emit_batch_item_failed!(operation, label, e);
                    report.record_failure(label, e.to_string());
                }
            }
        }
        emit_batch_completed!(operation, report.succeeded.len(), report.failed.len());
        report
    }

    /// Every configured tool for the given targets.
    fn build_matrix(&self, operation: &str, targets: &[Target]) -> BatchReport {
        let pairs: Vec<(&str, &str)> = self
            .tools
            .tool_names()
            .flat_map(|tool| targets.iter().map(move |t| (tool, t.rust_triple())))
            .collect();
        self.build_pairs(operation, pairs)
    }

    /// All tools for all four targets.
    pub fn build_all(&self) -> BatchReport {
        self.build_matrix("build-all", Target::all())
    }

    /// All tools for the targets of one platform class.
    pub fn build_class(&self, class: PlatformClass) -> BatchReport {
        let operation = match class {
            PlatformClass::Windows => "build-windows",
            PlatformClass::NonWindows => "build-non-windows",
        };
        self.build_matrix(operation, &Target::of_class(class))
    }

    /// One tool for all four targets.
    ///
    /// # Errors
    ///
    /// Returns an error up front when the tool is not configured.
    pub fn build_tool(&self, tool: &str) -> Result<BatchReport> {
        self.tools.tool(tool)?;
        let pairs = Target::all().iter().map(|t| (tool, t.rust_triple()));
        Ok(self.build_pairs("build-tool", pairs))
    }

    /// All tools for one platform.
    ///
    /// # Errors
    ///
    /// Returns an error up front when the platform is not supported.
    pub fn build_target(&self, platform: &str) -> Result<BatchReport> {
        let target: Target = platform.parse()?;
        Ok(self.build_matrix("build-target", &[target]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Pretends to be rustup and cargo: `cargo install` drops the configured
    /// binaries into the bin directory.
    struct FakeCargo {
        bin_dir: PathBuf,
        produces: Vec<&'static str>,
        fail_target: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeCargo {
        fn new(bin_dir: &Path, produces: Vec<&'static str>) -> Self {
            Self {
                bin_dir: bin_dir.to_path_buf(),
                produces,
                fail_target: None,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for FakeCargo {
        fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
            self.calls
                .borrow_mut()
                .push(format!("{program} {}", args.join(" ")));
            let ok = CommandOutput {
                success: true,
                code: Some(0),
                ..CommandOutput::default()
            };
            match (program, args.first().map(String::as_str)) {
                ("cargo", Some("install")) if args.iter().any(|a| a == "--list") => {
                    Ok(CommandOutput {
                        stdout: "flamegraph v0.6.5:\n    flamegraph\n".to_string(),
                        ..ok
                    })
                }
                ("cargo", Some("install")) => {
                    if let Some(bad) = self.fail_target
                        && args.iter().any(|a| a == bad)
                    {
                        return Ok(CommandOutput {
                            success: false,
                            code: Some(101),
                            stderr: "error: linker `link.exe` not found".to_string(),
                            ..CommandOutput::default()
                        });
                    }
                    std::fs::create_dir_all(&self.bin_dir).unwrap();
                    for name in &self.produces {
                        std::fs::write(self.bin_dir.join(name), b"bin").unwrap();
                    }
                    Ok(ok)
                }
                _ => Ok(ok),
            }
        }
    }

    fn setup() -> (TempDir, Settings, ToolsConfig) {
        let temp = TempDir::new().unwrap();
        let settings = Settings::new(temp.path().join("cargo-bin"))
            .with_dist_dir(temp.path().join("dist"));
        let tools =
            ToolsConfig::from_toml_str("[tools.flamegraph]\nversion = \"0.6.5\"\n").unwrap();
        (temp, settings, tools)
    }

    #[test]
    fn test_build_copies_binaries_and_version() {
        let (_temp, settings, tools) = setup();
        let runner = FakeCargo::new(
            &settings.cargo_bin_dir,
            vec!["flamegraph", "cargo-flamegraph", "flamegraph.d"],
        );
        let builder = Builder::new(&settings, &tools, &runner);

        let outcome = builder
            .build("flamegraph", "x86_64-unknown-linux-gnu")
            .unwrap();

        assert_eq!(outcome.binaries, vec!["flamegraph", "cargo-flamegraph"]);
        assert_eq!(outcome.version, "v0.6.5");
        let out = settings.target_dir("flamegraph", Target::LinuxX64);
        assert!(out.join("flamegraph").is_file());
        assert!(out.join("cargo-flamegraph").is_file());
        assert!(!out.join("flamegraph.d").exists());
        assert_eq!(
            std::fs::read_to_string(settings.version_file("flamegraph")).unwrap(),
            "v0.6.5"
        );

        let calls = runner.calls.borrow();
        assert_eq!(calls[0], "rustup target add x86_64-unknown-linux-gnu");
        assert_eq!(
            calls[1],
            "cargo install --target x86_64-unknown-linux-gnu --version 0.6.5 flamegraph --force"
        );
    }

    #[test]
    fn test_build_rejects_unknown_tool_and_target() {
        let (_temp, settings, tools) = setup();
        let runner = FakeCargo::new(&settings.cargo_bin_dir, vec![]);
        let builder = Builder::new(&settings, &tools, &runner);

        assert!(matches!(
            builder.build("ripgrep", "x86_64-unknown-linux-gnu"),
            Err(Error::Core(crateforge_core::Error::UnknownTool { .. }))
        ));
        assert!(matches!(
            builder.build("flamegraph", "riscv64gc-unknown-linux-gnu"),
            Err(Error::Core(crateforge_core::Error::UnknownTarget { .. }))
        ));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_build_without_binaries_fails() {
        let (_temp, settings, tools) = setup();
        let runner = FakeCargo::new(&settings.cargo_bin_dir, vec!["unrelated"]);
        let builder = Builder::new(&settings, &tools, &runner);

        let err = builder
            .build("flamegraph", "x86_64-unknown-linux-gnu")
            .unwrap_err();
        assert!(matches!(err, Error::NoBinaries { .. }));
    }

    #[test]
    fn test_batch_with_one_invalid_platform_continues() {
        let (_temp, settings, tools) = setup();
        let runner = FakeCargo::new(&settings.cargo_bin_dir, vec!["flamegraph", "flamegraph.exe"]);
        let builder = Builder::new(&settings, &tools, &runner);

        let report = builder.build_pairs(
            "build-tool",
            [
                ("flamegraph", "x86_64-pc-windows-gnu"),
                ("flamegraph", "sparc-sun-solaris"),
                ("flamegraph", "aarch64-unknown-linux-gnu"),
                ("flamegraph", "x86_64-unknown-linux-gnu"),
            ],
        );

        assert_eq!(report.succeeded.len(), 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].item, "flamegraph@sparc-sun-solaris");
        for target in [Target::WindowsGnuX64, Target::LinuxArm64, Target::LinuxX64] {
            assert!(settings.target_dir("flamegraph", target).is_dir());
        }
    }

    #[test]
    fn test_build_class_isolates_failing_target() {
        let (_temp, settings, tools) = setup();
        let mut runner = FakeCargo::new(&settings.cargo_bin_dir, vec!["flamegraph.exe"]);
        runner.fail_target = Some("x86_64-pc-windows-msvc");
        let builder = Builder::new(&settings, &tools, &runner);

        let report = builder.build_class(PlatformClass::Windows);
        assert_eq!(report.operation, "build-windows");
        assert_eq!(report.succeeded, vec!["flamegraph@x86_64-pc-windows-gnu"]);
        assert!(report.failed[0].error.contains("link.exe"));
    }

    #[test]
    fn test_fan_outs_validate_up_front() {
        let (_temp, settings, tools) = setup();
        let runner = FakeCargo::new(&settings.cargo_bin_dir, vec![]);
        let builder = Builder::new(&settings, &tools, &runner);

        assert!(builder.build_tool("ripgrep").is_err());
        assert!(builder.build_target("x86_64-apple-darwin").is_err());
        assert!(runner.calls.borrow().is_empty());
    }
}
