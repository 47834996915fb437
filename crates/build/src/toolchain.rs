//! rustup target management.

use crate::Result;
use crate::runner::{CommandOutput, CommandRunner};
use crateforge_core::Target;

/// Run `rustup target add <triple>`.
///
/// This step is best effort: callers may ignore a failure because the
/// following `cargo install` fails loudly when the target is unusable.
///
/// # Errors
///
/// Returns an error when rustup cannot be started or exits unsuccessfully.
pub fn add_target<R: CommandRunner>(runner: &R, target: Target) -> Result<CommandOutput> {
    let args = vec![
        "target".to_string(),
        "add".to_string(),
        target.rust_triple().to_string(),
    ];
    runner.run("rustup", &args)?.check("rustup", &args)
}

/// Add a target and report the outcome as an event, ignoring failure.
pub fn ensure_target<R: CommandRunner>(runner: &R, target: Target) -> bool {
    match add_target(runner, target) {
        Ok(_) => {
            crateforge_events::emit_target_installed!(target, true);
            true
        }
        Err(e) => {
            tracing::debug!(%target, error = %e, "rustup target add failed, continuing");
            crateforge_events::emit_target_installed!(target, false);
            false
        }
    }
}

/// Add every supported target. Returns the targets rustup accepted.
pub fn install_all_targets<R: CommandRunner>(runner: &R) -> Vec<Target> {
    Target::all()
        .iter()
        .copied()
        .filter(|target| ensure_target(runner, *target))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::RefCell;

    struct Recorder {
        calls: RefCell<Vec<Vec<String>>>,
        fail_on: &'static str,
    }

    impl CommandRunner for Recorder {
        fn run(&self, _program: &str, args: &[String]) -> Result<CommandOutput> {
            self.calls.borrow_mut().push(args.to_vec());
            Ok(CommandOutput {
                success: !args.iter().any(|a| a == self.fail_on),
                code: Some(0),
                ..CommandOutput::default()
            })
        }
    }

    #[test]
    fn test_add_target_args() {
        let runner = Recorder {
            calls: RefCell::new(Vec::new()),
            fail_on: "",
        };
        add_target(&runner, Target::LinuxArm64).unwrap();
        assert_eq!(
            runner.calls.borrow()[0],
            vec!["target", "add", "aarch64-unknown-linux-gnu"]
        );
    }

    #[test]
    fn test_install_all_targets_ignores_failures() {
        let runner = Recorder {
            calls: RefCell::new(Vec::new()),
            fail_on: "x86_64-pc-windows-msvc",
        };
        let installed = install_all_targets(&runner);
        assert_eq!(runner.calls.borrow().len(), 4);
        assert_eq!(installed.len(), 3);
        assert!(!installed.contains(&Target::WindowsMsvcX64));
    }

    #[test]
    fn test_add_target_failure_is_reported() {
        let runner = Recorder {
            calls: RefCell::new(Vec::new()),
            fail_on: "x86_64-unknown-linux-gnu",
        };
        let err = add_target(&runner, Target::LinuxX64).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }
}
