//! Subprocess seam.
//!
//! Every external program (`rustup`, `cargo`, the built binaries) is run
//! through [`CommandRunner`] so the builder can be exercised with a fake.

use crate::{Error, Result};
use std::process::Command;

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status 0.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Turn an unsuccessful output into [`Error::CommandFailed`].
    ///
    /// # Errors
    ///
    /// Returns an error when the process did not succeed.
    pub fn check(self, program: &str, args: &[String]) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(Error::command_failed(
                display_command(program, args),
                self.code,
                self.stderr.trim(),
            ))
        }
    }
}

/// Runs external programs to completion.
pub trait CommandRunner {
    /// Run `program` with `args` and capture its output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] when the program cannot be started. A
    /// non-zero exit is not an error at this level.
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        tracing::debug!(command = %display_command(program, args), "Running subprocess");

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| Error::spawn(program, e))?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Render a command line for messages.
#[must_use]
pub fn display_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}
