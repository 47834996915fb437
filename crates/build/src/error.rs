//! Error types for build operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for build operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a tool for a target.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Configuration, target or filesystem error from the core crate.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] crateforge_core::Error),

    /// A subprocess could not be started.
    #[error("Failed to run {program}: {source}")]
    #[diagnostic(
        code(crateforge::build::spawn),
        help("Make sure {program} is installed and on PATH")
    )]
    Spawn {
        /// The program that failed to start
        program: String,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// A subprocess exited unsuccessfully.
    #[error("`{command}` failed{}: {stderr}", exit_suffix(.code.as_ref().copied()))]
    #[diagnostic(code(crateforge::build::command_failed))]
    CommandFailed {
        /// The command line that was run
        command: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// `cargo install` succeeded but no binary could be located.
    #[error("No binaries for {tool} found in {}", .dir.display())]
    #[diagnostic(
        code(crateforge::build::no_binaries),
        help("Check that the crate installs a binary named {tool} or cargo-{tool}")
    )]
    NoBinaries {
        /// The tool that was built
        tool: String,
        /// The directory that was searched
        dir: PathBuf,
    },
}

fn exit_suffix(code: Option<i32>) -> String {
    code.map_or_else(String::new, |c| format!(" with exit code {c}"))
}

impl Error {
    /// Create a spawn error.
    #[must_use]
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Create a command failure error.
    #[must_use]
    pub fn command_failed(
        command: impl Into<String>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Create a no-binaries error.
    #[must_use]
    pub fn no_binaries(tool: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self::NoBinaries {
            tool: tool.into(),
            dir: dir.into(),
        }
    }
}
