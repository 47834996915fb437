//! crateforge command-line application.
//!
//! The binary is a thin wrapper around [`run`]: parse arguments, install the
//! tracing subscriber with the event renderer, execute the command and map
//! the result to an exit code.

pub mod cli;
pub mod commands;
pub mod tracing;

use crate::cli::{Cli, CliError, EXIT_OK, OkEnvelope, exit_code_for, render_error};
use crate::commands::{Context, Outcome, execute};
use crate::tracing::{TracingConfig, init_tracing};

/// Run a parsed command line and return the process exit code.
#[allow(clippy::print_stdout, clippy::print_stderr)]
#[must_use]
pub fn run(cli: &Cli) -> i32 {
    let config = TracingConfig {
        level: cli.level.into(),
        json: cli.json,
    };
    if let Err(e) = init_tracing(&config) {
        // The subscriber is not available, so this goes straight to stderr.
        eprintln!("{e}");
    }

    match run_command(cli) {
        Ok(outcome) => {
            print_outcome(&outcome, cli.json);
            EXIT_OK
        }
        Err(err) => {
            render_error(&err, cli.json);
            exit_code_for(&err)
        }
    }
}

fn run_command(cli: &Cli) -> Result<Outcome, CliError> {
    let ctx = Context::from_paths(&cli.paths)?;
    execute(&cli.command, &ctx)
}

#[allow(clippy::print_stdout)]
fn print_outcome(outcome: &Outcome, json_mode: bool) {
    if json_mode {
        match serde_json::to_string(&OkEnvelope::new(&outcome.data)) {
            Ok(json) => println!("{json}"),
            Err(e) => ::tracing::error!(error = %e, "Failed to serialize result"),
        }
    } else if !outcome.text.is_empty() {
        crateforge_events::emit_stdout!(outcome.text);
    }
}
