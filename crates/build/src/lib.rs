//! Cross-compilation of crates.io tools.
//!
//! For every tool/target pair the [`Builder`] adds the rustup target, runs
//! `cargo install --target`, finds the produced binaries in the cargo bin
//! directory and copies them into the output tree together with a version
//! sidecar. All subprocesses go through a [`CommandRunner`].

pub mod builder;
pub mod cargo;
pub mod discovery;
pub mod error;
pub mod runner;
pub mod toolchain;

pub use builder::{BuildOutcome, Builder};
pub use discovery::discover_binaries;
pub use error::{Error, Result};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use toolchain::install_all_targets;
