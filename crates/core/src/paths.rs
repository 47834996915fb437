//! Well-known locations outside the project directory.
//!
//! Supports environment overrides:
//! - `CARGO_HOME` - cargo's home; binaries live in `$CARGO_HOME/bin`

use crate::{Error, Result};
use std::path::PathBuf;

/// Directory `cargo install` places binaries in.
///
/// Resolution order:
/// 1. `$CARGO_HOME/bin`
/// 2. `~/.cargo/bin`
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn cargo_bin_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CARGO_HOME")
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir).join("bin"));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| Error::configuration("Could not determine home directory"))?;
    Ok(home.join(".cargo").join("bin"))
}
