//! Supported compilation targets.
//!
//! The toolkit builds for a fixed set of four Rust target triples. Each one is
//! classified as Windows or non-Windows; the class decides the executable
//! suffix and which archive format a tool is packaged with.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform class of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformClass {
    /// Windows targets (`.exe` binaries).
    Windows,
    /// Everything else.
    NonWindows,
}

impl fmt::Display for PlatformClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::NonWindows => write!(f, "non-windows"),
        }
    }
}

/// A supported build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    /// Windows `x86_64` with the GNU toolchain
    WindowsGnuX64,
    /// Windows `x86_64` with the MSVC toolchain
    WindowsMsvcX64,
    /// Linux ARM64/aarch64
    LinuxArm64,
    /// Linux `x86_64`
    LinuxX64,
}

impl Target {
    /// Returns the Rust target triple for this target.
    #[must_use]
    pub const fn rust_triple(&self) -> &'static str {
        match self {
            Self::WindowsGnuX64 => "x86_64-pc-windows-gnu",
            Self::WindowsMsvcX64 => "x86_64-pc-windows-msvc",
            Self::LinuxArm64 => "aarch64-unknown-linux-gnu",
            Self::LinuxX64 => "x86_64-unknown-linux-gnu",
        }
    }

    /// Returns the platform class of this target.
    #[must_use]
    pub const fn class(&self) -> PlatformClass {
        match self {
            Self::WindowsGnuX64 | Self::WindowsMsvcX64 => PlatformClass::Windows,
            Self::LinuxArm64 | Self::LinuxX64 => PlatformClass::NonWindows,
        }
    }

    /// Returns `true` for Windows targets.
    #[must_use]
    pub const fn is_windows(&self) -> bool {
        matches!(self.class(), PlatformClass::Windows)
    }

    /// Executable suffix used by binaries built for this target.
    #[must_use]
    pub const fn exe_suffix(&self) -> &'static str {
        match self.class() {
            PlatformClass::Windows => ".exe",
            PlatformClass::NonWindows => "",
        }
    }

    /// Returns all supported targets, in build order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::WindowsGnuX64,
            Self::WindowsMsvcX64,
            Self::LinuxArm64,
            Self::LinuxX64,
        ]
    }

    /// Returns the supported targets of one platform class.
    #[must_use]
    pub fn of_class(class: PlatformClass) -> Vec<Self> {
        Self::all()
            .iter()
            .copied()
            .filter(|t| t.class() == class)
            .collect()
    }

    /// Parses a target from a Rust triple.
    #[must_use]
    pub fn from_rust_triple(triple: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.rust_triple() == triple)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rust_triple())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_rust_triple(s).ok_or_else(|| Error::unknown_target(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_rust_triple() {
        assert_eq!(Target::WindowsGnuX64.rust_triple(), "x86_64-pc-windows-gnu");
        assert_eq!(
            Target::WindowsMsvcX64.rust_triple(),
            "x86_64-pc-windows-msvc"
        );
        assert_eq!(Target::LinuxArm64.rust_triple(), "aarch64-unknown-linux-gnu");
        assert_eq!(Target::LinuxX64.rust_triple(), "x86_64-unknown-linux-gnu");
    }

    #[test]
    fn test_exe_suffix_follows_class() {
        assert_eq!(Target::WindowsMsvcX64.exe_suffix(), ".exe");
        assert_eq!(Target::WindowsGnuX64.exe_suffix(), ".exe");
        assert_eq!(Target::LinuxX64.exe_suffix(), "");
        assert!(!Target::LinuxArm64.is_windows());
    }

    #[test]
    fn test_of_class() {
        assert_eq!(
            Target::of_class(PlatformClass::Windows),
            vec![Target::WindowsGnuX64, Target::WindowsMsvcX64]
        );
        assert_eq!(
            Target::of_class(PlatformClass::NonWindows),
            vec![Target::LinuxArm64, Target::LinuxX64]
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "x86_64-unknown-linux-gnu".parse::<Target>().unwrap(),
            Target::LinuxX64
        );
        let err = "riscv64gc-unknown-linux-gnu".parse::<Target>().unwrap_err();
        assert!(matches!(err, Error::UnknownTarget { .. }));
    }

    #[test]
    fn test_all_round_trips_through_display() {
        for target in Target::all() {
            assert_eq!(target.to_string().parse::<Target>().unwrap(), *target);
        }
    }
}
