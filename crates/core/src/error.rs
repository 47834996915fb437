//! Error types shared by every crateforge component.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading configuration or touching the output tree.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A configuration file does not exist.
    #[error("Configuration file not found: {}", .path.display())]
    #[diagnostic(
        code(crateforge::core::config_missing),
        help("Create the file or point --config-dir at the directory that contains it")
    )]
    ConfigNotFound {
        /// The path that was looked up
        path: PathBuf,
    },

    /// A configuration file exists but could not be parsed.
    #[error("Invalid configuration in {}: {message}", .path.display())]
    #[diagnostic(code(crateforge::core::config_parse))]
    ConfigParse {
        /// The offending file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Generic configuration problem.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(crateforge::core::config))]
    Configuration {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },

    /// The tool is not a key of the tool table.
    #[error("Tool '{name}' is not defined in tools.toml")]
    #[diagnostic(
        code(crateforge::core::unknown_tool),
        help("Add it with `crateforge add-tool {name}`")
    )]
    UnknownTool {
        /// The tool name that was requested
        name: String,
    },

    /// The platform is not one of the supported target triples.
    #[error("Invalid target platform '{triple}'")]
    #[diagnostic(
        code(crateforge::core::unknown_target),
        help(
            "Valid targets: x86_64-pc-windows-gnu, x86_64-pc-windows-msvc, aarch64-unknown-linux-gnu, x86_64-unknown-linux-gnu"
        )
    )]
    UnknownTarget {
        /// The rejected triple
        triple: String,
    },

    /// Unknown archive format name.
    #[error("Unknown archive format '{name}'")]
    #[diagnostic(
        code(crateforge::core::unknown_format),
        help("Valid formats: zip, 7z, tar.gz, tar.xz, tar.bz2")
    )]
    UnknownArchiveFormat {
        /// The rejected format string
        name: String,
    },

    /// I/O failure with context.
    #[error("I/O {operation} failed{}: {source}", display_path(.path.as_deref()))]
    #[diagnostic(code(crateforge::core::io))]
    Io {
        /// The underlying error
        #[source]
        source: std::io::Error,
        /// The path involved, if any
        path: Option<PathBuf>,
        /// What was being attempted
        operation: String,
    },
}

fn display_path(path: Option<&Path>) -> String {
    path.map_or_else(String::new, |p| format!(" on {}", p.display()))
}

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text.
    #[must_use]
    pub fn configuration_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a parse error for a configuration file.
    #[must_use]
    pub fn config_parse(path: &Path, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an unknown-tool error.
    #[must_use]
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool { name: name.into() }
    }

    /// Create an unknown-target error.
    #[must_use]
    pub fn unknown_target(triple: impl Into<String>) -> Self {
        Self::UnknownTarget {
            triple: triple.into(),
        }
    }

    /// Wrap an I/O error with the operation and path.
    #[must_use]
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: Option<&Path>) -> Self {
        Self::Io {
            source,
            path: path.map(Path::to_path_buf),
            operation: operation.into(),
        }
    }

    /// Whether this error belongs to the fatal configuration class.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigParse { .. } | Self::Configuration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_display() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from("config/tools.toml"),
        };
        assert_eq!(
            err.to_string(),
            "Configuration file not found: config/tools.toml"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unknown_tool() {
        let err = Error::unknown_tool("ripgrep");
        assert!(err.to_string().contains("ripgrep"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_io_error_with_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::io(io, "read", Some(Path::new("dist/x")));
        assert_eq!(err.to_string(), "I/O read failed on dist/x: gone");
    }

    #[test]
    fn test_io_error_without_path() {
        let io = std::io::Error::other("boom");
        let err = Error::io(io, "copy", None);
        assert_eq!(err.to_string(), "I/O copy failed: boom");
    }
}
