//! Tracing setup for the crateforge CLI
//!
//! Two layers share one registry: the event layer turns `crateforge::*`
//! events into rendered output at every level, and an `EnvFilter`-controlled
//! fmt layer writes diagnostic logs to stderr.

use crateforge_events::{CliRenderer, CliRendererConfig, EventSink, ForgeEventLayer, JsonRenderer};
use std::io;
use std::sync::Arc;
pub use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, FilterExt, filter_fn};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Prefix of the event targets handled by the event layer.
const EVENT_TARGET_PREFIX: &str = "crateforge::";

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Show all logs (trace level)
    Trace,
    /// Show debug and above
    Debug,
    /// Show info and above
    Info,
    /// Show warnings and above (default)
    Warn,
    /// Show errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level of the diagnostic log layer
    pub level: Level,
    /// Render events as JSON lines
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json: false,
        }
    }
}

/// Build the diagnostic filter: `RUST_LOG` when set, otherwise `level` for
/// the crateforge crates.
fn diagnostic_filter(level: Level) -> Result<EnvFilter, String> {
    EnvFilter::try_from_default_env()
        .or_else(|_| {
            let level = level.as_str().to_lowercase();
            EnvFilter::try_new(format!(
                "warn,crateforge={level},crateforge_core={level},crateforge_build={level},\
                 crateforge_release={level},crateforge_github={level}"
            ))
        })
        .map_err(|e| format!("Failed to create tracing filter: {e}"))
}

/// Initialize tracing with event rendering.
///
/// # Errors
///
/// Returns an error if the filter cannot be built or a global subscriber is
/// already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), String> {
    let sink: Arc<dyn EventSink> = if config.json {
        Arc::new(JsonRenderer::new())
    } else {
        Arc::new(CliRenderer::with_config(CliRendererConfig {
            verbose: config.level >= Level::DEBUG,
            ..CliRendererConfig::default()
        }))
    };

    // Events are rendered by the event layer; keep them out of the log output.
    let not_events =
        filter_fn(|meta: &tracing::Metadata<'_>| !meta.target().starts_with(EVENT_TARGET_PREFIX));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_target(true)
        .with_filter(diagnostic_filter(config.level)?.and(not_events));

    tracing_subscriber::registry()
        .with(ForgeEventLayer::new(sink))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| format!("Failed to install tracing subscriber: {e}"))?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        json = config.json,
        "Tracing initialized"
    );
    Ok(())
}
