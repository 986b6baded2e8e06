//! Logging configuration and initialization
//!
//! The protocol reports what it does through the `tracing` crate: request
//! creation and parsed batches at `debug`, rejected input at `warn`. This
//! module installs a `tracing-subscriber` pipeline so those events end up
//! somewhere useful.
//!
//! Libraries embedding the protocol usually install their own subscriber and
//! never call [`init_logging`]. It exists for binaries and tests that want a
//! sensible default.
//!
//! # Usage Pattern
//!
//! ```rust,no_run
//! use jrpc_core::{LogConfig, LogFormat};
//!
//! let config = LogConfig::default()
//!     .with_level("jrpc_core=debug")
//!     .with_format(LogFormat::Text);
//!
//! jrpc_core::init_logging(config).expect("Failed to init logging");
//! tracing::info!("Application started");
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (e.g. "info", "jrpc_core=debug"). When set
//!   it takes precedence over the configured level.
//! - `JRPC_LOG_FORMAT`: "json" or "text" (defaults to "json")

use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Human readable lines
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" | "plain" => Ok(LogFormat::Text),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// Logging configuration
///
/// # Defaults
///
/// - Level: `$RUST_LOG` or "info"
/// - Format: `$JRPC_LOG_FORMAT` or JSON
/// - Target, thread ids and line numbers are included
///
/// # Examples
///
/// ```rust
/// use jrpc_core::{LogConfig, LogFormat};
///
/// let config = LogConfig::default()
///     .with_level("debug")
///     .with_format(LogFormat::Text)
///     .with_thread_ids(false);
///
/// assert_eq!(config.level, "debug");
/// ```
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directives used when `RUST_LOG` is not set
    pub level: String,

    /// Output format
    pub format: LogFormat,

    /// Include the module path of each event
    pub with_target: bool,

    /// Include the emitting thread id
    pub with_thread_ids: bool,

    /// Include the source line number
    pub with_line_number: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            format: std::env::var("JRPC_LOG_FORMAT")
                .ok()
                .and_then(|f| f.parse().ok())
                .unwrap_or_default(),
            with_target: true,
            with_thread_ids: true,
            with_line_number: true,
        }
    }
}

impl LogConfig {
    /// Set the filter directives
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the output format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Include or omit the module path
    pub fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }

    /// Include or omit thread ids
    pub fn with_thread_ids(mut self, enable: bool) -> Self {
        self.with_thread_ids = enable;
        self
    }

    /// Include or omit line numbers
    pub fn with_line_number(mut self, enable: bool) -> Self {
        self.with_line_number = enable;
        self
    }
}

/// Install a global `tracing` subscriber
///
/// The subscriber is an [`EnvFilter`] built from `RUST_LOG` (falling back to
/// `config.level`) plus a fmt layer in the configured format.
///
/// # Errors
///
/// - The filter directives do not parse
/// - A global subscriber is already installed (only the first call wins)
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_line_number(config.with_line_number)
                .json();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_line_number(config.with_line_number);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    tracing::debug!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}
