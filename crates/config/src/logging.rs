//! Logging settings.
//!
//! The library crates only emit `tracing` events; these settings tell the
//! binary how to install a subscriber for them.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Default log filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Compact,
    /// One JSON object per line, for log aggregation.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "short" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'compact' or 'json', got '{other}'")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compact => f.write_str("compact"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Logging configuration.
///
/// # Examples
///
/// ```
/// use hubbot_config::{LogFormat, LoggingSettings};
///
/// let logging = LoggingSettings::default();
/// assert_eq!(logging.level, "info");
/// assert_eq!(logging.format, LogFormat::Compact);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive such as `info` or `hubbot_robot=debug`.
    ///
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}
