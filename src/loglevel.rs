use std::{fmt, str::FromStr};

use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{filter::EnvFilter, reload, Registry};

/// Runtime log level of the service, adjustable through the device's
/// `log-level` property and persisted across restarts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// All levels as a homie enum format string.
    pub fn enum_format() -> String {
        Self::ALL.iter().map(|level| level.as_str()).collect::<Vec<_>>().join(",")
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a log level: '{0}'")]
pub struct ParseLogLevelError(String);

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(ParseLogLevelError(other.to_string())),
        }
    }
}

/// Swaps the process wide env filter, so a level change takes effect without
/// a restart.
pub struct LogLevelReloadHandle {
    handle: reload::Handle<EnvFilter, Registry>,
}

impl LogLevelReloadHandle {
    pub fn new(handle: reload::Handle<EnvFilter, Registry>) -> Self {
        Self { handle }
    }

    pub fn apply(&self, level: LogLevel) -> Result<()> {
        self.handle.reload(EnvFilter::new(filter_directive(level)))?;
        Ok(())
    }
}

/// Env filter directive limiting `level` to this crate's own targets.
pub fn filter_directive(level: LogLevel) -> String {
    format!("{}={}", env!("CARGO_CRATE_NAME"), level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_roundtrip() {
        for level in LogLevel::ALL {
            assert_eq!(level.as_str().parse::<LogLevel>().unwrap(), level);
            assert_eq!(level.to_string(), level.as_str());
        }
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn serializes_as_lowercase_names() {
        let level: LogLevel = serde_yml::from_str("debug").unwrap();
        assert_eq!(level, LogLevel::Debug);
        assert_eq!(serde_yml::to_string(&LogLevel::Warn).unwrap().trim(), "warn");
    }

    #[test]
    fn enum_format_lists_all_levels() {
        assert_eq!(LogLevel::enum_format(), "error,warn,info,debug,trace");
    }

    #[test]
    fn directive_scopes_level_to_this_crate() {
        let directive = filter_directive(LogLevel::Trace);
        assert!(directive.ends_with("=trace"));
        assert!(!directive.starts_with('='));
    }
}
