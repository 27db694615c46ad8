//! Severity levels
//!
//! Fixed numeric ordering shared by the text format and the row store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity of a log entry
///
/// "Unset" (an unrecognized token in a re-parsed file) is represented as
/// `Option<Level>::None`, which orders below every real level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// All levels in ascending order
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    /// Upper-case name as written in log files
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// Numeric code stored in the row store
    pub fn code(&self) -> i32 {
        match self {
            Level::Debug => 10,
            Level::Info => 20,
            Level::Warning => 30,
            Level::Error => 40,
            Level::Critical => 50,
        }
    }

    pub fn from_code(code: i32) -> Option<Level> {
        Level::ALL.into_iter().find(|l| l.code() == code)
    }

    /// Match an exact upper-case token from a log line
    pub fn from_name(token: &str) -> Option<Level> {
        Level::ALL.into_iter().find(|l| l.as_str() == token)
    }

    /// Colour used by the viewer for this level
    pub fn color(&self) -> &'static str {
        match self {
            Level::Debug => "#6c757d",
            Level::Info => "#0d6efd",
            Level::Warning => "#ffc107",
            Level::Error => "#dc3545",
            Level::Critical => "#6f42c1",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a level name is not one of the five known severities
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level '{0}'")]
pub struct UnknownLevel(pub String);

impl FromStr for Level {
    type Err = UnknownLevel;

    /// Case-insensitive, accepts `warn` as an alias of `warning`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "WARN" => Ok(Level::Warning),
            other => Level::from_name(other).ok_or_else(|| UnknownLevel(s.to_string())),
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::ERROR => Level::Error,
        }
    }
}
