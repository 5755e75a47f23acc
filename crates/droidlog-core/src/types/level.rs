//! Severity levels and the enabled/disabled decision

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LogError, LogResult};

/// Log levels, most severe first
///
/// Filtering uses a fixed rank: `Suppress` (0) disables everything, then
/// `Error`, `Warn`, `Info`, `Debug` and `Verbose`. `Assert` is the fatal tier;
/// it sits above `Error` in severity but filters at the same rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    Suppress,
    Assert,
    Error,
    Warn,
    Info,
    Debug,
    Verbose,
}

impl Level {
    /// All levels in declaration order
    pub const ALL: [Level; 7] = [
        Level::Suppress,
        Level::Assert,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Verbose,
    ];

    /// Filtering rank; lower is more severe
    pub fn rank(self) -> u8 {
        match self {
            Level::Suppress => 0,
            Level::Assert | Level::Error => 1,
            Level::Warn => 2,
            Level::Info => 3,
            Level::Debug => 4,
            Level::Verbose => 5,
        }
    }

    /// Upper-case name as used in output and configuration
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Suppress => "SUPPRESS",
            Level::Assert => "ASSERT",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Verbose => "VERBOSE",
        }
    }

    /// Parse a level name, ignoring case
    ///
    /// Besides the enumeration names this accepts the log4j spellings found
    /// in property files: `off`, `fatal`, `wtf` and `trace`.
    pub fn parse(name: &str) -> LogResult<Level> {
        let lower = name.trim().to_ascii_lowercase();
        let level = match lower.as_str() {
            "suppress" | "off" => Level::Suppress,
            "assert" | "fatal" | "wtf" => Level::Assert,
            "error" => Level::Error,
            "warn" | "warning" => Level::Warn,
            "info" => Level::Info,
            "debug" => Level::Debug,
            "verbose" | "trace" => Level::Verbose,
            _ => return Err(LogError::InvalidLevel(name.to_string())),
        };
        Ok(level)
    }

    /// Android `android.util.Log` priority constant for this level
    ///
    /// `Suppress` has no priority of its own and maps to `ASSERT + 1`,
    /// which logcat never prints.
    pub fn priority(self) -> i32 {
        match self {
            Level::Verbose => 2,
            Level::Debug => 3,
            Level::Info => 4,
            Level::Warn => 5,
            Level::Error => 6,
            Level::Assert => 7,
            Level::Suppress => 8,
        }
    }

    /// Level for an Android priority constant
    pub fn from_priority(priority: i32) -> LogResult<Level> {
        match priority {
            2 => Ok(Level::Verbose),
            3 => Ok(Level::Debug),
            4 => Ok(Level::Info),
            5 => Ok(Level::Warn),
            6 => Ok(Level::Error),
            7 => Ok(Level::Assert),
            other => Err(LogError::InvalidLevel(format!("priority {}", other))),
        }
    }
}

/// Whether a message at `candidate` passes a `configured` threshold
pub fn is_enabled(configured: Level, candidate: Level) -> bool {
    if configured == Level::Suppress || candidate == Level::Suppress {
        return false;
    }
    candidate.rank() <= configured.rank()
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::parse(s)
    }
}

impl TryFrom<String> for Level {
    type Error = LogError;

    fn try_from(value: String) -> Result<Self, LogError> {
        Level::parse(&value)
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug => Level::Debug,
            log::Level::Trace => Level::Verbose,
        }
    }
}

impl From<Level> for log::LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Suppress => log::LevelFilter::Off,
            Level::Assert | Level::Error => log::LevelFilter::Error,
            Level::Warn => log::LevelFilter::Warn,
            Level::Info => log::LevelFilter::Info,
            Level::Debug => log::LevelFilter::Debug,
            Level::Verbose => log::LevelFilter::Trace,
        }
    }
}
