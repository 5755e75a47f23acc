//! The process-wide facade
//!
//! Created lazily on first use and never torn down. The free functions here
//! mirror the `LoggingFacade` methods so callers don't need to hold a handle.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;

use super::{FacadeState, LoggingFacade};
use crate::config::LogConfig;
use crate::error::LogResult;
use crate::registry::LoggerHandle;
use crate::sinks::FileSinkSettings;
use crate::types::{Level, Throwable};

static GLOBAL_FACADE: Lazy<LoggingFacade> = Lazy::new(LoggingFacade::new);

/// The process-wide facade
pub fn global() -> &'static LoggingFacade {
    &GLOBAL_FACADE
}

/// Configure the process-wide facade
pub fn configure(config: LogConfig) -> LogResult<()> {
    GLOBAL_FACADE.configure(config)
}

/// Log `message` under `tag`
pub fn log(level: Level, tag: &str, message: &str, throwable: Option<&Throwable>) {
    GLOBAL_FACADE.log(level, tag, message, throwable)
}

pub fn v(tag: &str, message: impl fmt::Display) {
    GLOBAL_FACADE.v(tag, message)
}

pub fn d(tag: &str, message: impl fmt::Display) {
    GLOBAL_FACADE.d(tag, message)
}

pub fn i(tag: &str, message: impl fmt::Display) {
    GLOBAL_FACADE.i(tag, message)
}

pub fn w(tag: &str, message: impl fmt::Display) {
    GLOBAL_FACADE.w(tag, message)
}

pub fn e(tag: &str, message: impl fmt::Display) {
    GLOBAL_FACADE.e(tag, message)
}

pub fn wtf(tag: &str, message: impl fmt::Display) {
    GLOBAL_FACADE.wtf(tag, message)
}

/// Log an error at `Error`, using its own text as the message
pub fn log_error(tag: &str, error: &(dyn Error + 'static)) {
    GLOBAL_FACADE.log_error(tag, error)
}

/// Log a throwable alone, using its own message
pub fn log_throwable(level: Level, tag: &str, throwable: &Throwable) {
    GLOBAL_FACADE.log_throwable(level, tag, throwable)
}

/// Check whether `level` passes the global threshold
pub fn is_enabled_for(level: Level) -> bool {
    GLOBAL_FACADE.is_enabled_for(level)
}

/// Get or create the named logger
pub fn get_logger(name: &str) -> LogResult<Arc<LoggerHandle>> {
    GLOBAL_FACADE.get_logger(name)
}

/// Override the threshold of the named logger
pub fn set_level_for(name: &str, level: Level) -> LogResult<()> {
    GLOBAL_FACADE.set_level_for(name, level)
}

pub fn threshold() -> Level {
    GLOBAL_FACADE.threshold()
}

pub fn state() -> FacadeState {
    GLOBAL_FACADE.state()
}

pub fn file_settings() -> Option<FileSinkSettings> {
    GLOBAL_FACADE.file_settings()
}

/// Path of the live log file, if a file sink is active
pub fn log_file_path() -> Option<PathBuf> {
    GLOBAL_FACADE.log_file_path()
}

pub fn read_log_file() -> LogResult<Vec<u8>> {
    GLOBAL_FACADE.read_log_file()
}

pub fn clear_logs() -> LogResult<()> {
    GLOBAL_FACADE.clear_logs()
}

pub fn flush() -> LogResult<()> {
    GLOBAL_FACADE.flush()
}

pub fn failed_writes() -> u64 {
    GLOBAL_FACADE.failed_writes()
}

#[doc(hidden)]
#[macro_export]
macro_rules! __droidlog_log {
    ($level:expr, $tag:expr, error: $err:expr, $($arg:tt)+) => {
        $crate::global().log_args(
            $level,
            $tag,
            format_args!($($arg)+),
            Some($crate::Throwable::from_dyn_error($err)),
            Some($crate::call_site!()),
        )
    };
    ($level:expr, $tag:expr, $($arg:tt)+) => {
        $crate::global().log_args(
            $level,
            $tag,
            format_args!($($arg)+),
            None,
            Some($crate::call_site!()),
        )
    };
}

/// Log at `Verbose` through the global facade
///
/// ```
/// droidlog_core::verbose_log!("Net", "retry {} of {}", 1, 3);
/// ```
#[macro_export]
macro_rules! verbose_log {
    ($($arg:tt)+) => {
        $crate::__droidlog_log!($crate::Level::Verbose, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)+) => {
        $crate::__droidlog_log!($crate::Level::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)+) => {
        $crate::__droidlog_log!($crate::Level::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)+) => {
        $crate::__droidlog_log!($crate::Level::Warn, $($arg)+)
    };
}

/// Log at `Error` through the global facade
///
/// An `error:` argument attaches an error and its sources:
///
/// ```
/// let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
/// droidlog_core::error_log!("Db", error: &err, "opening {} failed", "app.db");
/// ```
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)+) => {
        $crate::__droidlog_log!($crate::Level::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! wtf_log {
    ($($arg:tt)+) => {
        $crate::__droidlog_log!($crate::Level::Assert, $($arg)+)
    };
}
