//! The facade's configuration record

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::path::path_string;
use crate::error::{LogError, LogResult};
use crate::format::DEFAULT_PATTERN;
use crate::sinks::FileSinkSettings;
use crate::types::Level;

/// Default log file name
pub const DEFAULT_FILE_NAME: &str = "android.log";

/// Default number of rotated backups (`android.log.1` … `android.log.3`)
pub const DEFAULT_MAX_BACKUP_FILES: u32 = 3;

/// Default rotation size: 5 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Exclusive upper bound for the backup count and file size
pub const MAX_SETTING_VALUE: u64 = i32::MAX as u64;

/// Everything `LoggingFacade::configure` applies
///
/// Build it with [`LogConfig::new`] and the `with_*` methods, with the
/// validating `set_*` methods, or load it from YAML or a log4j-style
/// property file. Nothing takes effect until it is passed to `configure`,
/// which validates it again as a whole.
///
/// # Example
///
/// ```
/// use droidlog_core::{Level, LogConfig};
///
/// let config = LogConfig::new("/data/data/com.example/files/logs")
///     .with_file_name("app.log")
///     .with_level(Level::Debug)
///     .with_max_backup_files(2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Global threshold
    pub level: Level,
    /// Folder holding the live file and its backups
    pub logs_folder: String,
    /// Live file name inside `logs_folder`
    pub file_name: String,
    /// Pattern for the file sink, and for the platform sink unless overridden
    pub pattern: String,
    /// Separate pattern for the platform sink
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_pattern: Option<String>,
    pub max_backup_files: u32,
    /// Rotation size in bytes
    pub max_file_size: u64,
    pub immediate_flush: bool,
    /// Drop previous sinks and per-logger overrides before applying
    pub reset_configuration: bool,
    pub use_platform_sink: bool,
    pub use_file_sink: bool,
    /// Rotate the file sink; when off the file grows without bound
    pub use_rolling_file: bool,
    /// Per-logger threshold overrides
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub logger_levels: BTreeMap<String, Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            logs_folder: String::new(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            pattern: DEFAULT_PATTERN.to_string(),
            platform_pattern: None,
            max_backup_files: DEFAULT_MAX_BACKUP_FILES,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            immediate_flush: true,
            reset_configuration: true,
            use_platform_sink: true,
            use_file_sink: true,
            use_rolling_file: true,
            logger_levels: BTreeMap::new(),
        }
    }
}

impl LogConfig {
    /// Defaults with logs written under `logs_folder`
    pub fn new(logs_folder: impl Into<String>) -> Self {
        Self {
            logs_folder: logs_folder.into(),
            ..Self::default()
        }
    }

    /// All the positional parameters of a full configure call
    pub fn with_params(
        logs_folder: impl Into<String>,
        file_name: impl Into<String>,
        level: Level,
        pattern: impl Into<String>,
        max_backup_files: u32,
        max_file_size: u64,
    ) -> Self {
        Self::new(logs_folder)
            .with_file_name(file_name)
            .with_level(level)
            .with_pattern(pattern)
            .with_max_backup_files(max_backup_files)
            .with_max_file_size(max_file_size)
    }

    /// Platform output only, no file
    pub fn platform_only(level: Level) -> Self {
        Self {
            level,
            use_file_sink: false,
            ..Self::default()
        }
    }

    /// Set the global threshold
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the file name
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Set the pattern
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Set a pattern used only by the platform sink
    pub fn with_platform_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.platform_pattern = Some(pattern.into());
        self
    }

    /// Set the number of backups
    pub fn with_max_backup_files(mut self, max_backup_files: u32) -> Self {
        self.max_backup_files = max_backup_files;
        self
    }

    /// Set the rotation size in bytes
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    pub fn with_reset_configuration(mut self, reset_configuration: bool) -> Self {
        self.reset_configuration = reset_configuration;
        self
    }

    pub fn with_platform_sink(mut self, enabled: bool) -> Self {
        self.use_platform_sink = enabled;
        self
    }

    pub fn with_file_sink(mut self, enabled: bool) -> Self {
        self.use_file_sink = enabled;
        self
    }

    pub fn with_rolling_file(mut self, enabled: bool) -> Self {
        self.use_rolling_file = enabled;
        self
    }

    /// Override the threshold of one named logger
    pub fn with_logger_level(mut self, name: impl Into<String>, level: Level) -> Self {
        self.logger_levels.insert(name.into(), level);
        self
    }

    /// Set the logs folder, rejecting an empty one
    pub fn set_logs_folder(&mut self, logs_folder: &str) -> LogResult<()> {
        require_non_empty("logs_folder", logs_folder)?;
        self.logs_folder = logs_folder.to_string();
        Ok(())
    }

    /// Set the file name, rejecting an empty one
    pub fn set_file_name(&mut self, file_name: &str) -> LogResult<()> {
        require_non_empty("file_name", file_name)?;
        self.file_name = file_name.to_string();
        Ok(())
    }

    /// Set the pattern, rejecting an empty one
    pub fn set_pattern(&mut self, pattern: &str) -> LogResult<()> {
        require_non_empty("pattern", pattern)?;
        self.pattern = pattern.to_string();
        Ok(())
    }

    /// Set the backup count, rejecting values outside `1..i32::MAX`
    pub fn set_max_backup_files(&mut self, max_backup_files: u32) -> LogResult<()> {
        require_in_range("max_backup_files", u64::from(max_backup_files))?;
        self.max_backup_files = max_backup_files;
        Ok(())
    }

    /// Set the rotation size, rejecting values outside `1..i32::MAX`
    pub fn set_max_file_size(&mut self, max_file_size: u64) -> LogResult<()> {
        require_in_range("max_file_size", max_file_size)?;
        self.max_file_size = max_file_size;
        Ok(())
    }

    /// Check every setting
    pub fn validate(&self) -> LogResult<()> {
        require_non_empty("pattern", &self.pattern)?;
        if let Some(pattern) = &self.platform_pattern {
            require_non_empty("platform_pattern", pattern)?;
        }
        if self.use_file_sink {
            require_non_empty("logs_folder", &self.logs_folder)?;
            require_non_empty("file_name", &self.file_name)?;
            require_in_range("max_backup_files", u64::from(self.max_backup_files))?;
            require_in_range("max_file_size", self.max_file_size)?;
        }
        if self.logger_levels.keys().any(String::is_empty) {
            return Err(LogError::invalid_argument("logger name must not be empty"));
        }
        Ok(())
    }

    /// Live log file path: folder and file name joined once
    pub fn log_file_path(&self) -> PathBuf {
        PathBuf::from(path_string(&self.logs_folder, &self.file_name))
    }

    /// Pattern the platform sink uses
    pub fn effective_platform_pattern(&self) -> &str {
        self.platform_pattern.as_deref().unwrap_or(&self.pattern)
    }

    /// Settings for the file sink
    pub fn file_settings(&self) -> FileSinkSettings {
        FileSinkSettings {
            path: self.log_file_path(),
            max_file_size: self.max_file_size,
            max_backup_files: self.max_backup_files,
            immediate_flush: self.immediate_flush,
            rolling: self.use_rolling_file,
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> LogResult<()> {
    if value.is_empty() {
        return Err(LogError::invalid_argument(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn require_in_range(field: &str, value: u64) -> LogResult<()> {
    if value == 0 || value >= MAX_SETTING_VALUE {
        return Err(LogError::invalid_argument(format!("invalid {}: {}", field, value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LogConfig::new("/tmp/logs");
        assert_eq!(config.level, Level::Info);
        assert_eq!(config.file_name, "android.log");
        assert_eq!(config.pattern, DEFAULT_PATTERN);
        assert_eq!(config.max_backup_files, 3);
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert!(config.immediate_flush);
        assert!(config.reset_configuration);
        assert!(config.use_platform_sink && config.use_file_sink && config.use_rolling_file);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_params() {
        let config = LogConfig::with_params("/tmp/logs", "app.log", Level::Warn, "%m%n", 2, 1024);
        assert_eq!(config.log_file_path(), PathBuf::from("/tmp/logs/app.log"));
        assert_eq!(config.level, Level::Warn);

        let settings = config.file_settings();
        assert_eq!(settings.max_file_size, 1024);
        assert_eq!(settings.max_backup_files, 2);
        assert!(settings.rolling);
    }

    #[test]
    fn test_zero_backups_rejected() {
        let config = LogConfig::new("/tmp/logs").with_max_backup_files(0);
        assert!(matches!(config.validate(), Err(LogError::InvalidArgument(_))));

        let mut config = LogConfig::new("/tmp/logs");
        assert!(config.set_max_backup_files(0).is_err());
        assert_eq!(config.max_backup_files, DEFAULT_MAX_BACKUP_FILES);
    }

    #[test]
    fn test_file_size_bounds() {
        let mut config = LogConfig::new("/tmp/logs");
        assert!(config.set_max_file_size(0).is_err());
        assert!(config.set_max_file_size(MAX_SETTING_VALUE).is_err());
        assert!(config.set_max_file_size(MAX_SETTING_VALUE - 1).is_ok());
    }

    #[test]
    fn test_empty_strings_rejected() {
        let mut config = LogConfig::default();
        assert!(config.set_logs_folder("").is_err());
        assert!(config.set_file_name("").is_err());
        assert!(config.set_pattern("").is_err());

        // the folder is still empty, so the file sink cannot be built
        assert!(config.validate().is_err());
        assert!(LogConfig::platform_only(Level::Info).validate().is_ok());
    }

    #[test]
    fn test_platform_pattern_fallback() {
        let config = LogConfig::new("/tmp").with_pattern("%p %m");
        assert_eq!(config.effective_platform_pattern(), "%p %m");

        let config = config.with_platform_pattern("%m");
        assert_eq!(config.effective_platform_pattern(), "%m");
    }
}
