//! YAML configuration files
//!
//! A config file holds the same fields as [`LogConfig`]; every field is
//! optional and falls back to its default:
//!
//! ```yaml
//! level: debug
//! logs_folder: /data/data/com.example/files/logs
//! file_name: app.log
//! max_backup_files: 2
//! logger_levels:
//!   Network: verbose
//! ```

use std::fs;
use std::path::Path;

use super::options::LogConfig;
use crate::error::{LogError, LogResult};

impl LogConfig {
    /// Parse YAML text
    pub fn from_yaml_str(yaml: &str) -> LogResult<Self> {
        if yaml.trim().is_empty() {
            return Err(LogError::config("configuration is empty"));
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML config file
    pub fn load(path: impl AsRef<Path>) -> LogResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Serialize to YAML
    pub fn to_yaml_string(&self) -> LogResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write to a YAML file, creating parent folders
    pub fn save(&self, path: impl AsRef<Path>) -> LogResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Level;
    use tempfile::tempdir;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = LogConfig::from_yaml_str(
            "level: debug\nlogs_folder: /tmp/logs\nlogger_levels:\n  Network: VERBOSE\n",
        )
        .unwrap();

        assert_eq!(config.level, Level::Debug);
        assert_eq!(config.logs_folder, "/tmp/logs");
        assert_eq!(config.file_name, "android.log");
        assert_eq!(config.logger_levels.get("Network"), Some(&Level::Verbose));
    }

    #[test]
    fn test_invalid_level_in_yaml() {
        let err = LogConfig::from_yaml_str("level: shouting\n").unwrap_err();
        assert!(matches!(err, LogError::Yaml(_)));
    }

    #[test]
    fn test_empty_yaml() {
        assert!(matches!(
            LogConfig::from_yaml_str("  \n"),
            Err(LogError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("droidlog.yaml");

        let config = LogConfig::new("/tmp/logs")
            .with_level(Level::Warn)
            .with_logger_level("Db", Level::Debug);
        config.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("WARN"));

        assert_eq!(LogConfig::load(&path).unwrap(), config);
    }
}
