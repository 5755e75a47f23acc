//! Facade configuration
//!
//! Supports multiple configuration sources:
//! - Builder and validating setters on `LogConfig`
//! - YAML files (`LogConfig::load`)
//! - log4j-style property streams (`LogConfig::from_properties`)

mod options;
mod path;
mod file;
mod properties;

pub use options::{
    LogConfig, DEFAULT_FILE_NAME, DEFAULT_MAX_BACKUP_FILES, DEFAULT_MAX_FILE_SIZE,
    MAX_SETTING_VALUE,
};
pub use path::path_string;
