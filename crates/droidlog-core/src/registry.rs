//! Named logger handles and per-logger level overrides
//!
//! Handles are created on first lookup and live as long as the registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{LogError, LogResult};
use crate::types::Level;

/// A named logger, usually a tag or type name
#[derive(Debug)]
pub struct LoggerHandle {
    name: String,
    level_override: RwLock<Option<Level>>,
}

impl LoggerHandle {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level_override: RwLock::new(None),
        }
    }

    /// Name this handle was looked up by
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Threshold that replaces the global one for this logger, if any
    pub fn level_override(&self) -> Option<Level> {
        *self.level_override.read()
    }

    /// Set or remove this logger's threshold
    pub fn set_level(&self, level: Option<Level>) {
        *self.level_override.write() = level;
    }

    /// Effective threshold given the global one
    pub fn threshold(&self, global: Level) -> Level {
        self.level_override().unwrap_or(global)
    }
}

/// Cache of logger handles keyed by name
pub struct LoggerRegistry {
    loggers: RwLock<HashMap<String, Arc<LoggerHandle>>>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self {
            loggers: RwLock::new(HashMap::new()),
        }
    }

    /// Get the handle for `name`, creating it on first use
    ///
    /// Concurrent first lookups of the same name construct exactly one handle.
    pub fn get_logger(&self, name: &str) -> LogResult<Arc<LoggerHandle>> {
        if name.is_empty() {
            return Err(LogError::invalid_argument("logger name must not be empty"));
        }

        if let Some(handle) = self.loggers.read().get(name) {
            return Ok(Arc::clone(handle));
        }

        let mut loggers = self.loggers.write();
        let handle = loggers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(LoggerHandle::new(name)));
        Ok(Arc::clone(handle))
    }

    /// Look up a handle without creating it
    pub fn get(&self, name: &str) -> Option<Arc<LoggerHandle>> {
        self.loggers.read().get(name).cloned()
    }

    /// Override the threshold for one logger
    pub fn set_level_for(&self, name: &str, level: Level) -> LogResult<()> {
        self.get_logger(name)?.set_level(Some(level));
        Ok(())
    }

    /// Override for `name`, if one is set
    pub fn level_for(&self, name: &str) -> Option<Level> {
        self.get(name).and_then(|handle| handle.level_override())
    }

    /// Remove every override; handles stay cached
    pub fn clear_level_overrides(&self) {
        for handle in self.loggers.read().values() {
            handle.set_level(None);
        }
    }

    /// List all cached logger names
    pub fn names(&self) -> Vec<String> {
        self.loggers.read().keys().cloned().collect()
    }

    /// Number of cached handles
    pub fn len(&self) -> usize {
        self.loggers.read().len()
    }

    /// Check if no handle was created yet
    pub fn is_empty(&self) -> bool {
        self.loggers.read().is_empty()
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("loggers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn test_get_logger_caches() {
        let registry = LoggerRegistry::new();
        assert!(registry.is_empty());

        let first = registry.get_logger("MainActivity").unwrap();
        let second = registry.get_logger("MainActivity").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "MainActivity");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let registry = LoggerRegistry::new();
        let err = registry.get_logger("").unwrap_err();
        assert!(matches!(err, LogError::InvalidArgument(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_lookup_constructs_once() {
        let registry = Arc::new(LoggerRegistry::new());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.get_logger("A").unwrap()
                })
            })
            .collect();

        let loggers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(Arc::ptr_eq(&loggers[0], &loggers[1]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_level_overrides() {
        let registry = LoggerRegistry::new();
        assert_eq!(registry.level_for("Net"), None);

        registry.set_level_for("Net", Level::Verbose).unwrap();
        assert_eq!(registry.level_for("Net"), Some(Level::Verbose));

        let handle = registry.get_logger("Net").unwrap();
        assert_eq!(handle.threshold(Level::Info), Level::Verbose);

        let other = registry.get_logger("Db").unwrap();
        assert_eq!(other.threshold(Level::Info), Level::Info);

        registry.clear_level_overrides();
        assert_eq!(registry.level_for("Net"), None);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_names() {
        let registry = LoggerRegistry::new();
        registry.get_logger("a").unwrap();
        registry.get_logger("b").unwrap();

        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
