//! In-memory sink

use parking_lot::RwLock;

use super::traits::Sink;
use crate::error::LogResult;
use crate::types::{Level, LogRecord};

/// One captured write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLine {
    pub level: Level,
    pub logger_name: String,
    pub text: String,
}

/// A sink that keeps every formatted record in memory
///
/// Useful for testing, or for hosts that render logs in their own UI.
/// Lines are kept until [`MemorySink::clear`] is called.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: RwLock<Vec<CapturedLine>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured writes, oldest first
    pub fn captured(&self) -> Vec<CapturedLine> {
        self.lines.read().clone()
    }

    /// Formatted text of every captured write
    pub fn texts(&self) -> Vec<String> {
        self.lines.read().iter().map(|l| l.text.clone()).collect()
    }

    /// Drop everything captured so far
    pub fn clear(&self) {
        self.lines.write().clear();
    }

    /// Number of captured writes
    pub fn len(&self) -> usize {
        self.lines.read().len()
    }

    /// Check if nothing was captured
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write(&self, record: &LogRecord, formatted: &str) -> LogResult<()> {
        self.lines.write().push(CapturedLine {
            level: record.level,
            logger_name: record.logger_name.clone(),
            text: formatted.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_memory_sink_captures() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        let ts = DateTime::parse_from_rfc3339("2024-03-05T07:08:09+00:00").unwrap();
        let record = LogRecord::new(ts, Level::Warn, "Net", "slow");
        sink.write(&record, "W slow\n").unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink.captured()[0],
            CapturedLine {
                level: Level::Warn,
                logger_name: "Net".to_string(),
                text: "W slow\n".to_string(),
            }
        );

        sink.clear();
        assert!(sink.is_empty());
    }
}
