//! Sink trait definition

use std::sync::Arc;

use crate::error::LogResult;
use crate::types::LogRecord;

/// A destination for formatted log output
///
/// Implementations:
/// - `PlatformSink`: logcat on Android, stderr elsewhere
/// - `RotatingFileSink`: size-rotated log file
/// - `MemorySink`: in-memory capture for tests and hosts that render logs themselves
///
/// The facade formats each record once per pattern and hands every enabled
/// sink both the record and its formatted text. A sink error is reported
/// by the facade and never reaches the caller.
pub trait Sink: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    /// Deliver one formatted record
    fn write(&self, record: &LogRecord, formatted: &str) -> LogResult<()>;

    /// Push buffered output to its destination
    fn flush(&self) -> LogResult<()> {
        Ok(())
    }
}

/// Type alias for an Arc-wrapped sink
pub type SharedSink = Arc<dyn Sink>;
