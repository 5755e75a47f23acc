//! Routes the `log` crate into the global facade

use std::sync::Arc;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::instance::global;
use super::SinkSlot;
use crate::format::{Clock, SystemClock, PLATFORM_PATTERN};
use crate::sinks::{PlatformSink, SharedSink};
use crate::types::{is_enabled, CallSite, Level, LogRecord};

/// Records from this crate bypass the facade: they are emitted while the
/// facade may hold its own locks.
const OWN_TARGET: &str = "droidlog_core";

/// Threshold for this crate's own diagnostics
const DIAGNOSTIC_LEVEL: Level = Level::Info;

struct LogBridge {
    diagnostics: RwLock<SinkSlot>,
}

impl LogBridge {
    fn new() -> Self {
        Self {
            diagnostics: RwLock::new(SinkSlot::new(
                PLATFORM_PATTERN,
                Arc::new(PlatformSink::new()),
            )),
        }
    }

    fn write_diagnostic(&self, record: &Record<'_>) {
        let record = LogRecord::new(
            SystemClock.now(),
            Level::from(record.level()),
            record.target(),
            record.args().to_string(),
        )
        .with_call_site(call_site(record));

        let slot = self.diagnostics.read();
        if let Err(e) = slot.sink.write(&record, &slot.formatter.format(&record)) {
            eprintln!("droidlog: {}: {}", e, record.message);
        }
    }
}

static BRIDGE: Lazy<LogBridge> = Lazy::new(LogBridge::new);

fn is_own_target(target: &str) -> bool {
    target.starts_with(OWN_TARGET)
}

fn call_site(record: &Record<'_>) -> Option<CallSite> {
    let line = record.line()?;
    match (record.module_path_static(), record.file_static()) {
        (Some(module), Some(file)) => Some(CallSite::new(module, file, line)),
        _ => Some(CallSite::owned(record.module_path()?, record.file()?, line)),
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        let level = Level::from(metadata.level());
        if is_own_target(metadata.target()) {
            return is_enabled(DIAGNOSTIC_LEVEL, level);
        }
        global().is_enabled_for_tag(metadata.target(), level)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if is_own_target(record.target()) {
            self.write_diagnostic(record);
            return;
        }
        global().log_args(
            Level::from(record.level()),
            record.target(),
            *record.args(),
            None,
            call_site(record),
        );
    }

    fn flush(&self) {
        if let Err(e) = global().flush() {
            eprintln!("droidlog: flush failed: {}", e);
        }
        if let Err(e) = self.diagnostics.read().sink.flush() {
            eprintln!("droidlog: flush failed: {}", e);
        }
    }
}

/// Install the global facade as the `log` crate's logger
///
/// The record target becomes the logger name, so `log::info!(target: "Net", …)`
/// is filtered by the `Net` logger's threshold. droidlog's own warnings skip
/// the facade and go to the diagnostic sink. Fails if another logger was
/// installed first.
pub fn init_log_bridge() -> Result<(), SetLoggerError> {
    log::set_logger(&*BRIDGE)?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}

/// Replace the sink that receives droidlog's own diagnostics
///
/// Defaults to the platform log. Only used once the bridge is installed.
pub fn set_diagnostic_sink(pattern: impl Into<String>, sink: SharedSink) {
    *BRIDGE.diagnostics.write() = SinkSlot::new(pattern, sink);
}
