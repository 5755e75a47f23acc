//! droidlog Core
//!
//! A level-filtered logging facade for Android apps and native code.
//! Records are filtered per logger, formatted with log4j-style conversion
//! patterns and written to the platform log (logcat on device, stderr
//! elsewhere) and to a size-rotated file.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use droidlog_core::{Level, LogConfig};
//!
//! droidlog_core::configure(
//!     LogConfig::new("/data/data/com.example/files/logs").with_level(Level::Debug),
//! )?;
//!
//! droidlog_core::i("Main", "started");
//! droidlog_core::debug_log!("Main", "cache holds {} entries", 12);
//!
//! // Route `log::info!` and friends through the same sinks
//! droidlog_core::init_log_bridge().ok();
//! # Ok::<(), droidlog_core::LogError>(())
//! ```

pub mod types;
pub mod error;
pub mod format;
pub mod sinks;
pub mod registry;
pub mod config;
pub mod facade;

// Re-export commonly used types
pub use types::{is_enabled, CallSite, Level, LogRecord, Throwable};

pub use error::{LogError, LogResult};

pub use format::{Clock, FixedClock, PatternFormatter, SystemClock, DEFAULT_PATTERN, PLATFORM_PATTERN};

pub use sinks::{
    FatalHook, FileSinkSettings, MemorySink, PlatformSink, RotatingFileSink, SharedSink, Sink,
};

pub use registry::{LoggerHandle, LoggerRegistry};

pub use config::{path_string, LogConfig};

pub use facade::{
    clear_logs, configure, d, e, failed_writes, file_settings, flush, get_logger, global, i,
    init_log_bridge, is_enabled_for, log, log_error, log_file_path, log_throwable, read_log_file,
    set_diagnostic_sink, set_level_for, state, threshold, v, w, wtf, FacadeState, LoggingFacade,
};
