//! The logging facade
//!
//! `LoggingFacade` owns the active sinks, the global threshold and the
//! logger registry. Every log call funnels into [`LoggingFacade::log_args`],
//! which filters, builds one record, formats it once per distinct pattern and
//! hands it to each sink in order (platform, then file, then attached sinks).
//!
//! Most code uses the process-wide instance through [`global`] and the
//! module-level functions or macros rather than creating its own.

mod bridge;
mod instance;

use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::LogConfig;
use crate::error::{LogError, LogResult};
use crate::format::{Clock, PatternFormatter, SystemClock, PLATFORM_PATTERN};
use crate::registry::{LoggerHandle, LoggerRegistry};
use crate::sinks::{FatalHook, FileSinkSettings, PlatformSink, RotatingFileSink, SharedSink, Sink};
use crate::types::{is_enabled, CallSite, Level, LogRecord, Throwable};

pub use bridge::{init_log_bridge, set_diagnostic_sink};
pub use instance::*;

/// Threshold used before the first successful `configure`
pub const UNCONFIGURED_LEVEL: Level = Level::Info;

/// Lifecycle of a facade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacadeState {
    /// Never configured; records go to the platform sink at `Info`
    Unconfigured,
    /// A `configure` call is in progress
    Configuring,
    /// At least one `configure` call succeeded
    Configured,
}

impl FacadeState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => FacadeState::Configuring,
            2 => FacadeState::Configured,
            _ => FacadeState::Unconfigured,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            FacadeState::Unconfigured => 0,
            FacadeState::Configuring => 1,
            FacadeState::Configured => 2,
        }
    }
}

/// A sink paired with the formatter for its pattern
struct SinkSlot {
    formatter: PatternFormatter,
    sink: SharedSink,
}

impl SinkSlot {
    fn new(pattern: impl Into<String>, sink: SharedSink) -> Self {
        Self {
            formatter: PatternFormatter::new(pattern),
            sink,
        }
    }
}

/// What the last configure call installed
struct ActiveSinks {
    threshold: Level,
    slots: Vec<SinkSlot>,
    file: Option<Arc<RotatingFileSink>>,
    config: Option<LogConfig>,
}

impl ActiveSinks {
    fn unconfigured() -> Self {
        Self {
            threshold: UNCONFIGURED_LEVEL,
            slots: vec![SinkSlot::new(PLATFORM_PATTERN, Arc::new(PlatformSink::new()))],
            file: None,
            config: None,
        }
    }
}

/// Front door for all logging
///
/// # Thread Safety
///
/// Log calls take a read lock on the active sinks, so they run concurrently
/// with each other; each sink serializes its own writes. `configure` calls
/// are serialized and swap the sinks under the write lock, so a record is
/// delivered either entirely to the old sinks or entirely to the new ones.
pub struct LoggingFacade {
    active: RwLock<ActiveSinks>,
    attached: RwLock<Vec<SinkSlot>>,
    registry: LoggerRegistry,
    clock: Arc<dyn Clock>,
    state: AtomicU8,
    configure_lock: Mutex<()>,
    failed_writes: AtomicU64,
    reported_failures: Mutex<HashSet<String>>,
    fatal_hook: RwLock<Option<FatalHook>>,
}

impl Default for LoggingFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingFacade {
    /// Create an unconfigured facade stamping records with the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an unconfigured facade with a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            active: RwLock::new(ActiveSinks::unconfigured()),
            attached: RwLock::new(Vec::new()),
            registry: LoggerRegistry::new(),
            clock,
            state: AtomicU8::new(FacadeState::Unconfigured.as_u8()),
            configure_lock: Mutex::new(()),
            failed_writes: AtomicU64::new(0),
            reported_failures: Mutex::new(HashSet::new()),
            fatal_hook: RwLock::new(None),
        }
    }

    /// Apply a configuration
    ///
    /// Everything is validated and the new sinks are opened before anything
    /// is swapped, so on error the facade keeps logging exactly as before.
    /// Calling it again with an identical config yields identical settings.
    pub fn configure(&self, config: LogConfig) -> LogResult<()> {
        let _guard = self.configure_lock.lock();
        let previous = self.state.swap(FacadeState::Configuring.as_u8(), Ordering::SeqCst);

        match self.apply(config) {
            Ok(path) => {
                self.state.store(FacadeState::Configured.as_u8(), Ordering::SeqCst);
                match path {
                    Some(path) => log::info!("Logs configured at: {}", path.display()),
                    None => log::info!("Logs configured without a file sink"),
                }
                Ok(())
            }
            Err(e) => {
                self.state.store(previous, Ordering::SeqCst);
                log::warn!("Logging configuration rejected: {}", e);
                Err(e)
            }
        }
    }

    fn apply(&self, config: LogConfig) -> LogResult<Option<PathBuf>> {
        config.validate()?;

        let file = if config.use_file_sink {
            Some(Arc::new(RotatingFileSink::open(config.file_settings())?))
        } else {
            None
        };

        let mut slots = Vec::with_capacity(2);
        if config.use_platform_sink {
            slots.push(SinkSlot::new(
                config.effective_platform_pattern(),
                Arc::new(self.platform_sink()),
            ));
        }
        if let Some(file) = &file {
            slots.push(SinkSlot::new(config.pattern.clone(), file.clone() as SharedSink));
        }
        let path = file.as_ref().map(|f| f.path().to_path_buf());

        {
            let mut active = self.active.write();
            if config.reset_configuration {
                for slot in active.slots.iter().chain(self.attached.read().iter()) {
                    if let Err(e) = slot.sink.flush() {
                        log::warn!("Flushing {} sink failed: {}", slot.sink.name(), e);
                    }
                }
                self.attached.write().clear();
                self.registry.clear_level_overrides();
            }
            let previous = std::mem::replace(
                &mut *active,
                ActiveSinks {
                    threshold: config.level,
                    slots,
                    file,
                    config: None,
                },
            );
            // the live file's size is only final once the old sinks are flushed
            if let Some(old_file) = &previous.file {
                if let Err(e) = old_file.flush() {
                    log::warn!("Flushing the previous file sink failed: {}", e);
                }
            }
            drop(previous);
            if let Some(file) = &active.file {
                if let Err(e) = file.refresh_size() {
                    log::warn!("Unable to read the size of {}: {}", file.path().display(), e);
                }
            }
            self.reported_failures.lock().clear();
            for (name, level) in &config.logger_levels {
                self.registry.set_level_for(name, *level)?;
            }
            active.config = Some(config);
        }

        Ok(path)
    }

    fn platform_sink(&self) -> PlatformSink {
        match self.fatal_hook.read().clone() {
            Some(hook) => PlatformSink::new().with_fatal_hook(hook),
            None => PlatformSink::new(),
        }
    }

    /// Run `hook` for every `Assert` record the platform sink writes
    ///
    /// Takes effect at the next `configure`.
    pub fn set_fatal_hook(&self, hook: FatalHook) {
        *self.fatal_hook.write() = Some(hook);
    }

    /// Add a sink after the configured ones
    ///
    /// Attached sinks survive a `configure` without `reset_configuration`
    /// and are dropped by one with it.
    pub fn attach_sink(&self, pattern: impl Into<String>, sink: SharedSink) {
        self.attached.write().push(SinkSlot::new(pattern, sink));
    }

    /// Log `message` under `tag`
    pub fn log(&self, level: Level, tag: &str, message: &str, throwable: Option<&Throwable>) {
        self.dispatch(level, tag, || message.to_string(), throwable.cloned(), None);
    }

    /// Log preformatted arguments, with an optional throwable and call site
    ///
    /// The arguments are only rendered when the level is enabled.
    pub fn log_args(
        &self,
        level: Level,
        tag: &str,
        args: fmt::Arguments<'_>,
        throwable: Option<Throwable>,
        call_site: Option<CallSite>,
    ) {
        self.dispatch(level, tag, || args.to_string(), throwable, call_site);
    }

    fn dispatch(
        &self,
        level: Level,
        tag: &str,
        message: impl FnOnce() -> String,
        throwable: Option<Throwable>,
        call_site: Option<CallSite>,
    ) {
        if !self.is_enabled_for_tag(tag, level) {
            return;
        }

        let record = LogRecord::new(self.clock.now(), level, tag, message())
            .with_call_site(call_site)
            .with_throwable(throwable);

        let active = self.active.read();
        let attached = self.attached.read();
        let mut formatted: Vec<(&str, String)> = Vec::with_capacity(2);

        for slot in active.slots.iter().chain(attached.iter()) {
            let pattern = slot.formatter.pattern();
            let index = match formatted.iter().position(|(p, _)| *p == pattern) {
                Some(index) => index,
                None => {
                    formatted.push((pattern, slot.formatter.format(&record)));
                    formatted.len() - 1
                }
            };
            if let Err(e) = slot.sink.write(&record, &formatted[index].1) {
                self.record_failure(slot.sink.name(), &e);
            }
        }
    }

    fn record_failure(&self, sink: &str, error: &LogError) {
        self.failed_writes.fetch_add(1, Ordering::Relaxed);
        // warn once per sink until the next configure
        if self.reported_failures.lock().insert(sink.to_string()) {
            log::warn!("Writing to the {} sink failed: {}", sink, error);
        }
    }

    /// Log at `Verbose`
    pub fn v(&self, tag: &str, message: impl fmt::Display) {
        self.log_args(Level::Verbose, tag, format_args!("{}", message), None, None);
    }

    /// Log at `Debug`
    pub fn d(&self, tag: &str, message: impl fmt::Display) {
        self.log_args(Level::Debug, tag, format_args!("{}", message), None, None);
    }

    /// Log at `Info`
    pub fn i(&self, tag: &str, message: impl fmt::Display) {
        self.log_args(Level::Info, tag, format_args!("{}", message), None, None);
    }

    /// Log at `Warn`
    pub fn w(&self, tag: &str, message: impl fmt::Display) {
        self.log_args(Level::Warn, tag, format_args!("{}", message), None, None);
    }

    /// Log at `Error`
    pub fn e(&self, tag: &str, message: impl fmt::Display) {
        self.log_args(Level::Error, tag, format_args!("{}", message), None, None);
    }

    /// Log at `Assert`: a condition that should never happen
    pub fn wtf(&self, tag: &str, message: impl fmt::Display) {
        self.log_args(Level::Assert, tag, format_args!("{}", message), None, None);
    }

    pub fn v_with(&self, tag: &str, message: impl fmt::Display, throwable: &Throwable) {
        self.log_with(Level::Verbose, tag, message, throwable);
    }

    pub fn d_with(&self, tag: &str, message: impl fmt::Display, throwable: &Throwable) {
        self.log_with(Level::Debug, tag, message, throwable);
    }

    pub fn i_with(&self, tag: &str, message: impl fmt::Display, throwable: &Throwable) {
        self.log_with(Level::Info, tag, message, throwable);
    }

    pub fn w_with(&self, tag: &str, message: impl fmt::Display, throwable: &Throwable) {
        self.log_with(Level::Warn, tag, message, throwable);
    }

    pub fn e_with(&self, tag: &str, message: impl fmt::Display, throwable: &Throwable) {
        self.log_with(Level::Error, tag, message, throwable);
    }

    pub fn wtf_with(&self, tag: &str, message: impl fmt::Display, throwable: &Throwable) {
        self.log_with(Level::Assert, tag, message, throwable);
    }

    fn log_with(&self, level: Level, tag: &str, message: impl fmt::Display, throwable: &Throwable) {
        self.log_args(level, tag, format_args!("{}", message), Some(throwable.clone()), None);
    }

    /// Log an error at `Error`, using its own text as the message
    pub fn log_error(&self, tag: &str, error: &(dyn Error + 'static)) {
        if !self.is_enabled_for_tag(tag, Level::Error) {
            return;
        }
        let throwable = Throwable::from_dyn_error(error);
        self.log_args(Level::Error, tag, format_args!("{}", error), Some(throwable), None);
    }

    /// Log a throwable alone, using its own message
    pub fn log_throwable(&self, level: Level, tag: &str, throwable: &Throwable) {
        self.log_args(
            level,
            tag,
            format_args!("{}", throwable.message),
            Some(throwable.clone()),
            None,
        );
    }

    /// Check whether `level` passes the global threshold
    pub fn is_enabled_for(&self, level: Level) -> bool {
        is_enabled(self.threshold(), level)
    }

    /// Check whether `level` passes the threshold of logger `tag`
    pub fn is_enabled_for_tag(&self, tag: &str, level: Level) -> bool {
        is_enabled(self.threshold_for(tag), level)
    }

    /// Global threshold
    pub fn threshold(&self) -> Level {
        self.active.read().threshold
    }

    /// Effective threshold of logger `tag`
    pub fn threshold_for(&self, tag: &str) -> Level {
        let global = self.threshold();
        match self.registry.get(tag) {
            Some(handle) => handle.threshold(global),
            None => global,
        }
    }

    /// Get or create the named logger
    pub fn get_logger(&self, name: &str) -> LogResult<Arc<LoggerHandle>> {
        self.registry.get_logger(name)
    }

    /// Override the threshold of the named logger
    pub fn set_level_for(&self, name: &str, level: Level) -> LogResult<()> {
        self.registry.set_level_for(name, level)
    }

    /// Loggers created so far
    pub fn registry(&self) -> &LoggerRegistry {
        &self.registry
    }

    /// Current lifecycle state
    pub fn state(&self) -> FacadeState {
        FacadeState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// The config applied by the last successful `configure`
    pub fn config(&self) -> Option<LogConfig> {
        self.active.read().config.clone()
    }

    /// Settings of the active file sink
    pub fn file_settings(&self) -> Option<FileSinkSettings> {
        self.active.read().file.as_ref().map(|f| f.settings().clone())
    }

    /// Path of the live log file, if a file sink is active
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.active.read().file.as_ref().map(|f| f.path().to_path_buf())
    }

    /// Contents of the live log file
    pub fn read_log_file(&self) -> LogResult<Vec<u8>> {
        match self.file_sink() {
            Some(file) => file.read_all(),
            None => Err(LogError::config("no file sink is configured")),
        }
    }

    /// Truncate the live log file and delete its backups
    ///
    /// A no-op without a file sink.
    pub fn clear_logs(&self) -> LogResult<()> {
        match self.file_sink() {
            Some(file) => file.clear(),
            None => Ok(()),
        }
    }

    fn file_sink(&self) -> Option<Arc<RotatingFileSink>> {
        self.active.read().file.clone()
    }

    /// Flush every sink, returning the first failure
    pub fn flush(&self) -> LogResult<()> {
        let active = self.active.read();
        let attached = self.attached.read();
        let mut result = Ok(());
        for slot in active.slots.iter().chain(attached.iter()) {
            if let Err(e) = slot.sink.flush() {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Number of sink writes that failed
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// Names of the sinks that failed since the last `configure`
    pub fn failing_sinks(&self) -> Vec<String> {
        let mut names: Vec<String> = self.reported_failures.lock().iter().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for LoggingFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingFacade")
            .field("state", &self.state())
            .field("threshold", &self.threshold())
            .field("log_file_path", &self.log_file_path())
            .field("failed_writes", &self.failed_writes())
            .finish()
    }
}
