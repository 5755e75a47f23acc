//! Per-call log record, call site and throwable

use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::error::Error;

use chrono::{DateTime, FixedOffset};

use super::level::Level;

/// Where a log call was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Module path of the caller (`%C`)
    pub module: Cow<'static, str>,
    /// Source file (`%F`)
    pub file: Cow<'static, str>,
    /// Source line (`%L`)
    pub line: u32,
}

impl CallSite {
    /// Create a call site from static strings, as produced by [`call_site!`](crate::call_site)
    pub const fn new(module: &'static str, file: &'static str, line: u32) -> Self {
        Self {
            module: Cow::Borrowed(module),
            file: Cow::Borrowed(file),
            line,
        }
    }

    /// Create a call site from borrowed data that does not live long enough
    pub fn owned(module: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            module: Cow::Owned(module.into()),
            file: Cow::Owned(file.into()),
            line,
        }
    }
}

/// Expands to the [`CallSite`] of the invocation
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new(module_path!(), file!(), line!())
    };
}

/// A rendered error chain attached to a record
///
/// Built from any `std::error::Error` by walking `source()`. Frames are only
/// present when a backtrace was captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Throwable {
    pub kind: String,
    pub message: String,
    pub frames: Vec<String>,
    pub cause: Option<Box<Throwable>>,
}

impl Throwable {
    /// Create a throwable with no frames and no cause
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            frames: Vec::new(),
            cause: None,
        }
    }

    /// Build from a concrete error type, using its type name as the kind
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        let mut throwable = Self::new(short_type_name::<E>(), err.to_string());
        throwable.cause = err.source().map(|source| Box::new(Self::from_dyn_error(source)));
        throwable
    }

    /// Build from a trait object; the concrete type is unknown so the kind is `Error`
    pub fn from_dyn_error(err: &(dyn Error + 'static)) -> Self {
        let mut throwable = Self::new("Error", err.to_string());
        throwable.cause = err.source().map(|source| Box::new(Self::from_dyn_error(source)));
        throwable
    }

    /// Set the stack frames
    pub fn with_frames(mut self, frames: Vec<String>) -> Self {
        self.frames = frames;
        self
    }

    /// Take stack frames from a backtrace, if one was captured
    pub fn with_backtrace(mut self, backtrace: &Backtrace) -> Self {
        if backtrace.status() == BacktraceStatus::Captured {
            self.frames = backtrace
                .to_string()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
        }
        self
    }

    /// Set the cause
    pub fn with_cause(mut self, cause: Throwable) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Render the whole chain, one line per entry, each ending in a newline
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut current = Some(self);
        let mut first = true;
        while let Some(throwable) = current {
            if !first {
                out.push_str("Caused by: ");
            }
            out.push_str(&throwable.headline());
            out.push('\n');
            for frame in &throwable.frames {
                out.push_str("\tat ");
                out.push_str(frame);
                out.push('\n');
            }
            first = false;
            current = throwable.cause.as_deref();
        }
        out
    }

    fn headline(&self) -> String {
        if self.message.is_empty() {
            self.kind.clone()
        } else {
            format!("{}: {}", self.kind, self.message)
        }
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// One log call, consumed by the formatter and sinks and then dropped
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<FixedOffset>,
    pub level: Level,
    pub logger_name: String,
    pub call_site: Option<CallSite>,
    pub thread_name: String,
    pub message: String,
    pub throwable: Option<Throwable>,
}

impl LogRecord {
    /// Create a record on the current thread with no call site or throwable
    pub fn new(
        timestamp: DateTime<FixedOffset>,
        level: Level,
        logger_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level,
            logger_name: logger_name.into(),
            call_site: None,
            thread_name: current_thread_name(),
            message: message.into(),
            throwable: None,
        }
    }

    /// Set the call site
    pub fn with_call_site(mut self, call_site: Option<CallSite>) -> Self {
        self.call_site = call_site;
        self
    }

    /// Attach a throwable
    pub fn with_throwable(mut self, throwable: Option<Throwable>) -> Self {
        self.throwable = throwable;
        self
    }

    /// Override the thread name
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }
}

fn current_thread_name() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}
