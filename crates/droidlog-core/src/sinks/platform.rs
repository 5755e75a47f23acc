//! Platform sink: logcat on Android, stderr elsewhere

use std::sync::Arc;

use super::traits::Sink;
use crate::error::LogResult;
use crate::types::{Level, LogRecord};

/// Tag used when a record has no logger name
pub const DEFAULT_TAG: &str = "droidlog";

/// Callback run for `Assert` records after they are written
pub type FatalHook = Arc<dyn Fn(&LogRecord) + Send + Sync>;

/// One native log write: Android priority, tag and text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformLine<'a> {
    pub priority: i32,
    pub tag: &'a str,
    pub text: &'a str,
}

impl<'a> PlatformLine<'a> {
    /// The write for `record`, or `None` for `Suppress`
    ///
    /// An empty logger name becomes [`DEFAULT_TAG`]. Trailing newlines are
    /// dropped because logcat adds its own line structure.
    pub fn new(record: &'a LogRecord, formatted: &'a str) -> Option<Self> {
        if record.level == Level::Suppress {
            return None;
        }
        let tag = if record.logger_name.is_empty() {
            DEFAULT_TAG
        } else {
            record.logger_name.as_str()
        };
        Some(Self {
            priority: record.level.priority(),
            tag,
            text: formatted.trim_end_matches(['\r', '\n']),
        })
    }
}

/// A sink that writes to the host's native log
///
/// Each record is written under its logger name as the tag, at the Android
/// priority of its level; `Assert` goes out as fatal.
pub struct PlatformSink {
    fatal_hook: Option<FatalHook>,
}

impl Default for PlatformSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformSink {
    /// Create a platform sink
    pub fn new() -> Self {
        Self { fatal_hook: None }
    }

    /// Run `hook` for every `Assert` record
    pub fn with_fatal_hook(mut self, hook: FatalHook) -> Self {
        self.fatal_hook = Some(hook);
        self
    }

    #[cfg(target_os = "android")]
    fn emit(&self, line: &PlatformLine<'_>) {
        let tag = c_text(line.tag);
        let text = c_text(line.text);
        unsafe {
            android_log_sys::__android_log_write(line.priority as _, tag.as_ptr(), text.as_ptr());
        }
    }

    #[cfg(not(target_os = "android"))]
    fn emit(&self, line: &PlatformLine<'_>) {
        let letter = Level::from_priority(line.priority)
            .map(priority_letter)
            .unwrap_or('?');
        for text in line.text.lines() {
            eprintln!("{}/{}: {}", letter, line.tag, text);
        }
    }
}

/// C string for liblog, with interior NULs removed
#[cfg(target_os = "android")]
fn c_text(value: &str) -> std::ffi::CString {
    let bytes: Vec<u8> = value.bytes().filter(|b| *b != 0).collect();
    std::ffi::CString::new(bytes).unwrap_or_default()
}

/// Single-letter priority as logcat prints it
pub fn priority_letter(level: Level) -> char {
    match level {
        Level::Verbose => 'V',
        Level::Debug => 'D',
        Level::Info => 'I',
        Level::Warn => 'W',
        Level::Error => 'E',
        Level::Assert => 'F',
        Level::Suppress => 'S',
    }
}

impl Sink for PlatformSink {
    fn name(&self) -> &str {
        "platform"
    }

    fn write(&self, record: &LogRecord, formatted: &str) -> LogResult<()> {
        if let Some(line) = PlatformLine::new(record, formatted) {
            self.emit(&line);
        }

        if record.level == Level::Assert {
            if let Some(hook) = &self.fatal_hook {
                hook(record);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for PlatformSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformSink")
            .field("fatal_hook", &self.fatal_hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(level: Level, tag: &str) -> LogRecord {
        let ts = DateTime::parse_from_rfc3339("2024-03-05T07:08:09+00:00").unwrap();
        LogRecord::new(ts, level, tag, "message")
    }

    #[test]
    fn test_priority_letters() {
        assert_eq!(priority_letter(Level::Verbose), 'V');
        assert_eq!(priority_letter(Level::Info), 'I');
        assert_eq!(priority_letter(Level::Assert), 'F');
    }

    #[test]
    fn test_platform_sink_writes() {
        let sink = PlatformSink::new();
        for level in Level::ALL {
            sink.write(&record(level, "Test"), "message\n").unwrap();
        }
        sink.write(&record(Level::Info, ""), "untagged").unwrap();
        assert_eq!(sink.name(), "platform");

        let fatal = record(Level::Assert, "Test");
        assert_eq!(
            PlatformLine::new(&fatal, "boom\r\n"),
            Some(PlatformLine { priority: 7, tag: "Test", text: "boom" })
        );
        let error = record(Level::Error, "Test");
        assert_eq!(PlatformLine::new(&error, "failed").unwrap().priority, 6);
        let verbose = record(Level::Verbose, "Test");
        assert_eq!(PlatformLine::new(&verbose, "noise").unwrap().priority, 2);

        let untagged = record(Level::Info, "");
        assert_eq!(PlatformLine::new(&untagged, "x").unwrap().tag, DEFAULT_TAG);
        assert_eq!(PlatformLine::new(&record(Level::Suppress, "Test"), "x"), None);
    }

    #[test]
    fn test_fatal_hook_only_for_assert() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sink = PlatformSink::new().with_fatal_hook(Arc::new(move |record: &LogRecord| {
            assert_eq!(record.level, Level::Assert);
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        sink.write(&record(Level::Error, "T"), "error").unwrap();
        sink.write(&record(Level::Assert, "T"), "fatal").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
