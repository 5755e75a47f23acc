//! Core types shared by the formatter, sinks and facade

mod level;
mod record;

pub use level::{is_enabled, Level};
pub use record::{CallSite, LogRecord, Throwable};
