//! Log output destinations

mod traits;
mod memory;
mod platform;
pub mod file;

pub use traits::{SharedSink, Sink};
pub use memory::{CapturedLine, MemorySink};
pub use platform::{priority_letter, FatalHook, PlatformLine, PlatformSink, DEFAULT_TAG};
pub use file::{FileSinkSettings, RotatingFileSink};
