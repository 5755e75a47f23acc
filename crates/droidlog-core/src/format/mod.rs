//! Record formatting
//!
//! - `PatternFormatter`: compiled log4j-style conversion pattern
//! - `Clock`: injectable time source for record timestamps

mod clock;
mod pattern;

pub use clock::{Clock, FixedClock, SystemClock};
pub use pattern::{format, PatternFormatter, DEFAULT_PATTERN, PLATFORM_PATTERN};
