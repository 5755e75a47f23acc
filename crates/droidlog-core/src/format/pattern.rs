//! Pattern layout: renders a record through a conversion template
//!
//! The template uses the log4j conversion syntax. A `%` is followed by an
//! optional format modifier (`-` to left-justify, a minimum width, `.` and a
//! maximum width) and a conversion character, which may take a `{option}`:
//!
//! | Token | Output |
//! |-------|--------|
//! | `%d`, `%d{fmt}` | timestamp; `fmt` is a Java-style date format or `ISO8601`, `ABSOLUTE`, `DATE` |
//! | `%p` | level name |
//! | `%c`, `%c{N}` | logger name, optionally only its last `N` segments |
//! | `%C` | call-site module |
//! | `%F` / `%L` | call-site file / line |
//! | `%M` | method (`?`, not available in Rust) |
//! | `%l` | `module(file:line)` |
//! | `%t` | thread name |
//! | `%m` | message |
//! | `%n` | newline |
//! | `%%` | a literal `%` |
//!
//! Anything else passes through unchanged.

use chrono::{DateTime, FixedOffset, Timelike};

use crate::types::LogRecord;

/// Built-in template used when none is configured
pub const DEFAULT_PATTERN: &str = "[%d{yyyy-MM-dd HH:mm:ss.SSS zzz}] %5p [%c{1}(%L)] - %m%n";

/// Template for logcat output, which already carries time, level and tag
pub const PLATFORM_PATTERN: &str = "%m";

const ISO8601: &str = "yyyy-MM-dd HH:mm:ss,SSS";
const ABSOLUTE: &str = "HH:mm:ss,SSS";
const DATE: &str = "dd MMM yyyy HH:mm:ss,SSS";

/// A compiled pattern
#[derive(Debug, Clone)]
pub struct PatternFormatter {
    pattern: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Token(Conversion, Modifier),
}

#[derive(Debug, Clone)]
enum Conversion {
    Date(Vec<DatePart>),
    Level,
    Logger(Option<usize>),
    Module,
    File,
    Line,
    Method,
    Location,
    Thread,
    Message,
    Newline,
}

#[derive(Debug, Clone, Copy, Default)]
struct Modifier {
    left_justify: bool,
    min: usize,
    max: Option<usize>,
}

#[derive(Debug, Clone)]
enum DatePart {
    /// A chrono strftime fragment
    Strftime(String),
    /// Milliseconds, zero-padded to the given width
    Millis(usize),
}

impl PatternFormatter {
    /// Compile a pattern
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let segments = compile(&pattern);
        Self { pattern, segments }
    }

    /// The source template
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render a record
    ///
    /// A throwable, if present, is appended after the formatted line on its
    /// own lines.
    pub fn format(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(self.pattern.len() + record.message.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token(conversion, modifier) => {
                    let value = render(conversion, record);
                    modifier.apply(&value, &mut out);
                }
            }
        }

        if let Some(throwable) = &record.throwable {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&throwable.render());
        }
        out
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}

/// Render `record` through `pattern` without keeping the compiled form
pub fn format(record: &LogRecord, pattern: &str) -> String {
    PatternFormatter::new(pattern).format(record)
}

impl Modifier {
    fn apply(&self, value: &str, out: &mut String) {
        let count = value.chars().count();
        let value = match self.max {
            // log4j truncates from the front, keeping the tail
            Some(max) if count > max => {
                let skip = value
                    .char_indices()
                    .nth(count - max)
                    .map_or(value.len(), |(idx, _)| idx);
                &value[skip..]
            }
            _ => value,
        };

        let width = value.chars().count();
        let padding = self.min.saturating_sub(width);
        if self.left_justify {
            out.push_str(value);
            out.extend(std::iter::repeat(' ').take(padding));
        } else {
            out.extend(std::iter::repeat(' ').take(padding));
            out.push_str(value);
        }
    }
}

fn render(conversion: &Conversion, record: &LogRecord) -> String {
    let site = record.call_site.as_ref();
    match conversion {
        Conversion::Date(parts) => render_date(parts, &record.timestamp),
        Conversion::Level => record.level.as_str().to_string(),
        Conversion::Logger(None) => record.logger_name.clone(),
        Conversion::Logger(Some(n)) => last_segments(&record.logger_name, *n).to_string(),
        Conversion::Module => site.map_or_else(|| "?".to_string(), |s| s.module.to_string()),
        Conversion::File => site.map_or_else(|| "?".to_string(), |s| s.file.to_string()),
        Conversion::Line => site.map_or_else(|| "?".to_string(), |s| s.line.to_string()),
        Conversion::Method => "?".to_string(),
        Conversion::Location => site.map_or_else(
            || "?".to_string(),
            |s| format!("{}({}:{})", s.module, s.file, s.line),
        ),
        Conversion::Thread => record.thread_name.clone(),
        Conversion::Message => record.message.clone(),
        Conversion::Newline => "\n".to_string(),
    }
}

fn render_date(parts: &[DatePart], timestamp: &DateTime<FixedOffset>) -> String {
    let mut out = String::new();
    for part in parts {
        match part {
            DatePart::Strftime(fmt) => out.push_str(&timestamp.format(fmt).to_string()),
            DatePart::Millis(width) => {
                let millis = timestamp.nanosecond() / 1_000_000 % 1000;
                out.push_str(&format!("{:0width$}", millis, width = *width));
            }
        }
    }
    out
}

/// Keep the last `n` segments of a dotted or `::`-separated name
fn last_segments(name: &str, n: usize) -> &str {
    if n == 0 {
        return name;
    }
    let mut found = 0;
    let mut idx = name.len();
    while idx > 0 {
        let head = &name[..idx];
        let sep_len = if head.ends_with("::") {
            2
        } else if head.ends_with('.') {
            1
        } else {
            0
        };
        if sep_len > 0 {
            found += 1;
            if found == n {
                return &name[idx..];
            }
            idx -= sep_len;
        } else {
            idx -= head.chars().next_back().map_or(1, char::len_utf8);
        }
    }
    name
}

fn compile(pattern: &str) -> Vec<Segment> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '%' {
            literal.push(chars[i]);
            i += 1;
            continue;
        }

        let start = i;
        i += 1;
        if chars.get(i) == Some(&'%') {
            literal.push('%');
            i += 1;
            continue;
        }

        let mut modifier = Modifier::default();
        if chars.get(i) == Some(&'-') {
            modifier.left_justify = true;
            i += 1;
        }
        modifier.min = take_number(&chars, &mut i).unwrap_or(0);
        if chars.get(i) == Some(&'.') {
            i += 1;
            modifier.max = take_number(&chars, &mut i);
        }

        let Some(&conversion_char) = chars.get(i) else {
            literal.extend(&chars[start..]);
            break;
        };
        i += 1;

        let mut option_end = i;
        let option = take_option(&chars, &mut option_end);
        let conversion = match conversion_char {
            'd' => Some(Conversion::Date(compile_date(option.as_deref().unwrap_or("ISO8601")))),
            'p' => Some(Conversion::Level),
            'c' => Some(Conversion::Logger(
                option.as_deref().and_then(|o| o.trim().parse::<usize>().ok()),
            )),
            'C' => Some(Conversion::Module),
            'F' => Some(Conversion::File),
            'L' => Some(Conversion::Line),
            'M' => Some(Conversion::Method),
            'l' => Some(Conversion::Location),
            't' => Some(Conversion::Thread),
            'm' => Some(Conversion::Message),
            'n' => Some(Conversion::Newline),
            _ => None,
        };

        match conversion {
            Some(conversion) => {
                if matches!(conversion, Conversion::Date(_) | Conversion::Logger(_)) {
                    i = option_end;
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Token(conversion, modifier));
            }
            None => literal.extend(&chars[start..i]),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

fn take_number(chars: &[char], i: &mut usize) -> Option<usize> {
    let start = *i;
    while chars.get(*i).is_some_and(char::is_ascii_digit) {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    chars[start..*i].iter().collect::<String>().parse().ok()
}

fn take_option(chars: &[char], i: &mut usize) -> Option<String> {
    if chars.get(*i) != Some(&'{') {
        return None;
    }
    let close = chars[*i..].iter().position(|c| *c == '}')? + *i;
    let option = chars[*i + 1..close].iter().collect();
    *i = close + 1;
    Some(option)
}

/// Translate a Java `SimpleDateFormat` string into render parts
fn compile_date(format: &str) -> Vec<DatePart> {
    let format = match format {
        "ISO8601" => ISO8601,
        "ABSOLUTE" => ABSOLUTE,
        "DATE" => DATE,
        other => other,
    };

    let chars: Vec<char> = format.chars().collect();
    let mut parts = Vec::new();
    let mut strftime = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            // '' is a literal quote, otherwise quoted text is copied verbatim
            if chars.get(i + 1) == Some(&'\'') {
                strftime.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        strftime.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut strftime, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut strftime, c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while chars.get(i + run) == Some(&c) {
            run += 1;
        }
        i += run;

        let spec = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('a', _) => "%p",
            ('z', _) => "%Z",
            ('Z', _) => "%z",
            ('X', _) => "%:z",
            ('S', _) => {
                if !strftime.is_empty() {
                    parts.push(DatePart::Strftime(std::mem::take(&mut strftime)));
                }
                parts.push(DatePart::Millis(run));
                continue;
            }
            _ => {
                for _ in 0..run {
                    push_literal(&mut strftime, c);
                }
                continue;
            }
        };
        strftime.push_str(spec);
    }

    if !strftime.is_empty() {
        parts.push(DatePart::Strftime(strftime));
    }
    parts
}

fn push_literal(strftime: &mut String, c: char) {
    if c == '%' {
        strftime.push_str("%%");
    } else {
        strftime.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CallSite, Level, Throwable};

    fn record(message: &str) -> LogRecord {
        let ts = DateTime::parse_from_rfc3339("2024-03-05T07:08:09.045+00:00").unwrap();
        LogRecord::new(ts, Level::Info, "com.example.MainActivity", message)
            .with_call_site(Some(CallSite::new("app::ui", "src/ui.rs", 42)))
            .with_thread_name("main")
    }

    #[test]
    fn test_message_only_round_trip() {
        let messages = ["hello", "", "100% done", "a%mb", "multi\nline", "ünïcödé"];
        for message in messages {
            assert_eq!(format(&record(message), "%m"), message);
        }
    }

    #[test]
    fn test_full_pattern() {
        let out = format(
            &record("hello"),
            "[%d{yyyy-MM-dd HH:mm:ss.SSS}] %5p [%c{1}(%L)] - %m%n",
        );
        assert_eq!(out, "[2024-03-05 07:08:09.045]  INFO [MainActivity(42)] - hello\n");
    }

    #[test]
    fn test_default_pattern_shape() {
        let out = PatternFormatter::default().format(&record("hello"));
        assert!(out.starts_with("[2024-03-05 07:08:09.045 "));
        assert!(out.ends_with("]  INFO [MainActivity(42)] - hello\n"));
    }

    #[test]
    fn test_named_date_formats() {
        assert_eq!(format(&record("x"), "%d"), "2024-03-05 07:08:09,045");
        assert_eq!(format(&record("x"), "%d{ABSOLUTE}"), "07:08:09,045");
        assert_eq!(format(&record("x"), "%d{DATE}"), "05 Mar 2024 07:08:09,045");
    }

    #[test]
    fn test_date_quoted_literals() {
        assert_eq!(
            format(&record("x"), "%d{yyyyMMdd'T'HHmm}"),
            "20240305T0708"
        );
        assert_eq!(format(&record("x"), "%d{H 'o''clock'}"), "7 o'clock");
    }

    #[test]
    fn test_call_site_tokens() {
        let out = format(&record("x"), "%C|%F|%L|%M|%l|%t");
        assert_eq!(out, "app::ui|src/ui.rs|42|?|app::ui(src/ui.rs:42)|main");
    }

    #[test]
    fn test_missing_call_site() {
        let mut rec = record("x");
        rec.call_site = None;
        assert_eq!(format(&rec, "%C %F %L %l"), "? ? ? ?");
    }

    #[test]
    fn test_logger_precision() {
        let rec = record("x");
        assert_eq!(format(&rec, "%c"), "com.example.MainActivity");
        assert_eq!(format(&rec, "%c{2}"), "example.MainActivity");
        assert_eq!(format(&rec, "%c{9}"), "com.example.MainActivity");

        let mut rust = record("x");
        rust.logger_name = "app::net::client".to_string();
        assert_eq!(format(&rust, "%c{1}"), "client");
        assert_eq!(format(&rust, "%c{2}"), "net::client");
    }

    #[test]
    fn test_format_modifiers() {
        let rec = record("x");
        assert_eq!(format(&rec, "[%-6p]"), "[INFO  ]");
        assert_eq!(format(&rec, "[%6p]"), "[  INFO]");
        assert_eq!(format(&rec, "[%.4c]"), "[vity]");
        assert_eq!(format(&rec, "[%-10.4c]"), "[vity      ]");
    }

    #[test]
    fn test_unrecognized_tokens_pass_through() {
        let rec = record("x");
        assert_eq!(format(&rec, "%q %m %Z{1}"), "%q x %Z{1}");
        assert_eq!(format(&rec, "100%% %m"), "100% x");
        assert_eq!(format(&rec, "trailing %"), "trailing %");
        assert_eq!(format(&rec, "%-5"), "%-5");
    }

    #[test]
    fn test_throwable_after_line() {
        let rec = record("failed").with_throwable(Some(Throwable::new("IoError", "denied")));

        assert_eq!(format(&rec, "%p %m%n"), "INFO failed\nIoError: denied\n");
        // a pattern without %n still keeps the trace off the message line
        assert_eq!(format(&rec, "%m"), "failed\nIoError: denied\n");
    }

    #[test]
    fn test_formatter_reuse() {
        let formatter = PatternFormatter::new("%p:%m");
        assert_eq!(formatter.pattern(), "%p:%m");
        assert_eq!(formatter.format(&record("a")), "INFO:a");
        assert_eq!(formatter.format(&record("b")), "INFO:b");
    }
}
