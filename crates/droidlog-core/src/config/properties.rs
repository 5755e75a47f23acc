//! log4j-style property file configuration
//!
//! Recognized keys:
//!
//! ```text
//! log4j.rootLogger=INFO, file, logcat
//! log4j.appender.file=org.apache.log4j.RollingFileAppender
//! log4j.appender.file.File=/data/data/com.example/files/logs/app.log
//! log4j.appender.file.MaxFileSize=5MB
//! log4j.appender.file.MaxBackupIndex=3
//! log4j.appender.file.ImmediateFlush=true
//! log4j.appender.file.layout.ConversionPattern=%d %5p [%c] - %m%n
//! log4j.appender.logcat=com.example.AndroidAppender
//! log4j.appender.logcat.layout.ConversionPattern=%m
//! log4j.logger.Network=DEBUG
//! ```
//!
//! `MaxFileSize` is in megabytes unless it carries a `B`, `KB`, `MB` or `GB`
//! suffix.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use super::options::LogConfig;
use crate::error::{LogError, LogResult};
use crate::types::Level;

const ROOT_KEYS: [&str; 2] = ["log4j.rootLogger", "log4j.rootCategory"];
const APPENDER_PREFIX: &str = "log4j.appender.";
const LOGGER_PREFIX: &str = "log4j.logger.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppenderKind {
    File { rolling: bool },
    Platform,
}

impl LogConfig {
    /// Read a property stream; empty or malformed input is an error
    pub fn from_properties<R: Read>(mut reader: R) -> LogResult<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_properties_str(&text)
    }

    /// Parse property text
    pub fn from_properties_str(text: &str) -> LogResult<Self> {
        let props = parse_properties(text)?;
        if props.is_empty() {
            return Err(LogError::config("configuration is empty"));
        }

        let root = ROOT_KEYS
            .iter()
            .find_map(|key| props.get(*key))
            .ok_or_else(|| LogError::config("missing log4j.rootLogger"))?;

        let mut parts = root.split(',').map(str::trim);
        let mut config = LogConfig {
            use_file_sink: false,
            use_platform_sink: false,
            ..LogConfig::default()
        };
        if let Some(level) = parts.next().filter(|l| !l.is_empty()) {
            config.level = Level::parse(level)?;
        }

        let mut file_appender = None;
        for name in parts.filter(|n| !n.is_empty()) {
            let class = props
                .get(&format!("{}{}", APPENDER_PREFIX, name))
                .ok_or_else(|| LogError::config(format!("appender '{}' has no class", name)))?;

            match appender_kind(class)? {
                AppenderKind::File { rolling } => {
                    if file_appender.is_some() {
                        log::warn!("Ignoring extra file appender '{}'", name);
                        continue;
                    }
                    config.use_file_sink = true;
                    config.use_rolling_file = rolling;
                    file_appender = Some(name);
                }
                AppenderKind::Platform => {
                    config.use_platform_sink = true;
                    if let Some(pattern) = appender_prop(&props, name, "layout.ConversionPattern") {
                        config.platform_pattern = Some(pattern.to_string());
                    }
                }
            }
        }

        if let Some(name) = file_appender {
            apply_file_appender(&mut config, &props, name)?;
        }

        for (key, value) in props.range(LOGGER_PREFIX.to_string()..) {
            let Some(logger) = key.strip_prefix(LOGGER_PREFIX) else {
                break;
            };
            let level = value.split(',').next().unwrap_or("").trim();
            config.logger_levels.insert(logger.to_string(), Level::parse(level)?);
        }

        config.validate()?;
        Ok(config)
    }
}

fn apply_file_appender(
    config: &mut LogConfig,
    props: &BTreeMap<String, String>,
    name: &str,
) -> LogResult<()> {
    let file = appender_prop(props, name, "File")
        .ok_or_else(|| LogError::config(format!("appender '{}' has no File", name)))?;
    let path = Path::new(file);
    config.file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .ok_or_else(|| LogError::config(format!("invalid log file '{}'", file)))?;
    config.logs_folder = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    };

    if let Some(pattern) = appender_prop(props, name, "layout.ConversionPattern") {
        config.pattern = pattern.to_string();
    }
    if let Some(size) = appender_prop(props, name, "MaxFileSize") {
        config.max_file_size = parse_size(size)?;
    }
    if let Some(count) = appender_prop(props, name, "MaxBackupIndex") {
        config.max_backup_files = count
            .parse()
            .map_err(|_| LogError::config(format!("invalid MaxBackupIndex '{}'", count)))?;
    }
    if let Some(flush) = appender_prop(props, name, "ImmediateFlush") {
        config.immediate_flush = parse_bool(flush)?;
    }
    Ok(())
}

fn appender_prop<'a>(
    props: &'a BTreeMap<String, String>,
    appender: &str,
    field: &str,
) -> Option<&'a str> {
    props
        .get(&format!("{}{}.{}", APPENDER_PREFIX, appender, field))
        .map(String::as_str)
}

fn appender_kind(class: &str) -> LogResult<AppenderKind> {
    let simple = class.rsplit('.').next().unwrap_or(class);
    if simple.ends_with("RollingFileAppender") {
        Ok(AppenderKind::File { rolling: true })
    } else if simple.ends_with("FileAppender") {
        Ok(AppenderKind::File { rolling: false })
    } else if ["Android", "Logcat", "Console"].iter().any(|k| simple.contains(k)) {
        Ok(AppenderKind::Platform)
    } else {
        Err(LogError::config(format!("unsupported appender class '{}'", class)))
    }
}

/// Parse `5MB`, `512KB`, `1GB`, `100B` or a bare megabyte count
fn parse_size(value: &str) -> LogResult<u64> {
    let upper = value.trim().to_ascii_uppercase();
    let (digits, unit) = match upper.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => upper.split_at(idx),
        None => (upper.as_str(), ""),
    };
    let multiplier: u64 = match unit.trim() {
        "" | "MB" => 1024 * 1024,
        "KB" => 1024,
        "GB" => 1024 * 1024 * 1024,
        "B" => 1,
        _ => return Err(LogError::config(format!("invalid MaxFileSize '{}'", value))),
    };
    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| LogError::config(format!("invalid MaxFileSize '{}'", value)))
}

fn parse_bool(value: &str) -> LogResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(LogError::config(format!("invalid boolean '{}'", value))),
    }
}

/// Split property text into key/value pairs
///
/// `#` and `!` start comments, a trailing `\` continues the line, and the
/// first `=` or `:` separates key from value.
fn parse_properties(text: &str) -> LogResult<BTreeMap<String, String>> {
    let mut props = BTreeMap::new();
    let mut pending = String::new();
    let mut start_line = 0;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if pending.is_empty() {
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            start_line = index + 1;
        }

        if let Some(head) = line.strip_suffix('\\') {
            pending.push_str(head);
            continue;
        }
        pending.push_str(line);

        let entry = std::mem::take(&mut pending);
        let Some(split) = entry.find(['=', ':']) else {
            return Err(LogError::config(format!(
                "malformed line {}: '{}'",
                start_line, entry
            )));
        };
        let key = entry[..split].trim();
        if key.is_empty() {
            return Err(LogError::config(format!("missing key on line {}", start_line)));
        }
        props.insert(key.to_string(), entry[split + 1..].trim().to_string());
    }

    if !pending.is_empty() {
        return Err(LogError::config("unterminated line continuation"));
    }
    Ok(props)
}
