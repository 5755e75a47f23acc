//! JNI bindings for droidlog
//!
//! Exposes the process-wide facade as native methods of `dev.droidlog.DroidLog`:
//!
//! ```java
//! public final class DroidLog {
//!     static { System.loadLibrary("droidlog_jni"); }
//!
//!     public static native void configure(String folder, String fileName, String level,
//!             String pattern, int maxBackupFiles, long maxFileSize);
//!     public static native void log(int priority, String tag, String message);
//!     public static native boolean isEnabledFor(int priority);
//!     public static native void setLevelFor(String name, String level);
//!     public static native String logFilePath();
//! }
//! ```
//!
//! Priorities are the `android.util.Log` constants. Failures surface as
//! `IllegalArgumentException` for bad input and `IllegalStateException` for
//! I/O trouble.

use std::ffi::c_void;

use jni::objects::{JClass, JObject, JString};
use jni::sys::{jboolean, jint, jlong, jstring, JNI_FALSE, JNI_TRUE, JNI_VERSION_1_6};
use jni::JNIEnv;
use thiserror::Error;

use droidlog_core::{Level, LogConfig, LogError};

const ILLEGAL_ARGUMENT: &str = "java/lang/IllegalArgumentException";
const ILLEGAL_STATE: &str = "java/lang/IllegalStateException";

#[derive(Debug, Error)]
enum BindingError {
    #[error(transparent)]
    Log(#[from] LogError),

    #[error("JNI call failed: {0}")]
    Jni(#[from] jni::errors::Error),
}

impl BindingError {
    /// Java exception class thrown for this error
    fn exception_class(&self) -> &'static str {
        match self {
            BindingError::Log(LogError::SinkInit { .. })
            | BindingError::Log(LogError::Write { .. })
            | BindingError::Log(LogError::Io(_))
            | BindingError::Jni(_) => ILLEGAL_STATE,
            BindingError::Log(_) => ILLEGAL_ARGUMENT,
        }
    }

    /// A Java exception is already pending and must not be replaced
    fn is_pending_exception(&self) -> bool {
        matches!(self, BindingError::Jni(jni::errors::Error::JavaException))
    }
}

type BindingResult<T> = Result<T, BindingError>;

fn throw(env: &mut JNIEnv<'_>, err: BindingError) {
    if err.is_pending_exception() {
        return;
    }
    let class = err.exception_class();
    if let Err(e) = env.throw_new(class, err.to_string()) {
        log::error!("Throwing {} failed: {:?}", class, e);
    }
}

fn read_string(env: &mut JNIEnv<'_>, field: &str, value: &JString<'_>) -> BindingResult<String> {
    if value.is_null() {
        return Err(LogError::invalid_argument(format!("{} must not be null", field)).into());
    }
    Ok(env.get_string(value)?.into())
}

/// Convert a Java numeric setting, rejecting negatives
fn to_setting(field: &str, value: i64) -> Result<u64, LogError> {
    u64::try_from(value).map_err(|_| LogError::invalid_argument(format!("invalid {}: {}", field, value)))
}

fn build_config(
    folder: String,
    file_name: String,
    level: &str,
    pattern: String,
    max_backup_files: i64,
    max_file_size: i64,
) -> Result<LogConfig, LogError> {
    let backups = to_setting("max_backup_files", max_backup_files)?;
    let backups = u32::try_from(backups)
        .map_err(|_| LogError::invalid_argument(format!("invalid max_backup_files: {}", backups)))?;

    let config = LogConfig::with_params(
        folder,
        file_name,
        Level::parse(level)?,
        pattern,
        backups,
        to_setting("max_file_size", max_file_size)?,
    );
    config.validate()?;
    Ok(config)
}

#[no_mangle]
pub extern "system" fn JNI_OnLoad(_vm: *mut jni::sys::JavaVM, _reserved: *mut c_void) -> jint {
    // a host that already installed a `log` logger keeps it
    if droidlog_core::init_log_bridge().is_err() {
        droidlog_core::w("droidlog", "log crate bridge not installed: another logger is active");
    }
    JNI_VERSION_1_6
}

#[no_mangle]
pub extern "system" fn Java_dev_droidlog_DroidLog_configure<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    folder: JString<'local>,
    file_name: JString<'local>,
    level: JString<'local>,
    pattern: JString<'local>,
    max_backup_files: jint,
    max_file_size: jlong,
) {
    let result = (|| -> BindingResult<()> {
        let config = build_config(
            read_string(&mut env, "folder", &folder)?,
            read_string(&mut env, "fileName", &file_name)?,
            &read_string(&mut env, "level", &level)?,
            read_string(&mut env, "pattern", &pattern)?,
            i64::from(max_backup_files),
            max_file_size,
        )?;
        droidlog_core::configure(config)?;
        Ok(())
    })();

    if let Err(err) = result {
        throw(&mut env, err);
    }
}

#[no_mangle]
pub extern "system" fn Java_dev_droidlog_DroidLog_log<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    priority: jint,
    tag: JString<'local>,
    message: JString<'local>,
) {
    let result = (|| -> BindingResult<()> {
        let level = Level::from_priority(priority)?;
        let tag = read_string(&mut env, "tag", &tag)?;
        if !droidlog_core::global().is_enabled_for_tag(&tag, level) {
            return Ok(());
        }
        let message = read_string(&mut env, "message", &message)?;
        droidlog_core::log(level, &tag, &message, None);
        Ok(())
    })();

    if let Err(err) = result {
        throw(&mut env, err);
    }
}

#[no_mangle]
pub extern "system" fn Java_dev_droidlog_DroidLog_isEnabledFor<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    priority: jint,
) -> jboolean {
    match Level::from_priority(priority) {
        Ok(level) if droidlog_core::is_enabled_for(level) => JNI_TRUE,
        Ok(_) => JNI_FALSE,
        Err(e) => {
            throw(&mut env, e.into());
            JNI_FALSE
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_dev_droidlog_DroidLog_setLevelFor<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    name: JString<'local>,
    level: JString<'local>,
) {
    let result = (|| -> BindingResult<()> {
        let name = read_string(&mut env, "name", &name)?;
        let level = Level::parse(&read_string(&mut env, "level", &level)?)?;
        droidlog_core::set_level_for(&name, level)?;
        Ok(())
    })();

    if let Err(err) = result {
        throw(&mut env, err);
    }
}

/// Live log file path, or `null` without a file sink
#[no_mangle]
pub extern "system" fn Java_dev_droidlog_DroidLog_logFilePath<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    let Some(path) = droidlog_core::log_file_path() else {
        return JObject::null().into_raw();
    };
    match env.new_string(path.to_string_lossy()) {
        Ok(value) => value.into_raw(),
        Err(e) => {
            throw(&mut env, e.into());
            JObject::null().into_raw()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_classes() {
        let bad_level: BindingError = LogError::InvalidLevel("loud".into()).into();
        assert_eq!(bad_level.exception_class(), ILLEGAL_ARGUMENT);

        let bad_arg: BindingError = LogError::invalid_argument("empty").into();
        assert_eq!(bad_arg.exception_class(), ILLEGAL_ARGUMENT);

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let sink: BindingError = LogError::sink_init("/data/app.log", io).into();
        assert_eq!(sink.exception_class(), ILLEGAL_STATE);

        let jni: BindingError = jni::errors::Error::NullPtr("env").into();
        assert_eq!(jni.exception_class(), ILLEGAL_STATE);
        assert!(!jni.is_pending_exception());
        assert!(BindingError::from(jni::errors::Error::JavaException).is_pending_exception());
    }

    #[test]
    fn test_negative_settings_rejected() {
        assert_eq!(to_setting("max_file_size", 1024).unwrap(), 1024);
        assert!(matches!(
            to_setting("max_file_size", -1),
            Err(LogError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_build_config() {
        let config = build_config(
            "/data/logs".into(),
            "app.log".into(),
            "debug",
            "%m%n".into(),
            2,
            4096,
        )
        .unwrap();
        assert_eq!(config.level, Level::Debug);
        assert_eq!(config.max_backup_files, 2);
        assert_eq!(config.max_file_size, 4096);

        assert!(matches!(
            build_config("/data/logs".into(), "app.log".into(), "loud", "%m".into(), 2, 4096),
            Err(LogError::InvalidLevel(_))
        ));
        assert!(matches!(
            build_config("/data/logs".into(), "app.log".into(), "info", "%m".into(), 0, 4096),
            Err(LogError::InvalidArgument(_))
        ));
        assert!(matches!(
            build_config("".into(), "app.log".into(), "info", "%m".into(), 1, 4096),
            Err(LogError::InvalidArgument(_))
        ));
    }
}
