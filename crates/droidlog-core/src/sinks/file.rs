//! Size-rotated file sink
//!
//! Appends formatted lines to a log file. Once the live file reaches the
//! configured size it is renamed into a numbered backup chain
//! (`app.log.1` newest, `app.log.N` oldest) and a fresh live file is started.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::traits::Sink;
use crate::error::{LogError, LogResult};
use crate::types::LogRecord;

/// Parameters a file sink was opened with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSinkSettings {
    /// Live log file
    pub path: PathBuf,
    /// Rotate once the live file holds at least this many bytes
    pub max_file_size: u64,
    /// Number of numbered backups to keep
    pub max_backup_files: u32,
    /// Flush after every append instead of buffering
    pub immediate_flush: bool,
    /// Whether to rotate at all
    pub rolling: bool,
}

struct FileState {
    writer: BufWriter<File>,
    size: u64,
}

/// File sink with numbered backup rotation
///
/// # Thread Safety
///
/// An append and the rotation it may trigger run under one lock, so
/// concurrent writers never interleave a partial line with a rollover.
pub struct RotatingFileSink {
    settings: FileSinkSettings,
    state: Mutex<FileState>,
}

impl RotatingFileSink {
    /// Open (or create) the live file, creating missing parent folders
    ///
    /// Failing to create the folder is only a warning; failing to open the
    /// file itself is a [`LogError::SinkInit`].
    pub fn open(settings: FileSinkSettings) -> LogResult<Self> {
        ensure_parent(&settings.path);

        let file = open_live(&settings.path, false)
            .map_err(|e| LogError::sink_init(&settings.path, e))?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            settings,
            state: Mutex::new(FileState {
                writer: BufWriter::new(file),
                size,
            }),
        })
    }

    /// Settings this sink was opened with
    pub fn settings(&self) -> &FileSinkSettings {
        &self.settings
    }

    /// Path of the live file
    pub fn path(&self) -> &Path {
        &self.settings.path
    }

    /// Bytes written to the live file, including buffered ones
    pub fn size(&self) -> u64 {
        self.state.lock().size
    }

    /// Append one line, then rotate if the size threshold was reached
    pub fn append(&self, line: &str) -> LogResult<()> {
        let mut state = self.state.lock();
        state
            .writer
            .write_all(line.as_bytes())
            .map_err(|e| LogError::write("file", e))?;
        state.size += line.len() as u64;

        if self.settings.immediate_flush {
            state.writer.flush().map_err(|e| LogError::write("file", e))?;
        }

        self.rotate_locked(&mut state)
    }

    /// Rotate now if the live file is at or above the size threshold
    pub fn check_rotate(&self) -> LogResult<()> {
        let mut state = self.state.lock();
        self.rotate_locked(&mut state)
    }

    /// Existing backup files, newest first
    pub fn backup_paths(&self) -> Vec<PathBuf> {
        (1..=self.settings.max_backup_files)
            .map(|index| backup_path(&self.settings.path, index))
            .filter(|path| path.exists())
            .collect()
    }

    /// Contents of the live file
    pub fn read_all(&self) -> LogResult<Vec<u8>> {
        let mut state = self.state.lock();
        state.writer.flush()?;
        Ok(fs::read(&self.settings.path)?)
    }

    /// Truncate the live file and delete all backups
    pub fn clear(&self) -> LogResult<()> {
        let mut state = self.state.lock();
        state.writer.flush()?;
        for index in 1..=self.settings.max_backup_files {
            remove_if_exists(&backup_path(&self.settings.path, index))?;
        }
        let file = open_live(&self.settings.path, true)
            .map_err(|e| LogError::sink_init(&self.settings.path, e))?;
        state.writer = BufWriter::new(file);
        state.size = 0;
        Ok(())
    }

    fn rotate_locked(&self, state: &mut FileState) -> LogResult<()> {
        if !self.settings.rolling || state.size < self.settings.max_file_size {
            return Ok(());
        }
        self.roll_over(state)
    }

    fn roll_over(&self, state: &mut FileState) -> LogResult<()> {
        let path = &self.settings.path;
        state.writer.flush().map_err(|e| LogError::write("file", e))?;

        // move the live file aside first; the backups are only touched once
        // that has worked
        let staged = staged_path(path);
        if let Err(e) = fs::rename(path, &staged) {
            log::warn!("Unable to roll over {}: {}", path.display(), e);
            // keep appending and retry after another full file
            state.size = 0;
            return Ok(());
        }

        if let Err(e) = shift_backups(path, self.settings.max_backup_files) {
            state.size = 0;
            fs::rename(&staged, path).map_err(|e| LogError::write("file", e))?;
            return Err(LogError::write("file", e));
        }
        if let Err(e) = fs::rename(&staged, backup_path(path, 1)) {
            log::warn!("Unable to move {} to its first backup: {}", staged.display(), e);
        }

        let file = open_live(path, true).map_err(|e| LogError::sink_init(path, e))?;
        state.writer = BufWriter::new(file);
        state.size = 0;
        Ok(())
    }

    /// Re-read the live file's size from disk
    ///
    /// Needed when another handle appended to the same file since this sink
    /// was opened.
    pub fn refresh_size(&self) -> LogResult<()> {
        let mut state = self.state.lock();
        state.writer.flush().map_err(|e| LogError::write("file", e))?;
        state.size = state.writer.get_ref().metadata()?.len();
        self.rotate_locked(&mut state)
    }
}

impl Sink for RotatingFileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn write(&self, _record: &LogRecord, formatted: &str) -> LogResult<()> {
        self.append(formatted)
    }

    fn flush(&self) -> LogResult<()> {
        let mut state = self.state.lock();
        state.writer.flush().map_err(|e| LogError::write("file", e))
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        let _ = self.state.get_mut().writer.flush();
    }
}

impl std::fmt::Debug for RotatingFileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileSink")
            .field("settings", &self.settings)
            .finish()
    }
}

/// `<path>.<index>`
pub fn backup_path(path: &Path, index: u32) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

/// `<path>.rolling`, where the live file waits while backups shift
fn staged_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".rolling");
    PathBuf::from(name)
}

/// Drop the oldest backup and move each remaining one up an index
fn shift_backups(path: &Path, max: u32) -> io::Result<()> {
    remove_if_exists(&backup_path(path, max))?;
    for index in (1..max).rev() {
        let from = backup_path(path, index);
        if from.exists() {
            fs::rename(&from, backup_path(path, index + 1))?;
        }
    }
    Ok(())
}

fn ensure_parent(path: &Path) {
    let Some(parent) = path.parent() else {
        return;
    };
    if parent.as_os_str().is_empty() || parent.is_dir() {
        return;
    }
    if let Err(e) = fs::create_dir_all(parent) {
        log::warn!("Unable to create folder {}: {}", parent.display(), e);
    }
}

fn open_live(path: &Path, truncate: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    options.open(path)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn settings(path: PathBuf, max_file_size: u64, max_backup_files: u32) -> FileSinkSettings {
        FileSinkSettings {
            path,
            max_file_size,
            max_backup_files,
            immediate_flush: true,
            rolling: true,
        }
    }

    #[test]
    fn test_open_creates_folders_and_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("app.log");

        let sink = RotatingFileSink::open(settings(path.clone(), 1024, 2)).unwrap();
        assert!(path.exists());
        assert_eq!(sink.size(), 0);

        // opening again over an existing folder is fine
        drop(sink);
        RotatingFileSink::open(settings(path, 1024, 2)).unwrap();
    }

    #[test]
    fn test_open_directory_fails() {
        let dir = tempdir().unwrap();
        let err = RotatingFileSink::open(settings(dir.path().to_path_buf(), 1024, 2)).unwrap_err();
        assert!(matches!(err, LogError::SinkInit { .. }));
    }

    #[test]
    fn test_append_immediate_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = RotatingFileSink::open(settings(path.clone(), 1024, 2)).unwrap();

        sink.append("hello\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
        assert_eq!(sink.size(), 6);
    }

    #[test]
    fn test_append_buffered_until_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut config = settings(path.clone(), 1024, 2);
        config.immediate_flush = false;
        let sink = RotatingFileSink::open(config).unwrap();

        sink.append("buffered\n").unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);

        Sink::flush(&sink).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "buffered\n");
    }

    #[test]
    fn test_existing_size_counts_toward_threshold() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "0123456789").unwrap();

        let sink = RotatingFileSink::open(settings(path.clone(), 15, 2)).unwrap();
        assert_eq!(sink.size(), 10);

        sink.append("01234\n").unwrap();
        assert!(backup_path(&path, 1).exists());
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "012345678901234\n");
    }

    #[test]
    fn test_rotation_at_threshold() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = RotatingFileSink::open(settings(path.clone(), 100, 2)).unwrap();

        // 9 bytes per line; 11 lines = 99 bytes stays under the limit
        for _ in 0..11 {
            sink.append("12345678\n").unwrap();
        }
        assert!(sink.backup_paths().is_empty());

        // reaching 108 >= 100 rolls over exactly once
        sink.append("12345678\n").unwrap();
        assert_eq!(sink.backup_paths(), vec![backup_path(&path, 1)]);
        assert_eq!(sink.size(), 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert_eq!(fs::metadata(backup_path(&path, 1)).unwrap().len(), 108);
    }

    #[test]
    fn test_rotation_exact_threshold() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = RotatingFileSink::open(settings(path.clone(), 10, 3)).unwrap();

        sink.append("123456789\n").unwrap();
        assert!(backup_path(&path, 1).exists());
    }

    #[test]
    fn test_two_rotations_shift_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = RotatingFileSink::open(settings(path.clone(), 10, 2)).unwrap();

        sink.append("first....\n").unwrap();
        sink.append("second...\n").unwrap();

        assert_eq!(
            sink.backup_paths(),
            vec![backup_path(&path, 1), backup_path(&path, 2)]
        );
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "second...\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 2)).unwrap(), "first....\n");
    }

    #[test]
    fn test_backup_count_is_bounded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = RotatingFileSink::open(settings(path.clone(), 9, 2)).unwrap();

        // every 9-byte line fills the file and rolls it over
        for i in 0..10 {
            sink.append(&format!("line {:03}\n", i)).unwrap();
        }

        assert_eq!(sink.backup_paths().len(), 2);
        assert!(!backup_path(&path, 3).exists());
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "line 009\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 2)).unwrap(), "line 008\n");
    }

    #[test]
    fn test_failed_rollover_keeps_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(backup_path(&path, 1), "old one\n").unwrap();
        fs::write(backup_path(&path, 2), "old two\n").unwrap();

        // a non-empty directory where the live file would be moved aside
        let staged = staged_path(&path);
        fs::create_dir(&staged).unwrap();
        fs::write(staged.join("keep"), "x").unwrap();

        let sink = RotatingFileSink::open(settings(path.clone(), 10, 2)).unwrap();
        for _ in 0..5 {
            sink.append("123456789\n").unwrap();
        }

        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "old one\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 2)).unwrap(), "old two\n");
        assert_eq!(fs::metadata(&path).unwrap().len(), 50);
    }

    #[test]
    fn test_refresh_size_sees_other_writers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = RotatingFileSink::open(settings(path.clone(), 20, 2)).unwrap();
        let other = RotatingFileSink::open(settings(path.clone(), 20, 2)).unwrap();

        other.append("0123456789\n").unwrap();
        assert_eq!(sink.size(), 0);

        sink.refresh_size().unwrap();
        assert_eq!(sink.size(), 11);
        sink.append("0123456789\n").unwrap();
        assert!(backup_path(&path, 1).exists());
    }

    #[test]
    fn test_non_rolling_never_rotates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut config = settings(path.clone(), 10, 2);
        config.rolling = false;
        let sink = RotatingFileSink::open(config).unwrap();

        for _ in 0..5 {
            sink.append("123456789\n").unwrap();
        }
        assert!(sink.backup_paths().is_empty());
        assert_eq!(sink.size(), 50);
    }

    #[test]
    fn test_read_all_and_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = RotatingFileSink::open(settings(path.clone(), 10, 2)).unwrap();

        sink.append("rotated!!\n").unwrap();
        sink.append("live\n").unwrap();
        assert_eq!(sink.read_all().unwrap(), b"live\n");

        sink.clear().unwrap();
        assert!(sink.backup_paths().is_empty());
        assert!(sink.read_all().unwrap().is_empty());

        sink.append("after\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "after\n");
    }

    #[test]
    fn test_concurrent_appends_keep_lines_whole() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = Arc::new(RotatingFileSink::open(settings(path.clone(), 1000, 64)).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        sink.append(&format!("thread-{} line-{:04}\n", t, i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut files = sink.backup_paths();
        files.push(path);
        let mut total = 0;
        for file in files {
            for line in fs::read_to_string(file).unwrap().lines() {
                assert!(line.starts_with("thread-"), "corrupt line {:?}", line);
                assert_eq!(line.len(), "thread-0 line-0000".len());
                total += 1;
            }
        }
        assert_eq!(total, 1600);
    }
}
