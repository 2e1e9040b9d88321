//! Append-only backend log file.
//!
//! One sink is opened per backend lifetime. Writes are synchronous so a
//! record is on disk before any event derived from the same line goes out.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use dmsender_core::LogRecord;
use thiserror::Error;
use tracing::debug;

/// Errors from the backend log sink.
#[derive(Debug, Error)]
pub enum LogSinkError {
    /// The sink was closed at the end of its lifetime.
    #[error("Backend log {} is closed", path.display())]
    Closed { path: PathBuf },

    #[error("Failed to write backend log {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// File-backed sink for [`LogRecord`]s.
#[derive(Debug)]
pub struct BackendLogFile {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl BackendLogFile {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "Opened backend log sink");
        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one rendered record followed by a newline.
    ///
    /// The record goes out in a single write, so appends from another handle
    /// on the same file never split it.
    pub fn append(&self, record: &LogRecord) -> Result<(), LogSinkError> {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(file) = guard.as_mut() else {
            return Err(LogSinkError::Closed {
                path: self.path.clone(),
            });
        };
        let line = format!("{}\n", record.render());
        file.write_all(line.as_bytes()).map_err(|source| LogSinkError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Flush and release the file handle. Later appends fail with `Closed`.
    pub fn close(&self) {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut file) = guard.take() {
            let _ = file.flush();
            debug!(path = %self.path.display(), "Closed backend log sink");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmsender_core::StreamKind;
    use std::sync::Arc;

    #[test]
    fn appends_rendered_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("backend.log");

        let sink = BackendLogFile::open(&path).unwrap();
        sink.append(&LogRecord::output(StreamKind::Stdout, "one"))
            .unwrap();
        sink.append(&LogRecord::output(StreamKind::Stderr, "two"))
            .unwrap();
        sink.append(&LogRecord::exit(Some(0))).unwrap();
        sink.close();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "[STDOUT] one\n[STDERR] two\n[EXIT] backend process exited, code 0\n"
        );
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backend.log");

        let first = BackendLogFile::open(&path).unwrap();
        first
            .append(&LogRecord::output(StreamKind::Stdout, "first"))
            .unwrap();
        first.close();

        let second = BackendLogFile::open(&path).unwrap();
        second
            .append(&LogRecord::output(StreamKind::Stdout, "second"))
            .unwrap();
        second.close();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "[STDOUT] first\n[STDOUT] second\n");
    }

    #[test]
    fn concurrent_handles_keep_records_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backend.log");
        let old = Arc::new(BackendLogFile::open(&path).unwrap());
        let new = Arc::new(BackendLogFile::open(&path).unwrap());

        let writers: Vec<_> = [("OLD", old), ("NEW", new)]
            .into_iter()
            .map(|(tag, sink)| {
                std::thread::spawn(move || {
                    for i in 0..5_000 {
                        sink.append(&LogRecord::output(StreamKind::Stdout, format!("{tag}-{i}")))
                            .unwrap();
                    }
                    sink.close();
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 10_000);
        let torn: Vec<&&str> = lines
            .iter()
            .filter(|l| l.matches("[STDOUT]").count() != 1 || !l.starts_with("[STDOUT] "))
            .collect();
        assert!(torn.is_empty(), "torn records: {:?}", &torn[..torn.len().min(3)]);
    }

    #[test]
    fn append_after_close_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sink = BackendLogFile::open(dir.path().join("backend.log")).unwrap();
        sink.close();
        assert!(sink.is_closed());
        assert!(matches!(
            sink.append(&LogRecord::exit(None)),
            Err(LogSinkError::Closed { .. })
        ));
        // closing twice is harmless
        sink.close();
    }
}
