//! Job log sinks
//!
//! Every task writes the human-readable output of the external tools it runs
//! to a job log. The log is owned by the caller (usually the job queue); the
//! worker only appends to it.

use sightline_core::domain::log::{LogEntry, LogLevel};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

/// Append-only text sink for task output
pub trait JobLog: Send + Sync {
    /// Appends a chunk of text to the log
    ///
    /// # Arguments
    /// * `text` - One line or a multi-line block of tool output
    fn write(&self, text: &str);

    /// Appends a notice about the task itself rather than tool output
    fn warn(&self, text: &str) {
        self.write(text);
    }
}

/// Forwards job output to `tracing`
pub struct TracingJobLog {
    title: String,
}

impl TracingJobLog {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl JobLog for TracingJobLog {
    fn write(&self, text: &str) {
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            info!(job = %self.title, "{}", line);
        }
    }

    fn warn(&self, text: &str) {
        warn!(job = %self.title, "{}", text);
    }
}

/// In-memory job log
///
/// Uses Arc<Mutex<Vec<LogEntry>>> so clones share one buffer; the caller
/// keeps a clone and drains it while or after a task runs.
#[derive(Clone, Default)]
pub struct BufferedJobLog {
    buffer: Arc<Mutex<Vec<LogEntry>>>,
}

impl BufferedJobLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all buffered entries
    pub fn drain(&self) -> Vec<LogEntry> {
        self.lock().drain(..).collect()
    }

    /// All buffered messages joined by newlines, without draining
    pub fn contents(&self) -> String {
        self.lock()
            .iter()
            .map(|entry| entry.message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        // A panicking writer cannot leave a half-pushed entry behind
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JobLog for BufferedJobLog {
    fn write(&self, text: &str) {
        self.lock().push(LogEntry::new(LogLevel::Info, text));
    }

    fn warn(&self, text: &str) {
        self.lock().push(LogEntry::new(LogLevel::Warning, text));
    }
}

/// Appends job output to a file
pub struct FileJobLog {
    file: Mutex<File>,
}

impl FileJobLog {
    /// Opens `path` for appending, creating it if needed
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl JobLog for FileJobLog {
    fn write(&self, text: &str) {
        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let result = if text.ends_with('\n') {
            file.write_all(text.as_bytes())
        } else {
            writeln!(file, "{}", text)
        };

        if let Err(e) = result {
            warn!("Failed to write job log: {}", e);
        }
    }

    fn warn(&self, text: &str) {
        self.write(&format!("WARNING: {}", text));
    }
}
