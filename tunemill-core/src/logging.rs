//! Leveled, buffered file logging for conversion runs.
//!
//! `LogSink` is the durable audit log of a run. Producers (the scheduler and
//! its workers) call [`LogSink::append`], which only pushes onto an in-memory
//! buffer under a lock and never performs I/O. [`LogSink::flush`] swaps the
//! buffer out and writes every drained entry, in submission order, to three
//! cumulative streams filtered by severity:
//!
//! - `*.debug.log`: every entry
//! - `*.info.log`: INFO and above
//! - `*.error.log`: ERROR and CRITICAL only
//!
//! File names are chosen on first flush by probing an incrementing numeric
//! suffix, so repeated runs never overwrite earlier logs.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};

use crate::error::CoreResult;

/// Severity of a log entry, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Debug => write!(f, "DEBUG"),
            Level::Info => write!(f, "INFO"),
            Level::Warning => write!(f, "WARNING"),
            Level::Error => write!(f, "ERROR"),
            Level::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One buffered log entry. Append-only; never rewritten once flushed.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub message: String,
}

impl LogEntry {
    fn render(&self) -> String {
        format!(
            "{} - {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.message
        )
    }
}

struct LogStreams {
    debug: File,
    info: File,
    error: File,
}

/// Process-wide append-only leveled log store for one run.
///
/// `append` is safe to call from any number of threads; the buffer has its
/// own lock, independent of the scheduler's state lock, so log pressure
/// never serializes job dispatch. Writing only happens inside `flush`.
pub struct LogSink {
    log_dir: PathBuf,
    buffer: Mutex<Vec<LogEntry>>,
    // None until the first non-empty flush picks the run's file names.
    streams: Mutex<Option<LogStreams>>,
}

impl LogSink {
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Self {
        Self {
            log_dir: log_dir.as_ref().to_path_buf(),
            buffer: Mutex::new(Vec::new()),
            streams: Mutex::new(None),
        }
    }

    /// Buffers an entry. Never blocks on I/O.
    pub fn append<S: Into<String>>(&self, level: Level, message: S) {
        let entry = LogEntry {
            timestamp: Local::now(),
            level,
            message: message.into(),
        };
        self.buffer
            .lock()
            .expect("log buffer lock poisoned")
            .push(entry);
    }

    /// Writes all buffered entries to the three log streams and clears the
    /// buffer. An empty buffer writes nothing and always succeeds; file
    /// errors are returned to the caller but the buffer stays drained, so a
    /// degraded sink never stalls producers.
    pub fn flush(&self) -> CoreResult<()> {
        let drained = {
            let mut buffer = self.buffer.lock().expect("log buffer lock poisoned");
            std::mem::take(&mut *buffer)
        };
        if drained.is_empty() {
            return Ok(());
        }

        let mut streams = self.streams.lock().expect("log streams lock poisoned");
        if streams.is_none() {
            *streams = Some(self.open_streams()?);
        }
        let streams = streams.as_mut().expect("streams opened above");

        for entry in &drained {
            let line = entry.render();
            writeln!(streams.debug, "{line}")?;
            if entry.level >= Level::Info {
                writeln!(streams.info, "{line}")?;
            }
            if entry.level >= Level::Error {
                writeln!(streams.error, "{line}")?;
            }
        }
        streams.debug.flush()?;
        streams.info.flush()?;
        streams.error.flush()?;
        Ok(())
    }

    /// Directory this sink writes into.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Opens the three run files, probing `tunemill.<n>.*.log` for the first
    /// suffix where none of them exists yet.
    fn open_streams(&self) -> CoreResult<LogStreams> {
        fs::create_dir_all(&self.log_dir)?;
        let mut suffix = 0u32;
        loop {
            let debug_path = self.stream_path(suffix, "debug");
            let info_path = self.stream_path(suffix, "info");
            let error_path = self.stream_path(suffix, "error");
            if debug_path.exists() || info_path.exists() || error_path.exists() {
                suffix += 1;
                continue;
            }
            log::debug!("opening log streams with suffix {suffix}");
            return Ok(LogStreams {
                debug: Self::open_append(&debug_path)?,
                info: Self::open_append(&info_path)?,
                error: Self::open_append(&error_path)?,
            });
        }
    }

    fn stream_path(&self, suffix: u32, kind: &str) -> PathBuf {
        self.log_dir.join(format!("tunemill.{suffix}.{kind}.log"))
    }

    fn open_append(path: &Path) -> std::io::Result<File> {
        OpenOptions::new().create_new(true).append(true).open(path)
    }
}
