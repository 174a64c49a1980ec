//! Sync log: every line goes to the console and, timestamped, to an append-mode file.

use chrono::{DateTime, Local};
use colored::Colorize;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{Result, SyncError};

/// Timestamp layout of log file lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Error => "ERROR",
        }
    }
}

/// Render one log file line: `LEVEL - TIMESTAMP - MESSAGE`.
pub fn format_line(level: Level, timestamp: &DateTime<Local>, message: &str) -> String {
    format!("{} - {} - {}", level.as_str(), timestamp.format(TIMESTAMP_FORMAT), message)
}

/// Console + file sink owned by the reconciler.
pub struct SyncLog {
    console: Box<dyn Write + Send>,
    file: Box<dyn Write + Send>,
}

impl SyncLog {
    pub fn new(console: impl Write + Send + 'static, file: impl Write + Send + 'static) -> Self {
        Self {
            console: Box::new(console),
            file: Box::new(file),
        }
    }

    /// Open `path` in append mode, mirroring to stdout.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SyncError::from_io_error(e, "opening log file", path))?;

        Ok(Self::new(io::stdout(), file))
    }

    pub fn info(&mut self, message: &str) {
        self.record(Level::Info, message);
    }

    /// Failure notice: red on the console, an `ERROR` line in the file.
    pub fn error(&mut self, message: &str) {
        let console_line = message.red().to_string();
        self.write_console(&console_line);
        self.write_file(Level::Error, message);
    }

    /// Console-only line.
    pub fn say(&mut self, message: &str) {
        self.write_console(message);
    }

    fn record(&mut self, level: Level, message: &str) {
        self.write_console(message);
        self.write_file(level, message);
    }

    fn write_console(&mut self, message: &str) {
        if let Err(e) = writeln!(self.console, "{}", message).and_then(|_| self.console.flush()) {
            tracing::warn!(error = %e, "console write failed");
        }
    }

    fn write_file(&mut self, level: Level, message: &str) {
        let line = format_line(level, &Local::now(), message);
        if let Err(e) = writeln!(self.file, "{}", line).and_then(|_| self.file.flush()) {
            tracing::warn!(error = %e, "log file write failed");
        }
    }
}
