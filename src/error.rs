// Centralized error handling module
// Error types for configuration, tree comparison and reconciliation

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Main error type for the synchronizer
#[derive(Debug)]
pub enum SyncError {
    /// Configuration errors
    InvalidInterval { value: f64 },
    InvalidTick { millis: u64 },
    InvalidPattern { pattern: String, reason: String },

    /// File system errors with context
    DirectoryNotFound { path: PathBuf },
    PermissionDenied { path: PathBuf, operation: String },
    Io { path: Option<PathBuf>, operation: String, source: io::Error },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyncError::InvalidInterval { value } => {
                write!(f, "Invalid synchronization interval: {} minutes\n", value)?;
                write!(f, "Suggestion: Use a positive number of minutes, e.g. 0.5 or 10")
            }
            SyncError::InvalidTick { millis } => {
                write!(f, "Invalid polling tick: {} ms\n", millis)?;
                write!(f, "Suggestion: Use a tick of at least 1 millisecond")
            }
            SyncError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid ignore pattern '{}': {}", pattern, reason)
            }
            SyncError::DirectoryNotFound { path } => {
                write!(f, "Directory not found: {}", path.display())
            }
            SyncError::PermissionDenied { path, operation } => {
                write!(f, "Permission denied while {} {}", operation, path.display())
            }
            SyncError::Io { path, operation, source } => {
                if let Some(p) = path {
                    write!(f, "I/O error while {} {}: {}", operation, p.display(), source)
                } else {
                    write!(f, "I/O error while {}: {}", operation, source)
                }
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl SyncError {
    /// Create an error with context about the operation and the path involved.
    /// `NotFound` and `PermissionDenied` map to their specific variants.
    pub fn from_io_error(err: io::Error, operation: &str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound if operation.contains("directory") => {
                SyncError::DirectoryNotFound { path }
            }
            io::ErrorKind::PermissionDenied => SyncError::PermissionDenied {
                path,
                operation: operation.to_string(),
            },
            _ => SyncError::Io {
                path: Some(path),
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    /// Whether the underlying failure was a missing path.
    pub fn is_not_found(&self) -> bool {
        match self {
            SyncError::DirectoryNotFound { .. } => true,
            SyncError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<io::Error> for SyncError {
    fn from(err: io::Error) -> Self {
        SyncError::Io {
            path: None,
            operation: "accessing the filesystem".to_string(),
            source: err,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
