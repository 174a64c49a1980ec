use chrono::{DateTime, Utc};
use std::ffi::OsString;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Anything that is neither a regular file nor a directory (broken symlinks, sockets, ...).
    Other,
}

#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Display name, lossily converted to UTF-8.
    pub name: String,
    /// Name as stored on disk; used to build paths.
    pub os_name: OsString,
    pub size: u64,
    pub kind: EntryKind,
    pub modified: Option<DateTime<Utc>>,
}

impl FileEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Shallow comparison: type, size and modification time. Contents are never read.
    pub fn same_signature(&self, other: &FileEntry) -> bool {
        self.kind == other.kind && self.size == other.size && self.modified == other.modified
    }
}
