//! Tree comparison between a source and a destination directory.
//!
//! Walks both trees level by level with an explicit worklist and yields one
//! [`ChangeEvent`] per difference. A directory that exists on only one side is
//! reported once; its contents are not enumerated.

use std::collections::{BTreeMap, VecDeque};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::{FileEntry, LocalFs};
use crate::sync::exclude::ExcludePatterns;

/// Kind of difference found between the two trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    DirectoryCreated,
    FileCreated,
    DirectoryDeleted,
    FileDeleted,
    FileModified,
}

impl ChangeKind {
    /// Verb phrase used when the change is rendered.
    pub fn action(&self) -> &'static str {
        match self {
            Self::DirectoryCreated => "Created directory",
            Self::FileCreated => "Created file",
            Self::DirectoryDeleted => "Deleted directory",
            Self::FileDeleted => "Deleted file",
            Self::FileModified => "Modified file",
        }
    }

    pub fn is_deletion(&self) -> bool {
        matches!(self, Self::DirectoryDeleted | Self::FileDeleted)
    }
}

/// A single classified difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Entry basename.
    pub name: String,
    /// Source-side directory the entry was found in.
    pub containing_path: String,
    /// Absolute destination path of the entry, built from the on-disk name.
    pub destination: PathBuf,
}

impl ChangeEvent {
    /// Canonical description, e.g. `Created file "report.txt" in "/src"`.
    pub fn describe(&self) -> String {
        format!("{} \"{}\" in \"{}\"", self.kind.action(), self.name, self.containing_path)
    }

    pub fn destination_path(&self) -> &Path {
        &self.destination
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Read-only differ over a (source, destination) directory pair.
#[derive(Debug, Clone)]
pub struct TreeComparator {
    source: String,
    destination: String,
    excludes: ExcludePatterns,
}

impl TreeComparator {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: LocalFs::normalize_separators(&source.into()),
            destination: LocalFs::normalize_separators(&destination.into()),
            excludes: ExcludePatterns::with_defaults(),
        }
    }

    pub fn with_excludes(mut self, excludes: ExcludePatterns) -> Self {
        self.excludes = excludes;
        self
    }

    /// Lazy depth-first stream of changes.
    ///
    /// The stream ends after the first error.
    pub fn changes(&self) -> Changes<'_> {
        Changes {
            excludes: &self.excludes,
            pending: vec![DirPair {
                source: PathBuf::from(&self.source),
                destination: PathBuf::from(&self.destination),
                label: self.source.clone(),
            }],
            buffered: VecDeque::new(),
            failed: false,
        }
    }

    /// Collect every change, failing on the first unreadable directory.
    pub fn compare(&self) -> Result<Vec<ChangeEvent>> {
        self.changes().collect()
    }
}

#[derive(Debug)]
struct DirPair {
    source: PathBuf,
    destination: PathBuf,
    /// Forward-slash rendering of `source` used in messages.
    label: String,
}

/// Iterator returned by [`TreeComparator::changes`].
pub struct Changes<'a> {
    excludes: &'a ExcludePatterns,
    pending: Vec<DirPair>,
    buffered: VecDeque<ChangeEvent>,
    failed: bool,
}

impl Changes<'_> {
    /// Diff one directory level, buffering its events and returning the
    /// subdirectories present on both sides.
    fn diff_level(&mut self, pair: &DirPair) -> Result<Vec<DirPair>> {
        let source = self.listing(&pair.source)?;
        let destination = self.listing(&pair.destination)?;

        let event = |kind: ChangeKind, entry: &FileEntry| ChangeEvent {
            kind,
            name: entry.name.clone(),
            containing_path: pair.label.clone(),
            destination: pair.destination.join(&entry.os_name),
        };

        let mut modified = Vec::new();
        let mut common_dirs = Vec::new();

        for (name, entry) in &source {
            match destination.get(name) {
                None if entry.is_dir() => self.buffered.push_back(event(ChangeKind::DirectoryCreated, entry)),
                None if entry.is_file() => self.buffered.push_back(event(ChangeKind::FileCreated, entry)),
                None => {}
                Some(other) if entry.is_dir() && other.is_dir() => common_dirs.push(DirPair {
                    source: pair.source.join(name),
                    destination: pair.destination.join(name),
                    label: LocalFs::join(&pair.label, &entry.name),
                }),
                Some(other) => {
                    let comparable = (entry.is_file() || entry.is_dir()) && (other.is_file() || other.is_dir());
                    if comparable && !entry.same_signature(other) {
                        modified.push(event(ChangeKind::FileModified, entry));
                    }
                }
            }
        }

        for (name, entry) in &destination {
            if source.contains_key(name) {
                continue;
            }
            if entry.is_dir() {
                self.buffered.push_back(event(ChangeKind::DirectoryDeleted, entry));
            } else if entry.is_file() {
                self.buffered.push_back(event(ChangeKind::FileDeleted, entry));
            }
        }

        self.buffered.extend(modified);
        Ok(common_dirs)
    }

    fn listing(&self, dir: &Path) -> Result<BTreeMap<OsString, FileEntry>> {
        Ok(LocalFs::list_dir(dir)?
            .into_iter()
            .filter(|entry| !self.excludes.is_excluded(&entry.name))
            .map(|entry| (entry.os_name.clone(), entry))
            .collect())
    }
}

impl Iterator for Changes<'_> {
    type Item = Result<ChangeEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.buffered.pop_front() {
                return Some(Ok(event));
            }
            if self.failed {
                return None;
            }

            let pair = self.pending.pop()?;
            match self.diff_level(&pair) {
                Ok(subdirs) => {
                    // Reversed so the first name is visited first
                    self.pending.extend(subdirs.into_iter().rev());
                }
                Err(err) => {
                    self.failed = true;
                    self.pending.clear();
                    self.buffered.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}
