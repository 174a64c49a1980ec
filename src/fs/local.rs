use chrono::{DateTime, Utc};
use filetime::{set_file_times, FileTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::fs::types::{EntryKind, FileEntry};

pub struct LocalFs;

impl LocalFs {
    /// List a directory, following symlinks, sorted by name.
    pub fn list_dir(path: &Path) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();

        let read_dir = fs::read_dir(path)
            .map_err(|e| SyncError::from_io_error(e, "reading directory", path))?;

        for entry in read_dir {
            let entry = entry.map_err(|e| SyncError::from_io_error(e, "reading directory", path))?;
            let os_name = entry.file_name();
            let name = os_name.to_string_lossy().to_string();

            // Dangling links and other unreadable entries are listed as `Other`
            let entry = match fs::metadata(entry.path()) {
                Ok(metadata) => FileEntry {
                    name,
                    os_name,
                    size: metadata.len(),
                    kind: if metadata.is_dir() {
                        EntryKind::Dir
                    } else if metadata.is_file() {
                        EntryKind::File
                    } else {
                        EntryKind::Other
                    },
                    modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                },
                Err(_) => FileEntry {
                    name,
                    os_name,
                    size: 0,
                    kind: EntryKind::Other,
                    modified: None,
                },
            };

            entries.push(entry);
        }

        entries.sort_by(|a, b| a.os_name.cmp(&b.os_name));

        Ok(entries)
    }

    /// Copy `from` over `to` recursively, creating `to` if absent.
    ///
    /// Same-named destination entries are overwritten (a destination entry of the
    /// other type is removed first). Destination-only entries are left untouched.
    /// An entry that fails does not stop the walk: everything readable is copied,
    /// then the first failure is returned. Returns the number of files copied.
    pub fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
        let mut copied = 0;
        let mut first_error = None;
        let mut to_copy = vec![(from.to_path_buf(), to.to_path_buf())];

        while let Some((src_dir, dst_dir)) = to_copy.pop() {
            if let Err(err) = Self::copy_level(&src_dir, &dst_dir, &mut to_copy, &mut copied) {
                tracing::warn!(error = %err, "copy incomplete");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(copied),
        }
    }

    /// Copy the files of one directory and queue its subdirectories.
    /// Keeps going past failing entries and returns the first failure.
    fn copy_level(
        src_dir: &Path,
        dst_dir: &Path,
        to_copy: &mut Vec<(PathBuf, PathBuf)>,
        copied: &mut usize,
    ) -> Result<()> {
        Self::ensure_dir(dst_dir)?;

        let read_dir = fs::read_dir(src_dir)
            .map_err(|e| SyncError::from_io_error(e, "reading directory", src_dir))?;

        let mut first_error = None;
        for entry in read_dir {
            let outcome = entry
                .map_err(|e| SyncError::from_io_error(e, "reading directory", src_dir))
                .and_then(|entry| {
                    let src_path = entry.path();
                    let dst_path = dst_dir.join(entry.file_name());
                    let metadata = fs::metadata(&src_path)
                        .map_err(|e| SyncError::from_io_error(e, "reading metadata of", &src_path))?;

                    if metadata.is_dir() {
                        to_copy.push((src_path, dst_path));
                    } else {
                        Self::copy_file(&src_path, &dst_path, &metadata)?;
                        *copied += 1;
                    }
                    Ok(())
                });

            if let Err(err) = outcome {
                tracing::warn!(error = %err, "entry not copied");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Remove a directory and everything below it.
    pub fn remove_dir_all(path: &Path) -> Result<()> {
        fs::remove_dir_all(path).map_err(|e| SyncError::from_io_error(e, "removing directory", path))
    }

    pub fn remove_file(path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| SyncError::from_io_error(e, "removing file", path))
    }

    /// Convert every backslash to a forward slash.
    pub fn normalize_separators(path: &str) -> String {
        path.replace('\\', "/")
    }

    /// Join a directory string and an entry name with a forward slash.
    pub fn join(dir: &str, name: &str) -> String {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }

    fn ensure_dir(path: &Path) -> Result<()> {
        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_dir() => return Ok(()),
            Ok(metadata) if metadata.file_type().is_symlink() && path.is_dir() => return Ok(()),
            Ok(_) => Self::remove_file(path)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(SyncError::from_io_error(e, "reading metadata of", path)),
        }

        fs::create_dir_all(path).map_err(|e| SyncError::from_io_error(e, "creating directory", path))
    }

    fn copy_file(src: &Path, dst: &Path, src_metadata: &fs::Metadata) -> Result<()> {
        if dst.is_dir() {
            Self::remove_dir_all(dst)?;
        }

        fs::copy(src, dst).map_err(|e| SyncError::Io {
            path: Some(PathBuf::from(dst)),
            operation: format!("copying {} to", src.display()),
            source: e,
        })?;

        let atime = FileTime::from_last_access_time(src_metadata);
        let mtime = FileTime::from_last_modification_time(src_metadata);
        set_file_times(dst, atime, mtime)
            .map_err(|e| SyncError::from_io_error(e, "setting file times on", dst))
    }
}
