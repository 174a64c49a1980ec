//! Name patterns hidden from tree comparison.
//!
//! Excluded entries are neither reported nor descended into while diffing.
//! The full copy ignores this list and copies everything.

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::{Result, SyncError};

/// Names that are never compared.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "RCS",
    "CVS",
    "tags",
    ".git",
    ".hg",
    ".bzr",
    "_darcs",
    "__pycache__",
];

/// Pattern matching for entry names.
#[derive(Debug, Clone)]
pub struct ExcludePatterns {
    /// Compiled glob set for matching.
    glob_set: GlobSet,
    /// Raw pattern strings.
    patterns: Vec<String>,
}

impl ExcludePatterns {
    /// Create with default exclude patterns.
    pub fn with_defaults() -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut patterns = Vec::new();

        for pattern in DEFAULT_EXCLUDES {
            if let Ok(glob) = Glob::new(pattern) {
                builder.add(glob);
                patterns.push(pattern.to_string());
            }
        }

        Self {
            glob_set: builder.build().unwrap_or_else(|_| GlobSet::empty()),
            patterns,
        }
    }

    /// Add a pattern to the exclude set.
    pub fn add_pattern(&mut self, pattern: &str) -> Result<()> {
        if self.patterns.iter().any(|p| p == pattern) {
            return Ok(());
        }

        // Rebuild the glob set with the new pattern
        let mut builder = GlobSetBuilder::new();

        for existing in &self.patterns {
            if let Ok(glob) = Glob::new(existing) {
                builder.add(glob);
            }
        }

        builder.add(Glob::new(pattern).map_err(|e| invalid(pattern, e))?);
        self.glob_set = builder.build().map_err(|e| invalid(pattern, e))?;
        self.patterns.push(pattern.to_string());
        Ok(())
    }

    /// Check if an entry name should be excluded.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.glob_set.is_match(name)
    }
}

fn invalid(pattern: &str, err: globset::Error) -> SyncError {
    SyncError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: err.kind().to_string(),
    }
}
