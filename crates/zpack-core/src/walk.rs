//! Deterministic directory traversal.
//!
//! [`Walker`] yields every regular file under a root directory together
//! with its contents, sorted by file name at every level so repeated runs
//! over the same tree produce the same sequence.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

/// Ordered set of path suffixes excluded from directory packing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    suffixes: Vec<String>,
}

impl IgnoreSet {
    /// Creates an empty ignore set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a suffix, keeping insertion order and skipping duplicates
    pub fn insert(&mut self, suffix: impl Into<String>) {
        let suffix = suffix.into();
        if !self.suffixes.contains(&suffix) {
            self.suffixes.push(suffix);
        }
    }

    /// Returns true if `path` ends with any suffix in the set
    ///
    /// Matching is on the path text, not on path components: `.keep`
    /// matches both `dir/.keep` and `dir/a.keep`.
    pub fn matches(&self, path: &str) -> bool {
        self.suffixes.iter().any(|s| path.ends_with(s.as_str()))
    }

    /// Returns true if the set has no suffixes
    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    /// Iterates over the suffixes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.suffixes.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for suffix in iter {
            set.insert(suffix);
        }
        set
    }
}

/// A file found by the walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Path as walked: the root joined with the path below it
    pub path: PathBuf,
    /// UTF-8 form of `path`, used as the key in generated maps
    pub key: String,
    /// File contents
    pub data: Vec<u8>,
}

/// Lazy, sorted traversal of the regular files below a root directory
pub struct Walker<'a> {
    root: PathBuf,
    ignore: &'a IgnoreSet,
    inner: walkdir::IntoIter,
    failed: bool,
}

impl<'a> Walker<'a> {
    /// Creates a walker over `root`
    ///
    /// Symbolic links are followed, the root included, so a linked
    /// directory is packed by its contents rather than as a leaf.
    pub fn new(root: impl AsRef<Path>, ignore: &'a IgnoreSet) -> Self {
        let root = root.as_ref().to_path_buf();
        let inner = WalkDir::new(&root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        Self {
            root,
            ignore,
            inner,
            failed: false,
        }
    }

    /// Returns the root this walker was created with
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn next_entry(&mut self) -> Option<Result<WalkEntry>> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(Error::walk(&self.root, e))),
            };

            // Directories, sockets, FIFOs and devices are never read
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            let Some(key) = path.to_str().map(str::to_owned) else {
                return Some(Err(Error::non_utf8_path(path)));
            };

            if self.ignore.matches(&key) {
                trace!("Ignoring {}", key);
                continue;
            }

            trace!("Reading {}", key);
            return Some(match std::fs::read(&path) {
                Ok(data) => Ok(WalkEntry { path, key, data }),
                Err(e) => Err(Error::file_read(path, e)),
            });
        }
    }
}

impl Iterator for Walker<'_> {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        // The first error ends the walk; no partial results past it.
        if self.failed {
            return None;
        }
        let item = self.next_entry();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

/// Walk `root` and collect every entry, stopping at the first error
pub fn walk_dir(root: impl AsRef<Path>, ignore: &IgnoreSet) -> Result<Vec<WalkEntry>> {
    Walker::new(root, ignore).collect()
}
