//! Index of the photos already present in a destination tree.

use super::signature::{full_hash, FullHash};
use crate::core::cancel::CancellationToken;
use crate::core::scanner::PhotoFilter;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
struct IndexedFile {
    path: PathBuf,
    /// `None` until first needed; `Some(None)` if hashing failed
    hash: Option<Option<FullHash>>,
}

impl IndexedFile {
    fn hash(&mut self) -> Option<FullHash> {
        if self.hash.is_none() {
            let result = full_hash(&self.path)
                .map_err(|e| tracing::warn!("Cannot hash existing {}: {}", self.path.display(), e))
                .ok();
            self.hash = Some(result);
        }
        self.hash.flatten()
    }
}

/// Files under a destination root, keyed by size.
///
/// Full hashes are computed only when a source file of the same size is
/// looked up, and then at most once per indexed file.
#[derive(Debug, Default)]
pub struct DestinationIndex {
    by_size: HashMap<u64, Vec<IndexedFile>>,
}

impl DestinationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every supported photo under `root`.
    ///
    /// A missing root yields an empty index. Stops early when cancelled.
    pub fn build(root: &Path, filter: &PhotoFilter, cancel: &CancellationToken) -> Self {
        let mut index = Self::new();
        if !root.is_dir() {
            return index;
        }

        for entry in WalkDir::new(root).sort_by_file_name() {
            if cancel.is_cancelled() {
                break;
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable destination entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !filter.should_include(entry.path()) {
                continue;
            }
            if let Ok(metadata) = entry.metadata() {
                index.insert(entry.path().to_path_buf(), metadata.len());
            }
        }

        tracing::debug!("Indexed {} existing files under {}", index.len(), root.display());
        index
    }

    /// Record a file now present in the destination.
    pub fn insert(&mut self, path: PathBuf, size: u64) {
        self.by_size
            .entry(size)
            .or_default()
            .push(IndexedFile { path, hash: None });
    }

    /// An indexed file with the same content as `source`, if any.
    pub fn find(&mut self, source: &Path, size: u64) -> Option<PathBuf> {
        let entries = self.by_size.get_mut(&size)?;

        let source_hash = match full_hash(source) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!("Cannot hash {}: {}", source.display(), e);
                return None;
            }
        };

        entries
            .iter_mut()
            .find_map(|entry| (entry.hash() == Some(source_hash)).then(|| entry.path.clone()))
    }

    pub fn len(&self) -> usize {
        self.by_size.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_size.is_empty()
    }
}
