//! # Dedup Module
//!
//! Finds byte-identical files within a scan batch.
//!
//! ## Strategy
//! 1. **Size**: a file with a unique size cannot have a duplicate, no I/O
//! 2. **Quick signature**: size + xxh3 of the first and last 64KB
//! 3. **Full hash**: BLAKE3 over the whole file, only for files whose quick
//!    signature matched another file
//!
//! The earliest file in scan order is the representative of each cluster of
//! identical files; all later members point at it. Hashing runs on a bounded
//! rayon pool, but results are collected by index so completion order never
//! affects the outcome.
//!
//! A file that cannot be hashed is treated as unique and reported as a
//! warning.

mod index;
mod signature;

pub use index::DestinationIndex;
pub use signature::{files_identical, full_hash, quick_signature, FullHash, QuickSignature};

use crate::events::{null_sender, DedupEvent, Event, EventSender};
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Hashing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashConfig {
    /// Worker threads for hashing
    pub workers: usize,
}

impl Default for HashConfig {
    fn default() -> Self {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            workers: available.min(4),
        }
    }
}

/// A file offered for deduplication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub size: u64,
}

/// A file that could not be hashed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of deduplicating a batch
#[derive(Debug, Clone, Default)]
pub struct DedupReport {
    /// For each candidate, the index of its representative if it is a duplicate
    pub duplicate_of: Vec<Option<usize>>,
    /// Number of full hashes computed
    pub full_hashes: usize,
    pub warnings: Vec<DedupWarning>,
}

impl DedupReport {
    pub fn duplicate_count(&self) -> usize {
        self.duplicate_of.iter().filter(|d| d.is_some()).count()
    }

    fn warn(&mut self, path: &std::path::Path, message: String, events: &EventSender) {
        tracing::warn!("Treating {} as unique: {}", path.display(), message);
        events.send(Event::Dedup(DedupEvent::Warning {
            path: path.to_path_buf(),
            message: message.clone(),
        }));
        self.warnings.push(DedupWarning {
            path: path.to_path_buf(),
            message,
        });
    }
}

/// Two-level content deduplicator
pub struct ContentDeduplicator {
    pool: Option<ThreadPool>,
}

impl ContentDeduplicator {
    pub fn new(config: HashConfig) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers.max(1))
            .thread_name(|i| format!("photo-porter-hash-{}", i))
            .build();

        match pool {
            Ok(pool) => Self { pool: Some(pool) },
            Err(e) => {
                tracing::warn!("Could not build hashing pool, using global pool: {}", e);
                Self { pool: None }
            }
        }
    }

    /// Mark duplicates within an ordered batch.
    pub fn find_duplicates(&self, candidates: &[Candidate]) -> DedupReport {
        self.find_duplicates_with_events(candidates, &null_sender())
    }

    /// Mark duplicates within an ordered batch, reporting to `events`.
    pub fn find_duplicates_with_events(
        &self,
        candidates: &[Candidate],
        events: &EventSender,
    ) -> DedupReport {
        let mut report = DedupReport {
            duplicate_of: vec![None; candidates.len()],
            ..Default::default()
        };

        events.send(Event::Dedup(DedupEvent::Started {
            candidates: candidates.len(),
        }));

        // Phase 1: only files sharing a size can be identical
        let mut by_size: HashMap<u64, Vec<usize>> = HashMap::new();
        for (i, candidate) in candidates.iter().enumerate() {
            by_size.entry(candidate.size).or_default().push(i);
        }
        let mut same_size: Vec<usize> = by_size
            .into_values()
            .filter(|group| group.len() >= 2)
            .flatten()
            .collect();
        same_size.sort_unstable();

        // Phase 2: quick signatures
        let signatures: Vec<_> = self.install(|| {
            same_size
                .par_iter()
                .map(|&i| (i, quick_signature(&candidates[i].path)))
                .collect()
        });

        let mut buckets: HashMap<QuickSignature, Vec<usize>> = HashMap::new();
        for (i, result) in signatures {
            match result {
                Ok(signature) => buckets.entry(signature).or_default().push(i),
                Err(e) => report.warn(&candidates[i].path, e.to_string(), events),
            }
        }

        // Phase 3: full hashes for multi-member buckets
        let mut needs_hash: Vec<usize> = buckets
            .into_values()
            .filter(|bucket| bucket.len() >= 2)
            .flatten()
            .collect();
        needs_hash.sort_unstable();

        let hashes: Vec<_> = self.install(|| {
            needs_hash
                .par_iter()
                .map(|&i| (i, full_hash(&candidates[i].path)))
                .collect()
        });
        report.full_hashes = hashes.len();

        // Ascending index order makes the first member of each cluster the
        // representative.
        let mut representatives: HashMap<(u64, FullHash), usize> = HashMap::new();
        for (i, result) in hashes {
            match result {
                Ok(hash) => {
                    let key = (candidates[i].size, hash);
                    match representatives.get(&key) {
                        Some(&first) => report.duplicate_of[i] = Some(first),
                        None => {
                            representatives.insert(key, i);
                        }
                    }
                }
                Err(e) => report.warn(&candidates[i].path, e.to_string(), events),
            }
        }

        tracing::debug!(
            "Dedup: {} candidates, {} full hashes, {} duplicates",
            candidates.len(),
            report.full_hashes,
            report.duplicate_count()
        );

        events.send(Event::Dedup(DedupEvent::Completed {
            full_hashes: report.full_hashes,
            duplicates: report.duplicate_count(),
        }));

        report
    }

    fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Default for ContentDeduplicator {
    fn default() -> Self {
        Self::new(HashConfig::default())
    }
}
