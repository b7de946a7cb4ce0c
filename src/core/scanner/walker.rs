//! Directory walking implementation using walkdir.

use super::{filter::PhotoFilter, PhotoInfo, ScanResult, SkippedFile};
use crate::core::cancel::CancellationToken;
use crate::core::classify::ClassifyConfig;
use crate::core::dedup::{Candidate, ContentDeduplicator, HashConfig};
use crate::core::metadata::{MetadataExtractor, PhotoMetadata};
use crate::error::ScanError;
use crate::events::{null_sender, Event, EventSender, ScanEvent, ScanProgress};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: PhotoFilter,
    dedup: ContentDeduplicator,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self::with_hash_config(config, HashConfig::default())
    }

    pub fn with_hash_config(config: ScanConfig, hash: HashConfig) -> Self {
        let filter = PhotoFilter::new().with_hidden(config.include_hidden);
        Self {
            config,
            filter,
            dedup: ContentDeduplicator::new(hash),
        }
    }

    pub fn filter(&self) -> &PhotoFilter {
        &self.filter
    }

    /// Scan a source tree without progress reporting
    pub fn scan(
        &self,
        source: &Path,
        classify: &ClassifyConfig,
        extractor: &dyn MetadataExtractor,
    ) -> Result<ScanResult, ScanError> {
        self.scan_with_events(
            source,
            classify,
            extractor,
            &null_sender(),
            &CancellationToken::new(),
        )
    }

    /// Scan a source tree.
    ///
    /// Photos come back in walk order with file names sorted per directory,
    /// classified and with duplicates marked. Files that cannot be read end
    /// up in [`ScanResult::skipped`].
    pub fn scan_with_events(
        &self,
        source: &Path,
        classify: &ClassifyConfig,
        extractor: &dyn MetadataExtractor,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<ScanResult, ScanError> {
        classify.validate().map_err(ScanError::InvalidClassification)?;
        verify_root(source)?;

        tracing::info!("Scanning {}", source.display());
        events.send(Event::Scan(ScanEvent::Started {
            source: source.to_path_buf(),
        }));

        let mut photos = Vec::new();
        let mut skipped = Vec::new();
        let mut bytes_found = 0u64;

        let mut walker = WalkDir::new(source)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        // Hidden directories are pruned; the root itself is always walked.
        let entries = walker
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.filter.is_excluded_hidden(e.path()));

        for entry_result in entries {
            if cancel.is_cancelled() {
                tracing::info!("Scan of {} cancelled", source.display());
                return Err(ScanError::Cancelled);
            }

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    record_skip(&mut skipped, events, path, e.to_string());
                    continue;
                }
            };

            if entry.file_type().is_dir() || !self.filter.should_include(entry.path()) {
                continue;
            }

            let path = entry.path();
            let file_size = match fs::metadata(path) {
                Ok(metadata) if metadata.is_dir() => continue,
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    record_skip(&mut skipped, events, path.to_path_buf(), e.to_string());
                    continue;
                }
            };
            // Readable metadata does not mean readable content
            if let Err(e) = fs::File::open(path) {
                record_skip(&mut skipped, events, path.to_path_buf(), e.to_string());
                continue;
            }

            let metadata = extractor.extract(path).unwrap_or_else(|e| {
                tracing::debug!("No metadata for {}: {}", path.display(), e);
                PhotoMetadata::default()
            });

            bytes_found += file_size;
            photos.push(PhotoInfo {
                path: path.to_path_buf(),
                file_name: entry.file_name().to_string_lossy().to_string(),
                file_size,
                target_folder: classify.target_folder(&metadata),
                date_time: metadata.date_time,
                camera: metadata.camera,
                make: metadata.make,
                is_duplicate: false,
                duplicate_of: None,
            });

            events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                photos_found: photos.len(),
                bytes_found,
                current_path: path.to_path_buf(),
            })));
        }

        let candidates: Vec<Candidate> = photos
            .iter()
            .map(|p| Candidate {
                path: p.path.clone(),
                size: p.file_size,
            })
            .collect();
        let report = self.dedup.find_duplicates_with_events(&candidates, events);

        for (i, representative) in report.duplicate_of.iter().enumerate() {
            if let Some(first) = *representative {
                let original = photos[first].path.clone();
                photos[i].is_duplicate = true;
                photos[i].duplicate_of = Some(original);
            }
        }

        let mut result = ScanResult::new(source.to_path_buf(), photos);
        result.skipped = skipped;
        result.warnings = report.warnings;

        tracing::info!(
            "Found {} photos ({} bytes), {} duplicates, {} skipped",
            result.total_files,
            result.total_size,
            result.duplicate_count(),
            result.skipped.len()
        );
        events.send(Event::Scan(ScanEvent::Completed {
            total_photos: result.total_files,
            duplicates: result.duplicate_count(),
        }));

        Ok(result)
    }
}

/// The source must be an existing, readable directory.
fn verify_root(root: &Path) -> Result<(), ScanError> {
    let path = root.to_path_buf();
    let metadata = fs::metadata(root).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ScanError::DirectoryNotFound { path: path.clone() },
        ErrorKind::PermissionDenied => ScanError::PermissionDenied { path: path.clone() },
        _ => ScanError::ReadDirectory {
            path: path.clone(),
            source: e,
        },
    })?;

    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory { path });
    }

    fs::read_dir(root).map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => ScanError::PermissionDenied { path: path.clone() },
        _ => ScanError::ReadDirectory {
            path: path.clone(),
            source: e,
        },
    })?;

    Ok(())
}

fn record_skip(
    skipped: &mut Vec<SkippedFile>,
    events: &EventSender,
    path: std::path::PathBuf,
    reason: String,
) {
    tracing::debug!("Skipping {}: {}", path.display(), reason);
    events.send(Event::Scan(ScanEvent::Skipped {
        path: path.clone(),
        message: reason.clone(),
    }));
    skipped.push(SkippedFile { path, reason });
}
