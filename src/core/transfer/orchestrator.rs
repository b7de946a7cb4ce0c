//! Sequential, cancellable transfer of a scan result.

use super::copy::{atomic_copy, resolve_destination, Destination};
use super::{
    FileOutcome, TransferOptions, TransferProgress, TransferResult, TransferStatus,
    TransferredFile, CANCELLED_MESSAGE,
};
use crate::core::cancel::CancellationToken;
use crate::core::dedup::DestinationIndex;
use crate::core::classify::escapes_root;
use crate::core::rename::{is_plain_name, FolderCounters, NameContext};
use crate::core::scanner::{PhotoFilter, PhotoInfo, ScanResult};
use crate::error::TransferError;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Runs transfers
pub struct TransferOrchestrator {
    filter: PhotoFilter,
}

impl TransferOrchestrator {
    /// `filter` decides which existing target files are indexed for
    /// duplicate skipping.
    pub fn new(filter: PhotoFilter) -> Self {
        Self { filter }
    }

    /// Copy every photo of `scan` into `options.target_dir`.
    ///
    /// `on_progress` sees a snapshot after every file and a final snapshot
    /// whose status is terminal. Only an unusable target root is an error;
    /// everything else is reported per file in the result.
    pub fn run<F>(
        &self,
        scan: &ScanResult,
        options: &TransferOptions,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<TransferResult, TransferError>
    where
        F: FnMut(&TransferProgress),
    {
        let start = Instant::now();
        let target = options.target_dir.as_path();
        if let Some(photo) = scan.photos.iter().find(|p| escapes_root(&p.target_folder)) {
            return Err(TransferError::UnsafeFolder {
                folder: photo.target_folder.clone(),
            });
        }
        prepare_target(target)?;

        tracing::info!(
            "Transferring {} photos from {} to {}",
            scan.total_files,
            scan.source_dir.display(),
            target.display()
        );

        if options.rename.enabled {
            for warning in options.rename.validate(Some(scan.max_files_per_folder())) {
                tracing::warn!("Rename: {}", warning);
            }
        }

        let mut progress = TransferProgress {
            current: 0,
            total: scan.total_files,
            current_file: String::new(),
            bytes_transferred: 0,
            total_bytes: scan.total_size,
            status: TransferStatus::Scanning,
            skipped_duplicates: 0,
        };

        let mut index = if options.skip_duplicates {
            on_progress(&progress);
            DestinationIndex::build(target, &self.filter, cancel)
        } else {
            DestinationIndex::new()
        };
        progress.status = TransferStatus::Transferring;

        let mut result = TransferResult {
            success_count: 0,
            skip_count: 0,
            error_count: 0,
            errors: Vec::new(),
            status: TransferStatus::Completed,
            bytes_transferred: 0,
            duration_ms: 0,
            files: Vec::with_capacity(scan.photos.len()),
        };
        let mut counters = FolderCounters::new(options.rename.counter_start);

        for photo in &scan.photos {
            if cancel.is_cancelled() {
                tracing::info!("Transfer cancelled after {} files", progress.current);
                result.status = TransferStatus::Cancelled;
                result.errors.push(CANCELLED_MESSAGE.to_string());
                break;
            }

            let file = self.transfer_one(photo, options, &mut counters, &mut index);
            match &file.outcome {
                FileOutcome::Copied => {
                    result.success_count += 1;
                    result.bytes_transferred += file.size;
                }
                FileOutcome::SkippedDuplicate | FileOutcome::SkippedExisting => {
                    result.skip_count += 1;
                    progress.skipped_duplicates += 1;
                }
                FileOutcome::Failed(message) => {
                    tracing::warn!("{}", message);
                    result.error_count += 1;
                    result.errors.push(message.clone());
                }
            }
            result.files.push(file);

            progress.current += 1;
            progress.bytes_transferred += photo.file_size;
            progress.current_file = photo.file_name.clone();
            on_progress(&progress);
        }

        progress.status = result.status;
        on_progress(&progress);

        result.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Transfer {}: {} copied, {} skipped, {} failed in {}ms",
            result.status.as_str(),
            result.success_count,
            result.skip_count,
            result.error_count,
            result.duration_ms
        );

        Ok(result)
    }

    fn transfer_one(
        &self,
        photo: &PhotoInfo,
        options: &TransferOptions,
        counters: &mut FolderCounters,
        index: &mut DestinationIndex,
    ) -> TransferredFile {
        let mut file = TransferredFile {
            source: photo.path.clone(),
            destination: None,
            size: photo.file_size,
            outcome: FileOutcome::SkippedDuplicate,
        };

        if options.skip_duplicates && photo.is_duplicate {
            tracing::debug!("Skipping batch duplicate {}", photo.path.display());
            file.destination = photo.duplicate_of.clone();
            return file;
        }

        // Counters follow scan order, independent of what the target holds.
        let counter = counters.next(&photo.target_folder);
        let context = NameContext {
            original_name: &photo.file_name,
            date_time: photo.date_time.as_ref(),
            camera: photo.camera.as_deref(),
            make: photo.make.as_deref(),
        };
        let name = options.rename.file_name(&context, counter);
        if !is_plain_name(&name) {
            file.outcome = FileOutcome::Failed(format!("{}: unusable name '{}'", photo.file_name, name));
            return file;
        }

        if options.skip_duplicates {
            if let Some(existing) = index.find(&photo.path, photo.file_size) {
                tracing::debug!(
                    "Skipping {}, already in target as {}",
                    photo.path.display(),
                    existing.display()
                );
                file.destination = Some(existing);
                return file;
            }
        }

        let folder = options.target_dir.join(&photo.target_folder);
        if let Err(e) = fs::create_dir_all(&folder) {
            file.outcome = FileOutcome::Failed(format!(
                "{}: cannot create {}: {}",
                photo.file_name,
                folder.display(),
                e
            ));
            return file;
        }

        match resolve_destination(&folder, &name, &photo.path) {
            Destination::Identical(existing) => {
                tracing::debug!("{} already present", existing.display());
                file.destination = Some(existing);
                file.outcome = FileOutcome::SkippedExisting;
            }
            Destination::Free(destination) => match atomic_copy(&photo.path, &destination) {
                Ok(_) => {
                    tracing::debug!("Copied {} -> {}", photo.path.display(), destination.display());
                    if options.skip_duplicates {
                        index.insert(destination.clone(), photo.file_size);
                    }
                    file.destination = Some(destination);
                    file.outcome = FileOutcome::Copied;
                }
                Err(e) => {
                    file.outcome = FileOutcome::Failed(format!("{}: {}", photo.file_name, e));
                }
            },
        }

        file
    }
}

impl Default for TransferOrchestrator {
    fn default() -> Self {
        Self::new(PhotoFilter::new())
    }
}

/// Create the target root, or fail if it cannot hold files.
fn prepare_target(target: &Path) -> Result<(), TransferError> {
    if target.exists() && !target.is_dir() {
        return Err(TransferError::TargetNotADirectory {
            path: target.to_path_buf(),
        });
    }
    fs::create_dir_all(target).map_err(|source| TransferError::TargetUncreatable {
        path: target.to_path_buf(),
        source,
    })
}
