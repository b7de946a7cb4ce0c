//! # Transfer Module
//!
//! Copies a scanned batch into the target tree.
//!
//! Files are processed one at a time in scan order. Each file is either
//! copied (atomically, never overwriting), skipped as a duplicate, skipped
//! because identical content already sits at its destination, or recorded
//! as failed. A failure never stops the run; only cancellation does.

mod copy;
mod orchestrator;

pub use copy::{atomic_copy, resolve_destination, Destination};
pub use orchestrator::TransferOrchestrator;

pub use crate::events::{TransferProgress, TransferStatus};

use crate::core::rename::RenameConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Error entry appended when a run is cancelled
pub const CANCELLED_MESSAGE: &str = "Transfer cancelled";

/// Per-run transfer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOptions {
    pub target_dir: PathBuf,
    /// Skip batch duplicates and content already in the target tree
    pub skip_duplicates: bool,
    pub rename: RenameConfig,
}

impl TransferOptions {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            skip_duplicates: true,
            rename: RenameConfig::default(),
        }
    }
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FileOutcome {
    Copied,
    /// Same content as an earlier photo in the batch or a file in the target
    SkippedDuplicate,
    /// The destination already holds identical content
    SkippedExisting,
    Failed(String),
}

impl FileOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            FileOutcome::Copied => "copied",
            FileOutcome::SkippedDuplicate => "skipped_duplicate",
            FileOutcome::SkippedExisting => "skipped_existing",
            FileOutcome::Failed(_) => "failed",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            FileOutcome::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Rebuild an outcome from its stored kind and message.
    ///
    /// Unknown kinds come back as failures carrying the kind.
    pub fn from_parts(kind: &str, message: Option<String>) -> Self {
        match kind {
            "copied" => FileOutcome::Copied,
            "skipped_duplicate" => FileOutcome::SkippedDuplicate,
            "skipped_existing" => FileOutcome::SkippedExisting,
            "failed" => FileOutcome::Failed(message.unwrap_or_default()),
            other => FileOutcome::Failed(message.unwrap_or_else(|| other.to_string())),
        }
    }
}

/// Per-file record of a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferredFile {
    pub source: PathBuf,
    /// Final or matching path; `None` when no destination was reached
    pub destination: Option<PathBuf>,
    pub size: u64,
    pub outcome: FileOutcome,
}

/// Outcome of a transfer run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub success_count: usize,
    pub skip_count: usize,
    pub error_count: usize,
    /// One message per failed file, plus [`CANCELLED_MESSAGE`] when cancelled
    pub errors: Vec<String>,
    pub status: TransferStatus,
    /// Bytes actually copied
    pub bytes_transferred: u64,
    pub duration_ms: u64,
    /// Files processed before the run ended, in scan order
    pub files: Vec<TransferredFile>,
}

impl TransferResult {
    pub fn is_cancelled(&self) -> bool {
        self.status == TransferStatus::Cancelled
    }

    /// Files handled without error
    pub fn processed(&self) -> usize {
        self.success_count + self.skip_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_kind_matches_serialized_tag() {
        for outcome in [
            FileOutcome::Copied,
            FileOutcome::SkippedDuplicate,
            FileOutcome::SkippedExisting,
            FileOutcome::Failed("disk full".to_string()),
        ] {
            let json = serde_json::to_value(&outcome).unwrap();
            assert_eq!(json["kind"], outcome.kind());
            let message = outcome.message().map(str::to_string);
            assert_eq!(FileOutcome::from_parts(outcome.kind(), message), outcome);
        }
    }

    #[test]
    fn unknown_stored_kind_is_a_failure() {
        assert_eq!(
            FileOutcome::from_parts("moved", None),
            FileOutcome::Failed("moved".to_string())
        );
    }
}
