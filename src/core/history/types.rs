//! Types for transfer history storage.

use crate::core::scanner::ScanResult;
use crate::core::transfer::{TransferResult, TransferStatus, TransferredFile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Most records a store keeps; older ones are dropped on insert
pub const MAX_RECORDS: usize = 100;

/// One finished (or cancelled) transfer run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    /// Folder template the run used
    pub template: String,
    pub total_files: usize,
    pub success_count: usize,
    pub skip_count: usize,
    pub error_count: usize,
    /// Bytes in the scanned batch
    pub total_size: u64,
    pub duration_ms: u64,
    pub status: TransferStatus,
    /// What happened to each file, in transfer order
    #[serde(default)]
    pub files: Vec<TransferredFile>,
}

impl TransferRecord {
    /// Build a record for a run that just ended
    pub fn from_run(
        scan: &ScanResult,
        target_dir: PathBuf,
        template: &str,
        result: &TransferResult,
    ) -> Self {
        Self {
            id: generate_id(),
            timestamp: Utc::now(),
            source_dir: scan.source_dir.clone(),
            target_dir,
            template: template.to_string(),
            total_files: scan.total_files,
            success_count: result.success_count,
            skip_count: result.skip_count,
            error_count: result.error_count,
            total_size: scan.total_size,
            duration_ms: result.duration_ms,
            status: result.status,
            files: result.files.clone(),
        }
    }
}

/// Generate a new unique ID
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
