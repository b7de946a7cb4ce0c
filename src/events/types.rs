//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by a photo porter session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Duplicate detection events
    Dedup(DedupEvent),
    /// Transfer progress snapshots
    Transfer(TransferProgress),
    /// Session-level events
    Session(SessionEvent),
}

impl Event {
    /// Terminal events are never dropped by a full channel.
    pub fn is_terminal(&self) -> bool {
        match self {
            Event::Scan(ScanEvent::Completed { .. }) => true,
            Event::Transfer(progress) => progress.status.is_terminal(),
            Event::Session(SessionEvent::StateChanged { state }) => state.is_terminal(),
            Event::Session(SessionEvent::Error { .. }) => true,
            _ => false,
        }
    }
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { source: PathBuf },
    /// Progress update during scanning
    Progress(ScanProgress),
    /// A file could not be read and was left out of the scan
    Skipped { path: PathBuf, message: String },
    /// Scanning completed
    Completed {
        total_photos: usize,
        duplicates: usize,
    },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of supported photos found so far
    pub photos_found: usize,
    /// Bytes of photos found so far
    pub bytes_found: u64,
    /// File currently being inspected
    pub current_path: PathBuf,
}

/// Events from the content deduplicator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DedupEvent {
    /// Hashing has started
    Started { candidates: usize },
    /// A file could not be hashed and is treated as unique
    Warning { path: PathBuf, message: String },
    /// Hashing completed
    Completed {
        full_hashes: usize,
        duplicates: usize,
    },
}

/// Status carried by every transfer progress snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Indexing the destination before copying
    Scanning,
    Transferring,
    Completed,
    Cancelled,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Scanning => "scanning",
            TransferStatus::Transferring => "transferring",
            TransferStatus::Completed => "completed",
            TransferStatus::Cancelled => "cancelled",
        }
    }
}

/// Snapshot of a running transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProgress {
    /// Files processed so far (never decreases)
    pub current: usize,
    /// Files in the batch
    pub total: usize,
    /// Name of the file just processed
    pub current_file: String,
    /// Bytes accounted for so far (never decreases)
    pub bytes_transferred: u64,
    pub total_bytes: u64,
    pub status: TransferStatus,
    pub skipped_duplicates: usize,
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Scanning,
    Previewing,
    Transferring,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Cancelled | SessionState::Failed
        )
    }

    /// Whether a scan or transfer is currently running
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Scanning | SessionState::Transferring)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Scanning => write!(f, "Scanning"),
            SessionState::Previewing => write!(f, "Previewing"),
            SessionState::Transferring => write!(f, "Transferring"),
            SessionState::Completed => write!(f, "Completed"),
            SessionState::Cancelled => write!(f, "Cancelled"),
            SessionState::Failed => write!(f, "Failed"),
        }
    }
}

/// Session-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The session moved to a new state
    StateChanged { state: SessionState },
    /// A run ended with a fatal error
    Error { message: String },
}
