//! # Error Module
//!
//! Error types for the photo porter.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Fatal vs per-item** - only errors that abort a whole run live here;
//!   per-file failures are collected into result objects instead

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum PhotoPorterError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Errors that abort a scan. Unreadable individual files are not errors.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Source is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid folder rules: {0}")]
    InvalidClassification(String),

    #[error("Scan was cancelled")]
    Cancelled,
}

/// Errors while hashing file content
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the metadata collaborator. Always non-fatal to a scan.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No readable metadata in {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Errors that abort a transfer before any file is processed
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Destination folder leaves the target directory: {folder}")]
    UnsafeFolder { folder: String },

    #[error("Cannot create target directory {path}: {source}")]
    TargetUncreatable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Target {path} exists and is not a directory")]
    TargetNotADirectory { path: PathBuf },
}

/// Errors from the history store
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to open history database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("History query failed: {0}")]
    QueryFailed(String),

    #[error("History store lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for HistoryError {
    fn from(error: rusqlite::Error) -> Self {
        HistoryError::QueryFailed(error.to_string())
    }
}

/// Errors from the session lifecycle
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Another scan or transfer is already running")]
    Busy,

    #[error("No scan result available. Scan a source folder first.")]
    NotReady,

    #[error("Session state lock poisoned")]
    Poisoned,

    #[error("Background worker panicked")]
    WorkerPanicked,

    #[error("Failed to start background worker: {0}")]
    SpawnFailed(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, PhotoPorterError>;
