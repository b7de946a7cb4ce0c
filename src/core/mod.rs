//! # Core Module
//!
//! The UI-agnostic classify-and-transfer engine.
//!
//! ## Modules
//! - `scanner` - Discovers photos and reads their metadata
//! - `metadata` - Extracts EXIF capture date and camera
//! - `classify` - Maps metadata to target folders through a template
//! - `dedup` - Finds byte-identical files by content
//! - `rename` - Renders new file names with per-folder counters
//! - `transfer` - Copies photos into the target library
//! - `history` - Records finished transfers
//! - `session` - Drives one scan-preview-transfer run

pub mod cancel;
pub mod classify;
pub mod dedup;
pub mod history;
pub mod metadata;
pub mod rename;
pub mod scanner;
pub mod session;
pub mod transfer;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use classify::{ClassificationPreview, ClassifyConfig};
pub use dedup::{ContentDeduplicator, HashConfig};
pub use history::{HistoryRecorder, SqliteHistoryStore, TransferRecord};
pub use metadata::PhotoMetadata;
pub use rename::RenameConfig;
pub use scanner::{PhotoInfo, ScanConfig, ScanResult};
pub use session::Session;
pub use transfer::{TransferOptions, TransferOrchestrator, TransferResult};
