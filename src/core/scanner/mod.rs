//! # Scanner Module
//!
//! Discovers photo files in a source tree, reads their metadata, classifies
//! them and marks content duplicates.
//!
//! ## Supported Formats
//! - JPEG, PNG, TIFF, HEIC/HEIF, WebP, BMP, GIF
//! - RAW: Canon, Nikon, Sony, Olympus, Fujifilm, Panasonic, Pentax, Adobe DNG,
//!   Leica, Hasselblad, Epson, Kodak, Sigma
//!
//! ## Example
//! ```rust,ignore
//! use photo_porter::core::scanner::{ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(Path::new("/Volumes/CARD/DCIM"), &ClassifyConfig::default(), &ExifMetadataExtractor)?;
//! ```

mod filter;
mod walker;

pub use filter::{PhotoFilter, SUPPORTED_EXTENSIONS};
pub use walker::{ScanConfig, WalkDirScanner};

use crate::core::dedup::DedupWarning;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A discovered photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoInfo {
    /// Path to the photo file
    pub path: PathBuf,
    pub file_name: String,
    /// File size in bytes
    pub file_size: u64,
    /// Capture date, if the metadata had one
    pub date_time: Option<NaiveDateTime>,
    pub camera: Option<String>,
    pub make: Option<String>,
    /// Destination folder relative to the target root
    pub target_folder: String,
    pub is_duplicate: bool,
    /// Earlier photo in the same scan with identical content
    pub duplicate_of: Option<PathBuf>,
}

/// A file that was left out of a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of scanning a source directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub source_dir: PathBuf,
    pub total_files: usize,
    pub total_size: u64,
    /// Photos in scan order
    pub photos: Vec<PhotoInfo>,
    /// Files that could not be read (non-fatal)
    pub skipped: Vec<SkippedFile>,
    /// Files that could not be hashed and were treated as unique
    pub warnings: Vec<DedupWarning>,
}

impl ScanResult {
    pub fn new(source_dir: PathBuf, photos: Vec<PhotoInfo>) -> Self {
        Self {
            source_dir,
            total_files: photos.len(),
            total_size: photos.iter().map(|p| p.file_size).sum(),
            photos,
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn duplicate_count(&self) -> usize {
        self.photos.iter().filter(|p| p.is_duplicate).count()
    }

    /// Largest number of photos headed for a single folder
    pub fn max_files_per_folder(&self) -> usize {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for photo in &self.photos {
            *counts.entry(photo.target_folder.as_str()).or_default() += 1;
        }
        counts.into_values().max().unwrap_or(0)
    }
}
