//! # Metadata Module
//!
//! Reads the capture date and camera identity of a photo.
//!
//! The engine only depends on the [`MetadataExtractor`] trait. The default
//! [`ExifMetadataExtractor`] reads EXIF tags with kamadak-exif; other
//! backends (an external metadata tool, a test double) plug in through the
//! same trait. Closures of the right shape implement it too.
//!
//! ## Extracted Fields
//! - Date taken (DateTimeOriginal, then DateTimeDigitized, then DateTime)
//! - Camera model
//! - Camera make

use crate::error::MetadataError;
use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Metadata the classifier and rename engine need
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    /// Original capture date/time
    pub date_time: Option<NaiveDateTime>,
    /// Camera model (e.g., "EOS R5")
    pub camera: Option<String>,
    /// Camera make (e.g., "Canon")
    pub make: Option<String>,
}

/// Source of per-file metadata.
///
/// Called once per accepted file during a scan. Failures are non-fatal:
/// the scanner falls back to empty metadata.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<PhotoMetadata, MetadataError>;
}

impl<F> MetadataExtractor for F
where
    F: Fn(&Path) -> Result<PhotoMetadata, MetadataError> + Send + Sync,
{
    fn extract(&self, path: &Path) -> Result<PhotoMetadata, MetadataError> {
        self(path)
    }
}

/// EXIF-backed metadata extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifMetadataExtractor;

impl MetadataExtractor for ExifMetadataExtractor {
    fn extract(&self, path: &Path) -> Result<PhotoMetadata, MetadataError> {
        let file = File::open(path).map_err(|source| MetadataError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = BufReader::new(file);
        let exif = Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| MetadataError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let date_time = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime]
            .into_iter()
            .filter_map(|tag| exif.get_field(tag, In::PRIMARY))
            .filter_map(|field| ascii_value(&field.value))
            .find_map(|s| parse_exif_datetime(&s));

        let camera = exif
            .get_field(Tag::Model, In::PRIMARY)
            .and_then(|field| ascii_value(&field.value));
        let make = exif
            .get_field(Tag::Make, In::PRIMARY)
            .and_then(|field| ascii_value(&field.value));

        Ok(PhotoMetadata {
            date_time,
            camera,
            make,
        })
    }
}

/// Parse the date formats found in EXIF and exported metadata.
///
/// Accepts `YYYY:MM:DD HH:MM:SS`, `YYYY-MM-DD HH:MM:SS` and a bare
/// `YYYY:MM:DD` (midnight).
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');

    for format in ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y:%m:%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Helper to extract a string from an EXIF ASCII value
fn ascii_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}
