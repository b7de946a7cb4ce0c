//! Folder-by-folder preview of a scan.

use crate::core::scanner::ScanResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Photos that a scan would place into one destination folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationPreview {
    pub folder: String,
    pub file_count: usize,
    /// File names in scan order
    pub files: Vec<String>,
}

/// Group a scan by target folder, sorted by folder name.
pub fn preview_classification(scan: &ScanResult) -> Vec<ClassificationPreview> {
    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for photo in &scan.photos {
        groups
            .entry(photo.target_folder.as_str())
            .or_default()
            .push(photo.file_name.clone());
    }

    groups
        .into_iter()
        .map(|(folder, files)| ClassificationPreview {
            folder: folder.to_string(),
            file_count: files.len(),
            files,
        })
        .collect()
}
