//! # Classify Module
//!
//! Maps photo metadata to a destination folder through a template.
//!
//! ## Tokens
//! - `{year}` - 4-digit year
//! - `{month}`, `{day}` - 2-digit, zero-padded
//! - `{camera}` - camera model, `Unknown` when missing
//! - `{make}` - camera make, `Unknown` when missing
//!
//! A photo without a date always lands in the fallback folder; date tokens
//! are never partially substituted.

mod preview;
mod template;

pub use preview::{preview_classification, ClassificationPreview};
pub use template::{escapes_root, validate_template, TemplateValidation, FOLDER_TOKENS};

pub(crate) use template::{substitute, tokens};

use crate::core::metadata::PhotoMetadata;
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Placeholder for a missing camera or make
pub const UNKNOWN: &str = "Unknown";

/// Folder classification rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Folder template, e.g. `{year}/{month}`
    pub template: String,
    /// Folder used when the capture date is unknown
    pub fallback_folder: String,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            template: "{year}/{month}".to_string(),
            fallback_folder: UNKNOWN.to_string(),
        }
    }
}

impl ClassifyConfig {
    /// Reject templates or fallbacks that would place files outside the target.
    pub fn validate(&self) -> Result<(), String> {
        if escapes_root(&self.template) {
            return Err(format!("template '{}' leaves the target folder", self.template));
        }
        if escapes_root(&self.fallback_folder) {
            return Err(format!(
                "fallback folder '{}' leaves the target folder",
                self.fallback_folder
            ));
        }
        Ok(())
    }

    /// Destination folder for a photo with the given metadata
    pub fn target_folder(&self, metadata: &PhotoMetadata) -> String {
        classify(
            metadata.date_time.as_ref(),
            metadata.camera.as_deref(),
            metadata.make.as_deref(),
            &self.template,
            &self.fallback_folder,
        )
    }
}

/// Resolve a folder template.
pub fn classify(
    date_time: Option<&NaiveDateTime>,
    camera: Option<&str>,
    make: Option<&str>,
    template: &str,
    fallback_folder: &str,
) -> String {
    let Some(dt) = date_time else {
        return fallback_folder.to_string();
    };

    substitute(template, |token| match token {
        "year" => Some(format!("{:04}", dt.year())),
        "month" => Some(format!("{:02}", dt.month())),
        "day" => Some(format!("{:02}", dt.day())),
        "camera" => Some(sanitize_component(camera.unwrap_or(UNKNOWN))),
        "make" => Some(sanitize_component(make.unwrap_or(UNKNOWN))),
        _ => None,
    })
}

/// Replace characters that are illegal in (or would split) a path component.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Named folder templates offered to users
pub fn preset_templates() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Year / Month", "{year}/{month}"),
        ("Year / Month / Day", "{year}/{month}/{day}"),
        ("Year / Month-Day", "{year}/{month}-{day}"),
        ("Make / Year / Month", "{make}/{year}/{month}"),
        ("Camera / Year / Month", "{camera}/{year}/{month}"),
        ("Year / Camera / Month", "{year}/{camera}/{month}"),
    ]
}
