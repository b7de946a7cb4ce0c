//! # Rename Module
//!
//! Generates destination file names from a template.
//!
//! ## Tokens
//! - `{original}` - original file name without extension
//! - `{date}` - `YYYYMMDD`, `{time}` - `HHMMSS`, `{datetime}` - `YYYYMMDD_HHMMSS`
//! - `{year}`, `{month}`, `{day}`, `{hour}`, `{minute}`, `{second}`
//! - `{counter}` - per-folder counter, zero-padded
//! - `{camera}`, `{make}`
//!
//! The original extension is always kept, whatever the template says.

mod counter;

pub use counter::FolderCounters;

use crate::core::classify::{tokens, UNKNOWN};
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// Tokens understood by the rename engine
pub const NAME_TOKENS: &[&str] = &[
    "original", "date", "time", "datetime", "year", "month", "day", "hour", "minute", "second",
    "counter", "camera", "make",
];

/// Allowed range for the counter padding width
pub const COUNTER_DIGITS: std::ops::RangeInclusive<u32> = 1..=8;

/// Rename rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameConfig {
    pub enabled: bool,
    pub template: String,
    /// First counter value in every folder
    pub counter_start: u32,
    /// Zero-padding width of `{counter}`
    pub counter_digits: u32,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            template: "{original}".to_string(),
            counter_start: 1,
            counter_digits: 4,
        }
    }
}

/// Everything about a file that a name template can refer to
#[derive(Debug, Clone, Copy, Default)]
pub struct NameContext<'a> {
    pub original_name: &'a str,
    pub date_time: Option<&'a NaiveDateTime>,
    pub camera: Option<&'a str>,
    pub make: Option<&'a str>,
}

impl RenameConfig {
    /// Destination file name; the original name when renaming is disabled.
    pub fn file_name(&self, context: &NameContext<'_>, counter: u32) -> String {
        if !self.enabled {
            return context.original_name.to_string();
        }
        render_name(context, counter, &self.template, self.counter_digits)
    }

    /// Problems with this configuration.
    ///
    /// `max_per_folder` is the largest number of files headed for a single
    /// folder; when given, counter overflow beyond the padding is reported.
    pub fn validate(&self, max_per_folder: Option<usize>) -> Vec<String> {
        let mut warnings = Vec::new();

        if !COUNTER_DIGITS.contains(&self.counter_digits) {
            warnings.push(format!(
                "Counter digits must be between {} and {}, got {}",
                COUNTER_DIGITS.start(),
                COUNTER_DIGITS.end(),
                self.counter_digits
            ));
        }
        if self.counter_start < 1 {
            warnings.push("Counter must start at 1 or higher".to_string());
        }

        let found = tokens(&self.template);
        for token in found.iter().filter(|t| !NAME_TOKENS.contains(&t.as_str())) {
            warnings.push(format!("Unknown token: {{{}}}", token));
        }

        let has_counter = found.iter().any(|t| t == "counter");
        if !has_counter && !found.iter().any(|t| t == "original") {
            warnings.push(
                "Template has neither {counter} nor {original}; names may collide".to_string(),
            );
        }

        if let (true, Some(count)) = (has_counter, max_per_folder) {
            if count > 0 {
                let last = u64::from(self.counter_start) + count as u64 - 1;
                let width = last.to_string().len() as u32;
                if width > self.counter_digits {
                    warnings.push(format!(
                        "Counter reaches {} which exceeds {} digits; names will be wider than the padding",
                        last, self.counter_digits
                    ));
                }
            }
        }

        warnings
    }
}

/// Render a file name from a name, date, counter and camera.
pub fn render(
    original_name: &str,
    date_time: Option<&NaiveDateTime>,
    counter: u32,
    camera: Option<&str>,
    template: &str,
    counter_digits: u32,
) -> String {
    let context = NameContext {
        original_name,
        date_time,
        camera,
        make: None,
    };
    render_name(&context, counter, template, counter_digits)
}

/// Render a file name, keeping the original extension.
pub fn render_name(
    context: &NameContext<'_>,
    counter: u32,
    template: &str,
    counter_digits: u32,
) -> String {
    let original = Path::new(context.original_name);
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = original
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();

    let width = counter_digits.clamp(*COUNTER_DIGITS.start(), *COUNTER_DIGITS.end()) as usize;
    let dt = context.date_time;

    let name = crate::core::classify::substitute(template, |token| {
        let value = match token {
            "original" => stem.clone(),
            "counter" => format!("{:0width$}", counter, width = width),
            "camera" => context.camera.unwrap_or("").to_string(),
            "make" => context.make.unwrap_or("").to_string(),
            "date" => dt.map(|d| d.format("%Y%m%d").to_string()).unwrap_or_default(),
            "time" => dt.map(|d| d.format("%H%M%S").to_string()).unwrap_or_default(),
            "datetime" => dt
                .map(|d| d.format("%Y%m%d_%H%M%S").to_string())
                .unwrap_or_default(),
            "year" => dt.map(|d| format!("{:04}", d.year())).unwrap_or_default(),
            "month" => dt.map(|d| format!("{:02}", d.month())).unwrap_or_default(),
            "day" => dt.map(|d| format!("{:02}", d.day())).unwrap_or_default(),
            "hour" => dt.map(|d| format!("{:02}", d.hour())).unwrap_or_default(),
            "minute" => dt.map(|d| format!("{:02}", d.minute())).unwrap_or_default(),
            "second" => dt.map(|d| format!("{:02}", d.second())).unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    });

    let mut name = sanitize_file_name(&name);
    while name.contains("__") {
        name = name.replace("__", "_");
    }
    let mut name = name.trim_matches('_').to_string();
    if !is_plain_name(&name) {
        name = stem;
    }
    if !is_plain_name(&name) {
        name = UNKNOWN.to_string();
    }

    if extension.is_empty() {
        name
    } else {
        format!("{}.{}", name, extension)
    }
}

/// A single ordinary path component: not empty, `.` or `..`
pub(crate) fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Named rename templates offered to users
pub fn preset_templates() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Keep original", "{original}"),
        ("Date + original", "{date}_{original}"),
        ("Date-time + original", "{datetime}_{original}"),
        ("Date + counter", "{date}_{counter}"),
        ("Camera + date + counter", "{camera}_{date}_{counter}"),
        ("Original + counter", "{original}_{counter}"),
    ]
}
