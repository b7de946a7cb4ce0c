//! Decides which files count as photos.

use std::collections::HashSet;
use std::path::Path;

/// Extensions accepted by default, lowercase
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    // Canon
    "cr3", "cr2", "crw",
    // Nikon
    "nef", "nrw",
    // Sony
    "arw", "srf", "sr2",
    // Olympus, Fujifilm, Panasonic, Pentax
    "orf", "raf", "rw2", "pef",
    // Adobe, Leica
    "dng", "raw", "rwl",
    // Hasselblad, Epson, Kodak, Sigma
    "3fr", "erf", "kdc", "dcr", "x3f",
    // Common formats
    "jpg", "jpeg", "png", "tiff", "tif", "heic", "heif", "webp", "bmp", "gif",
];

/// Decides which files a scan picks up
#[derive(Debug, Clone)]
pub struct PhotoFilter {
    extensions: HashSet<String>,
    include_hidden: bool,
}

impl PhotoFilter {
    /// Create a filter accepting [`SUPPORTED_EXTENSIONS`]
    pub fn new() -> Self {
        Self {
            extensions: SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_hidden: false,
        }
    }

    /// Also accept dot files and descend into dot directories
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Whether a file name is hidden and hidden files are excluded
    pub fn is_excluded_hidden(&self, path: &Path) -> bool {
        !self.include_hidden
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with('.'))
    }

    /// Supported extension and not excluded as hidden
    pub fn should_include(&self, path: &Path) -> bool {
        if self.is_excluded_hidden(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }
}

impl Default for PhotoFilter {
    fn default() -> Self {
        Self::new()
    }
}
