//! # Photo Porter
//!
//! Copies photos off a camera card or folder into an organized library.
//!
//! ## What it does
//! - **Classify** - each photo lands in a folder rendered from its EXIF
//!   date and camera, e.g. `{year}/{month}` becomes `2024/03`
//! - **Deduplicate** - byte-identical photos are copied once, and photos
//!   already present in the library are skipped
//! - **Rename** - optional file name templates with per-folder counters
//! - **Never overwrite** - existing files are kept; name collisions get a suffix
//!
//! ## Architecture
//! - `core` - The scan, classify, dedup and transfer engine
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{PhotoPorterError, Result};

/// Initialize tracing for the library
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies.
/// Calling this more than once keeps the first subscriber.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
