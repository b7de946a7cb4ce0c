//! Destination name resolution and atomic copying.

use crate::core::dedup::files_identical;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Where a file should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Nothing exists at this path yet
    Free(PathBuf),
    /// This path already holds identical content
    Identical(PathBuf),
}

/// Pick the destination for `source` named `name` inside `folder`.
///
/// An occupied path with different content moves on to `stem_1.ext`,
/// `stem_2.ext` and so on; each candidate gets the same identical-content
/// check.
pub fn resolve_destination(folder: &Path, name: &str, source: &Path) -> Destination {
    let mut candidate = folder.join(name);
    let mut suffix = 1u32;

    loop {
        if !candidate.exists() {
            return Destination::Free(candidate);
        }

        match files_identical(source, &candidate) {
            Ok(true) => return Destination::Identical(candidate),
            Ok(false) => {}
            Err(e) => tracing::debug!("Cannot compare with {}: {}", candidate.display(), e),
        }

        candidate = folder.join(suffixed_name(name, suffix));
        suffix += 1;
    }
}

/// `IMG_1.jpg` + 2 -> `IMG_1_2.jpg`
fn suffixed_name(name: &str, suffix: u32) -> String {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    }
}

/// Copy `source` to `destination` without ever exposing a partial file.
///
/// The bytes land in a temporary file next to the destination, are synced,
/// and the temporary file is then renamed into place. An existing file at
/// `destination` is never overwritten. Returns the bytes copied.
pub fn atomic_copy(source: &Path, destination: &Path) -> io::Result<u64> {
    let folder = destination
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"))?;

    let mut reader = File::open(source)?;
    let mut temp = NamedTempFile::new_in(folder)?;
    let bytes = io::copy(&mut reader, temp.as_file_mut())?;
    temp.as_file().sync_all()?;

    temp.persist_noclobber(destination).map_err(|e| e.error)?;
    Ok(bytes)
}
