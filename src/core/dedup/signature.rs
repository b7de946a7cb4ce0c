//! Content fingerprints: a cheap quick signature and a full BLAKE3 hash.

use crate::error::HashError;
use memmap2::Mmap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;

/// Bytes sampled from each end of a file for the quick signature (64KB)
pub const SAMPLE_SIZE: u64 = 64 * 1024;

/// Minimum file size to hash through a memory map (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Cheap fingerprint used to bucket possible duplicates.
///
/// Equal signatures only mean "maybe identical"; a full hash confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuickSignature {
    pub size: u64,
    head: u64,
    tail: u64,
}

/// Full content hash of a file
pub type FullHash = blake3::Hash;

/// Size plus xxh3 of the first and last 64KB.
///
/// Files shorter than two samples are hashed whole.
pub fn quick_signature(path: &Path) -> Result<QuickSignature, HashError> {
    let mut file = open(path)?;
    let size = file
        .metadata()
        .map_err(|source| read_error(path, source))?
        .len();

    if size < SAMPLE_SIZE * 2 {
        let mut buffer = Vec::with_capacity(size as usize);
        file.read_to_end(&mut buffer)
            .map_err(|source| read_error(path, source))?;
        return Ok(QuickSignature {
            size,
            head: xxh3_64(&buffer),
            tail: 0,
        });
    }

    let mut buffer = vec![0u8; SAMPLE_SIZE as usize];
    file.read_exact(&mut buffer)
        .map_err(|source| read_error(path, source))?;
    let head = xxh3_64(&buffer);

    file.seek(SeekFrom::End(-(SAMPLE_SIZE as i64)))
        .map_err(|source| read_error(path, source))?;
    file.read_exact(&mut buffer)
        .map_err(|source| read_error(path, source))?;
    let tail = xxh3_64(&buffer);

    Ok(QuickSignature { size, head, tail })
}

/// BLAKE3 hash of the whole file.
///
/// Files of 1MB and above are mapped into memory instead of streamed.
pub fn full_hash(path: &Path) -> Result<FullHash, HashError> {
    let mut file = open(path)?;
    let size = file
        .metadata()
        .map_err(|source| read_error(path, source))?
        .len();

    if size >= MMAP_THRESHOLD {
        // SAFETY: the map is read-only and dropped before the file handle.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| read_error(path, source))?;
        return Ok(blake3::hash(&mmap));
    }

    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut file, &mut hasher).map_err(|source| read_error(path, source))?;
    Ok(hasher.finalize())
}

/// Whether two files have identical content.
pub fn files_identical(a: &Path, b: &Path) -> Result<bool, HashError> {
    let size_a = std::fs::metadata(a).map_err(|source| open_error(a, source))?.len();
    let size_b = std::fs::metadata(b).map_err(|source| open_error(b, source))?.len();
    if size_a != size_b {
        return Ok(false);
    }
    Ok(full_hash(a)? == full_hash(b)?)
}

fn open(path: &Path) -> Result<File, HashError> {
    File::open(path).map_err(|source| open_error(path, source))
}

fn open_error(path: &Path, source: std::io::Error) -> HashError {
    HashError::Open {
        path: path.to_path_buf(),
        source,
    }
}

fn read_error(path: &Path, source: std::io::Error) -> HashError {
    HashError::Read {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn small_identical_files_share_signature() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.jpg", b"0123456789");
        let b = write(&dir, "b.jpg", b"0123456789");
        assert_eq!(quick_signature(&a).unwrap(), quick_signature(&b).unwrap());
    }

    #[test]
    fn size_is_part_of_signature() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.jpg", b"0123456789");
        let b = write(&dir, "b.jpg", b"01234567890");
        let sig = quick_signature(&a).unwrap();
        assert_eq!(sig.size, 10);
        assert_ne!(sig, quick_signature(&b).unwrap());
    }

    #[test]
    fn large_files_differing_in_the_middle_collide_on_signature_only() {
        let dir = TempDir::new().unwrap();
        let mut content = vec![7u8; 4_000_000];
        let a = write(&dir, "a.cr3", &content);
        content[2_000_000] = 8;
        let b = write(&dir, "b.cr3", &content);

        assert_eq!(quick_signature(&a).unwrap(), quick_signature(&b).unwrap());
        assert_ne!(full_hash(&a).unwrap(), full_hash(&b).unwrap());
    }

    #[test]
    fn mapped_and_streamed_hashes_agree() {
        let dir = TempDir::new().unwrap();
        let content: Vec<u8> = (0..2_000_000u32).map(|i| (i % 251) as u8).collect();
        let large = write(&dir, "large.nef", &content);
        assert_eq!(full_hash(&large).unwrap(), blake3::hash(&content));

        let small = write(&dir, "small.nef", &content[..1000]);
        assert_eq!(full_hash(&small).unwrap(), blake3::hash(&content[..1000]));
    }

    #[test]
    fn identical_check() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.jpg", b"same");
        let b = write(&dir, "b.jpg", b"same");
        let c = write(&dir, "c.jpg", b"diff");
        assert!(files_identical(&a, &b).unwrap());
        assert!(!files_identical(&a, &c).unwrap());
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let result = quick_signature(Path::new("/nonexistent/a.jpg"));
        assert!(matches!(result, Err(HashError::Open { .. })));
    }
}
