//! The history store seam and an in-memory implementation.

use super::types::{TransferRecord, MAX_RECORDS};
use crate::error::HistoryError;
use std::sync::Mutex;

/// Persistence for transfer records.
///
/// `list` returns records newest first.
pub trait HistoryStore: Send + Sync {
    fn create(&self, record: &TransferRecord) -> Result<(), HistoryError>;
    fn list(&self) -> Result<Vec<TransferRecord>, HistoryError>;
    /// Returns whether a record was removed
    fn delete(&self, id: &str) -> Result<bool, HistoryError>;
    /// Returns the number of records removed
    fn clear(&self) -> Result<usize, HistoryError>;
}

/// Volatile store for tests and dry runs
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    records: Mutex<Vec<TransferRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn create(&self, record: &TransferRecord) -> Result<(), HistoryError> {
        let mut records = self.records.lock().map_err(|_| HistoryError::Poisoned)?;
        records.insert(0, record.clone());
        records.truncate(MAX_RECORDS);
        Ok(())
    }

    fn list(&self) -> Result<Vec<TransferRecord>, HistoryError> {
        let records = self.records.lock().map_err(|_| HistoryError::Poisoned)?;
        Ok(records.clone())
    }

    fn delete(&self, id: &str) -> Result<bool, HistoryError> {
        let mut records = self.records.lock().map_err(|_| HistoryError::Poisoned)?;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    fn clear(&self) -> Result<usize, HistoryError> {
        let mut records = self.records.lock().map_err(|_| HistoryError::Poisoned)?;
        let count = records.len();
        records.clear();
        Ok(count)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::history::types::generate_id;
    use crate::core::transfer::{FileOutcome, TransferStatus, TransferredFile};
    use chrono::{Duration, Utc};
    use std::path::PathBuf;

    pub(crate) fn record(age_secs: i64) -> TransferRecord {
        TransferRecord {
            id: generate_id(),
            timestamp: Utc::now() - Duration::seconds(age_secs),
            source_dir: PathBuf::from("/card/DCIM"),
            target_dir: PathBuf::from("/nas/photos"),
            template: "{year}/{month}".to_string(),
            total_files: 10,
            success_count: 8,
            skip_count: 1,
            error_count: 1,
            total_size: 4096,
            duration_ms: 1500,
            status: TransferStatus::Completed,
            files: vec![
                TransferredFile {
                    source: PathBuf::from("/card/DCIM/IMG_0001.JPG"),
                    destination: Some(PathBuf::from("/nas/photos/2024/03/IMG_0001.JPG")),
                    size: 2048,
                    outcome: FileOutcome::Copied,
                },
                TransferredFile {
                    source: PathBuf::from("/card/DCIM/IMG_0002.JPG"),
                    destination: None,
                    size: 2048,
                    outcome: FileOutcome::Failed("permission denied".to_string()),
                },
            ],
        }
    }

    #[test]
    fn newest_first_and_capped() {
        let store = InMemoryHistoryStore::new();
        for age in (0..(MAX_RECORDS as i64 + 5)).rev() {
            store.create(&record(age)).unwrap();
        }

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), MAX_RECORDS);
        assert!(listed[0].timestamp > listed[1].timestamp);
    }

    #[test]
    fn delete_and_clear() {
        let store = InMemoryHistoryStore::new();
        let first = record(1);
        store.create(&first).unwrap();
        store.create(&record(0)).unwrap();

        assert!(store.delete(&first.id).unwrap());
        assert!(!store.delete(&first.id).unwrap());
        assert_eq!(store.clear().unwrap(), 1);
        assert!(store.list().unwrap().is_empty());
    }
}
