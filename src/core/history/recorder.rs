//! Turns finished runs into history records.

use super::store::HistoryStore;
use super::types::TransferRecord;
use crate::core::scanner::ScanResult;
use crate::core::transfer::TransferResult;
use crate::error::HistoryError;
use std::path::PathBuf;
use std::sync::Arc;

/// Records runs into a [`HistoryStore`]
#[derive(Clone)]
pub struct HistoryRecorder {
    store: Arc<dyn HistoryStore>,
}

impl HistoryRecorder {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// Persist a run.
    ///
    /// A store failure is logged and swallowed: the run itself already
    /// finished and its result stands.
    pub fn record(
        &self,
        scan: &ScanResult,
        target_dir: PathBuf,
        template: &str,
        result: &TransferResult,
    ) -> TransferRecord {
        let record = TransferRecord::from_run(scan, target_dir, template, result);
        match self.store.create(&record) {
            Ok(()) => tracing::debug!("Recorded transfer {}", record.id),
            Err(e) => tracing::warn!("Failed to record transfer history: {}", e),
        }
        record
    }

    pub fn list(&self) -> Result<Vec<TransferRecord>, HistoryError> {
        self.store.list()
    }

    pub fn delete(&self, id: &str) -> Result<bool, HistoryError> {
        self.store.delete(id)
    }

    pub fn clear(&self) -> Result<usize, HistoryError> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::InMemoryHistoryStore;
    use crate::core::transfer::TransferStatus;

    struct BrokenStore;

    impl HistoryStore for BrokenStore {
        fn create(&self, _: &TransferRecord) -> Result<(), HistoryError> {
            Err(HistoryError::QueryFailed("disk full".to_string()))
        }
        fn list(&self) -> Result<Vec<TransferRecord>, HistoryError> {
            Ok(Vec::new())
        }
        fn delete(&self, _: &str) -> Result<bool, HistoryError> {
            Ok(false)
        }
        fn clear(&self) -> Result<usize, HistoryError> {
            Ok(0)
        }
    }

    fn result() -> TransferResult {
        TransferResult {
            success_count: 1,
            skip_count: 0,
            error_count: 0,
            errors: Vec::new(),
            status: TransferStatus::Completed,
            bytes_transferred: 3,
            duration_ms: 5,
            files: Vec::new(),
        }
    }

    #[test]
    fn record_is_stored_and_listed() {
        let recorder = HistoryRecorder::new(Arc::new(InMemoryHistoryStore::new()));
        let scan = ScanResult::new(PathBuf::from("/card"), Vec::new());

        let record = recorder.record(&scan, PathBuf::from("/nas"), "{year}", &result());

        let listed = recorder.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, record.id);
        assert!(recorder.delete(&record.id).unwrap());
    }

    #[test]
    fn store_failure_is_not_fatal() {
        let recorder = HistoryRecorder::new(Arc::new(BrokenStore));
        let scan = ScanResult::new(PathBuf::from("/card"), Vec::new());

        let record = recorder.record(&scan, PathBuf::from("/nas"), "{year}", &result());
        assert_eq!(record.success_count, 1);
    }
}
