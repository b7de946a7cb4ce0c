//! # Session Module
//!
//! Owns the lifecycle of one scan-preview-transfer run.
//!
//! ## States
//! `Idle -> Scanning -> Previewing -> Transferring -> Completed | Cancelled | Failed`
//!
//! A session runs at most one scan or transfer at a time; starting another
//! while one is active fails with [`SessionError::Busy`]. The state lives
//! behind a mutex that is never held while files are being read or copied,
//! so [`Session::cancel_transfer`] and [`Session::state`] stay responsive.
//!
//! ## Example
//! ```rust,ignore
//! let session = Session::builder()
//!     .history_store(Arc::new(SqliteHistoryStore::open(&db)?))
//!     .events(sender)
//!     .build();
//!
//! let scan = session.scan(Path::new("/Volumes/CARD"), ClassifyConfig::default())?;
//! let result = session.start_transfer("/nas/photos".into(), true, RenameConfig::default())?;
//! ```

mod builder;
mod handle;

pub use builder::SessionBuilder;
pub use handle::RunHandle;

use crate::core::cancel::CancellationToken;
use crate::core::classify::{preview_classification, ClassificationPreview, ClassifyConfig};
use crate::core::history::{HistoryRecorder, TransferRecord};
use crate::core::metadata::MetadataExtractor;
use crate::core::rename::RenameConfig;
use crate::core::scanner::{ScanResult, WalkDirScanner};
use crate::core::transfer::{TransferOptions, TransferOrchestrator, TransferResult};
use crate::error::{Result, ScanError, SessionError};
use crate::events::{Event, EventSender, SessionEvent, SessionState};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle to a background transfer
pub type TransferHandle = RunHandle<TransferResult>;
/// Handle to a background scan
pub type ScanHandle = RunHandle<Arc<ScanResult>>;

struct RunState {
    state: SessionState,
    scan: Option<Arc<ScanResult>>,
    /// Classification used for the current scan
    classify: ClassifyConfig,
    cancel: Option<CancellationToken>,
}

struct SessionInner {
    scanner: WalkDirScanner,
    orchestrator: TransferOrchestrator,
    extractor: Arc<dyn MetadataExtractor>,
    recorder: HistoryRecorder,
    events: EventSender,
    run: Mutex<RunState>,
}

/// A photo transfer session. Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

/// A transfer that has claimed the session but not started copying
struct PreparedTransfer {
    scan: Arc<ScanResult>,
    template: String,
    options: TransferOptions,
    cancel: CancellationToken,
}

impl Session {
    /// Create a session builder
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn state(&self) -> SessionState {
        self.lock().map(|run| run.state).unwrap_or(SessionState::Failed)
    }

    /// The current scan result, if a scan has completed
    pub fn scan_result(&self) -> Option<Arc<ScanResult>> {
        self.lock().ok().and_then(|run| run.scan.clone())
    }

    /// Scan `source_dir` and keep the result for preview and transfer.
    pub fn scan(&self, source_dir: &Path, classify: ClassifyConfig) -> Result<Arc<ScanResult>> {
        let cancel = self.begin_scan(classify.clone())?;
        self.run_scan(source_dir, &classify, &cancel)
    }

    /// Scan on a background thread.
    pub fn spawn_scan(&self, source_dir: PathBuf, classify: ClassifyConfig) -> Result<ScanHandle> {
        let cancel = self.begin_scan(classify.clone())?;
        let session = self.clone();
        let token = cancel.clone();
        let thread = std::thread::Builder::new()
            .name("photo-porter-scan".to_string())
            .spawn(move || session.run_scan(&source_dir, &classify, &token))
            .map_err(|e| self.spawn_failed(e))?;
        Ok(RunHandle::new(thread, cancel, self.clone()))
    }

    /// Folder-by-folder preview of the current scan
    pub fn preview(&self) -> std::result::Result<Vec<ClassificationPreview>, SessionError> {
        let scan = self.scan_result().ok_or(SessionError::NotReady)?;
        Ok(preview_classification(&scan))
    }

    /// Copy the current scan into `target_dir`, blocking until done.
    ///
    /// Progress goes to the session's event sender.
    pub fn start_transfer(
        &self,
        target_dir: PathBuf,
        skip_duplicates: bool,
        rename: RenameConfig,
    ) -> Result<TransferResult> {
        let prepared = self.begin_transfer(target_dir, skip_duplicates, rename)?;
        self.run_transfer(prepared)
    }

    /// Transfer on a background thread.
    pub fn spawn_transfer(
        &self,
        target_dir: PathBuf,
        skip_duplicates: bool,
        rename: RenameConfig,
    ) -> Result<TransferHandle> {
        let prepared = self.begin_transfer(target_dir, skip_duplicates, rename)?;
        let cancel = prepared.cancel.clone();
        let session = self.clone();
        let thread = std::thread::Builder::new()
            .name("photo-porter-transfer".to_string())
            .spawn(move || session.run_transfer(prepared))
            .map_err(|e| self.spawn_failed(e))?;
        Ok(RunHandle::new(thread, cancel, self.clone()))
    }

    /// Request cancellation of the active scan or transfer.
    ///
    /// Does nothing when nothing is running.
    pub fn cancel_transfer(&self) {
        if let Ok(run) = self.lock() {
            if run.state.is_busy() {
                if let Some(cancel) = &run.cancel {
                    tracing::info!("Cancellation requested");
                    cancel.cancel();
                }
            }
        }
    }

    /// Drop the current scan and return to `Idle`.
    pub fn reset(&self) -> std::result::Result<(), SessionError> {
        {
            let mut run = self.lock()?;
            if run.state.is_busy() {
                return Err(SessionError::Busy);
            }
            run.state = SessionState::Idle;
            run.scan = None;
            run.cancel = None;
        }
        self.emit_state(SessionState::Idle);
        Ok(())
    }

    /// Past transfers, newest first
    pub fn history(&self) -> Result<Vec<TransferRecord>> {
        Ok(self.inner.recorder.list()?)
    }

    pub fn delete_history(&self, id: &str) -> Result<bool> {
        Ok(self.inner.recorder.delete(id)?)
    }

    pub fn clear_history(&self) -> Result<usize> {
        Ok(self.inner.recorder.clear()?)
    }

    fn begin_scan(&self, classify: ClassifyConfig) -> std::result::Result<CancellationToken, SessionError> {
        let cancel = CancellationToken::new();
        {
            let mut run = self.lock()?;
            if run.state.is_busy() {
                return Err(SessionError::Busy);
            }
            run.state = SessionState::Scanning;
            run.scan = None;
            run.classify = classify;
            run.cancel = Some(cancel.clone());
        }
        self.emit_state(SessionState::Scanning);
        Ok(cancel)
    }

    fn run_scan(
        &self,
        source_dir: &Path,
        classify: &ClassifyConfig,
        cancel: &CancellationToken,
    ) -> Result<Arc<ScanResult>> {
        let outcome = self.inner.scanner.scan_with_events(
            source_dir,
            classify,
            self.inner.extractor.as_ref(),
            &self.inner.events,
            cancel,
        );

        let (state, outcome) = match outcome {
            Ok(scan) => (SessionState::Previewing, Ok(Arc::new(scan))),
            Err(ScanError::Cancelled) => (SessionState::Cancelled, Err(ScanError::Cancelled)),
            Err(e) => (SessionState::Failed, Err(e)),
        };

        {
            let mut run = self.lock()?;
            run.state = state;
            run.cancel = None;
            run.scan = outcome.as_ref().ok().cloned();
        }

        if let Err(e) = &outcome {
            self.emit_error(e.to_string());
        }
        self.emit_state(state);
        Ok(outcome?)
    }

    fn begin_transfer(
        &self,
        target_dir: PathBuf,
        skip_duplicates: bool,
        rename: RenameConfig,
    ) -> std::result::Result<PreparedTransfer, SessionError> {
        let cancel = CancellationToken::new();
        let prepared = {
            let mut run = self.lock()?;
            if run.state.is_busy() {
                return Err(SessionError::Busy);
            }
            let scan = run.scan.clone().ok_or(SessionError::NotReady)?;
            run.state = SessionState::Transferring;
            run.cancel = Some(cancel.clone());

            PreparedTransfer {
                scan,
                template: run.classify.template.clone(),
                options: TransferOptions {
                    target_dir,
                    skip_duplicates,
                    rename,
                },
                cancel,
            }
        };
        self.emit_state(SessionState::Transferring);
        Ok(prepared)
    }

    fn run_transfer(&self, prepared: PreparedTransfer) -> Result<TransferResult> {
        let events = &self.inner.events;
        let outcome = self.inner.orchestrator.run(
            &prepared.scan,
            &prepared.options,
            &prepared.cancel,
            |progress| events.send(Event::Transfer(progress.clone())),
        );

        let state = match &outcome {
            Ok(result) => {
                self.inner.recorder.record(
                    &prepared.scan,
                    prepared.options.target_dir.clone(),
                    &prepared.template,
                    result,
                );
                if result.is_cancelled() {
                    SessionState::Cancelled
                } else {
                    SessionState::Completed
                }
            }
            Err(e) => {
                self.emit_error(e.to_string());
                SessionState::Failed
            }
        };

        {
            let mut run = self.lock()?;
            run.state = state;
            run.cancel = None;
        }
        self.emit_state(state);

        Ok(outcome?)
    }

    /// Release a session whose background worker never reported back
    fn mark_failed(&self, error: &SessionError) {
        if let Ok(mut run) = self.lock() {
            run.state = SessionState::Failed;
            run.cancel = None;
        }
        self.emit_error(error.to_string());
        self.emit_state(SessionState::Failed);
    }

    fn spawn_failed(&self, e: std::io::Error) -> SessionError {
        let error = SessionError::SpawnFailed(e.to_string());
        self.mark_failed(&error);
        error
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, RunState>, SessionError> {
        self.inner.run.lock().map_err(|_| SessionError::Poisoned)
    }

    fn emit_state(&self, state: SessionState) {
        tracing::debug!("Session state: {}", state);
        self.inner
            .events
            .send(Event::Session(SessionEvent::StateChanged { state }));
    }

    fn emit_error(&self, message: String) {
        tracing::error!("{}", message);
        self.inner
            .events
            .send(Event::Session(SessionEvent::Error { message }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::InMemoryHistoryStore;
    use crate::core::metadata::PhotoMetadata;
    use crate::core::transfer::TransferStatus;
    use crate::error::{MetadataError, PhotoPorterError};
    use crate::events::EventChannel;
    use std::fs;
    use tempfile::TempDir;

    fn no_metadata(_: &Path) -> std::result::Result<PhotoMetadata, MetadataError> {
        Ok(PhotoMetadata::default())
    }

    fn session() -> Session {
        Session::builder()
            .extractor(Arc::new(no_metadata))
            .history_store(Arc::new(InMemoryHistoryStore::new()))
            .build()
    }

    fn source_with(files: &[(&str, &[u8])]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, bytes) in files {
            fs::write(dir.path().join(name), bytes).unwrap();
        }
        dir
    }

    #[test]
    fn full_lifecycle() {
        let source = source_with(&[("a.jpg", b"a"), ("b.jpg", b"bb")]);
        let target = TempDir::new().unwrap();
        let session = session();
        assert_eq!(session.state(), SessionState::Idle);

        let scan = session.scan(source.path(), ClassifyConfig::default()).unwrap();
        assert_eq!(scan.total_files, 2);
        assert_eq!(session.state(), SessionState::Previewing);
        assert_eq!(session.preview().unwrap()[0].folder, "Unknown");

        let result = session
            .start_transfer(target.path().to_path_buf(), true, RenameConfig::default())
            .unwrap();
        assert_eq!(result.success_count, 2);
        assert_eq!(session.state(), SessionState::Completed);

        let history = session.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].template, "{year}/{month}");

        session.reset().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.scan_result().is_none());
    }

    #[test]
    fn transfer_without_scan_is_not_ready() {
        let target = TempDir::new().unwrap();
        let err = session()
            .start_transfer(target.path().to_path_buf(), true, RenameConfig::default())
            .unwrap_err();
        assert!(matches!(err, PhotoPorterError::Session(SessionError::NotReady)));
        assert_eq!(session().preview().unwrap_err(), SessionError::NotReady);
    }

    #[test]
    fn failed_scan_leaves_no_result() {
        let session = session();
        let err = session
            .scan(Path::new("/nonexistent/card"), ClassifyConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            PhotoPorterError::Scan(ScanError::DirectoryNotFound { .. })
        ));
        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.scan_result().is_none());
    }

    #[test]
    fn second_run_while_busy_is_rejected() {
        let source = source_with(&[("a.jpg", b"a")]);
        let session = session();
        session.scan(source.path(), ClassifyConfig::default()).unwrap();

        // Claim the session the way a background transfer does
        let target = TempDir::new().unwrap();
        let prepared = session
            .begin_transfer(target.path().to_path_buf(), true, RenameConfig::default())
            .unwrap();

        let err = session
            .scan(source.path(), ClassifyConfig::default())
            .unwrap_err();
        assert!(matches!(err, PhotoPorterError::Session(SessionError::Busy)));
        assert_eq!(session.reset().unwrap_err(), SessionError::Busy);

        session.run_transfer(prepared).unwrap();
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn cancel_before_first_file() {
        let source = source_with(&[("a.jpg", b"a"), ("b.jpg", b"bb")]);
        let target = TempDir::new().unwrap();
        let session = session();
        session.scan(source.path(), ClassifyConfig::default()).unwrap();

        let prepared = session
            .begin_transfer(target.path().to_path_buf(), true, RenameConfig::default())
            .unwrap();
        session.cancel_transfer();
        let result = session.run_transfer(prepared).unwrap();

        assert_eq!(result.status, TransferStatus::Cancelled);
        assert_eq!(result.success_count, 0);
        assert_eq!(session.state(), SessionState::Cancelled);
        assert_eq!(session.history().unwrap()[0].status, TransferStatus::Cancelled);
    }

    #[test]
    fn cancel_when_idle_is_a_no_op() {
        let session = session();
        session.cancel_transfer();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn spawned_transfer_reports_progress() {
        let source = source_with(&[("a.jpg", b"a"), ("b.jpg", b"bb"), ("c.jpg", b"ccc")]);
        let target = TempDir::new().unwrap();
        let (sender, receiver) = EventChannel::new();
        let session = Session::builder()
            .extractor(Arc::new(no_metadata))
            .history_store(Arc::new(InMemoryHistoryStore::new()))
            .events(sender)
            .build();

        session.scan(source.path(), ClassifyConfig::default()).unwrap();
        let handle = session
            .spawn_transfer(target.path().to_path_buf(), true, RenameConfig::default())
            .unwrap();
        let result = handle.join().unwrap();
        assert_eq!(result.success_count, 3);

        let finals: Vec<_> = receiver
            .try_iter()
            .filter_map(|e| match e {
                Event::Transfer(p) if p.status.is_terminal() => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].current, 3);
    }

    #[test]
    fn spawned_scan_can_be_joined() {
        let source = source_with(&[("a.jpg", b"a")]);
        let session = session();

        let handle = session
            .spawn_scan(source.path().to_path_buf(), ClassifyConfig::default())
            .unwrap();
        let scan = handle.join().unwrap();

        assert_eq!(scan.total_files, 1);
        assert_eq!(session.state(), SessionState::Previewing);
    }
}
