use super::{RunState, Session, SessionInner};
use crate::core::classify::ClassifyConfig;
use crate::core::dedup::HashConfig;
use crate::core::history::{HistoryRecorder, HistoryStore, InMemoryHistoryStore};
use crate::core::metadata::{ExifMetadataExtractor, MetadataExtractor};
use crate::core::scanner::{ScanConfig, WalkDirScanner};
use crate::core::transfer::TransferOrchestrator;
use crate::events::{null_sender, EventSender, SessionState};
use std::sync::{Arc, Mutex};

/// Builder for session configuration
#[derive(Default)]
pub struct SessionBuilder {
    scan_config: ScanConfig,
    hash_config: HashConfig,
    extractor: Option<Arc<dyn MetadataExtractor>>,
    history: Option<Arc<dyn HistoryStore>>,
    events: Option<EventSender>,
}

impl SessionBuilder {
    /// Create a new session builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.scan_config = config;
        self
    }

    /// Set hashing configuration
    pub fn hash_config(mut self, config: HashConfig) -> Self {
        self.hash_config = config;
        self
    }

    /// Set the metadata source (default: EXIF)
    pub fn extractor(mut self, extractor: Arc<dyn MetadataExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Set the history store (default: in memory)
    pub fn history_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    /// Send progress events to `events`
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the session
    pub fn build(self) -> Session {
        let scanner = WalkDirScanner::with_hash_config(self.scan_config, self.hash_config);
        let orchestrator = TransferOrchestrator::new(scanner.filter().clone());
        let store = self
            .history
            .unwrap_or_else(|| Arc::new(InMemoryHistoryStore::new()));

        Session {
            inner: Arc::new(SessionInner {
                scanner,
                orchestrator,
                extractor: self
                    .extractor
                    .unwrap_or_else(|| Arc::new(ExifMetadataExtractor)),
                recorder: HistoryRecorder::new(store),
                events: self.events.unwrap_or_else(null_sender),
                run: Mutex::new(RunState {
                    state: SessionState::Idle,
                    scan: None,
                    classify: ClassifyConfig::default(),
                    cancel: None,
                }),
            }),
        }
    }
}
