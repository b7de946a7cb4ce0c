//! # Transfer History Module
//!
//! Stores and retrieves past transfer runs.
//!
//! ## Features
//! - Persistent storage using SQLite
//! - In-memory store for tests and dry runs
//! - Newest first, capped at the most recent 100 runs
//! - Delete and clear operations

mod recorder;
mod repository;
mod store;
mod types;

pub use recorder::HistoryRecorder;
pub use repository::SqliteHistoryStore;
pub use store::{HistoryStore, InMemoryHistoryStore};
pub use types::{generate_id, TransferRecord, MAX_RECORDS};
