//! SQLite-backed transfer history.

use super::store::HistoryStore;
use super::types::{TransferRecord, MAX_RECORDS};
use crate::core::transfer::{FileOutcome, TransferStatus, TransferredFile};
use crate::error::HistoryError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SELECT_COLUMNS: &str = "SELECT id, timestamp, source_dir, target_dir, template, total_files,
        success_count, skip_count, error_count, total_size, duration_ms, status
 FROM transfer_history";

const SELECT_FILES: &str = "SELECT source, destination, size, outcome, message
 FROM transfer_files WHERE record_id = ? ORDER BY seq";

/// History persisted in a SQLite database
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Open or create the history database
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        let open_failed = |reason: String| HistoryError::OpenFailed {
            path: path.to_path_buf(),
            reason,
        };

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| open_failed(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| open_failed(e.to_string()))?;

        // Enable WAL mode
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| open_failed(e.to_string()))?;

        Self::with_connection(conn)
    }

    /// A database that lives only as long as the store
    pub fn open_in_memory() -> Result<Self, HistoryError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS transfer_history (
                id TEXT PRIMARY KEY,
                timestamp INTEGER NOT NULL,
                source_dir TEXT NOT NULL,
                target_dir TEXT NOT NULL,
                template TEXT NOT NULL,
                total_files INTEGER NOT NULL,
                success_count INTEGER NOT NULL,
                skip_count INTEGER NOT NULL,
                error_count INTEGER NOT NULL,
                total_size INTEGER NOT NULL,
                duration_ms INTEGER NOT NULL,
                status TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transfer_history_time
             ON transfer_history(timestamp DESC)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS transfer_files (
                record_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                source TEXT NOT NULL,
                destination TEXT,
                size INTEGER NOT NULL,
                outcome TEXT NOT NULL,
                message TEXT,
                PRIMARY KEY (record_id, seq)
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, HistoryError> {
        self.conn.lock().map_err(|_| HistoryError::Poisoned)
    }

    /// Get a specific record by ID
    pub fn get(&self, id: &str) -> Result<Option<TransferRecord>, HistoryError> {
        let conn = self.lock()?;
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);

        match conn.query_row(&sql, [id], record_from_row) {
            Ok(mut record) => {
                record.files = load_files(&conn, &record.id)?;
                Ok(Some(record))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn create(&self, record: &TransferRecord) -> Result<(), HistoryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO transfer_history
             (id, timestamp, source_dir, target_dir, template, total_files, success_count,
              skip_count, error_count, total_size, duration_ms, status)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.id,
                record.timestamp.timestamp_millis(),
                record.source_dir.to_string_lossy(),
                record.target_dir.to_string_lossy(),
                record.template,
                record.total_files as i64,
                record.success_count as i64,
                record.skip_count as i64,
                record.error_count as i64,
                record.total_size as i64,
                record.duration_ms as i64,
                record.status.as_str(),
            ],
        )?;

        tx.execute("DELETE FROM transfer_files WHERE record_id = ?", [&record.id])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO transfer_files
                 (record_id, seq, source, destination, size, outcome, message)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )?;
            for (seq, file) in record.files.iter().enumerate() {
                insert.execute(params![
                    record.id,
                    seq as i64,
                    file.source.to_string_lossy(),
                    file.destination.as_ref().map(|d| d.to_string_lossy()),
                    file.size as i64,
                    file.outcome.kind(),
                    file.outcome.message(),
                ])?;
            }
        }

        // Retention: keep only the newest records
        tx.execute(
            "DELETE FROM transfer_history WHERE id NOT IN (
                SELECT id FROM transfer_history
                ORDER BY timestamp DESC, rowid DESC LIMIT ?
             )",
            [MAX_RECORDS as i64],
        )?;
        delete_orphan_files(&tx)?;

        tx.commit()?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<TransferRecord>, HistoryError> {
        let conn = self.lock()?;
        let sql = format!("{} ORDER BY timestamp DESC, rowid DESC", SELECT_COLUMNS);

        let mut stmt = conn.prepare(&sql)?;
        let mut records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for record in &mut records {
            record.files = load_files(&conn, &record.id)?;
        }
        Ok(records)
    }

    fn delete(&self, id: &str) -> Result<bool, HistoryError> {
        let conn = self.lock()?;
        let rows_affected = conn.execute("DELETE FROM transfer_history WHERE id = ?", [id])?;
        conn.execute("DELETE FROM transfer_files WHERE record_id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    fn clear(&self) -> Result<usize, HistoryError> {
        let conn = self.lock()?;
        let rows_affected = conn.execute("DELETE FROM transfer_history", [])?;
        conn.execute("DELETE FROM transfer_files", [])?;
        Ok(rows_affected)
    }
}

fn load_files(conn: &Connection, record_id: &str) -> Result<Vec<TransferredFile>, HistoryError> {
    let mut stmt = conn.prepare_cached(SELECT_FILES)?;
    let files = stmt
        .query_map([record_id], file_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(files)
}

/// Drop file rows whose record is gone
fn delete_orphan_files(conn: &Connection) -> Result<usize, HistoryError> {
    let removed = conn.execute(
        "DELETE FROM transfer_files WHERE record_id NOT IN (SELECT id FROM transfer_history)",
        [],
    )?;
    Ok(removed)
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<TransferredFile> {
    let source: String = row.get(0)?;
    let destination: Option<String> = row.get(1)?;
    let size: i64 = row.get(2)?;
    let outcome: String = row.get(3)?;
    let message: Option<String> = row.get(4)?;

    Ok(TransferredFile {
        source: PathBuf::from(source),
        destination: destination.map(PathBuf::from),
        size: size as u64,
        outcome: FileOutcome::from_parts(&outcome, message),
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<TransferRecord> {
    let timestamp_ms: i64 = row.get(1)?;
    let source_dir: String = row.get(2)?;
    let target_dir: String = row.get(3)?;
    let total_files: i64 = row.get(5)?;
    let success_count: i64 = row.get(6)?;
    let skip_count: i64 = row.get(7)?;
    let error_count: i64 = row.get(8)?;
    let total_size: i64 = row.get(9)?;
    let duration_ms: i64 = row.get(10)?;
    let status: String = row.get(11)?;

    Ok(TransferRecord {
        id: row.get(0)?,
        timestamp: DateTime::<Utc>::from_timestamp_millis(timestamp_ms).unwrap_or_default(),
        source_dir: PathBuf::from(source_dir),
        target_dir: PathBuf::from(target_dir),
        template: row.get(4)?,
        total_files: total_files as usize,
        success_count: success_count as usize,
        skip_count: skip_count as usize,
        error_count: error_count as usize,
        total_size: total_size as u64,
        duration_ms: duration_ms as u64,
        status: match status.as_str() {
            "cancelled" => TransferStatus::Cancelled,
            _ => TransferStatus::Completed,
        },
        files: Vec::new(),
    })
}
