//! Integration tests for the transfer workflow.
//!
//! These tests verify end-to-end transfer behavior including:
//! - Folder layout and byte-exact copies
//! - Idempotent re-runs into the same library
//! - Duplicate handling, large files included
//! - Name collisions and per-folder rename counters
//! - Cancellation and history persistence

use assert_fs::prelude::*;
use chrono::NaiveDate;
use photo_porter::core::classify::ClassifyConfig;
use photo_porter::core::history::{HistoryStore, InMemoryHistoryStore, SqliteHistoryStore};
use photo_porter::core::metadata::{MetadataExtractor, PhotoMetadata};
use photo_porter::core::rename::RenameConfig;
use photo_porter::core::session::Session;
use photo_porter::core::transfer::{FileOutcome, TransferResult, TransferStatus};
use photo_porter::error::{MetadataError, PhotoPorterError, ScanError};
use photo_porter::events::{Event, EventChannel, SessionEvent, SessionState};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Photos named `YYYYMMDD_*` are dated from their name; others have no date
fn dated_by_name() -> Arc<dyn MetadataExtractor> {
    Arc::new(|path: &Path| -> Result<PhotoMetadata, MetadataError> {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        let date_time = name
            .get(..8)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y%m%d").ok())
            .and_then(|d| d.and_hms_opt(9, 30, 0));
        Ok(PhotoMetadata {
            date_time,
            camera: Some("X-T5".to_string()),
            make: Some("FUJIFILM".to_string()),
        })
    })
}

fn session() -> Session {
    Session::builder()
        .extractor(dated_by_name())
        .history_store(Arc::new(InMemoryHistoryStore::new()))
        .build()
}

/// Every file under `root`, relative and sorted
fn library(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

fn transfer(session: &Session, source: &Path, target: &Path, rename: RenameConfig) -> TransferResult {
    session.scan(source, ClassifyConfig::default()).unwrap();
    session
        .start_transfer(target.to_path_buf(), true, rename)
        .unwrap()
}

#[test]
fn photos_land_in_dated_folders_byte_for_byte() {
    let source = assert_fs::TempDir::new().unwrap();
    let target = assert_fs::TempDir::new().unwrap();
    source.child("20240315_a.jpg").write_binary(b"spring").unwrap();
    source.child("20231224_b.raf").write_binary(b"winter raw").unwrap();
    source.child("nodate.jpg").write_binary(b"???").unwrap();

    let result = transfer(&session(), source.path(), target.path(), RenameConfig::default());

    assert_eq!(result.status, TransferStatus::Completed);
    assert_eq!(result.success_count, 3);
    assert_eq!(result.bytes_transferred, 19);
    target
        .child("2024/03/20240315_a.jpg")
        .assert(predicate::path::is_file());
    target.child("2023/12/20231224_b.raf").assert("winter raw");
    target.child("Unknown/nodate.jpg").assert("???");

    // Sources are never touched
    source.child("20240315_a.jpg").assert("spring");
}

#[test]
fn second_run_into_the_same_library_copies_nothing() {
    let source = assert_fs::TempDir::new().unwrap();
    let target = assert_fs::TempDir::new().unwrap();
    for (name, bytes) in [("20240101_1.jpg", "one"), ("20240101_2.jpg", "two"), ("x.png", "three")] {
        source.child(name).write_str(bytes).unwrap();
    }

    let first = transfer(&session(), source.path(), target.path(), RenameConfig::default());
    let before = library(target.path());

    let second = transfer(&session(), source.path(), target.path(), RenameConfig::default());

    assert_eq!(first.success_count, 3);
    assert_eq!(second.success_count, 0);
    assert_eq!(second.skip_count, 3);
    assert_eq!(second.bytes_transferred, 0);
    assert_eq!(library(target.path()), before);
}

#[test]
fn renamed_rerun_is_still_idempotent() {
    let source = assert_fs::TempDir::new().unwrap();
    let target = assert_fs::TempDir::new().unwrap();
    source.child("20240101_1.jpg").write_str("one").unwrap();
    source.child("20240101_2.jpg").write_str("two").unwrap();
    let rename = RenameConfig {
        enabled: true,
        template: "{date}_{counter}".to_string(),
        counter_start: 1,
        counter_digits: 3,
    };

    transfer(&session(), source.path(), target.path(), rename.clone());
    let again = transfer(&session(), source.path(), target.path(), rename);

    assert_eq!(again.success_count, 0);
    assert_eq!(
        library(target.path()),
        vec!["2024/01/20240101_001.jpg", "2024/01/20240101_002.jpg"]
    );
}

#[test]
fn identical_files_in_the_source_are_copied_once() {
    let source = assert_fs::TempDir::new().unwrap();
    let target = assert_fs::TempDir::new().unwrap();
    // Past the memory-map threshold, with identical head and tail samples
    // in the near-miss so only the full hash can tell them apart
    let mut big = vec![7u8; 3 * 1024 * 1024];
    source.child("20240601_big.dng").write_binary(&big).unwrap();
    source.child("backup/20240601_big_copy.dng").write_binary(&big).unwrap();
    big[1024 * 1024] = 8;
    source.child("20240601_near.dng").write_binary(&big).unwrap();

    let session = session();
    let scan = session
        .scan(source.path(), ClassifyConfig::default())
        .unwrap();
    assert_eq!(scan.duplicate_count(), 1);

    let result = session
        .start_transfer(target.path().to_path_buf(), true, RenameConfig::default())
        .unwrap();

    assert_eq!(result.success_count, 2);
    assert_eq!(result.skip_count, 1);
    assert_eq!(
        library(target.path()),
        vec!["2024/06/20240601_big.dng", "2024/06/20240601_near.dng"]
    );
    assert_eq!(
        fs::read(target.child("2024/06/20240601_near.dng").path()).unwrap(),
        big
    );
}

#[test]
fn duplicates_are_copied_when_skipping_is_off() {
    let source = assert_fs::TempDir::new().unwrap();
    let target = assert_fs::TempDir::new().unwrap();
    source.child("a.jpg").write_str("same").unwrap();
    source.child("b.jpg").write_str("same").unwrap();
    // Already in the library under another name
    target.child("Unknown/old.jpg").write_str("same").unwrap();

    let session = session();
    session
        .scan(source.path(), ClassifyConfig::default())
        .unwrap();
    let result = session
        .start_transfer(target.path().to_path_buf(), false, RenameConfig::default())
        .unwrap();

    assert_eq!(result.success_count, 2);
    assert_eq!(
        library(target.path()),
        vec!["Unknown/a.jpg", "Unknown/b.jpg", "Unknown/old.jpg"]
    );
}

#[test]
fn content_already_in_the_library_is_skipped() {
    let source = assert_fs::TempDir::new().unwrap();
    let target = assert_fs::TempDir::new().unwrap();
    source.child("IMG_1.jpg").write_str("imported last week").unwrap();
    source.child("IMG_2.jpg").write_str("new").unwrap();
    target
        .child("Unknown/renamed_by_hand.jpg")
        .write_str("imported last week")
        .unwrap();

    let result = transfer(&session(), source.path(), target.path(), RenameConfig::default());

    assert_eq!(result.success_count, 1);
    assert_eq!(result.skip_count, 1);
    target.child("Unknown/IMG_1.jpg").assert(predicate::path::missing());
    target.child("Unknown/IMG_2.jpg").assert("new");
}

#[test]
fn different_content_under_the_same_name_gets_a_suffix() {
    let source = assert_fs::TempDir::new().unwrap();
    let target = assert_fs::TempDir::new().unwrap();
    source.child("IMG_0001.JPG").write_str("card two").unwrap();
    target.child("Unknown/IMG_0001.JPG").write_str("card one").unwrap();

    let result = transfer(&session(), source.path(), target.path(), RenameConfig::default());

    assert_eq!(result.success_count, 1);
    target.child("Unknown/IMG_0001.JPG").assert("card one");
    target.child("Unknown/IMG_0001_1.JPG").assert("card two");
}

#[test]
fn rename_counters_restart_in_every_folder() {
    let source = assert_fs::TempDir::new().unwrap();
    let target = assert_fs::TempDir::new().unwrap();
    for name in ["20240301_a.jpg", "20240302_b.jpg", "20240401_c.jpg", "20240303_d.jpg"] {
        source.child(name).write_str(name).unwrap();
    }
    let rename = RenameConfig {
        enabled: true,
        template: "{camera}_{counter}".to_string(),
        counter_start: 5,
        counter_digits: 2,
    };

    let result = transfer(&session(), source.path(), target.path(), rename);

    assert_eq!(result.success_count, 4);
    assert_eq!(
        library(target.path()),
        vec![
            "2024/03/X-T5_05.jpg",
            "2024/03/X-T5_06.jpg",
            "2024/03/X-T5_07.jpg",
            "2024/04/X-T5_05.jpg",
        ]
    );
    target.child("2024/03/X-T5_07.jpg").assert("20240303_d.jpg");
}

#[test]
fn cancelled_transfer_leaves_only_complete_files() {
    let source = assert_fs::TempDir::new().unwrap();
    let target = assert_fs::TempDir::new().unwrap();
    for i in 0..200 {
        source
            .child(format!("IMG_{:04}.JPG", i))
            .write_binary(&vec![i as u8; 4096 + i])
            .unwrap();
    }

    let session = session();
    session
        .scan(source.path(), ClassifyConfig::default())
        .unwrap();
    let handle = session
        .spawn_transfer(target.path().to_path_buf(), true, RenameConfig::default())
        .unwrap();
    session.cancel_transfer();
    let result = handle.join().unwrap();

    // The worker may have finished before the request arrived
    match result.status {
        TransferStatus::Cancelled => {
            assert!(result.processed() < 200);
            assert_eq!(session.state(), SessionState::Cancelled);
        }
        status => {
            assert_eq!(status, TransferStatus::Completed);
            assert_eq!(result.success_count, 200);
        }
    }

    let copied = library(target.path());
    assert_eq!(copied.len(), result.success_count);
    for name in &copied {
        let original = source.path().join(Path::new(name).file_name().unwrap());
        assert_eq!(
            fs::read(target.path().join(name)).unwrap(),
            fs::read(original).unwrap()
        );
    }
}

#[test]
fn unusable_target_fails_the_session() {
    let source = assert_fs::TempDir::new().unwrap();
    let target = assert_fs::TempDir::new().unwrap();
    source.child("a.jpg").write_str("a").unwrap();
    let not_a_dir = target.child("library");
    not_a_dir.write_str("I am a file").unwrap();

    let (sender, receiver) = EventChannel::new();
    let session = Session::builder()
        .extractor(dated_by_name())
        .events(sender)
        .build();
    session
        .scan(source.path(), ClassifyConfig::default())
        .unwrap();

    assert!(session
        .start_transfer(not_a_dir.path().to_path_buf(), true, RenameConfig::default())
        .is_err());
    assert_eq!(session.state(), SessionState::Failed);

    let errors: Vec<String> = receiver
        .try_iter()
        .filter_map(|e| match e {
            Event::Session(SessionEvent::Error { message }) => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(predicate::str::contains("library").eval(&errors[0]));
}

#[test]
fn history_survives_reopening_the_database() {
    let source = assert_fs::TempDir::new().unwrap();
    let target = assert_fs::TempDir::new().unwrap();
    let data = assert_fs::TempDir::new().unwrap();
    let db: PathBuf = data.child("nested/history.db").path().to_path_buf();
    source.child("20240101_a.jpg").write_str("a").unwrap();

    {
        let session = Session::builder()
            .extractor(dated_by_name())
            .history_store(Arc::new(SqliteHistoryStore::open(&db).unwrap()))
            .build();
        transfer(&session, source.path(), target.path(), RenameConfig::default());
        transfer(&session, source.path(), target.path(), RenameConfig::default());
    }

    let store = SqliteHistoryStore::open(&db).unwrap();
    let records = store.list().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].timestamp >= records[1].timestamp);
    assert_eq!(records[1].success_count, 1);
    assert_eq!(records[0].success_count, 0);
    assert_eq!(records[0].skip_count, 1);
    assert_eq!(records[0].source_dir, source.path());
    assert_eq!(records[1].files.len(), 1);
    assert_eq!(records[1].files[0].outcome, FileOutcome::Copied);
    assert!(matches!(
        records[0].files[0].outcome,
        FileOutcome::SkippedExisting | FileOutcome::SkippedDuplicate
    ));

    assert!(store.delete(&records[0].id).unwrap());
    assert_eq!(store.clear().unwrap(), 1);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn folder_rules_cannot_escape_the_library() {
    let root = assert_fs::TempDir::new().unwrap();
    root.child("card/a.jpg").write_str("no date").unwrap();
    let library = root.child("library");

    for classify in [
        ClassifyConfig {
            fallback_folder: "../escaped".to_string(),
            ..ClassifyConfig::default()
        },
        ClassifyConfig {
            template: "/{year}".to_string(),
            ..ClassifyConfig::default()
        },
    ] {
        let session = session();
        let err = session
            .scan(root.child("card").path(), classify)
            .unwrap_err();
        assert!(matches!(
            err,
            PhotoPorterError::Scan(ScanError::InvalidClassification(_))
        ));
        assert_eq!(session.state(), SessionState::Failed);
        assert!(session
            .start_transfer(library.path().to_path_buf(), true, RenameConfig::default())
            .is_err());
    }

    root.child("escaped").assert(predicate::path::missing());
    library.assert(predicate::path::missing());
}
