//! Unit tests for the AuthorizationManager public API.
//!
//! Every test drives the manager through `AuthorizationManagerTrait` over an
//! in-memory database and an `InMemoryFileSystem`. A clone of the file system
//! stays with the test to steer pickers and permissions.

use std::sync::Arc;

use bookmark_tool::database::Database;
use bookmark_tool::managers::authorization_manager::{
    AuthorizationManager, AuthorizationManagerTrait, AUTH_STATE_KEY, HANDLE_KEY,
};
use bookmark_tool::services::file_access::InMemoryFileSystem;
use bookmark_tool::services::handle_store::HandleStore;
use bookmark_tool::services::local_mirror::LocalMirror;
use bookmark_tool::types::bookmark::Folder;
use bookmark_tool::types::errors::{PermissionError, StoreError};
use bookmark_tool::types::file_access::{AuthorizationStatus, PermissionState};
use bookmark_tool::types::storage::StorageData;

const DATA_KEY: &str = "bookmark-tool-data";
const FILE: &str = "bookmarks.json";

fn setup() -> (Arc<Database>, InMemoryFileSystem, AuthorizationManager<InMemoryFileSystem>) {
    let db = Arc::new(Database::open_in_memory().expect("Failed to open in-memory database"));
    let fs = InMemoryFileSystem::new();
    let manager = AuthorizationManager::new(fs.clone(), db.clone(), DATA_KEY, FILE);
    (db, fs, manager)
}

async fn authorized() -> (Arc<Database>, InMemoryFileSystem, AuthorizationManager<InMemoryFileSystem>) {
    let (db, fs, mut manager) = setup();
    fs.set_next_pick(Some(FILE));
    manager.request_authorization().await.expect("authorization should succeed");
    (db, fs, manager)
}

fn sample() -> StorageData {
    StorageData::new(
        vec![],
        vec![Folder {
            id: "f1".to_string(),
            title: "Work".to_string(),
            parent_id: None,
            path: vec![],
        }],
    )
}

// ─── Request ───

#[tokio::test]
async fn test_request_persists_handle_and_flag() {
    let (db, _fs, mut manager) = authorized().await;

    assert!(manager.is_authorized().await);
    let stored = HandleStore::new(db.clone()).load(HANDLE_KEY).unwrap();
    assert_eq!(stored.as_deref(), Some(FILE));
    let flag = LocalMirror::new(db, DATA_KEY).get_item(AUTH_STATE_KEY).unwrap();
    assert_eq!(flag.as_deref(), Some("true"));
}

#[tokio::test]
async fn test_request_cancelled_picker_leaves_nothing_behind() {
    let (db, _fs, mut manager) = setup();
    let err = manager.request_authorization().await.unwrap_err();
    assert_eq!(err, PermissionError::PickerCancelled);
    assert!(!manager.is_authorized().await);
    assert_eq!(HandleStore::new(db).load(HANDLE_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_unsupported_environment() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let mut manager = AuthorizationManager::new(InMemoryFileSystem::unsupported(), db, DATA_KEY, FILE);

    assert!(!manager.is_supported());
    assert_eq!(manager.request_authorization().await, Err(PermissionError::Unsupported));
    assert_eq!(
        manager.status().await,
        AuthorizationStatus { supported: false, authorized: false }
    );
}

#[tokio::test]
async fn test_failed_handle_save_rolls_back() {
    let (db, fs, mut manager) = setup();
    db.connection().execute_batch("DROP TABLE file_handles;").unwrap();
    fs.set_next_pick(Some(FILE));

    let err = manager.request_authorization().await.unwrap_err();
    assert!(matches!(err, PermissionError::HandleStore(_)));
    assert!(!manager.is_authorized().await);
    let flag = LocalMirror::new(db, DATA_KEY).get_item(AUTH_STATE_KEY).unwrap();
    assert_eq!(flag, None);
}

// ─── Passive check and restore ───

#[tokio::test]
async fn test_passive_check_never_prompts() {
    let (_db, fs, mut manager) = authorized().await;
    fs.set_permission(FILE, PermissionState::Prompt);
    fs.set_prompt_response(PermissionState::Granted);

    assert!(!manager.is_authorized().await);
    // still lapsed: the passive check did not resolve the prompt
    assert!(!manager.is_authorized().await);

    manager.restore_authorization().await.expect("restore should prompt and succeed");
    assert!(manager.is_authorized().await);
}

#[tokio::test]
async fn test_restore_with_dismissed_prompt_fails() {
    let (_db, fs, mut manager) = authorized().await;
    fs.set_permission(FILE, PermissionState::Prompt);
    fs.set_prompt_response(PermissionState::Prompt);

    let err = manager.restore_authorization().await.unwrap_err();
    assert!(matches!(err, PermissionError::Denied(_)));
    assert!(!manager.is_authorized().await);
}

#[tokio::test]
async fn test_restore_without_stored_handle_is_not_authorized() {
    let (_db, _fs, mut manager) = setup();
    assert_eq!(manager.restore_authorization().await, Err(PermissionError::NotAuthorized));
}

#[tokio::test]
async fn test_grant_survives_a_new_session() {
    let (db, fs, _first) = authorized().await;
    let mut second = AuthorizationManager::new(fs.clone(), db, DATA_KEY, FILE);
    assert!(second.is_authorized().await, "stored handle should be revived");
}

// ─── Read / write ───

#[tokio::test]
async fn test_write_then_read_roundtrip() {
    let (_db, fs, mut manager) = authorized().await;
    assert_eq!(manager.read_data().await.unwrap(), None, "fresh file reads as empty");

    manager.write_data(&sample()).await.unwrap();
    assert!(fs.contents(FILE).unwrap().contains("\"Work\""));
    assert_eq!(manager.read_data().await.unwrap(), Some(sample()));
}

#[tokio::test]
async fn test_revoked_handle_fails_with_permission_error() {
    let (_db, fs, mut manager) = authorized().await;
    fs.revoke(FILE);

    let err = manager.write_data(&sample()).await.unwrap_err();
    assert!(err.is_permission());
    let err = manager.read_data().await.unwrap_err();
    assert!(matches!(err, StoreError::Permission(PermissionError::Revoked(_))));
}

#[tokio::test]
async fn test_failed_write_is_storage_error() {
    let (_db, fs, mut manager) = authorized().await;
    fs.set_fail_writes(FILE, true);
    let err = manager.write_data(&sample()).await.unwrap_err();
    assert!(matches!(err, StoreError::Storage(_)));
}

#[tokio::test]
async fn test_corrupt_file_is_parse_error() {
    let (_db, fs, mut manager) = authorized().await;
    fs.insert_file(FILE, "{ not json");
    assert!(matches!(manager.read_data().await, Err(StoreError::Parse(_))));
}

// ─── Release ───

#[tokio::test]
async fn test_release_forgets_grant() {
    let (db, _fs, mut manager) = authorized().await;
    manager.release().unwrap();
    assert!(!manager.is_authorized().await);
    assert_eq!(HandleStore::new(db).load(HANDLE_KEY).unwrap(), None);
    assert!(matches!(
        manager.write_data(&sample()).await,
        Err(StoreError::Permission(PermissionError::NotAuthorized))
    ));
}

// ─── One-off import / export ───

#[tokio::test]
async fn test_import_and_export_use_picked_files() {
    let (_db, fs, manager) = setup();
    fs.insert_file("old.json", r#"{"bookmarks":[{"url":"https://a.com"}]}"#);
    fs.set_next_pick(Some("old.json"));
    let data = manager.import_from_file().await.unwrap();
    assert_eq!(data.bookmarks.len(), 1);

    fs.set_next_pick(Some("export.json"));
    manager.export_to_file(&sample()).await.unwrap();
    assert!(fs.contents("export.json").unwrap().contains("\"Work\""));
}

#[tokio::test]
async fn test_import_from_missing_file_is_permission_error() {
    let (_db, fs, manager) = setup();
    fs.set_next_pick(Some("missing.json"));
    let err = manager.import_from_file().await.unwrap_err();
    assert!(err.is_permission());
}
