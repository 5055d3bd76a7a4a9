//! Unit tests for the BookmarkStore public API.
//!
//! These tests exercise loading, CRUD, import and write-through behaviour
//! over an in-memory database and an `InMemoryFileSystem`.

use std::sync::Arc;

use bookmark_tool::database::Database;
use bookmark_tool::managers::authorization_manager::{AuthorizationManager, AUTH_STATE_KEY, HANDLE_KEY};
use bookmark_tool::managers::bookmark_store::BookmarkStore;
use bookmark_tool::services::file_access::InMemoryFileSystem;
use bookmark_tool::services::handle_store::HandleStore;
use bookmark_tool::services::local_mirror::LocalMirror;
use bookmark_tool::types::bookmark::{Bookmark, BookmarkDraft, BookmarkPatch, FolderDraft, FolderPatch};
use bookmark_tool::types::errors::StoreError;
use bookmark_tool::types::storage::{ImportOutcome, LoadSource, LoadState, PersistReport, StorageData};

const DATA_KEY: &str = "bookmark-tool-data";
const FILE: &str = "bookmarks.json";

fn store(db: &Arc<Database>, fs: &InMemoryFileSystem) -> BookmarkStore<InMemoryFileSystem> {
    let mirror = LocalMirror::new(db.clone(), DATA_KEY);
    let auth = AuthorizationManager::new(fs.clone(), db.clone(), DATA_KEY, FILE);
    BookmarkStore::new(mirror, auth)
}

fn setup() -> (Arc<Database>, InMemoryFileSystem) {
    let db = Arc::new(Database::open_in_memory().expect("Failed to open in-memory database"));
    (db, InMemoryFileSystem::new())
}

/// Simulates a grant made in an earlier session.
fn grant_file(db: &Arc<Database>, fs: &InMemoryFileSystem, contents: &str) {
    fs.insert_file(FILE, contents);
    HandleStore::new(db.clone()).save(HANDLE_KEY, FILE).unwrap();
    LocalMirror::new(db.clone(), DATA_KEY).set_item(AUTH_STATE_KEY, "true").unwrap();
}

fn mirrored(db: &Arc<Database>) -> Option<StorageData> {
    LocalMirror::new(db.clone(), DATA_KEY).load_data().unwrap()
}

fn snapshot_with(url: &str) -> StorageData {
    StorageData::new(
        vec![Bookmark {
            id: format!("id-{}", url),
            title: url.to_string(),
            url: url.to_string(),
            icon: "A".to_string(),
            color: "#FF6B6B".to_string(),
            parent_id: None,
            path: vec![],
            is_pinned: false,
            created_at: 1,
        }],
        vec![],
    )
}

fn draft(title: &str, url: &str) -> BookmarkDraft {
    BookmarkDraft {
        title: title.to_string(),
        url: url.to_string(),
        ..Default::default()
    }
}

fn folder_draft(title: &str, parent: Option<&str>) -> FolderDraft {
    FolderDraft {
        title: title.to_string(),
        parent_id: parent.map(str::to_string),
    }
}

async fn loaded() -> (Arc<Database>, InMemoryFileSystem, BookmarkStore<InMemoryFileSystem>) {
    let (db, fs) = setup();
    let mut store = store(&db, &fs);
    store.load().await;
    (db, fs, store)
}

// ─── Loading ───

#[tokio::test]
async fn test_load_empty_is_default() {
    let (db, fs) = setup();
    let mut store = store(&db, &fs);
    assert_eq!(store.load_state(), LoadState::Uninitialized);
    assert_eq!(store.load().await, LoadSource::Default);
    assert_eq!(store.load_state(), LoadState::Loaded(LoadSource::Default));
    assert!(store.bookmarks().is_empty());
}

#[tokio::test]
async fn test_load_prefers_authorized_file_over_mirror() {
    let (db, fs) = setup();
    let file_data = snapshot_with("https://file.example");
    grant_file(&db, &fs, &serde_json::to_string(&file_data).unwrap());
    LocalMirror::new(db.clone(), DATA_KEY)
        .save_data(&snapshot_with("https://mirror.example"))
        .unwrap();

    let mut store = store(&db, &fs);
    assert_eq!(store.load().await, LoadSource::File);
    assert_eq!(store.bookmarks(), file_data.bookmarks.as_slice());
    assert!(store.file_storage_enabled());
    assert_eq!(mirrored(&db), Some(file_data), "file data should overwrite the mirror");
}

#[tokio::test]
async fn test_load_empty_file_falls_back_to_mirror() {
    let (db, fs) = setup();
    grant_file(&db, &fs, "");
    let mirror_data = snapshot_with("https://mirror.example");
    LocalMirror::new(db.clone(), DATA_KEY).save_data(&mirror_data).unwrap();

    let mut store = store(&db, &fs);
    assert_eq!(store.load().await, LoadSource::LocalStorage);
    assert_eq!(store.snapshot(), mirror_data);
    assert!(store.file_storage_enabled(), "an empty file is still a usable backing file");
}

#[tokio::test]
async fn test_load_with_revoked_file_uses_mirror_only() {
    let (db, fs) = setup();
    grant_file(&db, &fs, &serde_json::to_string(&snapshot_with("https://file.example")).unwrap());
    fs.revoke(FILE);
    LocalMirror::new(db.clone(), DATA_KEY)
        .save_data(&snapshot_with("https://mirror.example"))
        .unwrap();

    let mut store = store(&db, &fs);
    assert_eq!(store.load().await, LoadSource::LocalStorage);
    assert!(!store.file_storage_enabled());
}

#[tokio::test]
async fn test_corrupt_mirror_starts_empty() {
    let (db, fs) = setup();
    LocalMirror::new(db.clone(), DATA_KEY).set_item(DATA_KEY, "{ nope").unwrap();
    let mut store = store(&db, &fs);
    assert_eq!(store.load().await, LoadSource::Default);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_load_is_idempotent() {
    let (db, fs) = setup();
    let mut store = store(&db, &fs);
    assert_eq!(store.load().await, LoadSource::Default);

    LocalMirror::new(db.clone(), DATA_KEY)
        .save_data(&snapshot_with("https://late.example"))
        .unwrap();
    assert_eq!(store.load().await, LoadSource::Default);
    assert!(store.bookmarks().is_empty());
}

#[tokio::test]
async fn test_nothing_is_written_before_load() {
    let (db, fs) = setup();
    let stored = snapshot_with("https://stored.example");
    LocalMirror::new(db.clone(), DATA_KEY).save_data(&stored).unwrap();

    let mut store = store(&db, &fs);
    assert_eq!(store.persist().await, PersistReport::default());
    store.add_bookmark(draft("Early", "https://early.example")).await.unwrap();
    assert_eq!(mirrored(&db), Some(stored.clone()), "pre-load state must not clobber the mirror");

    assert_eq!(store.load().await, LoadSource::LocalStorage);
    assert_eq!(store.snapshot(), stored);
}

#[tokio::test]
async fn test_backup_before_load_leaves_file_untouched() {
    let (db, fs) = setup();
    let file_json = serde_json::to_string(&snapshot_with("https://file.example")).unwrap();
    grant_file(&db, &fs, &file_json);

    let mut store = store(&db, &fs);
    assert!(!store.backup_data().await);
    assert_eq!(fs.contents(FILE).as_deref(), Some(file_json.as_str()));

    assert_eq!(store.load().await, LoadSource::File);
    assert_eq!(store.bookmarks()[0].url, "https://file.example");
}

#[tokio::test]
async fn test_import_before_load_merges_into_loaded_state() {
    let (db, fs) = setup();
    LocalMirror::new(db.clone(), DATA_KEY)
        .save_data(&snapshot_with("https://stored.example"))
        .unwrap();

    let mut store = store(&db, &fs);
    let outcome = store.import_bookmarks(snapshot_with("https://new.example")).await;
    assert_eq!(outcome, ImportOutcome::Imported { folders: 0, bookmarks: 1 });
    assert_eq!(store.load_state(), LoadState::Loaded(LoadSource::LocalStorage));

    let urls: Vec<&str> = store.bookmarks().iter().map(|b| b.url.as_str()).collect();
    assert!(urls.contains(&"https://stored.example"));
    assert!(urls.contains(&"https://new.example"));
    assert_eq!(mirrored(&db), Some(store.snapshot()));
}

#[tokio::test]
async fn test_import_from_file_before_load_survives() {
    let (db, fs) = setup();
    fs.insert_file("restore.json", &serde_json::to_string(&snapshot_with("https://new.example")).unwrap());
    fs.set_next_pick(Some("restore.json"));

    let mut store = store(&db, &fs);
    store.import_from_file().await.unwrap();
    assert!(store.is_loaded());
    assert_eq!(store.load().await, LoadSource::Default);
    assert_eq!(store.bookmarks()[0].url, "https://new.example");
    assert_eq!(mirrored(&db), Some(store.snapshot()));
}

// ─── Bookmarks ───

#[tokio::test]
async fn test_add_bookmark_prepends_and_persists() {
    let (db, _fs, mut store) = loaded().await;
    store.add_bookmark(draft("First", "https://first.example")).await.unwrap();
    let second = store.add_bookmark(draft("Second", "https://second.example")).await.unwrap();

    assert_eq!(store.bookmarks()[0].id, second.id);
    assert_eq!(second.icon, "S");
    assert!(second.created_at > 0);
    assert_eq!(mirrored(&db).unwrap().bookmarks.len(), 2);
}

#[tokio::test]
async fn test_add_bookmark_with_empty_title_is_rejected_without_mutation() {
    let (db, _fs, mut store) = loaded().await;
    let err = store.add_bookmark(draft("   ", "https://a.example")).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(store.bookmarks().is_empty());
    assert_eq!(mirrored(&db), None);
}

#[tokio::test]
async fn test_add_bookmark_into_unknown_folder_is_rejected() {
    let (_db, _fs, mut store) = loaded().await;
    let mut d = draft("A", "https://a.example");
    d.parent_id = Some("missing".to_string());
    assert!(matches!(store.add_bookmark(d).await, Err(StoreError::Validation(_))));
}

#[tokio::test]
async fn test_add_bookmark_into_folder_carries_path() {
    let (_db, _fs, mut store) = loaded().await;
    let work = store.add_folder(folder_draft("Work", None)).await.unwrap();
    let tools = store.add_folder(folder_draft("Tools", Some(&work.id))).await.unwrap();
    let mut d = draft("Docs", "https://docs.rs");
    d.parent_id = Some(tools.id.clone());
    let bookmark = store.add_bookmark(d).await.unwrap();
    assert_eq!(bookmark.path, vec!["Work".to_string(), "Tools".to_string()]);
}

#[tokio::test]
async fn test_update_bookmark_patches_fields() {
    let (_db, _fs, mut store) = loaded().await;
    let folder = store.add_folder(folder_draft("Work", None)).await.unwrap();
    let mut d = draft("Old", "https://a.example");
    d.parent_id = Some(folder.id.clone());
    let bookmark = store.add_bookmark(d).await.unwrap();

    let patch = BookmarkPatch {
        title: Some("New".to_string()),
        parent_id: Some(None),
        ..Default::default()
    };
    let updated = store.update_bookmark(&bookmark.id, patch).await.unwrap().unwrap();
    assert_eq!(updated.title, "New");
    assert_eq!(updated.url, "https://a.example");
    assert_eq!(updated.parent_id, None);
    assert!(updated.path.is_empty());
}

#[tokio::test]
async fn test_update_bookmark_rejects_bad_url_and_unknown_id() {
    let (_db, _fs, mut store) = loaded().await;
    let bookmark = store.add_bookmark(draft("A", "https://a.example")).await.unwrap();

    let patch = BookmarkPatch { url: Some("not a url".to_string()), ..Default::default() };
    assert!(store.update_bookmark(&bookmark.id, patch).await.is_err());
    assert_eq!(store.get_bookmark(&bookmark.id).unwrap().url, "https://a.example");

    assert_eq!(store.update_bookmark("missing", BookmarkPatch::default()).await, Ok(None));
}

#[tokio::test]
async fn test_delete_and_toggle_pin() {
    let (_db, _fs, mut store) = loaded().await;
    let bookmark = store.add_bookmark(draft("A", "https://a.example")).await.unwrap();

    assert_eq!(store.toggle_pin_bookmark(&bookmark.id).await, Some(true));
    assert_eq!(store.pinned_bookmarks().len(), 1);
    assert_eq!(store.toggle_pin_bookmark(&bookmark.id).await, Some(false));
    assert!(store.pinned_bookmarks().is_empty());
    assert_eq!(store.toggle_pin_bookmark("missing").await, None);

    assert!(store.delete_bookmark(&bookmark.id).await);
    assert!(!store.delete_bookmark(&bookmark.id).await);
}

#[tokio::test]
async fn test_reorder_bookmarks() {
    let (_db, _fs, mut store) = loaded().await;
    let a = store.add_bookmark(draft("A", "https://a.example")).await.unwrap();
    let b = store.add_bookmark(draft("B", "https://b.example")).await.unwrap();
    let c = store.add_bookmark(draft("C", "https://c.example")).await.unwrap();

    store.reorder_bookmarks(&[a.id.clone(), "ghost".to_string(), b.id.clone()]).await;
    let order: Vec<&str> = store.bookmarks().iter().map(|b| b.id.as_str()).collect();
    assert_eq!(order, vec![a.id.as_str(), b.id.as_str(), c.id.as_str()]);
}

#[tokio::test]
async fn test_search_is_case_insensitive_on_title_and_url() {
    let (_db, _fs, mut store) = loaded().await;
    store.add_bookmark(draft("Rust Language", "https://rust-lang.org")).await.unwrap();
    store.add_bookmark(draft("Docs", "https://DOCS.rs")).await.unwrap();

    assert_eq!(store.search_bookmarks("rust").len(), 1);
    assert_eq!(store.search_bookmarks("docs.RS").len(), 1);
    assert!(store.search_bookmarks("  ").is_empty());
}

// ─── Folders ───

#[tokio::test]
async fn test_rename_folder_updates_descendant_paths() {
    let (_db, _fs, mut store) = loaded().await;
    let work = store.add_folder(folder_draft("Work", None)).await.unwrap();
    let tools = store.add_folder(folder_draft("Tools", Some(&work.id))).await.unwrap();
    let mut d = draft("Docs", "https://docs.rs");
    d.parent_id = Some(tools.id.clone());
    let bookmark = store.add_bookmark(d).await.unwrap();

    let patch = FolderPatch { title: Some("Job".to_string()), ..Default::default() };
    store.update_folder(&work.id, patch).await.unwrap();

    assert_eq!(store.get_folder(&tools.id).unwrap().path, vec!["Job".to_string()]);
    assert_eq!(
        store.get_bookmark(&bookmark.id).unwrap().path,
        vec!["Job".to_string(), "Tools".to_string()]
    );
    assert!(store.folder_by_path(&["Job".to_string(), "Tools".to_string()]).is_some());
}

#[tokio::test]
async fn test_folder_cannot_move_inside_itself() {
    let (_db, _fs, mut store) = loaded().await;
    let work = store.add_folder(folder_draft("Work", None)).await.unwrap();
    let tools = store.add_folder(folder_draft("Tools", Some(&work.id))).await.unwrap();

    let patch = FolderPatch { parent_id: Some(Some(tools.id.clone())), ..Default::default() };
    let err = store.update_folder(&work.id, patch).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.get_folder(&work.id).unwrap().parent_id, None);
}

#[tokio::test]
async fn test_delete_folder_cascades() {
    let (_db, _fs, mut store) = loaded().await;
    let work = store.add_folder(folder_draft("Work", None)).await.unwrap();
    let tools = store.add_folder(folder_draft("Tools", Some(&work.id))).await.unwrap();
    let keep = store.add_folder(folder_draft("Home", None)).await.unwrap();
    let mut inner = draft("Docs", "https://docs.rs");
    inner.parent_id = Some(tools.id.clone());
    store.add_bookmark(inner).await.unwrap();
    store.add_bookmark(draft("Root", "https://root.example")).await.unwrap();

    assert!(store.delete_folder(&work.id).await);
    assert_eq!(store.folders().len(), 1);
    assert_eq!(store.folders()[0].id, keep.id);
    assert_eq!(store.bookmarks().len(), 1);
    assert_eq!(store.bookmarks()[0].url, "https://root.example");
    assert!(!store.delete_folder(&work.id).await);
}

#[tokio::test]
async fn test_folder_contents_lists_direct_children() {
    let (_db, _fs, mut store) = loaded().await;
    let work = store.add_folder(folder_draft("Work", None)).await.unwrap();
    store.add_folder(folder_draft("Tools", Some(&work.id))).await.unwrap();
    let mut d = draft("A", "https://a.example");
    d.parent_id = Some(work.id.clone());
    store.add_bookmark(d).await.unwrap();

    let root = store.folder_contents(None);
    assert_eq!(root.folders.len(), 1);
    assert!(root.bookmarks.is_empty());
    let inside = store.folder_contents(Some(&work.id));
    assert_eq!(inside.folders.len(), 1);
    assert_eq!(inside.bookmarks.len(), 1);
}

// ─── Import / export ───

const WORK_EXPORT: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<DL><p>
    <DT><H3>Work</H3>
    <DL><p>
        <DT><A HREF="https://example.com">Example</A>
    </DL><p>
</DL><p>"#;

#[tokio::test]
async fn test_importing_the_same_file_twice() {
    let (_db, _fs, mut store) = loaded().await;
    let first = store.import_text(WORK_EXPORT, "bookmarks.html").await.unwrap();
    assert_eq!(first, ImportOutcome::Imported { folders: 1, bookmarks: 1 });

    let second = store.import_text(WORK_EXPORT, "bookmarks.html").await.unwrap();
    assert_eq!(second, ImportOutcome::AllDuplicates);
    assert_eq!(store.folders().len(), 1);
    assert_eq!(store.bookmarks().len(), 1);
    assert_eq!(store.bookmarks()[0].parent_id.as_deref(), Some(store.folders()[0].id.as_str()));
}

#[tokio::test]
async fn test_import_with_nothing_in_it() {
    let (_db, _fs, mut store) = loaded().await;
    let outcome = store.import_text("<html><body>empty</body></html>", "x.html").await.unwrap();
    assert_eq!(outcome, ImportOutcome::NothingFound);
}

#[tokio::test]
async fn test_import_json_by_extension() {
    let (_db, _fs, mut store) = loaded().await;
    let json = r#"{"bookmarks":[{"title":"A","url":"https://a.example"}],"folders":[]}"#;
    let outcome = store.import_text(json, "backup.json").await.unwrap();
    assert_eq!(outcome, ImportOutcome::Imported { folders: 0, bookmarks: 1 });
    assert!(store.import_text("{ broken", "backup.json").await.is_err());
}

#[tokio::test]
async fn test_json_with_own_title_paths_matches_html_folders() {
    let (_db, _fs, mut store) = loaded().await;
    let json = r#"{
        "folders": [{"id": "w", "title": "Work", "path": ["Work"]}],
        "bookmarks": [{"title": "Example", "url": "https://example.com", "parentId": "w", "path": ["Work"]}]
    }"#;
    let first = store.import_text(json, "backup.json").await.unwrap();
    assert_eq!(first, ImportOutcome::Imported { folders: 1, bookmarks: 1 });
    assert!(store.folders()[0].path.is_empty());

    let second = store.import_text(WORK_EXPORT, "bookmarks.html").await.unwrap();
    assert_eq!(second, ImportOutcome::AllDuplicates);
    assert_eq!(store.folders().len(), 1);
}

#[tokio::test]
async fn test_export_html_and_json() {
    let (_db, _fs, mut store) = loaded().await;
    store.import_text(WORK_EXPORT, "bookmarks.html").await.unwrap();

    let html = store.export_html();
    assert!(html.contains("<H3>Work</H3>"));
    assert!(html.contains("https://example.com"));

    let json = store.export_json().unwrap();
    let parsed: StorageData = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, store.snapshot());
}

// ─── File storage ───

#[tokio::test]
async fn test_request_file_storage_writes_current_state() {
    let (_db, fs, mut store) = loaded().await;
    store.add_bookmark(draft("A", "https://a.example")).await.unwrap();

    fs.set_next_pick(Some(FILE));
    store.request_file_storage().await.unwrap();
    assert!(store.file_storage_enabled());
    assert!(fs.contents(FILE).unwrap().contains("https://a.example"));

    store.add_bookmark(draft("B", "https://b.example")).await.unwrap();
    assert!(fs.contents(FILE).unwrap().contains("https://b.example"));
}

#[tokio::test]
async fn test_revocation_downgrades_to_local_only() {
    let (db, fs) = setup();
    grant_file(&db, &fs, "");
    let mut store = store(&db, &fs);
    store.load().await;
    assert!(store.file_storage_enabled());

    fs.revoke(FILE);
    store.add_bookmark(draft("A", "https://a.example")).await.unwrap();

    assert!(!store.file_storage_enabled());
    assert!(store.last_persist_error().unwrap().is_permission());
    assert_eq!(mirrored(&db).unwrap().bookmarks.len(), 1, "local mirror still written");
    assert_eq!(store.bookmarks().len(), 1, "in-memory state unaffected");
}

#[tokio::test]
async fn test_write_failure_keeps_file_tier() {
    let (db, fs) = setup();
    grant_file(&db, &fs, "");
    let mut store = store(&db, &fs);
    store.load().await;

    fs.set_fail_writes(FILE, true);
    store.add_bookmark(draft("A", "https://a.example")).await.unwrap();
    assert!(store.file_storage_enabled());
    assert!(matches!(store.last_persist_error(), Some(StoreError::Storage(_))));

    fs.set_fail_writes(FILE, false);
    let report = store.persist().await;
    assert_eq!(report, PersistReport { local: true, file: Some(true) });
    assert!(store.last_persist_error().is_none());
}

#[tokio::test]
async fn test_release_and_backup() {
    let (db, fs) = setup();
    grant_file(&db, &fs, "");
    let mut store = store(&db, &fs);
    store.load().await;
    assert!(store.backup_data().await);

    store.release_file_storage().unwrap();
    assert!(!store.file_storage_enabled());
    assert!(!store.backup_data().await);
    assert!(!store.authorization_status().await.authorized);
}

#[tokio::test]
async fn test_import_from_file_replaces_state() {
    let (_db, fs, mut store) = loaded().await;
    store.add_bookmark(draft("Old", "https://old.example")).await.unwrap();

    fs.insert_file("restore.json", &serde_json::to_string(&snapshot_with("https://new.example")).unwrap());
    fs.set_next_pick(Some("restore.json"));
    store.import_from_file().await.unwrap();
    assert_eq!(store.bookmarks().len(), 1);
    assert_eq!(store.bookmarks()[0].url, "https://new.example");
}

#[tokio::test]
async fn test_cancelled_export_is_reported() {
    let (_db, _fs, store) = loaded().await;
    let err = store.export_to_file().await.unwrap_err();
    assert!(err.is_permission());
}
