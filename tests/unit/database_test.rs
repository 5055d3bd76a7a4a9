//! Unit tests for the bookmark tool database layer (connection + migrations).

use bookmark_tool::database::migrations::CURRENT_SCHEMA_VERSION;
use bookmark_tool::database::Database;
use tempfile::TempDir;

fn table_exists(db: &Database, table: &str) -> bool {
    db.connection()
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )
        .unwrap_or(false)
}

#[test]
fn test_open_in_memory_succeeds() {
    let db = Database::open_in_memory();
    assert!(db.is_ok(), "open_in_memory should succeed");
}

#[test]
fn test_migrations_create_all_tables() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    for table in ["schema_version", "local_storage", "file_handles"] {
        assert!(table_exists(&db, table), "Table '{}' should exist after migrations", table);
    }
}

#[test]
fn test_schema_version_is_current() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    assert_eq!(db.schema_version(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_reopen_file_database_keeps_data() {
    let tmp = TempDir::new().expect("temp dir");
    let path = tmp.path().join("bookmark-tool.db");

    {
        let db = Database::open(&path).expect("first open");
        db.connection()
            .execute(
                "INSERT INTO local_storage (key, value, updated_at) VALUES ('k', 'v', 0)",
                [],
            )
            .expect("insert");
    }

    let db = Database::open(&path).expect("second open");
    assert_eq!(db.schema_version(), CURRENT_SCHEMA_VERSION);
    let value: String = db
        .connection()
        .query_row("SELECT value FROM local_storage WHERE key = 'k'", [], |row| row.get(0))
        .expect("row should survive reopen");
    assert_eq!(value, "v");
}

#[test]
fn test_local_storage_key_is_unique() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();
    conn.execute(
        "INSERT INTO local_storage (key, value, updated_at) VALUES ('k', 'a', 0)",
        [],
    )
    .unwrap();
    let dup = conn.execute(
        "INSERT INTO local_storage (key, value, updated_at) VALUES ('k', 'b', 0)",
        [],
    );
    assert!(dup.is_err(), "duplicate key must violate the primary key");
}
