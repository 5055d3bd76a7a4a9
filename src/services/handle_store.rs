//! Durable store for file capability handles.
//!
//! Handles are persisted as opaque tokens; only the file-system backend that
//! issued a token knows how to revive it.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};

use crate::database::connection::Database;
use crate::services::validation::now_secs;
use crate::types::errors::StorageError;

/// Key/token table surviving restarts.
pub struct HandleStore {
    db: Arc<Database>,
}

impl HandleStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn save(&self, key: &str, token: &str) -> Result<(), StorageError> {
        self.db
            .connection()
            .execute(
                "INSERT INTO file_handles (key, token, saved_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET token = excluded.token, saved_at = excluded.saved_at",
                params![key, token, now_secs()],
            )
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    pub fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let token = self
            .db
            .connection()
            .query_row(
                "SELECT token FROM file_handles WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(token)
    }

    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.db
            .connection()
            .execute("DELETE FROM file_handles WHERE key = ?1", params![key])
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(())
    }
}
