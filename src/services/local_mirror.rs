//! The local key/value tier.
//!
//! Mirrors the semantics of a browser's `localStorage`: synchronous string
//! get/set/remove by key, always available. The bookmark snapshot lives
//! under a single key as JSON and is the floor-level durable copy.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};

use crate::database::connection::Database;
use crate::services::validation::now_secs;
use crate::types::errors::{ParseError, StorageError, StoreError};
use crate::types::storage::StorageData;

/// Key/value storage backed by the `local_storage` table.
pub struct LocalMirror {
    db: Arc<Database>,
    data_key: String,
}

impl LocalMirror {
    pub fn new(db: Arc<Database>, data_key: &str) -> Self {
        Self {
            db,
            data_key: data_key.to_string(),
        }
    }

    /// Key under which the bookmark snapshot is stored.
    pub fn data_key(&self) -> &str {
        &self.data_key
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .db
            .connection()
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.db
            .connection()
            .execute(
                "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now_secs()],
            )
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.db
            .connection()
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    /// Reads the stored snapshot.
    ///
    /// `Ok(None)` when nothing is stored. A stored value that is not a valid
    /// snapshot is a `ParseError` so the caller can fall back to defaults.
    pub fn load_data(&self) -> Result<Option<StorageData>, StoreError> {
        let Some(raw) = self.get_item(&self.data_key)? else {
            return Ok(None);
        };
        let data = serde_json::from_str(&raw).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
        Ok(Some(data))
    }

    /// Replaces the stored snapshot.
    pub fn save_data(&self, data: &StorageData) -> Result<(), StorageError> {
        let json = serde_json::to_string(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        self.set_item(&self.data_key, &json)
    }
}
