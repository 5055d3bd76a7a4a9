//! Authorization Manager for the bookmark tool.
//!
//! Owns the capability handle to the user's backing file: acquires it through
//! a save picker, persists it across sessions in the handle store, and checks
//! its permission before every read or write. The "authorized" flag is kept
//! next to the local mirror and only set once the handle is durably stored.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::database::connection::Database;
use crate::services::file_access::{FileHandle, FileSystemAccess};
use crate::services::handle_store::HandleStore;
use crate::services::import_reader;
use crate::services::local_mirror::LocalMirror;
use crate::services::validation::{iso_date, now_millis};
use crate::types::errors::{ParseError, PermissionError, StorageError, StoreError};
use crate::types::file_access::{AccessMode, AuthorizationStatus, PermissionState, PickerOptions};
use crate::types::storage::StorageData;

/// Key of the "authorized" flag in the local key/value table.
pub const AUTH_STATE_KEY: &str = "bookmark-tool-file-auth-state";
/// Key of the backing file's handle in the handle store.
pub const HANDLE_KEY: &str = "bookmarks-file";

/// Trait defining capability-handle operations.
#[allow(async_fn_in_trait)]
pub trait AuthorizationManagerTrait {
    fn is_supported(&self) -> bool;
    /// Prompts for a backing file and persists the grant.
    async fn request_authorization(&mut self) -> Result<(), PermissionError>;
    /// Passive check; never prompts.
    async fn is_authorized(&mut self) -> bool;
    /// User-initiated re-validation; may prompt.
    async fn restore_authorization(&mut self) -> Result<(), PermissionError>;
    fn release(&mut self) -> Result<(), PermissionError>;
    async fn read_data(&mut self) -> Result<Option<StorageData>, StoreError>;
    async fn write_data(&mut self, data: &StorageData) -> Result<(), StoreError>;
    /// Reads a snapshot from a file the user picks, without touching the grant.
    async fn import_from_file(&self) -> Result<StorageData, StoreError>;
    /// Writes a snapshot to a new file the user picks, without touching the grant.
    async fn export_to_file(&self, data: &StorageData) -> Result<(), StoreError>;
    async fn status(&mut self) -> AuthorizationStatus;
}

/// Capability manager over a file-system backend.
pub struct AuthorizationManager<F: FileSystemAccess> {
    fs: F,
    handles: HandleStore,
    flags: LocalMirror,
    suggested_file_name: String,
    handle: Option<F::Handle>,
}

impl<F: FileSystemAccess> AuthorizationManager<F> {
    pub fn new(fs: F, db: Arc<Database>, data_key: &str, suggested_file_name: &str) -> Self {
        Self {
            fs,
            handles: HandleStore::new(db.clone()),
            flags: LocalMirror::new(db, data_key),
            suggested_file_name: suggested_file_name.to_string(),
            handle: None,
        }
    }

    pub fn file_system(&self) -> &F {
        &self.fs
    }

    fn flag_set(&self) -> bool {
        matches!(self.flags.get_item(AUTH_STATE_KEY), Ok(Some(v)) if v == "true")
    }

    fn set_flag(&self) -> Result<(), StorageError> {
        self.flags.set_item(AUTH_STATE_KEY, "true")
    }

    /// Returns the cached handle, reviving it from the store if needed.
    fn load_handle(&mut self) -> Result<&F::Handle, PermissionError> {
        if self.handle.is_none() {
            let token = self
                .handles
                .load(HANDLE_KEY)
                .map_err(|e| PermissionError::HandleStore(e.to_string()))?
                .ok_or(PermissionError::NotAuthorized)?;
            let handle = self
                .fs
                .revive_handle(&token)
                .ok_or(PermissionError::NotAuthorized)?;
            self.handle = Some(handle);
        }
        self.handle.as_ref().ok_or(PermissionError::NotAuthorized)
    }

    /// Undoes a half-finished grant so no handle outlives a failed save.
    fn roll_back(&mut self) {
        self.handle = None;
        if let Err(e) = self.handles.delete(HANDLE_KEY) {
            warn!(error = %e, "Rollback could not delete stored handle");
        }
        if let Err(e) = self.flags.remove_item(AUTH_STATE_KEY) {
            warn!(error = %e, "Rollback could not clear authorization flag");
        }
    }

    async fn checked_handle(&mut self, mode: AccessMode) -> Result<&F::Handle, PermissionError> {
        let handle = self.load_handle()?;
        match handle.query_permission(mode).await {
            PermissionState::Granted => Ok(handle),
            PermissionState::Prompt => Err(PermissionError::Revoked(format!(
                "{} needs to be re-authorized",
                handle.name()
            ))),
            PermissionState::Denied => Err(PermissionError::Revoked(format!(
                "access to {} was withdrawn",
                handle.name()
            ))),
        }
    }
}

impl<F: FileSystemAccess> AuthorizationManagerTrait for AuthorizationManager<F> {
    fn is_supported(&self) -> bool {
        self.fs.is_supported()
    }

    async fn request_authorization(&mut self) -> Result<(), PermissionError> {
        if !self.fs.is_supported() {
            return Err(PermissionError::Unsupported);
        }
        let options = PickerOptions::json(&self.suggested_file_name);
        let handle = self.fs.show_save_file_picker(&options).await?;

        let mut permission = handle.query_permission(AccessMode::ReadWrite).await;
        if permission == PermissionState::Prompt {
            permission = handle.request_permission(AccessMode::ReadWrite).await;
        }
        if permission != PermissionState::Granted {
            return Err(PermissionError::Denied(format!(
                "write access to {} was not granted",
                handle.name()
            )));
        }

        let token = handle.token();
        if let Err(e) = self.handles.save(HANDLE_KEY, &token) {
            self.roll_back();
            return Err(PermissionError::HandleStore(e.to_string()));
        }
        if let Err(e) = self.set_flag() {
            self.roll_back();
            return Err(PermissionError::HandleStore(e.to_string()));
        }

        info!(file = %handle.name(), "File storage authorized");
        self.handle = Some(handle);
        Ok(())
    }

    async fn is_authorized(&mut self) -> bool {
        if !self.fs.is_supported() || !self.flag_set() {
            return false;
        }
        let handle = match self.load_handle() {
            Ok(handle) => handle,
            Err(e) => {
                debug!(error = %e, "No usable file handle");
                return false;
            }
        };
        let permission = handle.query_permission(AccessMode::ReadWrite).await;
        if permission != PermissionState::Granted {
            debug!(?permission, "File handle lacks read-write permission");
        }
        permission == PermissionState::Granted
    }

    async fn restore_authorization(&mut self) -> Result<(), PermissionError> {
        if !self.fs.is_supported() {
            return Err(PermissionError::Unsupported);
        }
        let handle = self.load_handle()?;
        let permission = match handle.query_permission(AccessMode::ReadWrite).await {
            PermissionState::Prompt => handle.request_permission(AccessMode::ReadWrite).await,
            state => state,
        };
        match permission {
            PermissionState::Granted => {
                self.set_flag()
                    .map_err(|e| PermissionError::HandleStore(e.to_string()))?;
                info!("File storage authorization restored");
                Ok(())
            }
            PermissionState::Prompt => Err(PermissionError::Denied(
                "permission prompt was dismissed".to_string(),
            )),
            PermissionState::Denied => Err(PermissionError::Revoked(
                "the stored file is no longer accessible".to_string(),
            )),
        }
    }

    fn release(&mut self) -> Result<(), PermissionError> {
        self.handle = None;
        self.flags
            .remove_item(AUTH_STATE_KEY)
            .map_err(|e| PermissionError::HandleStore(e.to_string()))?;
        self.handles
            .delete(HANDLE_KEY)
            .map_err(|e| PermissionError::HandleStore(e.to_string()))?;
        info!("File storage released");
        Ok(())
    }

    async fn read_data(&mut self) -> Result<Option<StorageData>, StoreError> {
        let handle = self.checked_handle(AccessMode::Read).await?;
        let contents = handle.read_text().await?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let data = serde_json::from_str(&contents)
            .map_err(|e| ParseError::InvalidJson(e.to_string()))?;
        Ok(Some(data))
    }

    async fn write_data(&mut self, data: &StorageData) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let handle = self.checked_handle(AccessMode::ReadWrite).await?;
        handle.write_text(&json).await?;
        Ok(())
    }

    async fn import_from_file(&self) -> Result<StorageData, StoreError> {
        if !self.fs.is_supported() {
            return Err(PermissionError::Unsupported.into());
        }
        let options = PickerOptions::json(&self.suggested_file_name);
        let handle = self.fs.show_open_file_picker(&options).await?;
        let contents = handle.read_text().await?;
        Ok(import_reader::read_json(&contents)?)
    }

    async fn export_to_file(&self, data: &StorageData) -> Result<(), StoreError> {
        if !self.fs.is_supported() {
            return Err(PermissionError::Unsupported.into());
        }
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let options = PickerOptions::json(&backup_file_name(now_millis()));
        let handle = self.fs.show_save_file_picker(&options).await?;
        handle.write_text(&json).await?;
        info!(file = %handle.name(), "Exported snapshot");
        Ok(())
    }

    async fn status(&mut self) -> AuthorizationStatus {
        AuthorizationStatus {
            supported: self.fs.is_supported(),
            authorized: self.is_authorized().await,
        }
    }
}

/// Suggested name for a dated export, e.g. `bookmarks-backup-2024-05-01.json`.
pub fn backup_file_name(millis: i64) -> String {
    format!("bookmarks-backup-{}.json", iso_date(millis))
}
