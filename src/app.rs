//! App Core for the bookmark tool.
//!
//! Wires the database, settings, file-system backend and bookmark store
//! together and runs the startup load.

use std::path::PathBuf;
use std::sync::Arc;

use crate::database::connection::Database;
use crate::managers::authorization_manager::AuthorizationManager;
use crate::managers::bookmark_store::BookmarkStore;
use crate::services::file_access::{FileSystemAccess, InMemoryFileSystem, LocalFileSystem, PendingSelection};
use crate::services::local_mirror::LocalMirror;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::settings::AppSettings;
use crate::types::storage::LoadSource;

/// The desktop flavour: real files, pickers answered by the UI's selection.
pub type LocalApp = App<LocalFileSystem<PendingSelection>>;

/// Central application struct.
pub struct App<F: FileSystemAccess> {
    pub db: Arc<Database>,
    pub settings_engine: SettingsEngine,
    pub store: BookmarkStore<F>,
    /// Present when pickers are resolved from a path the caller supplies.
    pub picker: Option<PendingSelection>,
}

impl<F: FileSystemAccess> App<F> {
    /// Builds an app over an already opened database and file-system backend.
    pub fn with_file_system(db: Arc<Database>, settings_engine: SettingsEngine, fs: F) -> Self {
        let settings = settings_engine.get_settings().clone();
        let mirror = LocalMirror::new(db.clone(), &settings.storage.data_key);
        let auth = AuthorizationManager::new(
            fs,
            db.clone(),
            &settings.storage.data_key,
            &settings.file_access.suggested_file_name,
        );
        Self {
            db,
            settings_engine,
            store: BookmarkStore::new(mirror, auth),
            picker: None,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        self.settings_engine.get_settings()
    }

    /// Startup sequence: settle the store's source of truth.
    pub async fn startup(&mut self) -> LoadSource {
        self.store.load().await
    }

    /// Arms the next picker with `path`. Fails for backends without a selection.
    pub fn arm_picker(&self, path: &str) -> Result<(), String> {
        match &self.picker {
            Some(selection) => {
                selection.arm(path);
                Ok(())
            }
            None => Err("this backend does not accept picker paths".to_string()),
        }
    }
}

impl LocalApp {
    /// Opens the database at `db_path` and uses real files for storage.
    pub fn new(db_path: &str, settings_engine: SettingsEngine) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(Database::open(db_path)?);
        let selection = PendingSelection::new();
        let remember = settings_engine.get_settings().file_access.remember_grants;
        let fs = LocalFileSystem::new(selection.clone(), remember);
        let mut app = Self::with_file_system(db, settings_engine, fs);
        app.picker = Some(selection);
        Ok(app)
    }

    /// Database location inside `data_dir` as configured.
    pub fn database_path(data_dir: PathBuf, settings: &AppSettings) -> PathBuf {
        data_dir.join(&settings.storage.database_file)
    }
}

impl App<InMemoryFileSystem> {
    /// Fully volatile app: in-memory database and files.
    pub fn in_memory(settings_engine: SettingsEngine, fs: InMemoryFileSystem) -> Result<Self, rusqlite::Error> {
        let db = Arc::new(Database::open_in_memory()?);
        Ok(Self::with_file_system(db, settings_engine, fs))
    }
}
