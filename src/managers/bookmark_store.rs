//! Bookmark Store for the bookmark tool.
//!
//! The single owner of the canonical bookmark and folder collections. Every
//! mutation is applied in memory first and then written through to the local
//! mirror and, when authorized, to the backing file. The local mirror is the
//! floor-level copy; file writes are best-effort and a permission failure
//! downgrades the session to local-only until the user re-authorizes.
//!
//! Nothing is written before [`BookmarkStore::load`] has settled the session's
//! source of truth, so an empty initial state can never clobber stored data.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::managers::authorization_manager::{AuthorizationManager, AuthorizationManagerTrait};
use crate::services::bookmark_codec;
use crate::services::file_access::FileSystemAccess;
use crate::services::import_reader;
use crate::services::local_mirror::LocalMirror;
use crate::services::merge_engine;
use crate::services::validation::{self, unique_id, validate_title, validate_url};
use crate::types::bookmark::{Bookmark, BookmarkDraft, BookmarkPatch, Folder, FolderDraft, FolderPatch};
use crate::types::errors::{PermissionError, StorageError, StoreError, ValidationError};
use crate::types::file_access::AuthorizationStatus;
use crate::types::storage::{
    FolderContents, ImportOutcome, LoadSource, LoadState, PersistReport, StorageData,
};

/// Canonical in-memory state plus its write-through tiers.
pub struct BookmarkStore<F: FileSystemAccess> {
    bookmarks: Vec<Bookmark>,
    folders: Vec<Folder>,
    mirror: LocalMirror,
    auth: AuthorizationManager<F>,
    state: LoadState,
    /// Whether writes currently go to the backing file.
    file_enabled: bool,
    last_persist_error: Option<StoreError>,
}

impl<F: FileSystemAccess> BookmarkStore<F> {
    pub fn new(mirror: LocalMirror, auth: AuthorizationManager<F>) -> Self {
        Self {
            bookmarks: Vec::new(),
            folders: Vec::new(),
            mirror,
            auth,
            state: LoadState::Uninitialized,
            file_enabled: false,
            last_persist_error: None,
        }
    }

    // === Session lifecycle ===

    /// Settles the session's source of truth: authorized file, then local
    /// mirror, then empty defaults. Data loaded from the file is copied into
    /// the mirror. Calling this again after the first load is a no-op.
    pub async fn load(&mut self) -> LoadSource {
        if let LoadState::Loaded(source) = self.state {
            return source;
        }

        self.file_enabled = self.auth.is_authorized().await;
        let mut source = None;

        if self.file_enabled {
            match self.auth.read_data().await {
                Ok(Some(data)) if !data.is_empty() => {
                    self.replace(data);
                    source = Some(LoadSource::File);
                }
                Ok(_) => debug!("Backing file is empty, trying local mirror"),
                Err(e) => {
                    warn!(error = %e, "Backing file unreadable, trying local mirror");
                    if e.is_permission() {
                        self.file_enabled = false;
                    }
                }
            }
        }

        let source = match source {
            Some(source) => source,
            None => match self.mirror.load_data() {
                Ok(Some(data)) => {
                    self.replace(data);
                    LoadSource::LocalStorage
                }
                Ok(None) => LoadSource::Default,
                Err(e) => {
                    warn!(error = %e, "Local mirror unusable, starting empty");
                    LoadSource::Default
                }
            },
        };

        self.state = LoadState::Loaded(source);
        info!(
            ?source,
            bookmarks = self.bookmarks.len(),
            folders = self.folders.len(),
            file = self.file_enabled,
            "Bookmark store loaded"
        );

        if source == LoadSource::File {
            if let Err(e) = self.mirror.save_data(&self.snapshot()) {
                warn!(error = %e, "Could not mirror file data locally");
                self.last_persist_error = Some(e.into());
            }
        }
        source
    }

    pub fn load_state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }

    /// Whether mutations are currently written to the backing file.
    pub fn file_storage_enabled(&self) -> bool {
        self.file_enabled
    }

    /// The most recent write-through failure, cleared by the next clean write.
    pub fn last_persist_error(&self) -> Option<&StoreError> {
        self.last_persist_error.as_ref()
    }

    pub fn authorization(&self) -> &AuthorizationManager<F> {
        &self.auth
    }

    fn replace(&mut self, data: StorageData) {
        self.bookmarks = data.bookmarks;
        self.folders = data.folders;
    }

    /// Writes the current state through every available tier. Failures are
    /// logged and kept in `last_persist_error`; in-memory state is untouched.
    pub async fn persist(&mut self) -> PersistReport {
        if !self.is_loaded() {
            debug!("Write-through skipped before initial load");
            return PersistReport::default();
        }

        let snapshot = self.snapshot();
        let mut report = PersistReport::default();
        let mut failure: Option<StoreError> = None;

        match self.mirror.save_data(&snapshot) {
            Ok(()) => report.local = true,
            Err(e) => {
                warn!(error = %e, "Local mirror write failed");
                failure = Some(e.into());
            }
        }

        if self.file_enabled {
            match self.auth.write_data(&snapshot).await {
                Ok(()) => report.file = Some(true),
                Err(e) => {
                    if e.is_permission() {
                        warn!(error = %e, "File storage downgraded to local-only");
                        self.file_enabled = false;
                    } else {
                        warn!(error = %e, "Backing file write failed");
                    }
                    report.file = Some(false);
                    failure = Some(e);
                }
            }
        }

        self.last_persist_error = failure;
        report
    }

    // === Queries ===

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn snapshot(&self) -> StorageData {
        StorageData::new(self.bookmarks.clone(), self.folders.clone())
    }

    pub fn get_bookmark(&self, id: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.id == id)
    }

    pub fn get_folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    /// Case-insensitive substring match on title or URL.
    pub fn search_bookmarks(&self, query: &str) -> Vec<Bookmark> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.bookmarks
            .iter()
            .filter(|b| {
                b.title.to_lowercase().contains(&needle) || b.url.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    pub fn pinned_bookmarks(&self) -> Vec<Bookmark> {
        self.bookmarks.iter().filter(|b| b.is_pinned).cloned().collect()
    }

    /// Direct child folders and bookmarks of `parent_id` (`None` is the root).
    pub fn folder_contents(&self, parent_id: Option<&str>) -> FolderContents {
        FolderContents {
            folders: self
                .folders
                .iter()
                .filter(|f| f.parent_id.as_deref() == parent_id)
                .cloned()
                .collect(),
            bookmarks: self
                .bookmarks
                .iter()
                .filter(|b| b.parent_id.as_deref() == parent_id)
                .cloned()
                .collect(),
        }
    }

    /// Folder reached by following `path` title by title from the root.
    pub fn folder_by_path(&self, path: &[String]) -> Option<&Folder> {
        let (title, ancestors) = path.split_last()?;
        self.folders
            .iter()
            .find(|f| &f.title == title && f.path.as_slice() == ancestors)
    }

    fn parent_path(&self, parent_id: Option<&str>) -> Result<Vec<String>, ValidationError> {
        match parent_id {
            None => Ok(Vec::new()),
            Some(id) => self
                .get_folder(id)
                .map(Folder::child_path)
                .ok_or_else(|| ValidationError::new("parentId", "does not reference an existing folder")),
        }
    }

    // === Bookmarks ===

    /// Validates and stores a new bookmark at the front of the collection.
    pub async fn add_bookmark(&mut self, draft: BookmarkDraft) -> Result<Bookmark, StoreError> {
        let mut bookmark = validation::validate_bookmark(&draft)?;
        bookmark.path = self.parent_path(bookmark.parent_id.as_deref())?;
        bookmark.id = unique_id(|id| self.bookmarks.iter().any(|b| b.id == id));

        self.bookmarks.insert(0, bookmark.clone());
        debug!(id = %bookmark.id, "Bookmark added");
        self.persist().await;
        Ok(bookmark)
    }

    /// Merges `patch` into the bookmark. `Ok(None)` when the id is unknown.
    pub async fn update_bookmark(
        &mut self,
        id: &str,
        patch: BookmarkPatch,
    ) -> Result<Option<Bookmark>, StoreError> {
        let Some(index) = self.bookmarks.iter().position(|b| b.id == id) else {
            return Ok(None);
        };

        let title = patch.title.as_deref().map(validate_title).transpose()?;
        let url = patch.url.as_deref().map(validate_url).transpose()?;
        let placement = match &patch.parent_id {
            Some(parent) => Some((parent.clone(), self.parent_path(parent.as_deref())?)),
            None => None,
        };

        let bookmark = &mut self.bookmarks[index];
        if let Some(title) = title {
            bookmark.title = title;
        }
        if let Some(url) = url {
            bookmark.url = url;
        }
        if let Some(icon) = patch.icon {
            bookmark.icon = icon;
        }
        if let Some(color) = patch.color {
            bookmark.color = color;
        }
        if let Some(pinned) = patch.is_pinned {
            bookmark.is_pinned = pinned;
        }
        if let Some((parent_id, path)) = placement {
            bookmark.parent_id = parent_id;
            bookmark.path = path;
        }
        let updated = bookmark.clone();

        self.persist().await;
        Ok(Some(updated))
    }

    /// Removes the bookmark. Returns whether it existed.
    pub async fn delete_bookmark(&mut self, id: &str) -> bool {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|b| b.id != id);
        if self.bookmarks.len() == before {
            return false;
        }
        self.persist().await;
        true
    }

    /// Flips `is_pinned`; returns the new value, or `None` for an unknown id.
    pub async fn toggle_pin_bookmark(&mut self, id: &str) -> Option<bool> {
        let bookmark = self.bookmarks.iter_mut().find(|b| b.id == id)?;
        bookmark.is_pinned = !bookmark.is_pinned;
        let pinned = bookmark.is_pinned;
        self.persist().await;
        Some(pinned)
    }

    /// Puts the listed bookmarks first, in the given order. Unknown ids are
    /// ignored; unlisted bookmarks follow in their previous relative order.
    pub async fn reorder_bookmarks(&mut self, order: &[String]) {
        let mut remaining: Vec<Option<Bookmark>> =
            std::mem::take(&mut self.bookmarks).into_iter().map(Some).collect();
        let positions: HashMap<String, usize> = remaining
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_ref().map(|b| (b.id.clone(), i)))
            .collect();

        let mut reordered = Vec::with_capacity(remaining.len());
        for id in order {
            if let Some(bookmark) = positions.get(id).and_then(|&i| remaining[i].take()) {
                reordered.push(bookmark);
            }
        }
        reordered.extend(remaining.into_iter().flatten());
        self.bookmarks = reordered;
        self.persist().await;
    }

    // === Folders ===

    pub async fn add_folder(&mut self, draft: FolderDraft) -> Result<Folder, StoreError> {
        let title = validation::validate_folder(&draft)?;
        let path = self.parent_path(draft.parent_id.as_deref())?;
        let folder = Folder {
            id: unique_id(|id| self.folders.iter().any(|f| f.id == id)),
            title,
            parent_id: draft.parent_id,
            path,
        };

        self.folders.push(folder.clone());
        debug!(id = %folder.id, "Folder added");
        self.persist().await;
        Ok(folder)
    }

    /// Renames and/or moves a folder. Paths of everything below it follow.
    /// `Ok(None)` when the id is unknown.
    pub async fn update_folder(
        &mut self,
        id: &str,
        patch: FolderPatch,
    ) -> Result<Option<Folder>, StoreError> {
        let Some(index) = self.folders.iter().position(|f| f.id == id) else {
            return Ok(None);
        };

        let title = patch.title.as_deref().map(validate_title).transpose()?;
        if let Some(Some(parent)) = &patch.parent_id {
            if self.get_folder(parent).is_none() {
                return Err(ValidationError::new("parentId", "does not reference an existing folder").into());
            }
            if self.descendant_folder_ids(id).contains(parent.as_str()) {
                return Err(ValidationError::new("parentId", "a folder cannot move inside itself").into());
            }
        }

        let folder = &mut self.folders[index];
        if let Some(title) = title {
            folder.title = title;
        }
        if let Some(parent) = patch.parent_id {
            folder.parent_id = parent;
        }
        self.refresh_paths();

        let updated = self.folders[index].clone();
        self.persist().await;
        Ok(Some(updated))
    }

    /// Removes the folder, every folder below it, and every bookmark inside
    /// any of them. Returns whether the folder existed.
    pub async fn delete_folder(&mut self, id: &str) -> bool {
        if self.get_folder(id).is_none() {
            return false;
        }
        let doomed = self.descendant_folder_ids(id);
        self.folders.retain(|f| !doomed.contains(f.id.as_str()));
        self.bookmarks
            .retain(|b| b.parent_id.as_deref().map_or(true, |p| !doomed.contains(p)));
        debug!(id, removed_folders = doomed.len(), "Folder deleted");
        self.persist().await;
        true
    }

    /// `id` plus the ids of all folders nested below it.
    fn descendant_folder_ids(&self, id: &str) -> HashSet<String> {
        let mut found: HashSet<String> = HashSet::new();
        let mut pending = vec![id.to_string()];
        while let Some(current) = pending.pop() {
            if !found.insert(current.clone()) {
                continue;
            }
            pending.extend(
                self.folders
                    .iter()
                    .filter(|f| f.parent_id.as_deref() == Some(current.as_str()))
                    .map(|f| f.id.clone()),
            );
        }
        found
    }

    /// Recomputes every folder and bookmark path from the parent chain.
    fn refresh_paths(&mut self) {
        let nodes: HashMap<String, (String, Option<String>)> = self
            .folders
            .iter()
            .map(|f| (f.id.clone(), (f.title.clone(), f.parent_id.clone())))
            .collect();

        // Titles from the root down to and including `id`.
        let chain = |id: &str| -> Vec<String> {
            let mut titles = Vec::new();
            let mut seen = HashSet::new();
            let mut cursor = Some(id.to_string());
            while let Some(current) = cursor {
                if !seen.insert(current.clone()) {
                    break;
                }
                match nodes.get(&current) {
                    Some((title, parent)) => {
                        titles.push(title.clone());
                        cursor = parent.clone();
                    }
                    None => break,
                }
            }
            titles.reverse();
            titles
        };

        for folder in &mut self.folders {
            folder.path = folder.parent_id.as_deref().map(&chain).unwrap_or_default();
        }
        for bookmark in &mut self.bookmarks {
            if let Some(parent) = bookmark.parent_id.as_deref() {
                if nodes.contains_key(parent) {
                    bookmark.path = chain(parent);
                }
            }
        }
    }

    // === Import / export ===

    /// Adds the part of `incoming` that is not already present. The store is
    /// loaded first so the merge runs against the session's real data.
    pub async fn import_bookmarks(&mut self, incoming: StorageData) -> ImportOutcome {
        self.load().await;
        if incoming.is_empty() {
            return ImportOutcome::NothingFound;
        }
        let delta = merge_engine::merge(&self.snapshot(), &incoming);
        if delta.is_empty() {
            info!("Import contained only duplicates");
            return ImportOutcome::AllDuplicates;
        }

        let outcome = ImportOutcome::Imported {
            folders: delta.new_folders.len(),
            bookmarks: delta.new_bookmarks.len(),
        };
        self.folders.extend(delta.new_folders);
        self.bookmarks.extend(delta.new_bookmarks);
        info!(?outcome, "Import merged");
        self.persist().await;
        outcome
    }

    /// Decodes an import file (JSON by `.json` extension, Netscape HTML
    /// otherwise) and merges it.
    pub async fn import_text(&mut self, contents: &str, file_name: &str) -> Result<ImportOutcome, StoreError> {
        let incoming = import_reader::read_import(contents, file_name)?;
        Ok(self.import_bookmarks(incoming).await)
    }

    /// Netscape bookmark file for the current state.
    pub fn export_html(&self) -> String {
        bookmark_codec::serialize(&self.folders, &self.bookmarks)
    }

    /// Pretty-printed JSON snapshot.
    pub fn export_json(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| StorageError::SerializationError(e.to_string()).into())
    }

    /// Forces a write of the current state to the backing file.
    pub async fn backup_data(&mut self) -> bool {
        if !self.is_loaded() {
            info!("Backup skipped before initial load");
            return false;
        }
        if !self.auth.is_authorized().await {
            info!("Backup skipped, file storage not authorized");
            self.file_enabled = false;
            return false;
        }
        match self.auth.write_data(&self.snapshot()).await {
            Ok(()) => {
                self.file_enabled = true;
                info!("Backup written");
                true
            }
            Err(e) => {
                warn!(error = %e, "Backup failed");
                if e.is_permission() {
                    self.file_enabled = false;
                }
                self.last_persist_error = Some(e);
                false
            }
        }
    }

    /// Replaces the whole state with the contents of a file the user picks.
    pub async fn import_from_file(&mut self) -> Result<(), StoreError> {
        self.load().await;
        let data = self.auth.import_from_file().await?;
        info!(
            bookmarks = data.bookmarks.len(),
            folders = data.folders.len(),
            "Replacing state from file"
        );
        self.replace(data);
        self.persist().await;
        Ok(())
    }

    /// Saves the current state to a new, dated file the user picks.
    pub async fn export_to_file(&self) -> Result<(), StoreError> {
        self.auth.export_to_file(&self.snapshot()).await
    }

    // === File storage authorization ===

    /// Lets the user choose a backing file and writes the current state to it.
    pub async fn request_file_storage(&mut self) -> Result<(), PermissionError> {
        self.auth.request_authorization().await?;
        self.file_enabled = true;
        self.persist().await;
        Ok(())
    }

    /// Re-validates a stored grant (may prompt) and resumes file writes.
    pub async fn restore_file_storage(&mut self) -> Result<(), PermissionError> {
        self.auth.restore_authorization().await?;
        self.file_enabled = true;
        self.persist().await;
        Ok(())
    }

    /// Forgets the backing file; later writes go to the local mirror only.
    pub fn release_file_storage(&mut self) -> Result<(), PermissionError> {
        self.file_enabled = false;
        self.auth.release()
    }

    pub async fn authorization_status(&mut self) -> AuthorizationStatus {
        let status = self.auth.status().await;
        if !status.authorized {
            self.file_enabled = false;
        }
        status
    }
}
