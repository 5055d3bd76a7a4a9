use serde::{Deserialize, Serialize};

use super::bookmark::{Bookmark, Folder};

/// Serializable snapshot of the whole collection.
///
/// This is the unit written to the local mirror, to the authorized file, and
/// accepted by JSON import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageData {
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    #[serde(default)]
    pub folders: Vec<Folder>,
}

impl StorageData {
    pub fn new(bookmarks: Vec<Bookmark>, folders: Vec<Folder>) -> Self {
        Self { bookmarks, folders }
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty() && self.folders.is_empty()
    }
}

/// The filtered delta produced by reconciling an import against existing state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeResult {
    pub new_bookmarks: Vec<Bookmark>,
    pub new_folders: Vec<Folder>,
}

impl MergeResult {
    pub fn is_empty(&self) -> bool {
        self.new_bookmarks.is_empty() && self.new_folders.is_empty()
    }
}

/// What an import did. The first two variants carry different user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// The source contained no bookmarks and no folders.
    NothingFound,
    /// The source had items but every one was already present.
    AllDuplicates,
    Imported { folders: usize, bookmarks: usize },
}

/// Where the session's canonical state was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadSource {
    File,
    LocalStorage,
    Default,
}

/// Per-session lifecycle of the store. `Loaded` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Loaded(LoadSource),
}

/// Outcome of writing the current state through the persistence tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersistReport {
    /// The local mirror accepted the snapshot.
    pub local: bool,
    /// `None` when the file tier was not attempted.
    pub file: Option<bool>,
}

/// Direct children of one folder (or of the root).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderContents {
    pub folders: Vec<Folder>,
    pub bookmarks: Vec<Bookmark>,
}
