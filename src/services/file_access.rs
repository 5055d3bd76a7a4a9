//! File capability boundary.
//!
//! A [`FileHandle`] is an opaque, revocable grant to one file. Nothing about a
//! handle is assumed to stay true between calls: callers ask for the current
//! permission before every read or write. [`FileSystemAccess`] hands out handles
//! through picker dialogs and revives handles from their persisted tokens.
//!
//! Two backends are provided. [`LocalFileSystem`] works on real files and
//! resolves pickers through a [`PathChooser`]; [`InMemoryFileSystem`] keeps
//! everything in memory and exposes controls for picks, permission changes and
//! write failures.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::types::errors::{PermissionError, StorageError};
use crate::types::file_access::{AccessMode, PermissionState, PickerKind, PickerOptions};

/// Capability to read and write a single file.
#[allow(async_fn_in_trait)]
pub trait FileHandle {
    /// Opaque value the issuing backend can revive the handle from.
    fn token(&self) -> String;
    /// Display name of the file.
    fn name(&self) -> String;
    /// Current permission. Never prompts.
    async fn query_permission(&self, mode: AccessMode) -> PermissionState;
    /// Asks for permission again. Only valid in response to a user gesture.
    async fn request_permission(&self, mode: AccessMode) -> PermissionState;
    async fn read_text(&self) -> Result<String, StorageError>;
    async fn write_text(&self, contents: &str) -> Result<(), StorageError>;
}

/// Source of file handles.
#[allow(async_fn_in_trait)]
pub trait FileSystemAccess {
    type Handle: FileHandle;

    /// Whether this environment can hand out file handles at all.
    fn is_supported(&self) -> bool;
    /// Lets the user pick (or create) a file to write to.
    async fn show_save_file_picker(&self, options: &PickerOptions) -> Result<Self::Handle, PermissionError>;
    /// Lets the user pick an existing file to read.
    async fn show_open_file_picker(&self, options: &PickerOptions) -> Result<Self::Handle, PermissionError>;
    /// Rebuilds a handle from a stored token. The handle's permission is not checked.
    fn revive_handle(&self, token: &str) -> Option<Self::Handle>;
}

// === Local files ===

/// Resolves a picker request to a path chosen by the user.
pub trait PathChooser {
    /// `None` means the user cancelled the dialog.
    fn choose(&self, kind: PickerKind, options: &PickerOptions) -> Option<PathBuf>;
}

/// A one-shot selection armed by the UI before it invokes an operation that
/// opens a picker. Taking the selection disarms it.
#[derive(Debug, Clone, Default)]
pub struct PendingSelection {
    path: Rc<RefCell<Option<PathBuf>>>,
}

impl PendingSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<P: Into<PathBuf>>(&self, path: P) {
        *self.path.borrow_mut() = Some(path.into());
    }
}

impl PathChooser for PendingSelection {
    fn choose(&self, _kind: PickerKind, _options: &PickerOptions) -> Option<PathBuf> {
        self.path.borrow_mut().take()
    }
}

/// Handle to a file on the local file system.
#[derive(Debug)]
pub struct LocalFileHandle {
    path: PathBuf,
    granted: Cell<bool>,
}

impl LocalFileHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Permission as seen on disk, ignoring the grant.
    async fn disk_permission(&self, mode: AccessMode) -> PermissionState {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if !meta.is_file() => PermissionState::Denied,
            Ok(meta) if mode == AccessMode::ReadWrite && meta.permissions().readonly() => {
                PermissionState::Denied
            }
            Ok(_) => PermissionState::Granted,
            Err(_) => PermissionState::Denied,
        }
    }
}

impl FileHandle for LocalFileHandle {
    fn token(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.token())
    }

    async fn query_permission(&self, mode: AccessMode) -> PermissionState {
        match self.disk_permission(mode).await {
            PermissionState::Granted if !self.granted.get() => PermissionState::Prompt,
            state => state,
        }
    }

    async fn request_permission(&self, mode: AccessMode) -> PermissionState {
        let state = self.disk_permission(mode).await;
        if state == PermissionState::Granted {
            self.granted.set(true);
        }
        state
    }

    async fn read_text(&self) -> Result<String, StorageError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StorageError::ReadFailed(format!("{}: {}", self.path.display(), e)))
    }

    async fn write_text(&self, contents: &str) -> Result<(), StorageError> {
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("{}: {}", self.path.display(), e)))
    }
}

/// Real files, with pickers answered by a [`PathChooser`].
pub struct LocalFileSystem<C: PathChooser> {
    chooser: C,
    remember_grants: bool,
}

impl<C: PathChooser> LocalFileSystem<C> {
    /// `remember_grants` controls whether revived handles start out granted
    /// or in the `Prompt` state.
    pub fn new(chooser: C, remember_grants: bool) -> Self {
        Self {
            chooser,
            remember_grants,
        }
    }

    pub fn chooser(&self) -> &C {
        &self.chooser
    }
}

impl<C: PathChooser> FileSystemAccess for LocalFileSystem<C> {
    type Handle = LocalFileHandle;

    fn is_supported(&self) -> bool {
        true
    }

    async fn show_save_file_picker(&self, options: &PickerOptions) -> Result<LocalFileHandle, PermissionError> {
        let mut path = self
            .chooser
            .choose(PickerKind::Save, options)
            .ok_or(PermissionError::PickerCancelled)?;
        if tokio::fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false) {
            path = path.join(&options.suggested_name);
        }
        // The dialog creates the file but never truncates an existing one.
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| PermissionError::Denied(format!("{}: {}", path.display(), e)))?;
        Ok(LocalFileHandle {
            path,
            granted: Cell::new(true),
        })
    }

    async fn show_open_file_picker(&self, options: &PickerOptions) -> Result<LocalFileHandle, PermissionError> {
        let path = self
            .chooser
            .choose(PickerKind::Open, options)
            .ok_or(PermissionError::PickerCancelled)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(LocalFileHandle {
                path,
                granted: Cell::new(true),
            }),
            _ => Err(PermissionError::Denied(format!("{} is not a readable file", path.display()))),
        }
    }

    fn revive_handle(&self, token: &str) -> Option<LocalFileHandle> {
        if token.is_empty() {
            return None;
        }
        Some(LocalFileHandle {
            path: PathBuf::from(token),
            granted: Cell::new(self.remember_grants),
        })
    }
}

// === In-memory files ===

#[derive(Debug, Clone)]
struct MemoryFile {
    contents: String,
    permission: PermissionState,
    fail_writes: bool,
}

#[derive(Debug)]
struct MemoryState {
    supported: bool,
    files: HashMap<String, MemoryFile>,
    next_pick: Option<String>,
    prompt_response: PermissionState,
}

/// Volatile file system. Clones share the same files, so a test can keep a
/// clone to steer the instance it handed to the store.
#[derive(Debug, Clone)]
pub struct InMemoryFileSystem {
    state: Rc<RefCell<MemoryState>>,
}

impl Default for InMemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MemoryState {
                supported: true,
                files: HashMap::new(),
                next_pick: None,
                prompt_response: PermissionState::Granted,
            })),
        }
    }

    /// An environment without file-handle support.
    pub fn unsupported() -> Self {
        let fs = Self::new();
        fs.state.borrow_mut().supported = false;
        fs
    }

    /// Name the next picker resolves to; `None` makes it cancel.
    pub fn set_next_pick(&self, name: Option<&str>) {
        self.state.borrow_mut().next_pick = name.map(str::to_string);
    }

    pub fn insert_file(&self, name: &str, contents: &str) {
        self.state.borrow_mut().files.insert(
            name.to_string(),
            MemoryFile {
                contents: contents.to_string(),
                permission: PermissionState::Granted,
                fail_writes: false,
            },
        );
    }

    pub fn remove_file(&self, name: &str) {
        self.state.borrow_mut().files.remove(name);
    }

    pub fn contents(&self, name: &str) -> Option<String> {
        self.state.borrow().files.get(name).map(|f| f.contents.clone())
    }

    pub fn set_permission(&self, name: &str, permission: PermissionState) {
        if let Some(file) = self.state.borrow_mut().files.get_mut(name) {
            file.permission = permission;
        }
    }

    /// Out-of-band revocation.
    pub fn revoke(&self, name: &str) {
        self.set_permission(name, PermissionState::Denied);
    }

    pub fn set_fail_writes(&self, name: &str, fail: bool) {
        if let Some(file) = self.state.borrow_mut().files.get_mut(name) {
            file.fail_writes = fail;
        }
    }

    /// What a permission prompt resolves to for files in the `Prompt` state.
    pub fn set_prompt_response(&self, response: PermissionState) {
        self.state.borrow_mut().prompt_response = response;
    }

    fn take_pick(&self) -> Result<String, PermissionError> {
        self.state
            .borrow_mut()
            .next_pick
            .take()
            .ok_or(PermissionError::PickerCancelled)
    }

    fn handle(&self, name: String) -> MemoryFileHandle {
        MemoryFileHandle {
            name,
            state: Rc::clone(&self.state),
        }
    }
}

/// Handle into an [`InMemoryFileSystem`].
#[derive(Debug)]
pub struct MemoryFileHandle {
    name: String,
    state: Rc<RefCell<MemoryState>>,
}

impl FileHandle for MemoryFileHandle {
    fn token(&self) -> String {
        self.name.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    async fn query_permission(&self, _mode: AccessMode) -> PermissionState {
        self.state
            .borrow()
            .files
            .get(&self.name)
            .map(|f| f.permission)
            .unwrap_or(PermissionState::Denied)
    }

    async fn request_permission(&self, _mode: AccessMode) -> PermissionState {
        let mut state = self.state.borrow_mut();
        let response = state.prompt_response;
        match state.files.get_mut(&self.name) {
            Some(file) => {
                if file.permission == PermissionState::Prompt {
                    file.permission = response;
                }
                file.permission
            }
            None => PermissionState::Denied,
        }
    }

    async fn read_text(&self) -> Result<String, StorageError> {
        self.state
            .borrow()
            .files
            .get(&self.name)
            .map(|f| f.contents.clone())
            .ok_or_else(|| StorageError::ReadFailed(format!("{} does not exist", self.name)))
    }

    async fn write_text(&self, contents: &str) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        let file = state
            .files
            .get_mut(&self.name)
            .ok_or_else(|| StorageError::WriteFailed(format!("{} does not exist", self.name)))?;
        if file.fail_writes {
            return Err(StorageError::WriteFailed(format!("{} rejected the write", self.name)));
        }
        file.contents = contents.to_string();
        Ok(())
    }
}

impl FileSystemAccess for InMemoryFileSystem {
    type Handle = MemoryFileHandle;

    fn is_supported(&self) -> bool {
        self.state.borrow().supported
    }

    async fn show_save_file_picker(&self, _options: &PickerOptions) -> Result<MemoryFileHandle, PermissionError> {
        if !self.is_supported() {
            return Err(PermissionError::Unsupported);
        }
        let name = self.take_pick()?;
        {
            let mut state = self.state.borrow_mut();
            let file = state.files.entry(name.clone()).or_insert_with(|| MemoryFile {
                contents: String::new(),
                permission: PermissionState::Granted,
                fail_writes: false,
            });
            file.permission = PermissionState::Granted;
        }
        Ok(self.handle(name))
    }

    async fn show_open_file_picker(&self, _options: &PickerOptions) -> Result<MemoryFileHandle, PermissionError> {
        if !self.is_supported() {
            return Err(PermissionError::Unsupported);
        }
        let name = self.take_pick()?;
        let found = match self.state.borrow_mut().files.get_mut(&name) {
            Some(file) => {
                file.permission = PermissionState::Granted;
                true
            }
            None => false,
        };
        if !found {
            return Err(PermissionError::Denied(format!("{} does not exist", name)));
        }
        Ok(self.handle(name))
    }

    fn revive_handle(&self, token: &str) -> Option<MemoryFileHandle> {
        if token.is_empty() || !self.is_supported() {
            return None;
        }
        Some(self.handle(token.to_string()))
    }
}
