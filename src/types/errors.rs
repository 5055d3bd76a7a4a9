use std::fmt;

// === ValidationError ===

/// Rejected user input. Raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the offending field as the UI knows it (`title`, `url`, `parentId`).
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &str, reason: &str) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

// === StorageError ===

/// Failures of the local mirror, the handle store, or the external file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Reading a persisted copy failed.
    ReadFailed(String),
    /// Writing a persisted copy failed.
    WriteFailed(String),
    /// SQLite operation failed.
    DatabaseError(String),
    /// Snapshot could not be encoded.
    SerializationError(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ReadFailed(msg) => write!(f, "Storage read failed: {}", msg),
            StorageError::WriteFailed(msg) => write!(f, "Storage write failed: {}", msg),
            StorageError::DatabaseError(msg) => write!(f, "Storage database error: {}", msg),
            StorageError::SerializationError(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

// === ParseError ===

/// Malformed JSON import or corrupted persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// JSON could not be decoded into a snapshot.
    InvalidJson(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidJson(msg) => write!(f, "Invalid JSON: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

// === PermissionError ===

/// File capability missing, denied, or revoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// No file has been authorized in this environment.
    NotAuthorized,
    /// The user or the platform refused access.
    Denied(String),
    /// A previously granted handle no longer works.
    Revoked(String),
    /// The user dismissed the file picker.
    PickerCancelled,
    /// The environment has no file-access capability.
    Unsupported,
    /// The handle could not be persisted, so authorization was rolled back.
    HandleStore(String),
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionError::NotAuthorized => write!(f, "File storage is not authorized"),
            PermissionError::Denied(msg) => write!(f, "File access denied: {}", msg),
            PermissionError::Revoked(msg) => write!(f, "File access revoked: {}", msg),
            PermissionError::PickerCancelled => write!(f, "File selection cancelled"),
            PermissionError::Unsupported => write!(f, "File access is not supported"),
            PermissionError::HandleStore(msg) => {
                write!(f, "Failed to persist file handle: {}", msg)
            }
        }
    }
}

impl std::error::Error for PermissionError {}

// === NetworkError ===

/// Failures of best-effort page title / favicon lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    InvalidUrl(String),
    RequestFailed(String),
    Timeout(String),
    BadStatus(u16),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            NetworkError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            NetworkError::Timeout(url) => write!(f, "Request timed out: {}", url),
            NetworkError::BadStatus(code) => write!(f, "Unexpected HTTP status: {}", code),
        }
    }
}

impl std::error::Error for NetworkError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => write!(f, "Invalid settings value: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

// === StoreError ===

/// Anything a bookmark store operation can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(ValidationError),
    Storage(StorageError),
    Parse(ParseError),
    Permission(PermissionError),
}

impl StoreError {
    /// Whether the failure came from the file capability rather than the data.
    pub fn is_permission(&self) -> bool {
        matches!(self, StoreError::Permission(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Validation(e) => e.fmt(f),
            StoreError::Storage(e) => e.fmt(f),
            StoreError::Parse(e) => e.fmt(f),
            StoreError::Permission(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Validation(e) => Some(e),
            StoreError::Storage(e) => Some(e),
            StoreError::Parse(e) => Some(e),
            StoreError::Permission(e) => Some(e),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(e: ValidationError) -> Self {
        StoreError::Validation(e)
    }
}

impl From<StorageError> for StoreError {
    fn from(e: StorageError) -> Self {
        StoreError::Storage(e)
    }
}

impl From<ParseError> for StoreError {
    fn from(e: ParseError) -> Self {
        StoreError::Parse(e)
    }
}

impl From<PermissionError> for StoreError {
    fn from(e: PermissionError) -> Self {
        StoreError::Permission(e)
    }
}
