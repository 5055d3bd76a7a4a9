use serde::{Deserialize, Serialize};

/// Access level requested on a file handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    ReadWrite,
}

/// Permission currently reported by a file handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    /// Access lapsed; a user gesture may grant it again.
    Prompt,
    Denied,
}

/// Which dialog a picker request stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerKind {
    Open,
    Save,
}

/// Options passed to a file picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerOptions {
    pub suggested_name: String,
    pub description: String,
    /// Accepted extensions including the dot, e.g. `.json`.
    pub extensions: Vec<String>,
}

impl PickerOptions {
    /// JSON-only picker with the given suggested file name.
    pub fn json(suggested_name: &str) -> Self {
        Self {
            suggested_name: suggested_name.to_string(),
            description: "JSON Files".to_string(),
            extensions: vec![".json".to_string()],
        }
    }
}

/// Authorization state exposed to UI collaborators.
///
/// Local capability state only; never part of an exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationStatus {
    pub supported: bool,
    pub authorized: bool,
}
