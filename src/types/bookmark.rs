use serde::{Deserialize, Serialize};

/// A saved bookmark.
///
/// Field names follow the persisted JSON shape (`parentId`, `isPinned`, ...)
/// so snapshots written by earlier builds of the tool load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Emoji, `data:` URI, or http(s) URL of an image.
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Titles of the enclosing folders, root first.
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub is_pinned: bool,
    /// Milliseconds since the UNIX epoch.
    #[serde(default)]
    pub created_at: i64,
}

/// A folder in the bookmark tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Titles of all ancestors, root first. Does not include `title`.
    #[serde(default)]
    pub path: Vec<String>,
}

impl Folder {
    /// Path a direct child of this folder carries.
    pub fn child_path(&self) -> Vec<String> {
        let mut path = self.path.clone();
        path.push(self.title.clone());
        path
    }
}

/// User input for a new bookmark. `id`, `createdAt` and `path` are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDraft {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
}

/// Partial update for a bookmark; `None` leaves a field untouched.
///
/// `parent_id: Some(None)` moves the bookmark to the root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<String>>,
    #[serde(default)]
    pub is_pinned: Option<bool>,
}

/// User input for a new folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDraft {
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Rename and/or move a folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<String>>,
}

/// Distinguishes an absent `parentId` key from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Option<String>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}
