//! Reads user-supplied import files into a snapshot.
//!
//! `.json` files are expected to hold `{ "bookmarks": [...], "folders": [...] }`
//! in any state of completeness; every other file is treated as a Netscape
//! bookmark file. Records are normalised so that later stages can rely on
//! every field being present.

use serde_json::{Map, Value};

use crate::services::bookmark_codec;
use crate::services::validation::{now_millis, unique_id};
use crate::types::bookmark::{Bookmark, Folder};
use crate::types::errors::ParseError;
use crate::types::storage::StorageData;

pub const UNTITLED_BOOKMARK: &str = "Untitled bookmark";
pub const UNTITLED_FOLDER: &str = "Untitled folder";
pub const DEFAULT_ICON: &str = "🔖";
pub const DEFAULT_COLOR: &str = "#666666";

/// Import file flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    NetscapeHtml,
}

impl ImportFormat {
    /// Picks the format from the file name's extension.
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.trim().to_ascii_lowercase().ends_with(".json") {
            ImportFormat::Json
        } else {
            ImportFormat::NetscapeHtml
        }
    }
}

/// Decodes an import file according to its name.
pub fn read_import(contents: &str, file_name: &str) -> Result<StorageData, ParseError> {
    match ImportFormat::from_file_name(file_name) {
        ImportFormat::Json => read_json(contents),
        ImportFormat::NetscapeHtml => Ok(bookmark_codec::parse(contents)),
    }
}

/// Decodes a JSON snapshot, tolerating missing or mistyped fields.
///
/// Non-array `bookmarks`/`folders` members are ignored. Bookmarks without a
/// URL are dropped.
pub fn read_json(contents: &str) -> Result<StorageData, ParseError> {
    let value: Value =
        serde_json::from_str(contents).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let root = value
        .as_object()
        .ok_or_else(|| ParseError::InvalidJson("expected a JSON object at the top level".to_string()))?;

    let mut folders: Vec<Folder> = array_of_objects(root, "folders")
        .map(normalize_folder)
        .collect();
    strip_own_titles(&mut folders);
    let bookmarks: Vec<Bookmark> = array_of_objects(root, "bookmarks")
        .filter_map(normalize_bookmark)
        .collect();

    Ok(StorageData::new(bookmarks, folders))
}

fn array_of_objects<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> {
    root.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn string_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn path_field(record: &Map<String, Value>) -> Vec<String> {
    record
        .get("path")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn normalize_bookmark(record: &Map<String, Value>) -> Option<Bookmark> {
    let url = string_field(record, "url")?;
    Some(Bookmark {
        id: string_field(record, "id").unwrap_or_else(|| unique_id(|_| false)),
        title: string_field(record, "title").unwrap_or_else(|| UNTITLED_BOOKMARK.to_string()),
        url,
        icon: string_field(record, "icon").unwrap_or_else(|| DEFAULT_ICON.to_string()),
        color: string_field(record, "color").unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        parent_id: string_field(record, "parentId"),
        path: path_field(record),
        is_pinned: record.get("isPinned").and_then(Value::as_bool).unwrap_or(false),
        created_at: record
            .get("createdAt")
            .and_then(Value::as_i64)
            .filter(|ts| *ts > 0)
            .unwrap_or_else(now_millis),
    })
}

fn normalize_folder(record: &Map<String, Value>) -> Folder {
    Folder {
        id: string_field(record, "id").unwrap_or_else(|| unique_id(|_| false)),
        title: string_field(record, "title").unwrap_or_else(|| UNTITLED_FOLDER.to_string()),
        parent_id: string_field(record, "parentId"),
        path: path_field(record),
    }
}

/// Some exports end every folder's path with the folder's own title. Paths
/// here hold ancestors only, so that trailing title is dropped when all
/// folders in the file carry it.
fn strip_own_titles(folders: &mut [Folder]) {
    let own_title_paths =
        !folders.is_empty() && folders.iter().all(|f| f.path.last() == Some(&f.title));
    if own_title_paths {
        for folder in folders.iter_mut() {
            folder.path.pop();
        }
    }
}
