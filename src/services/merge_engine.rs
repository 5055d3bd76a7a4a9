//! Reconciles an imported snapshot against the current collection.
//!
//! Bookmarks are identified by URL, folders by their `(title, path)` pair.
//! Incoming folders dropped as duplicates are mapped onto the folder that
//! already carries their key, so anything imported underneath them lands in
//! the existing folder instead of pointing at an id that was never stored.

use std::collections::{HashMap, HashSet};

use crate::services::validation::unique_id;
use crate::types::bookmark::{Bookmark, Folder};
use crate::types::storage::{MergeResult, StorageData};

/// Structural folder identity. Kept as a tuple so no title can forge another key.
type FolderKey<'a> = (&'a str, &'a [String]);

fn folder_key(folder: &Folder) -> FolderKey<'_> {
    (folder.title.as_str(), folder.path.as_slice())
}

/// Returns the part of `incoming` not already present in `existing`.
///
/// Neither input is modified. Duplicates within `incoming` itself are
/// collapsed to their first occurrence. Ids of accepted records are kept
/// unless they collide with an id already in use.
pub fn merge(existing: &StorageData, incoming: &StorageData) -> MergeResult {
    let mut taken: HashSet<String> = existing
        .bookmarks
        .iter()
        .map(|b| b.id.clone())
        .chain(existing.folders.iter().map(|f| f.id.clone()))
        .collect();

    let mut known_folders: HashMap<FolderKey<'_>, String> = existing
        .folders
        .iter()
        .map(|f| (folder_key(f), f.id.clone()))
        .collect();

    // incoming folder id -> id it ends up with in the merged collection
    let mut id_map: HashMap<&str, String> = HashMap::new();
    let mut new_folders: Vec<Folder> = Vec::new();

    for folder in &incoming.folders {
        let key = folder_key(folder);
        if let Some(target) = known_folders.get(&key) {
            id_map.insert(folder.id.as_str(), target.clone());
            continue;
        }
        let id = claim_id(&folder.id, &mut taken);
        known_folders.insert(key, id.clone());
        id_map.insert(folder.id.as_str(), id.clone());
        new_folders.push(Folder { id, ..folder.clone() });
    }

    for folder in &mut new_folders {
        folder.parent_id = remap_parent(folder.parent_id.as_deref(), &id_map);
    }

    let mut seen_urls: HashSet<&str> = existing.bookmarks.iter().map(|b| b.url.as_str()).collect();
    let mut new_bookmarks: Vec<Bookmark> = Vec::new();

    for bookmark in &incoming.bookmarks {
        if !seen_urls.insert(bookmark.url.as_str()) {
            continue;
        }
        let id = claim_id(&bookmark.id, &mut taken);
        new_bookmarks.push(Bookmark {
            id,
            parent_id: remap_parent(bookmark.parent_id.as_deref(), &id_map),
            ..bookmark.clone()
        });
    }

    MergeResult {
        new_bookmarks,
        new_folders,
    }
}

/// Keeps `id` when it is free, otherwise mints a fresh one. Either way the
/// result is marked as taken.
fn claim_id(id: &str, taken: &mut HashSet<String>) -> String {
    let id = if id.is_empty() || taken.contains(id) {
        unique_id(|candidate| taken.contains(candidate))
    } else {
        id.to_string()
    };
    taken.insert(id.clone());
    id
}

fn remap_parent(parent: Option<&str>, id_map: &HashMap<&str, String>) -> Option<String> {
    parent.map(|p| id_map.get(p).cloned().unwrap_or_else(|| p.to_string()))
}
