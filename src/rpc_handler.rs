//! RPC method handler for the bookmark tool's JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` maps each method onto a bookmark store operation.
//! Expected failures of file operations (cancelled picker, revoked grant)
//! come back as `{"success": false, "error": ...}` results; malformed
//! requests and rejected input come back as errors.

use serde::Serialize;
use serde_json::{json, Value};

use crate::app::App;
use crate::services::file_access::FileSystemAccess;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::bookmark::{BookmarkDraft, BookmarkPatch, FolderDraft, FolderPatch};
use crate::types::storage::StorageData;

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn opt_str_param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

fn parse_params<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("invalid params: {}", e))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

fn outcome<E: std::fmt::Display>(result: Result<(), E>) -> Value {
    match result {
        Ok(()) => json!({"success": true}),
        Err(e) => json!({"success": false, "error": e.to_string()}),
    }
}

/// Dispatch a JSON-RPC method call to the bookmark store.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method<F: FileSystemAccess>(
    app: &mut App<F>,
    method: &str,
    params: &Value,
) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),

        // ─── Session ───
        "store.load" => {
            let source = app.store.load().await;
            Ok(json!({"source": source}))
        }
        "store.snapshot" => to_json(&app.store.snapshot()),

        // ─── Bookmarks ───
        "bookmark.list" => to_json(&app.store.bookmarks()),
        "bookmark.add" => {
            let draft: BookmarkDraft = parse_params(params.clone())?;
            let bookmark = app.store.add_bookmark(draft).await.map_err(|e| e.to_string())?;
            to_json(&bookmark)
        }
        "bookmark.update" => {
            let id = str_param(params, "id")?;
            let patch: BookmarkPatch = parse_params(params.get("patch").cloned().unwrap_or(json!({})))?;
            let updated = app.store.update_bookmark(id, patch).await.map_err(|e| e.to_string())?;
            to_json(&updated)
        }
        "bookmark.delete" => {
            let id = str_param(params, "id")?;
            Ok(json!({"deleted": app.store.delete_bookmark(id).await}))
        }
        "bookmark.togglePin" => {
            let id = str_param(params, "id")?;
            Ok(json!({"isPinned": app.store.toggle_pin_bookmark(id).await}))
        }
        "bookmark.reorder" => {
            let order: Vec<String> = parse_params(params.get("order").cloned().unwrap_or(json!([])))?;
            app.store.reorder_bookmarks(&order).await;
            Ok(json!({"ok": true}))
        }
        "bookmark.search" => {
            let query = str_param(params, "query")?;
            to_json(&app.store.search_bookmarks(query))
        }
        "bookmark.pinned" => to_json(&app.store.pinned_bookmarks()),

        // ─── Folders ───
        "folder.list" => to_json(&app.store.folders()),
        "folder.add" => {
            let draft: FolderDraft = parse_params(params.clone())?;
            let folder = app.store.add_folder(draft).await.map_err(|e| e.to_string())?;
            to_json(&folder)
        }
        "folder.update" => {
            let id = str_param(params, "id")?;
            let patch: FolderPatch = parse_params(params.get("patch").cloned().unwrap_or(json!({})))?;
            let updated = app.store.update_folder(id, patch).await.map_err(|e| e.to_string())?;
            to_json(&updated)
        }
        "folder.delete" => {
            let id = str_param(params, "id")?;
            Ok(json!({"deleted": app.store.delete_folder(id).await}))
        }
        "folder.contents" => {
            let parent = opt_str_param(params, "parentId");
            to_json(&app.store.folder_contents(parent))
        }
        "folder.byPath" => {
            let path: Vec<String> = parse_params(params.get("path").cloned().unwrap_or(json!([])))?;
            to_json(&app.store.folder_by_path(&path))
        }

        // ─── Import / export ───
        "data.import" => {
            let contents = str_param(params, "contents")?;
            let file_name = opt_str_param(params, "fileName").unwrap_or("bookmarks.html");
            let result = app.store.import_text(contents, file_name).await.map_err(|e| e.to_string())?;
            to_json(&result)
        }
        "data.importItems" => {
            let incoming: StorageData = parse_params(params.clone())?;
            to_json(&app.store.import_bookmarks(incoming).await)
        }
        "data.exportHtml" => Ok(json!({"html": app.store.export_html()})),
        "data.exportJson" => {
            let json = app.store.export_json().map_err(|e| e.to_string())?;
            Ok(json!({"json": json}))
        }
        "data.backup" => Ok(json!({"success": app.store.backup_data().await})),
        "data.importFromFile" => {
            if let Some(path) = opt_str_param(params, "path") {
                app.arm_picker(path)?;
            }
            Ok(outcome(app.store.import_from_file().await))
        }
        "data.exportToFile" => {
            if let Some(path) = opt_str_param(params, "path") {
                app.arm_picker(path)?;
            }
            Ok(outcome(app.store.export_to_file().await))
        }

        // ─── File storage ───
        "storage.request" => {
            if let Some(path) = opt_str_param(params, "path") {
                app.arm_picker(path)?;
            }
            Ok(outcome(app.store.request_file_storage().await))
        }
        "storage.restore" => Ok(outcome(app.store.restore_file_storage().await)),
        "storage.release" => Ok(outcome(app.store.release_file_storage())),
        "storage.status" => {
            let status = app.store.authorization_status().await;
            Ok(json!({
                "supported": status.supported,
                "authorized": status.authorized,
                "fileEnabled": app.store.file_storage_enabled(),
                "lastError": app.store.last_persist_error().map(|e| e.to_string()),
            }))
        }

        // ─── Settings ───
        "settings.get" => to_json(app.settings_engine.get_settings()),
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            app.settings_engine.set_value(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Page metadata ───
        #[cfg(feature = "network")]
        "page.title" => {
            let url = str_param(params, "url")?;
            let timeout = app.settings().network.request_timeout_secs;
            match crate::services::page_metadata::fetch_page_title(url, timeout).await {
                Ok(title) => Ok(json!({"title": title})),
                Err(e) => Ok(json!({"title": null, "error": e.to_string()})),
            }
        }
        #[cfg(feature = "network")]
        "page.favicon" => {
            let url = str_param(params, "url")?;
            let timeout = app.settings().network.request_timeout_secs;
            match crate::services::page_metadata::fetch_favicon(url, timeout).await {
                Ok(icon) => Ok(json!({"icon": icon})),
                Err(e) => Ok(json!({"icon": null, "error": e.to_string()})),
            }
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
