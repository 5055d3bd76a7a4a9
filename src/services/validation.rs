//! Entity validation and identity helpers.
//!
//! Pure functions: nothing here touches stored state. The store runs these
//! before mutating its collections so a rejected draft leaves no trace.

use chrono::{TimeZone, Utc};
use url::Url;
use uuid::Uuid;

use crate::services::site_style;
use crate::types::bookmark::{Bookmark, BookmarkDraft, FolderDraft};
use crate::types::errors::ValidationError;

/// Returns the current UNIX timestamp in milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Returns the current UNIX timestamp in seconds.
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// `YYYY-MM-DD` (UTC) for a millisecond timestamp. Out-of-range values
/// format as the epoch.
pub fn iso_date(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
        .format("%Y-%m-%d")
        .to_string()
}

/// Fresh id that `is_taken` does not report as already used.
pub fn unique_id<F>(is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    loop {
        let id = Uuid::new_v4().to_string();
        if !is_taken(&id) {
            return id;
        }
    }
}

/// Trimmed, non-empty title.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("title", "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Trimmed URL that parses as an absolute URL.
pub fn validate_url(url: &str) -> Result<String, ValidationError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("url", "must not be empty"));
    }
    Url::parse(trimmed)
        .map_err(|e| ValidationError::new("url", &format!("not an absolute URL ({})", e)))?;
    Ok(trimmed.to_string())
}

/// Checks a bookmark draft and builds the record it describes.
///
/// The record gets a fresh id and `created_at`; icon and colour fall back to
/// the values derived from the URL's hostname. `path` is left empty for the
/// caller to fill from the parent folder.
pub fn validate_bookmark(draft: &BookmarkDraft) -> Result<Bookmark, ValidationError> {
    let title = validate_title(&draft.title)?;
    let url = validate_url(&draft.url)?;

    let icon = match draft.icon.as_deref().map(str::trim) {
        Some(icon) if !icon.is_empty() => icon.to_string(),
        _ => site_style::icon_for_url(&url),
    };
    let color = match draft.color.as_deref().map(str::trim) {
        Some(color) if !color.is_empty() => color.to_string(),
        _ => site_style::color_for_url(&url),
    };

    Ok(Bookmark {
        id: Uuid::new_v4().to_string(),
        title,
        url,
        icon,
        color,
        parent_id: draft.parent_id.clone(),
        path: Vec::new(),
        is_pinned: draft.is_pinned,
        created_at: now_millis(),
    })
}

/// Checks a folder draft, returning the trimmed title.
pub fn validate_folder(draft: &FolderDraft) -> Result<String, ValidationError> {
    validate_title(&draft.title)
}
