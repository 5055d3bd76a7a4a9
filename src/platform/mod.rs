// Bookmark tool platform abstraction
// Per-OS locations for the settings file and the SQLite database.
//
// Uses `cfg(target_os)` to pick the implementation at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Directory holding `settings.json`.
///
/// - **Linux**: `~/.config/bookmark-tool` (or `$XDG_CONFIG_HOME/bookmark-tool`)
/// - **macOS**: `~/Library/Application Support/BookmarkTool`
/// - **Windows**: `%APPDATA%/BookmarkTool`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Directory holding the SQLite database.
///
/// - **Linux**: `~/.local/share/bookmark-tool` (or `$XDG_DATA_HOME/bookmark-tool`)
/// - **macOS**: `~/Library/Application Support/BookmarkTool`
/// - **Windows**: `%LOCALAPPDATA%/BookmarkTool`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}
