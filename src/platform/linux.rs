// Bookmark tool paths for Linux
// Config: ~/.config/bookmark-tool
// Data:   ~/.local/share/bookmark-tool

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "bookmark-tool";

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// `$XDG_CONFIG_HOME/bookmark-tool` if set, otherwise `~/.config/bookmark-tool`.
pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join(APP_DIR),
        _ => home_dir().join(".config").join(APP_DIR),
    }
}

/// `$XDG_DATA_HOME/bookmark-tool` if set, otherwise `~/.local/share/bookmark-tool`.
pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join(APP_DIR),
        _ => home_dir().join(".local").join("share").join(APP_DIR),
    }
}
