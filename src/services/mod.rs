// Bookmark tool services
// Self-contained engines: validation, codec, merge, storage tiers, file access, settings, logging.

pub mod bookmark_codec;
pub mod file_access;
pub mod handle_store;
pub mod import_reader;
pub mod local_mirror;
pub mod logging;
pub mod merge_engine;
pub mod page_metadata;
pub mod settings_engine;
pub mod site_style;
pub mod validation;
