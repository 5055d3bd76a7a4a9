// Bookmark tool state managers
// Managers own state: the bookmark collections and the file capability.

pub mod authorization_manager;
pub mod bookmark_store;
