//! Bookmark tool: a personal bookmark manager with durable local storage.
//!
//! Bookmarks and folders live in memory, are mirrored to a local key/value
//! table and, once the user grants access, to a JSON file of their choice.
//! Netscape bookmark files can be imported and exported.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod services;
pub mod rpc_handler;
pub mod types;
