//! Bookmark tool database layer.
//!
//! Provides SQLite connection management and schema migrations. The database
//! backs the local mirror (a key/value table) and the durable file-handle store.
//!
//! # Usage
//!
//! ```no_run
//! use bookmark_tool::database::Database;
//!
//! // Open a persistent database
//! let db = Database::open("bookmark-tool.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
