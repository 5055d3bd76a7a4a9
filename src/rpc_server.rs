//! Bookmark tool RPC server: JSON-RPC over stdin/stdout for a UI shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.add", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr so stdout carries protocol lines only.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use bookmark_tool::app::LocalApp;
use bookmark_tool::platform;
use bookmark_tool::rpc_handler::handle_method;
use bookmark_tool::services::logging::init_logging;
use bookmark_tool::services::settings_engine::SettingsEngine;

use serde_json::{json, Value};
use tracing::{error, info};

fn emit(value: &Value) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", value)?;
    stdout.flush()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings_engine = SettingsEngine::new(std::env::var("BOOKMARK_TOOL_CONFIG").ok());
    let settings = settings_engine.load_or_default();
    init_logging(&settings.logging);

    // BOOKMARK_TOOL_DATA_DIR wins over the platform data directory.
    let data_dir = std::env::var("BOOKMARK_TOOL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| platform::get_data_dir());
    std::fs::create_dir_all(&data_dir)?;
    let db_path = LocalApp::database_path(data_dir, &settings);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut app = LocalApp::new(&db_path.to_string_lossy(), settings_engine)?;
        let source = app.startup().await;
        info!(db = %db_path.display(), ?source, "RPC server ready");

        emit(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION"), "source": source}))?;

        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    error!(error = %e, "stdin closed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let req: Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => {
                    emit(&json!({"id": null, "error": format!("parse error: {}", e)}))?;
                    continue;
                }
            };

            let id = req.get("id").cloned().unwrap_or(Value::Null);
            let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
            let params = req.get("params").cloned().unwrap_or(json!({}));

            let response = match handle_method(&mut app, method, &params).await {
                Ok(val) => json!({"id": id, "result": val}),
                Err(err) => json!({"id": id, "error": err}),
            };
            emit(&response)?;
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
