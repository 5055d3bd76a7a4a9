// Bookmark tool logging setup
// Installs a `tracing` subscriber writing to stderr; stdout carries RPC traffic.

use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::types::settings::LoggingSettings;

/// Filter directive derived from settings. `debug = true` wins over `level`.
pub fn filter_directive(settings: &LoggingSettings) -> String {
    if settings.debug {
        return "debug".to_string();
    }
    let level = settings.level.trim();
    if level.is_empty() {
        "info".to_string()
    } else {
        level.to_string()
    }
}

/// Installs the global subscriber once. `RUST_LOG` overrides the settings.
pub fn init_logging(settings: &LoggingSettings) {
    static INIT: OnceLock<()> = OnceLock::new();
    let directive = filter_directive(settings);
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&directive))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();
    });
}
