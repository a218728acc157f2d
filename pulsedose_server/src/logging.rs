//! Tracing subscriber setup: console (pretty or JSON lines), optional file
//! appender from the config's `[logging]` section.

use pulsedose_config::Logging;
use std::sync::OnceLock;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

// Keeps the non-blocking file writer alive for the process lifetime.
static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

pub fn init(level: &str, json: bool, logging: &Logging) -> eyre::Result<()> {
    let level = logging.level.as_deref().unwrap_or(level);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let file_layer = if let Some(path) = logging.file.as_deref() {
        let path = std::path::Path::new(path);
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let name = path.file_name().unwrap_or_else(|| "pulsedose.log".as_ref());
        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        Some(fmt::layer().json().with_writer(writer))
    } else {
        None
    };

    let console = fmt::layer().with_target(true);
    let registry = tracing_subscriber::registry().with(env_filter).with(file_layer);
    if json {
        registry.with(console.json()).init();
    } else {
        registry.with(console).init();
    }
    Ok(())
}
