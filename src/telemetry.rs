// ABOUTME: Diagnostic logging setup — tracing events go to a file because the TUI owns the terminal.
// ABOUTME: Filter comes from DEBATEMATE_LOG, falling back to the configured level.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "DEBATEMATE_LOG";

/// Install the global tracing subscriber writing to `<dir>/debatemate.log`.
/// Returns the log file path.
pub fn init(dir: &Path, default_level: &str) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join("debatemate.log");
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;

    Ok(path)
}
