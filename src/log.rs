// src/log.rs
// Debug log goes to `.store/debug.log`; console output is the CLI's job.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::consts::{LOG_FILE, STORE_DIR};
use crate::errors::Result;
use crate::file::ensure_directory;

/// Install the global subscriber. Level comes from `RUST_LOG` (default `info`).
/// Returns the log file path.
pub fn init(base_dir: &Path) -> Result<PathBuf> {
    let dir = base_dir.join(STORE_DIR);
    ensure_directory(&dir)?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (e.g. embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
    Ok(path)
}
