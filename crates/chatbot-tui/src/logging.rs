//! File logging
//!
//! The terminal belongs to the UI, so tracing output goes to a log file.
//! `RUST_LOG` picks the filter; the default is `info`.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Returns the log path, or `None` if logging is off.
pub fn init(log_path: Option<PathBuf>) -> Option<PathBuf> {
    let path = log_path?;

    if let Err(e) = install(&path) {
        eprintln!("chatbot: logging disabled ({}): {}", path.display(), e);
        return None;
    }
    Some(path)
}

fn install(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    Ok(())
}
