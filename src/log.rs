// src/log.rs
//
// Log macros keep the short `logf!`/`logd!`/`logw!`/`loge!` call shape and
// forward to `tracing`. `init` points the subscriber at the debug log file;
// without it events go nowhere, which is what tests want.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use tracing::Level;

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Install a file-backed subscriber. Safe to call more than once; only the
/// first call wins.
pub fn init(path: &Path, verbose: bool) -> std::io::Result<()> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let installed = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level)
        .try_init()
        .is_ok();

    if installed {
        let _ = INSTALLED.set(());
    }
    Ok(())
}

/// Info-level logging
#[macro_export]
macro_rules! logf {
    ($($arg:tt)*) => {
        ::tracing::info!("{}", format!($($arg)*))
    };
}

/// Debug-level logging
#[macro_export]
macro_rules! logd {
    ($($arg:tt)*) => {
        ::tracing::debug!("{}", format!($($arg)*))
    };
}

/// Warn-level logging
#[macro_export]
macro_rules! logw {
    ($($arg:tt)*) => {
        ::tracing::warn!("{}", format!($($arg)*))
    };
}

/// Error-level logging
#[macro_export]
macro_rules! loge {
    ($($arg:tt)*) => {
        ::tracing::error!("{}", format!($($arg)*))
    };
}
