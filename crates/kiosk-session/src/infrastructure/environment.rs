//! Process environment the session depends on.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Directory that holds the display socket.
pub const RUNTIME_DIR_VAR: &str = "XDG_RUNTIME_DIR";

/// Tells clients which display socket to connect to.
pub const DISPLAY_VAR: &str = "WAYLAND_DISPLAY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("XDG_RUNTIME_DIR is not set in the environment")]
    MissingRuntimeDir,

    #[error("XDG_RUNTIME_DIR ({}) is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("refusing to export display name {0:?}")]
    InvalidDisplayName(String),
}

/// Checks that the runtime directory is set and exists.
pub fn validate_runtime_dir(dir: Option<&Path>) -> Result<PathBuf, EnvironmentError> {
    let dir = match dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => return Err(EnvironmentError::MissingRuntimeDir),
    };
    if !dir.is_dir() {
        return Err(EnvironmentError::NotADirectory(dir.to_path_buf()));
    }
    Ok(dir.to_path_buf())
}

/// Serializes tests that change the process environment or fork children.
#[cfg(test)]
pub(crate) static ENVIRONMENT_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Sets `WAYLAND_DISPLAY` so the child inherits it.
///
/// Changes the process environment: no other thread may fork or read the
/// environment at the same time.  The session calls this from its single
/// event loop thread before the child is spawned.
pub fn export_display_name(name: &str) -> Result<(), EnvironmentError> {
    if name.is_empty() || name.contains(['\0', '=']) {
        return Err(EnvironmentError::InvalidDisplayName(name.to_string()));
    }
    std::env::set_var(DISPLAY_VAR, name);
    debug!(display = name, "WAYLAND_DISPLAY exported");
    Ok(())
}
