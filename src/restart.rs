// Chunk: docs/chunks/restart_state - Restart state persistence
//!
//! Restart state for the shell.
//!
//! While the user sits idle at the prompt, the line editor asks the shell to
//! save enough state to come back after a restart: the command history and
//! the working directory. The next launch loads it and carries on.
//!
//! ## File Location
//!
//! The state is stored at `<data dir>/conline/restart.json`, e.g.
//! `~/.local/share/conline/restart.json` on Linux.
//!
//! ## Schema Version
//!
//! The file carries a schema version. A file written by a different version
//! is ignored and the shell starts fresh.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ShellError;

/// Current schema version for the restart file.
///
/// Increment this when making breaking changes to the format.
const SCHEMA_VERSION: u32 = 1;

const APP_NAME: &str = "conline";

const RESTART_FILENAME: &str = "restart.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartState {
    pub schema_version: u32,
    /// Entered lines, oldest first.
    pub history: Vec<String>,
    /// Working directory at the time of the save.
    pub cwd: Option<PathBuf>,
}

impl RestartState {
    pub fn new(history: Vec<String>, cwd: Option<PathBuf>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            history,
            cwd,
        }
    }
}

/// Returns the path of the restart file, or `None` if the platform has no
/// data directory.
pub fn restart_file_path() -> Option<PathBuf> {
    let data_dir = dirs::data_dir()?;
    Some(data_dir.join(APP_NAME).join(RESTART_FILENAME))
}

/// Writes `state` to `path` atomically: the JSON goes to a temporary file
/// next to it, which is then renamed over the old one.
pub fn save_restart_state(path: &Path, state: &RestartState) -> Result<(), ShellError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(ShellError::RestartIo)?;
    }
    let json = serde_json::to_string_pretty(state)?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, json).map_err(ShellError::RestartIo)?;
    fs::rename(&temp_path, path).map_err(ShellError::RestartIo)?;
    debug!(path = %path.display(), entries = state.history.len(), "saved restart state");
    Ok(())
}

/// Loads the restart state from `path`.
///
/// Returns `None` if the file is missing, unreadable, malformed, or from a
/// different schema version.
pub fn load_restart_state(path: &Path) -> Option<RestartState> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read restart state");
            return None;
        }
    };

    let state: RestartState = match serde_json::from_str(&contents) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse restart state");
            return None;
        }
    };

    if state.schema_version != SCHEMA_VERSION {
        warn!(
            expected = SCHEMA_VERSION,
            found = state.schema_version,
            "restart state schema version mismatch"
        );
        return None;
    }

    Some(state)
}
