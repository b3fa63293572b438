// Chunk: docs/chunks/shell_bootstrap - Interactive shell entry point and workspace

//! conline: an interactive command shell built on the conline line editor.
//!
//! The heavy lifting lives in the workspace crates; this crate holds the
//! state the shell carries between commands and the glue around it:
//!
//! - [`ShellContext`]: history, aliases, the process buffer registry and
//!   the output encoding
//! - [`restart`]: saving and loading restart state
//! - [`launch`]: running `|` pipelines through process buffers

pub mod launch;
pub mod restart;

use std::io;
use std::path::PathBuf;

use conline_buffer::Codepage;
use conline_editor::{AliasMap, EditorError, EditorHooks, History};
use conline_process::{BufferRegistry, PumpError};
use thiserror::Error;

use crate::restart::RestartState;

/// Failures the shell loop reports.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Pump(#[from] PumpError),

    #[error("failed to launch command: {0}")]
    Launch(#[source] io::Error),

    #[error("restart state I/O failed: {0}")]
    RestartIo(#[source] io::Error),

    #[error("restart state could not be encoded: {0}")]
    RestartFormat(#[from] serde_json::Error),
}

/// State shared by every command the shell runs.
pub struct ShellContext {
    pub buffers: BufferRegistry,
    /// Encoding used to decode captured output.
    pub encoding: Codepage,
    pub history: History,
    pub aliases: AliasMap,
}

impl Default for ShellContext {
    fn default() -> Self {
        Self {
            buffers: BufferRegistry::new(),
            encoding: Codepage::Utf8,
            history: History::new(),
            aliases: AliasMap::new(),
        }
    }
}

impl ShellContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks for one `read_line` call, borrowing the history and aliases.
    pub fn editor_hooks(&self) -> EditorHooks<'_> {
        EditorHooks::new(&self.history, &self.aliases)
    }

    /// Records a committed line in the history.
    pub fn record(&mut self, line: &str) {
        self.history.push(line);
    }

    /// Captures what the next launch needs to pick up where this one left.
    pub fn restart_state(&self) -> RestartState {
        RestartState::new(self.history.to_vec(), std::env::current_dir().ok())
    }

    /// Restores history from a previous launch. Returns the saved working
    /// directory so the caller can decide whether to change into it.
    pub fn apply_restart_state(&mut self, state: RestartState) -> Option<PathBuf> {
        for line in &state.history {
            self.history.push(line);
        }
        state.cwd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conline_editor::HistorySource;

    #[test]
    fn test_record_skips_blank_lines() {
        let mut ctx = ShellContext::new();
        ctx.record("dir");
        ctx.record("   ");
        ctx.record("dir");
        assert_eq!(ctx.history.len(), 1);
    }

    #[test]
    fn test_restart_state_round_trip_through_context() {
        let mut ctx = ShellContext::new();
        ctx.record("echo one");
        ctx.record("echo two");
        let state = ctx.restart_state();

        let mut restored = ShellContext::new();
        restored.apply_restart_state(state);
        assert_eq!(restored.history.to_vec(), vec!["echo one", "echo two"]);
    }
}
