// Chunk: docs/chunks/process_buffer_pump - Buffered child process output
//! Error types for the process buffer pump.

use std::io;

use thiserror::Error;

/// Errors surfaced by process buffer operations.
///
/// Pipe breaks and mirror failures are handled inside the pump and never
/// appear here.
#[derive(Debug, Error)]
pub enum PumpError {
    #[error("pipe error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to start {what} thread: {source}")]
    Spawn {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("pump thread panicked")]
    PumpPanicked,
}
