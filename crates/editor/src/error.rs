// Chunk: docs/chunks/line_editor - Console line editor
//! Error types for the line editor.

use std::io;

use thiserror::Error;

/// Failures that end a `read_line` call or a clipboard operation.
///
/// Allocation failures while editing never appear here: the offending key
/// is dropped and the line stays as it was.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("console I/O failed: {0}")]
    Console(#[from] io::Error),

    #[error("console input was lost")]
    InputLost,

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("no saved attributes for the selection")]
    NoSavedAttributes,
}
