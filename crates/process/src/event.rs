// Chunk: docs/chunks/process_buffer_pump - Buffered child process output
//! Event types for stream reader communication.
//!
//! This module defines the events that flow from the per-stream reader
//! threads to the pump thread via a crossbeam channel. Receiving from that
//! channel is how the pump waits on both streams at once.

use std::io;

/// Which of a child's output streams an event or buffer refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Out,
    Err,
}

impl StreamKind {
    pub fn name(self) -> &'static str {
        match self {
            StreamKind::Out => "stdout",
            StreamKind::Err => "stderr",
        }
    }
}

/// Events sent from a stream reader thread to the pump thread.
#[derive(Debug)]
pub(crate) enum PumpEvent {
    /// Bytes read from the stream's source pipe.
    Data(StreamKind, Vec<u8>),
    /// The source reported end of file or a broken pipe.
    Closed(StreamKind),
    /// Any other read failure; the pump stops.
    Failed(StreamKind, io::Error),
}
