// Chunk: docs/chunks/process_buffer_pump - Buffered child process output
//! Global list of process buffers.
//!
//! The shell records every buffer it starts so that it can periodically join
//! pumps that have already exited. Entries are weak: the list never keeps a
//! buffer alive, and buffers whose last reference is gone drop out on the
//! next sweep.

use std::sync::{Arc, Weak};

use tracing::{debug, warn};

use crate::buffered_process::BufferedProcess;

/// Tracks live process buffers for periodic reaping.
#[derive(Default)]
pub struct BufferRegistry {
    entries: Vec<Weak<BufferedProcess>>,
}

impl BufferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, process: &Arc<BufferedProcess>) {
        self.entries.push(Arc::downgrade(process));
    }

    /// Joins every pump that has exited and forgets freed buffers.
    ///
    /// Returns the number of pumps joined.
    pub fn sweep(&mut self) -> usize {
        let mut joined = 0;
        self.entries.retain(|entry| {
            let Some(process) = entry.upgrade() else {
                return false;
            };
            match process.reap() {
                Ok(true) => joined += 1,
                Ok(false) => {}
                Err(e) => warn!(id = process.id(), error = %e, "pump did not exit cleanly"),
            }
            true
        });
        if joined > 0 {
            debug!(joined, remaining = self.entries.len(), "swept process buffers");
        }
        joined
    }

    /// Number of buffers that still have at least one reference.
    pub fn live_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }
}
