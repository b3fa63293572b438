// Chunk: docs/chunks/process_buffer_pump - Buffered child process output
//! Per-stream capture buffer.
//!
//! A `ProcessStream` holds everything captured from one of a child's output
//! streams, plus the optional mirror that receives a live copy. All access
//! happens under the owning process's mutex.

use std::io::{self, Write};

use tracing::debug;

use crate::event::StreamKind;

/// Initial capture allocation.
pub(crate) const INITIAL_CAPACITY: usize = 1024;
/// Allocation growth factor when the buffer fills.
const GROWTH_FACTOR: usize = 4;
/// Largest single write into a mirror.
pub(crate) const MIRROR_CHUNK: usize = 4096;

/// Growing the capture buffer failed; the bytes that did not fit were dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GrowFailed {
    pub dropped: usize,
}

/// Captured output for one stream.
pub(crate) struct ProcessStream {
    kind: StreamKind,
    /// Captured bytes; `buffer.len()` is the populated count.
    buffer: Vec<u8>,
    /// Logical allocation, grown by 4x when full.
    allocated: usize,
    /// Upper bound on `allocated`, beyond which growth fails.
    limit: Option<usize>,
    /// Whether a source is attached and has not yet closed.
    pub(crate) source_open: bool,
    mirror: Option<Box<dyn Write + Send>>,
    bytes_sent: usize,
}

impl ProcessStream {
    pub(crate) fn new(kind: StreamKind, limit: Option<usize>) -> Self {
        Self {
            kind,
            buffer: Vec::with_capacity(INITIAL_CAPACITY),
            allocated: INITIAL_CAPACITY,
            limit,
            source_open: false,
            mirror: None,
            bytes_sent: 0,
        }
    }

    pub(crate) fn bytes_populated(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    #[cfg(test)]
    pub(crate) fn allocated(&self) -> usize {
        self.allocated
    }

    pub(crate) fn has_mirror(&self) -> bool {
        self.mirror.is_some()
    }

    pub(crate) fn contents(&self) -> &[u8] {
        &self.buffer
    }

    /// Grows the allocation by 4x.
    fn grow(&mut self) -> bool {
        let Some(new_allocated) = self.allocated.checked_mul(GROWTH_FACTOR) else {
            return false;
        };
        if self.limit.is_some_and(|limit| new_allocated > limit) {
            return false;
        }
        if self
            .buffer
            .try_reserve_exact(new_allocated - self.buffer.len())
            .is_err()
        {
            return false;
        }
        self.allocated = new_allocated;
        true
    }

    /// Appends bytes read from the source, growing as the buffer fills. On
    /// growth failure everything that fit is kept.
    pub(crate) fn append(&mut self, mut data: &[u8]) -> Result<(), GrowFailed> {
        while !data.is_empty() {
            let room = self.allocated - self.buffer.len();
            let take = room.min(data.len());
            self.buffer.extend_from_slice(&data[..take]);
            data = &data[take..];

            if self.buffer.len() == self.allocated && !self.grow() {
                if data.is_empty() {
                    // Full but nothing is waiting; the next append will retry.
                    return Ok(());
                }
                return Err(GrowFailed {
                    dropped: data.len(),
                });
            }
        }
        Ok(())
    }

    /// Room for the next read (`allocated - populated`), growing first if
    /// the buffer is full.
    pub(crate) fn room(&mut self) -> Result<usize, GrowFailed> {
        if self.buffer.len() == self.allocated && !self.grow() {
            return Err(GrowFailed { dropped: 0 });
        }
        Ok(self.allocated - self.buffer.len())
    }

    /// Attaches a mirror. Everything captured so far is replayed into it.
    pub(crate) fn attach_mirror(&mut self, mirror: Box<dyn Write + Send>) {
        self.mirror = Some(mirror);
        self.bytes_sent = 0;
        self.flush_mirror();
    }

    pub(crate) fn detach_mirror(&mut self) {
        self.mirror = None;
        self.bytes_sent = 0;
    }

    /// Writes captured-but-unmirrored bytes into the mirror in 4 KiB chunks.
    /// A failed write detaches the mirror silently.
    pub(crate) fn flush_mirror(&mut self) {
        let Some(mirror) = self.mirror.as_mut() else {
            return;
        };

        let mut failed = false;
        while self.bytes_sent < self.buffer.len() {
            let end = (self.bytes_sent + MIRROR_CHUNK).min(self.buffer.len());
            match mirror.write(&self.buffer[self.bytes_sent..end]) {
                Ok(0) => {
                    failed = true;
                    break;
                }
                Ok(n) => self.bytes_sent += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(stream = self.kind.name(), error = %e, "mirror write failed");
                    failed = true;
                    break;
                }
            }
        }

        if failed || mirror.flush().is_err() {
            debug!(stream = self.kind.name(), "detaching mirror");
            self.mirror = None;
            self.bytes_sent = 0;
        }
    }
}
