// Chunk: docs/chunks/process_buffer_pump - Buffered child process output
//! Buffered capture of a child process's output.
//!
//! A [`BufferedProcess`] captures a child's stdout and stderr into growable
//! byte buffers on a background pump thread, optionally mirroring each
//! stream into a live sink. Once the child finishes, the captured output can
//! be snapshotted as text, appended to by the next command, or forwarded
//! into the stdin of the next process in a pipeline.
//!
//! # Ownership
//!
//! A process buffer is shared through `Arc`. [`BufferedProcess::start`]
//! returns the execution context's reference and hands a second one to the
//! pump thread, so the count starts at two. The pump drops its reference
//! when it exits; the caller drops its own when the output has been
//! consumed. [`BufferedProcess::append`] and
//! [`BufferedProcess::forward_to_next`] each hand out one more reference for
//! the next command. The buffers are freed when the last reference goes.
//!
//! # Locking
//!
//! One mutex covers both streams. The pump holds it while appending,
//! growing and mirroring; reads from the source pipes happen on reader
//! threads without it.
//!
//! # Backpressure
//!
//! A reader reads only after the pump grants it the room left in its
//! stream's buffer, and the pump grants again only once the previous chunk
//! has been appended and mirrored. A stalled mirror therefore stalls the
//! reads, and the child blocks on its full pipe instead of its output
//! piling up in memory.

use std::io::{self, PipeReader, PipeWriter, Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use conline_buffer::Codepage;
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, error, warn};

use crate::error::PumpError;
use crate::event::{PumpEvent, StreamKind};
use crate::reader::spawn_reader;
use crate::stream::{GrowFailed, ProcessStream, MIRROR_CHUNK};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Each reader has at most one event outstanding, so one slot per stream.
const EVENT_SLOTS: usize = 2;

// =============================================================================
// Configuration
// =============================================================================

/// The pipes attached to one command's output.
#[derive(Default)]
pub struct ProcessStreams {
    /// Read end of the child's stdout pipe
    pub stdout: Option<Box<dyn Read + Send>>,
    /// Read end of the child's stderr pipe
    pub stderr: Option<Box<dyn Read + Send>>,
    /// Live copy of stdout, e.g. the console when running in the foreground
    pub stdout_mirror: Option<Box<dyn Write + Send>>,
    /// Live copy of stderr
    pub stderr_mirror: Option<Box<dyn Write + Send>>,
}

impl ProcessStreams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout(mut self, source: impl Read + Send + 'static) -> Self {
        self.stdout = Some(Box::new(source));
        self
    }

    pub fn stderr(mut self, source: impl Read + Send + 'static) -> Self {
        self.stderr = Some(Box::new(source));
        self
    }

    pub fn mirror_stdout(mut self, sink: impl Write + Send + 'static) -> Self {
        self.stdout_mirror = Some(Box::new(sink));
        self
    }

    pub fn mirror_stderr(mut self, sink: impl Write + Send + 'static) -> Self {
        self.stderr_mirror = Some(Box::new(sink));
        self
    }
}

/// Tuning for a process buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpOptions {
    /// Largest allocation either stream may grow to. `None` is unbounded.
    pub capacity_limit: Option<usize>,
}

// =============================================================================
// BufferedProcess
// =============================================================================

struct PumpState {
    out: ProcessStream,
    err: ProcessStream,
    /// A pump or forwarding thread is active.
    running: bool,
    /// The last pump stopped because of an error rather than both pipes closing.
    terminated_early: bool,
}

impl PumpState {
    fn stream(&self, kind: StreamKind) -> &ProcessStream {
        match kind {
            StreamKind::Out => &self.out,
            StreamKind::Err => &self.err,
        }
    }

    fn stream_mut(&mut self, kind: StreamKind) -> &mut ProcessStream {
        match kind {
            StreamKind::Out => &mut self.out,
            StreamKind::Err => &mut self.err,
        }
    }

    fn any_source_open(&self) -> bool {
        self.out.source_open || self.err.source_open
    }
}

/// Threads working on a buffer: the pump (or forwarder) and its readers.
#[derive(Default)]
struct PumpThreads {
    pump: Option<JoinHandle<()>>,
    readers: Vec<JoinHandle<()>>,
}

impl PumpThreads {
    fn is_finished(&self) -> bool {
        self.pump.as_ref().map_or(true, JoinHandle::is_finished)
            && self.readers.iter().all(JoinHandle::is_finished)
    }
}

/// The pump thread's ends of the reader channels.
struct PumpChannels {
    events: Receiver<PumpEvent>,
    out_grants: Option<Sender<usize>>,
    err_grants: Option<Sender<usize>>,
}

impl PumpChannels {
    /// Lets the reader of `kind` read up to `room` more bytes. Returns false
    /// if that reader is gone.
    fn grant(&self, kind: StreamKind, room: usize) -> bool {
        let grants = match kind {
            StreamKind::Out => &self.out_grants,
            StreamKind::Err => &self.err_grants,
        };
        grants.as_ref().is_some_and(|tx| tx.send(room).is_ok())
    }
}

/// Captured output of one command (or a chain of appended commands).
pub struct BufferedProcess {
    id: u64,
    state: Mutex<PumpState>,
    threads: Mutex<PumpThreads>,
}

impl BufferedProcess {
    /// Starts capturing the given streams.
    ///
    /// Returns the execution context's reference; the pump thread holds the
    /// other one until it exits.
    pub fn start(streams: ProcessStreams) -> Result<Arc<Self>, PumpError> {
        Self::start_with(streams, PumpOptions::default())
    }

    /// Like [`BufferedProcess::start`] with explicit options.
    pub fn start_with(streams: ProcessStreams, options: PumpOptions) -> Result<Arc<Self>, PumpError> {
        let process = Arc::new(Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(PumpState {
                out: ProcessStream::new(StreamKind::Out, options.capacity_limit),
                err: ProcessStream::new(StreamKind::Err, options.capacity_limit),
                running: false,
                terminated_early: false,
            }),
            threads: Mutex::new(PumpThreads::default()),
        });
        process.launch_pump(streams)?;
        Ok(process)
    }

    /// Process buffer identifier, unique within this process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of live references (execution contexts plus an active pump).
    pub fn reference_count(this: &Arc<Self>) -> usize {
        Arc::strong_count(this)
    }

    fn lock_state(&self) -> MutexGuard<'_, PumpState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_threads(&self) -> MutexGuard<'_, PumpThreads> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn launch_pump(self: &Arc<Self>, streams: ProcessStreams) -> Result<(), PumpError> {
        let ProcessStreams {
            stdout,
            stderr,
            stdout_mirror,
            stderr_mirror,
        } = streams;

        {
            let mut state = self.lock_state();
            if let Some(mirror) = stdout_mirror {
                state.out.attach_mirror(mirror);
            }
            if let Some(mirror) = stderr_mirror {
                state.err.attach_mirror(mirror);
            }
            state.out.source_open = stdout.is_some();
            state.err.source_open = stderr.is_some();
            state.running = true;
            state.terminated_early = false;
        }

        let (tx, rx) = bounded(EVENT_SLOTS);
        let mut readers = Vec::new();
        let spawned = (|| {
            let mut start = |kind: StreamKind,
                             source: Option<Box<dyn Read + Send>>|
             -> Result<Option<Sender<usize>>, PumpError> {
                let Some(source) = source else {
                    return Ok(None);
                };
                let (grant_tx, grant_rx) = bounded(1);
                readers.push(spawn_reader(kind, source, grant_rx, tx.clone())?);
                Ok(Some(grant_tx))
            };
            let channels = PumpChannels {
                out_grants: start(StreamKind::Out, stdout)?,
                err_grants: start(StreamKind::Err, stderr)?,
                events: rx,
            };
            drop(tx);

            let process = Arc::clone(self);
            thread::Builder::new()
                .name(format!("conline-pump-{}", self.id))
                .spawn(move || process.run_pump(channels))
                .map_err(|source| PumpError::Spawn {
                    what: "pump",
                    source,
                })
        })();

        match spawned {
            Ok(handle) => {
                *self.lock_threads() = PumpThreads {
                    pump: Some(handle),
                    readers,
                };
                debug!(id = self.id, "pump started");
                Ok(())
            }
            Err(e) => {
                // Readers already started see their grant channel close and exit.
                let mut state = self.lock_state();
                state.out.source_open = false;
                state.err.source_open = false;
                state.running = false;
                Err(e)
            }
        }
    }

    /// Body of the pump thread: grants each reader room, then appends
    /// whatever arrives until both sources close or an unrecoverable error
    /// occurs. Dropping `channels` on exit stops the readers.
    fn run_pump(&self, channels: PumpChannels) {
        for kind in [StreamKind::Out, StreamKind::Err] {
            if !self.grant_room(&channels, kind) {
                self.finish_pump();
                return;
            }
        }

        loop {
            if !self.lock_state().any_source_open() {
                break;
            }
            let Ok(event) = channels.events.recv() else {
                break;
            };

            let mut state = self.lock_state();
            match event {
                PumpEvent::Data(kind, bytes) => {
                    let stream = state.stream_mut(kind);
                    let appended = stream.append(&bytes);
                    stream.flush_mirror();
                    if let Err(GrowFailed { dropped }) = appended {
                        warn!(
                            id = self.id,
                            stream = kind.name(),
                            dropped,
                            "capture buffer could not grow; stopping pump"
                        );
                        state.terminated_early = true;
                        break;
                    }
                    drop(state);
                    if !self.grant_room(&channels, kind) {
                        break;
                    }
                }
                PumpEvent::Closed(kind) => {
                    debug!(id = self.id, stream = kind.name(), "source closed");
                    state.stream_mut(kind).source_open = false;
                }
                PumpEvent::Failed(kind, e) => {
                    error!(id = self.id, stream = kind.name(), error = %e, "read failed; stopping pump");
                    state.out.detach_mirror();
                    state.err.detach_mirror();
                    state.terminated_early = true;
                    break;
                }
            }
        }

        self.finish_pump();
    }

    /// Grants the reader of `kind` the room left in its buffer, growing it
    /// if full. Returns false if the pump must stop because the buffer
    /// cannot grow.
    fn grant_room(&self, channels: &PumpChannels, kind: StreamKind) -> bool {
        let mut state = self.lock_state();
        let stream = state.stream_mut(kind);
        if !stream.source_open {
            return true;
        }
        match stream.room() {
            Ok(room) => {
                drop(state);
                // A reader that already exited has sent its last event.
                channels.grant(kind, room);
                true
            }
            Err(_) => {
                warn!(id = self.id, stream = kind.name(), "capture buffer full; stopping pump");
                state.terminated_early = true;
                false
            }
        }
    }

    fn finish_pump(&self) {
        let mut state = self.lock_state();
        state.out.source_open = false;
        state.err.source_open = false;
        state.running = false;
        debug!(
            id = self.id,
            stdout = state.out.bytes_populated(),
            stderr = state.err.bytes_populated(),
            "pump exited"
        );
    }

    /// Body of the forwarding thread: writes everything captured on `kind`
    /// into the successor's stdin pipe, then closes it.
    fn run_forward(&self, kind: StreamKind, mut pipe: PipeWriter) {
        let mut offset = 0;
        loop {
            let chunk = {
                let state = self.lock_state();
                let data = state.stream(kind).contents();
                if offset >= data.len() {
                    break;
                }
                let end = (offset + MIRROR_CHUNK).min(data.len());
                data[offset..end].to_vec()
            };
            if let Err(e) = pipe.write_all(&chunk) {
                debug!(id = self.id, error = %e, "successor stopped reading");
                break;
            }
            offset += chunk.len();
        }

        self.lock_state().running = false;
        debug!(id = self.id, forwarded = offset, "forward complete");
    }

    // ==================== Lifecycle ====================

    /// Waits for the active pump (or forwarding) thread and its readers to
    /// exit. On return the populated counts and source state are final and
    /// every source handle has been dropped.
    ///
    /// A reader blocked in a read when the pump stopped early exits at the
    /// child's next write or exit.
    pub fn wait_finalize(&self) -> Result<(), PumpError> {
        let threads = std::mem::take(&mut *self.lock_threads());
        let mut panicked = false;
        for handle in threads.pump.into_iter().chain(threads.readers) {
            panicked |= handle.join().is_err();
        }
        if panicked {
            return Err(PumpError::PumpPanicked);
        }
        Ok(())
    }

    /// Returns true if no pump, forwarding or reader thread is active.
    pub fn is_finished(&self) -> bool {
        self.lock_threads().is_finished()
    }

    /// Joins the pump thread if it has already exited. Never blocks.
    pub(crate) fn reap(&self) -> Result<bool, PumpError> {
        if self.is_finished() {
            self.wait_finalize()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Reuses this buffer for the next command: waits for the current pump,
    /// then captures `streams` after what is already there.
    ///
    /// Returns the new command's reference.
    pub fn append(self: &Arc<Self>, streams: ProcessStreams) -> Result<Arc<Self>, PumpError> {
        self.wait_finalize()?;
        self.launch_pump(streams)?;
        Ok(Arc::clone(self))
    }

    /// Turns this buffer into the stdin of the next process in a pipeline.
    ///
    /// Waits for the upstream command's pump to exit, creates a pipe, and
    /// starts a thread that writes everything captured on `kind` into it. The
    /// read end is returned for the successor along with the successor's
    /// reference.
    pub fn forward_to_next(
        self: &Arc<Self>,
        kind: StreamKind,
    ) -> Result<(PipeReader, Arc<Self>), PumpError> {
        self.wait_finalize()?;

        let (reader, writer) = io::pipe()?;
        self.lock_state().running = true;

        let process = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(format!("conline-forward-{}", self.id))
            .spawn(move || process.run_forward(kind, writer))
            .map_err(|source| {
                self.lock_state().running = false;
                PumpError::Spawn {
                    what: "forward",
                    source,
                }
            })?;
        *self.lock_threads() = PumpThreads {
            pump: Some(handle),
            readers: Vec::new(),
        };

        Ok((reader, Arc::clone(self)))
    }

    /// Attaches a live mirror to a stream. Output captured so far is
    /// replayed into it first.
    pub fn pipe_mirror(&self, kind: StreamKind, sink: impl Write + Send + 'static) {
        self.lock_state().stream_mut(kind).attach_mirror(Box::new(sink));
    }

    // ==================== Observation ====================

    /// Returns true while a pump or forwarding thread is active.
    pub fn is_running(&self) -> bool {
        self.lock_state().running
    }

    /// Returns true if the last pump stopped on an error.
    pub fn terminated_early(&self) -> bool {
        self.lock_state().terminated_early
    }

    pub fn bytes_populated(&self, kind: StreamKind) -> usize {
        self.lock_state().stream(kind).bytes_populated()
    }

    pub fn bytes_sent(&self, kind: StreamKind) -> usize {
        self.lock_state().stream(kind).bytes_sent()
    }

    pub fn has_mirror(&self, kind: StreamKind) -> bool {
        self.lock_state().stream(kind).has_mirror()
    }

    /// A point-in-time copy of the captured bytes. Does not stop the pump.
    pub fn snapshot_bytes(&self, kind: StreamKind) -> Vec<u8> {
        self.lock_state().stream(kind).contents().to_vec()
    }

    /// A point-in-time copy of the captured output decoded with `encoding`.
    pub fn snapshot(&self, kind: StreamKind, encoding: Codepage) -> String {
        let state = self.lock_state();
        encoding.decode(state.stream(kind).contents())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// A source that fails with a non-pipe error after yielding some bytes.
    struct FailingSource {
        sent: bool,
    }

    impl Read for FailingSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.sent {
                self.sent = true;
                buf[..3].copy_from_slice(b"abc");
                return Ok(3);
            }
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    /// A source that reports a broken pipe instead of EOF.
    struct BrokenPipeSource {
        data: Cursor<Vec<u8>>,
    }

    impl Read for BrokenPipeSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_captures_both_streams() {
        let process = BufferedProcess::start(
            ProcessStreams::new()
                .stdout(Cursor::new(b"out text".to_vec()))
                .stderr(Cursor::new(b"err text".to_vec())),
        )
        .unwrap();
        process.wait_finalize().unwrap();

        assert_eq!(process.snapshot(StreamKind::Out, Codepage::Utf8), "out text");
        assert_eq!(process.snapshot(StreamKind::Err, Codepage::Utf8), "err text");
        assert!(!process.is_running());
        assert!(!process.terminated_early());
    }

    #[test]
    fn test_broken_pipe_closes_only_that_stream() {
        let process = BufferedProcess::start(
            ProcessStreams::new()
                .stdout(BrokenPipeSource {
                    data: Cursor::new(b"partial".to_vec()),
                })
                .stderr(Cursor::new(b"still here".to_vec())),
        )
        .unwrap();
        process.wait_finalize().unwrap();

        assert_eq!(process.snapshot_bytes(StreamKind::Out), b"partial");
        assert_eq!(process.snapshot_bytes(StreamKind::Err), b"still here");
        assert!(!process.terminated_early());
    }

    #[test]
    fn test_read_error_stops_pump_and_detaches_mirror() {
        let process = BufferedProcess::start(
            ProcessStreams::new()
                .stdout(FailingSource { sent: false })
                .mirror_stdout(Vec::new()),
        )
        .unwrap();
        process.wait_finalize().unwrap();

        assert!(process.terminated_early());
        assert!(!process.has_mirror(StreamKind::Out));
        assert_eq!(process.snapshot_bytes(StreamKind::Out), b"abc");
    }

    #[test]
    fn test_grow_failure_keeps_partial_buffer() {
        let big = vec![b'x'; 10_000];
        let process = BufferedProcess::start_with(
            ProcessStreams::new().stdout(Cursor::new(big)),
            PumpOptions {
                capacity_limit: Some(4096),
            },
        )
        .unwrap();
        process.wait_finalize().unwrap();

        assert!(process.terminated_early());
        assert_eq!(process.bytes_populated(StreamKind::Out), 4096);
    }

    #[test]
    fn test_reference_count_returns_to_one_after_pump_exits() {
        let process =
            BufferedProcess::start(ProcessStreams::new().stdout(Cursor::new(b"x".to_vec()))).unwrap();
        process.wait_finalize().unwrap();
        assert_eq!(BufferedProcess::reference_count(&process), 1);
    }

    #[test]
    fn test_no_sources_finishes_immediately() {
        let process = BufferedProcess::start(ProcessStreams::new()).unwrap();
        process.wait_finalize().unwrap();
        assert_eq!(process.bytes_populated(StreamKind::Out), 0);
        assert!(process.is_finished());
    }

    #[test]
    fn test_snapshot_decodes_with_oem_codepage() {
        let process =
            BufferedProcess::start(ProcessStreams::new().stdout(Cursor::new(vec![b'a', 0x82]))).unwrap();
        process.wait_finalize().unwrap();
        assert_eq!(process.snapshot(StreamKind::Out, Codepage::Oem437), "aé");
    }
}
