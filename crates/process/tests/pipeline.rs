//! Integration tests for pipeline stage reuse, forwarding and mirroring.

use std::io::{Cursor, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use conline_buffer::Codepage;
use conline_process::{BufferedProcess, ProcessStreams, PumpOptions, StreamKind};
use crossbeam_channel::{bounded, Receiver};

/// A mirror sink the test can inspect after handing it to the pump.
#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ==================== Stage reuse ====================

#[test]
fn test_append_then_forward_produces_concatenation() {
    let first = BufferedProcess::start(ProcessStreams::new().stdout(Cursor::new(b"hello".to_vec())))
        .unwrap();

    let second = first
        .append(ProcessStreams::new().stdout(Cursor::new(b"world".to_vec())))
        .unwrap();
    drop(first);

    let (mut pipe, successor) = second.forward_to_next(StreamKind::Out).unwrap();
    drop(second);

    let mut forwarded = String::new();
    pipe.read_to_string(&mut forwarded).unwrap();
    assert_eq!(forwarded, "helloworld");

    successor.wait_finalize().unwrap();
    assert!(!successor.is_running());
    assert_eq!(BufferedProcess::reference_count(&successor), 1);
}

#[test]
fn test_forward_of_empty_buffer_closes_immediately() {
    let process = BufferedProcess::start(ProcessStreams::new().stdout(Cursor::new(Vec::new()))).unwrap();
    let (mut pipe, successor) = process.forward_to_next(StreamKind::Out).unwrap();

    let mut forwarded = Vec::new();
    pipe.read_to_end(&mut forwarded).unwrap();
    assert!(forwarded.is_empty());
    successor.wait_finalize().unwrap();
}

#[test]
fn test_forward_larger_than_pipe_buffer() {
    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let process = BufferedProcess::start(ProcessStreams::new().stdout(Cursor::new(data.clone()))).unwrap();
    let (mut pipe, successor) = process.forward_to_next(StreamKind::Out).unwrap();

    let mut forwarded = Vec::new();
    pipe.read_to_end(&mut forwarded).unwrap();
    assert_eq!(forwarded, data);
    successor.wait_finalize().unwrap();
}

#[test]
fn test_successor_closing_early_ends_forward() {
    let process = BufferedProcess::start(
        ProcessStreams::new().stdout(Cursor::new(vec![b'q'; 500_000])),
    )
    .unwrap();
    let (pipe, successor) = process.forward_to_next(StreamKind::Out).unwrap();
    drop(pipe);

    successor.wait_finalize().unwrap();
    assert!(!successor.is_running());
}

// ==================== Mirroring ====================

#[test]
fn test_mirror_receives_live_copy() {
    let sink = SharedSink::default();
    let process = BufferedProcess::start(
        ProcessStreams::new()
            .stdout(Cursor::new(b"live output".to_vec()))
            .mirror_stdout(sink.clone()),
    )
    .unwrap();
    process.wait_finalize().unwrap();

    assert_eq!(sink.contents(), b"live output");
    assert_eq!(process.bytes_sent(StreamKind::Out), process.bytes_populated(StreamKind::Out));
}

#[test]
fn test_pipe_mirror_replays_captured_output() {
    let process = BufferedProcess::start(ProcessStreams::new().stderr(Cursor::new(b"background".to_vec())))
        .unwrap();
    process.wait_finalize().unwrap();

    let sink = SharedSink::default();
    process.pipe_mirror(StreamKind::Err, sink.clone());
    assert_eq!(sink.contents(), b"background");
}

// ==================== Backpressure ====================

/// A child's output pipe: `remaining` bytes of `z`, counting what was read
/// and noting when it is dropped.
struct CountingSource {
    remaining: usize,
    read: Arc<AtomicUsize>,
    dropped: Arc<AtomicBool>,
}

impl CountingSource {
    fn new(len: usize) -> Self {
        Self {
            remaining: len,
            read: Arc::default(),
            dropped: Arc::default(),
        }
    }
}

impl Read for CountingSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.remaining);
        buf[..n].fill(b'z');
        self.remaining -= n;
        self.read.fetch_add(n, Ordering::SeqCst);
        Ok(n)
    }
}

impl Drop for CountingSource {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

/// A mirror whose first write blocks until the test opens the gate.
struct GatedMirror {
    gate: Receiver<()>,
    open: bool,
    received: Arc<AtomicUsize>,
}

impl Write for GatedMirror {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if !self.open {
            let _ = self.gate.recv();
            self.open = true;
        }
        self.received.fetch_add(buf.len(), Ordering::SeqCst);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_stalled_mirror_stops_reading_the_source() {
    const TOTAL: usize = 1 << 20;
    let source = CountingSource::new(TOTAL);
    let read = Arc::clone(&source.read);
    let (gate_tx, gate_rx) = bounded(1);
    let received = Arc::new(AtomicUsize::new(0));

    let process = BufferedProcess::start(
        ProcessStreams::new().stdout(source).mirror_stdout(GatedMirror {
            gate: gate_rx,
            open: false,
            received: Arc::clone(&received),
        }),
    )
    .unwrap();

    thread::sleep(Duration::from_millis(300));
    let read_while_stalled = read.load(Ordering::SeqCst);
    assert!(read_while_stalled > 0);
    assert!(
        read_while_stalled <= 16 * 1024,
        "source drained while the mirror was stalled: {read_while_stalled} bytes"
    );

    gate_tx.send(()).unwrap();
    process.wait_finalize().unwrap();

    assert_eq!(read.load(Ordering::SeqCst), TOTAL);
    assert_eq!(process.bytes_populated(StreamKind::Out), TOTAL);
    assert_eq!(received.load(Ordering::SeqCst), TOTAL);
}

#[test]
fn test_reads_never_exceed_the_capacity_limit() {
    let source = CountingSource::new(1 << 20);
    let read = Arc::clone(&source.read);

    let process = BufferedProcess::start_with(
        ProcessStreams::new().stdout(source),
        PumpOptions {
            capacity_limit: Some(4096),
        },
    )
    .unwrap();
    process.wait_finalize().unwrap();

    assert!(process.terminated_early());
    assert_eq!(process.bytes_populated(StreamKind::Out), 4096);
    assert_eq!(read.load(Ordering::SeqCst), 4096);
}

#[test]
fn test_early_stop_releases_both_sources_before_finalize_returns() {
    let out = CountingSource::new(1 << 20);
    let err = CountingSource::new(1 << 20);
    let out_dropped = Arc::clone(&out.dropped);
    let err_dropped = Arc::clone(&err.dropped);

    let process = BufferedProcess::start_with(
        ProcessStreams::new().stdout(out).stderr(err),
        PumpOptions {
            capacity_limit: Some(4096),
        },
    )
    .unwrap();
    process.wait_finalize().unwrap();

    assert!(process.terminated_early());
    assert!(out_dropped.load(Ordering::SeqCst));
    assert!(err_dropped.load(Ordering::SeqCst));
    assert!(process.is_finished());
}

// ==================== Snapshots ====================

#[test]
fn test_snapshot_is_independent_copy() {
    let process = BufferedProcess::start(ProcessStreams::new().stdout(Cursor::new(b"one".to_vec()))).unwrap();
    process.wait_finalize().unwrap();
    let before = process.snapshot(StreamKind::Out, Codepage::Utf8);

    let process = process
        .append(ProcessStreams::new().stdout(Cursor::new(b" two".to_vec())))
        .unwrap();
    process.wait_finalize().unwrap();

    assert_eq!(before, "one");
    assert_eq!(process.snapshot(StreamKind::Out, Codepage::Utf8), "one two");
}

// ==================== Real children ====================

#[cfg(unix)]
#[test]
fn test_captures_real_child_streams() {
    use std::process::{Command, Stdio};

    let mut child = Command::new("sh")
        .args(["-c", "printf out; printf err >&2"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let streams = ProcessStreams::new()
        .stdout(child.stdout.take().unwrap())
        .stderr(child.stderr.take().unwrap());
    let process = BufferedProcess::start(streams).unwrap();
    child.wait().unwrap();
    process.wait_finalize().unwrap();

    assert_eq!(process.snapshot(StreamKind::Out, Codepage::Utf8), "out");
    assert_eq!(process.snapshot(StreamKind::Err, Codepage::Utf8), "err");
}

#[cfg(unix)]
#[test]
fn test_forward_into_real_child_stdin() {
    use std::process::{Command, Stdio};

    let upstream = BufferedProcess::start(ProcessStreams::new().stdout(Cursor::new(b"b\na\n".to_vec())))
        .unwrap();
    let (pipe, _successor) = upstream.forward_to_next(StreamKind::Out).unwrap();

    let output = Command::new("sort")
        .stdin(Stdio::from(pipe))
        .stdout(Stdio::piped())
        .output()
        .unwrap();
    assert_eq!(output.stdout, b"a\nb\n");
}
