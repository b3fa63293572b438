// Chunk: docs/chunks/process_buffer_pump - Buffered child process output
//! Stream reader threads.
//!
//! Each open source pipe gets a reader thread. A reader only reads after the
//! pump grants it room, and each read is sized by that grant, so a pump that
//! is slow to append (for example because its mirror is stalled) stops the
//! reads and the child blocks on a full pipe. Reads happen here, outside the
//! process buffer mutex.

use std::io::{self, Read};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::error::PumpError;
use crate::event::{PumpEvent, StreamKind};

/// Largest single read from a source pipe.
pub(crate) const READ_CHUNK: usize = 4096;

/// Spawns a thread reading `source` one grant at a time until end of file,
/// a broken pipe, an unrecoverable error, or until the pump stops granting.
///
/// The source is dropped when the thread exits.
pub(crate) fn spawn_reader(
    kind: StreamKind,
    mut source: Box<dyn Read + Send>,
    grants: Receiver<usize>,
    tx: Sender<PumpEvent>,
) -> Result<JoinHandle<()>, PumpError> {
    thread::Builder::new()
        .name(format!("conline-{}-reader", kind.name()))
        .spawn(move || {
            let mut buf = Vec::with_capacity(READ_CHUNK);
            // A closed grant channel means the pump has exited.
            while let Ok(room) = grants.recv() {
                buf.resize(room.clamp(1, READ_CHUNK), 0);
                let event = match read_retrying(&mut source, &mut buf) {
                    // EOF - the writer closed its end
                    Ok(0) => PumpEvent::Closed(kind),
                    Ok(n) => PumpEvent::Data(kind, buf[..n].to_vec()),
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => PumpEvent::Closed(kind),
                    Err(e) => PumpEvent::Failed(kind, e),
                };
                let more = matches!(event, PumpEvent::Data(..));
                if tx.send(event).is_err() || !more {
                    break;
                }
            }
        })
        .map_err(|source| PumpError::Spawn {
            what: "stream reader",
            source,
        })
}

fn read_retrying(source: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match source.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}
