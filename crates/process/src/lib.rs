// Chunk: docs/chunks/process_buffer_pump - Buffered child process output

//! conline-process: buffered capture of child process output.
//!
//! Every command the shell runs gets a [`BufferedProcess`] holding two
//! growable byte buffers, one for stdout and one for stderr. A background
//! pump thread moves bytes from the child's pipes into those buffers and on
//! to an optional live mirror.
//!
//! # Pipelines
//!
//! When a command feeds the next one, its buffer is either reused
//! ([`BufferedProcess::append`]) so the next command's output lands after
//! it, or flipped into a pipe source ([`BufferedProcess::forward_to_next`])
//! that replays the captured bytes into the successor's stdin.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use conline_buffer::Codepage;
//! use conline_process::{BufferedProcess, ProcessStreams, StreamKind};
//!
//! let process = BufferedProcess::start(
//!     ProcessStreams::new().stdout(Cursor::new(b"hello".to_vec())),
//! )
//! .unwrap();
//! process.wait_finalize().unwrap();
//! assert_eq!(process.snapshot(StreamKind::Out, Codepage::Utf8), "hello");
//! ```

mod buffered_process;
mod error;
mod event;
mod reader;
mod registry;
mod stream;

pub use buffered_process::{BufferedProcess, ProcessStreams, PumpOptions};
pub use error::PumpError;
pub use event::StreamKind;
pub use registry::BufferRegistry;
