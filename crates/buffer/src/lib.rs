// Chunk: docs/chunks/input_line - Input line storage with dirty range tracking
// Chunk: docs/chunks/console_attributes - Console colour attributes

//! conline-buffer: text storage and console text primitives for conline.
//!
//! This crate provides the editable input line and the small vocabulary of
//! console text types the editor and the process pump share.
//!
//! # Overview
//!
//! The main type is [`LineBuffer`], which provides:
//! - Character insertion in insert or overwrite mode at the cursor
//! - Backward/forward deletion and range replacement
//! - Growth by quadrupling with a reserved terminator slot
//! - Dirty range tracking to minimize console writes
//!
//! # Example
//!
//! ```
//! use conline_buffer::{LineBuffer, DirtyRange};
//!
//! let mut line = LineBuffer::new();
//! line.insert_str("abc", true).unwrap();
//! assert_eq!(line.text(), "abc");
//! assert_eq!(line.cursor(), 3);
//! assert_eq!(line.take_dirty(), DirtyRange::new(0, 3));
//! ```
//!
//! # Console text
//!
//! - [`Attr`] / [`ConsoleColor`]: packed 16-colour cell attributes
//! - [`Codepage`]: OEM/ANSI/UTF-8 decoding for keypad entry and captured output

mod attr;
mod codepage;
mod line_buffer;
mod types;

pub use attr::{Attr, ConsoleColor};
pub use codepage::Codepage;
pub use line_buffer::{AllocError, LineBuffer};
pub use types::DirtyRange;
