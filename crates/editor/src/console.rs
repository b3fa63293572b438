// Chunk: docs/chunks/console_surface - Console surface abstraction
//!
//! The console surface the line editor drives.
//!
//! Everything the editor does to the screen goes through [`ConsoleSurface`]:
//! reading input events, reading and writing cells, moving the cursor,
//! scrolling, and the clipboard. Real and test implementations are
//! interchangeable; see [`crate::MemoryConsole`] and
//! [`crate::CrosstermConsole`].
//!
//! All coordinates are buffer coordinates. Row- and cell-oriented writes run
//! linearly from the starting cell, wrapping at the buffer width, and are
//! clipped at the end of the buffer.

use std::io;
use std::time::Duration;

use conline_buffer::Attr;
use conline_input::{Coord, InputEvent, Rect};

use crate::error::EditorError;

/// Outcome of waiting for console input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    /// At least one event is ready to be peeked.
    Ready,
    /// The timeout elapsed with no input.
    Timeout,
    /// The input handle failed; no more events will arrive.
    Error,
}

/// Console cursor shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    Hidden,
    /// Thin cursor (20% of the cell) used in insert mode.
    #[default]
    Insert,
    /// Half-cell cursor (50%) used in overwrite mode.
    Overwrite,
}

impl CursorShape {
    pub fn for_insert_mode(insert_mode: bool) -> Self {
        if insert_mode {
            CursorShape::Insert
        } else {
            CursorShape::Overwrite
        }
    }

    /// Cursor height as a percentage of the cell.
    pub fn percent(self) -> u8 {
        match self {
            CursorShape::Hidden => 0,
            CursorShape::Insert => 20,
            CursorShape::Overwrite => 50,
        }
    }
}

/// The capability set the line editor needs from a console.
pub trait ConsoleSurface {
    // ==================== Input ====================

    /// Returns up to `max` pending events without removing them. Never blocks.
    fn peek_events(&mut self, max: usize) -> io::Result<Vec<InputEvent>>;

    /// Removes the first `count` pending events.
    fn consume_events(&mut self, count: usize);

    /// Blocks until input is available or `timeout` elapses. `None` waits
    /// indefinitely.
    fn wait_for_input(&mut self, timeout: Option<Duration>) -> WaitResult;

    // ==================== Geometry ====================

    fn cursor_position(&self) -> Coord;

    fn set_cursor_position(&mut self, at: Coord) -> io::Result<()>;

    /// Visible part of the buffer, inclusive.
    fn window_rect(&self) -> Rect;

    /// Moves the visible window so its top-left cell is `top_left`, clamped
    /// so the window stays inside the buffer.
    fn set_window_origin(&mut self, top_left: Coord) -> io::Result<()>;

    /// Buffer dimensions as (columns, rows).
    fn buffer_size(&self) -> Coord;

    // ==================== Cells ====================

    fn default_attr(&self) -> Attr;

    /// The console's popup colours, used to paint selections, if configured.
    fn popup_attr(&self) -> Option<Attr>;

    fn write_chars(&mut self, at: Coord, chars: &[char]) -> io::Result<()>;

    fn write_attrs(&mut self, at: Coord, attrs: &[Attr]) -> io::Result<()>;

    fn fill_attr(&mut self, at: Coord, count: usize, attr: Attr) -> io::Result<()>;

    fn read_chars(&self, at: Coord, count: usize) -> io::Result<Vec<char>>;

    fn read_attrs(&self, at: Coord, count: usize) -> io::Result<Vec<Attr>>;

    /// Scrolls the buffer contents up by `lines`; new bottom rows are blank.
    fn scroll_buffer_up(&mut self, lines: i32) -> io::Result<()>;

    // ==================== Cursor shape ====================

    fn cursor_shape(&self) -> CursorShape;

    fn set_cursor_shape(&mut self, shape: CursorShape) -> io::Result<()>;

    // ==================== Clipboard ====================

    /// Plain text currently on the clipboard, if any.
    fn paste_text(&mut self) -> Option<String>;

    /// Places both a plain-text and an HTML rendering on the clipboard.
    fn copy_text_and_html(&mut self, text: &str, html: &str) -> Result<(), EditorError>;
}

/// Clamps a window origin so a window of `window_size` stays within a buffer
/// of `buffer_size`.
pub fn clamp_window_origin(origin: Coord, window_size: Coord, buffer_size: Coord) -> Coord {
    let max_x = (buffer_size.x - window_size.x).max(0);
    let max_y = (buffer_size.y - window_size.y).max(0);
    Coord::new(origin.x.clamp(0, max_x), origin.y.clamp(0, max_y))
}
