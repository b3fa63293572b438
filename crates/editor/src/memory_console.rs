// Chunk: docs/chunks/console_surface - Console surface abstraction
//!
//! A deterministic in-memory console.
//!
//! `MemoryConsole` keeps its buffer in a [`ScreenGrid`], reads input from a
//! scripted queue, and captures clipboard writes. It is what the editor's
//! tests drive, and it works for headless use as well.
//!
//! # Scripting input
//!
//! Events are queued with [`MemoryConsole::push_event`] and friends. A
//! [`MemoryConsole::push_pause`] marker splits the queue: the editor sees the
//! events before it, and its next timed wait reports a timeout, which lets
//! tests trigger idle behaviour (suggestions, auto-scroll, restart saves) at
//! an exact point. When the queue runs dry an untimed wait reports
//! [`WaitResult::Error`], i.e. the input was lost.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use conline_buffer::Attr;
use conline_input::{Coord, InputEvent, KeyEvent, Rect};

use crate::console::{clamp_window_origin, ConsoleSurface, CursorShape, WaitResult};
use crate::error::EditorError;
use crate::screen::{Cell, ScreenGrid};

/// Consecutive timed waits on an empty queue before the console gives up.
const MAX_IDLE_TIMEOUTS: usize = 64;

#[derive(Debug, Clone)]
enum Scripted {
    Event(InputEvent),
    Pause,
}

/// One clipboard write captured by the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardCopy {
    pub text: String,
    pub html: String,
}

pub struct MemoryConsole {
    grid: ScreenGrid,
    window_origin: Coord,
    window_size: Coord,
    cursor: Coord,
    cursor_shape: CursorShape,
    default_attr: Attr,
    popup_attr: Option<Attr>,
    script: VecDeque<Scripted>,
    idle_timeouts: usize,
    waits: Vec<Option<Duration>>,
    clipboard: Option<String>,
    clipboard_available: bool,
    copies: Vec<ClipboardCopy>,
}

impl MemoryConsole {
    /// A console whose window shows the whole `width` x `height` buffer.
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_window(width, height, height)
    }

    /// A console with a `width` x `height` buffer and a window showing
    /// `window_rows` rows of it, scrolled to the top.
    pub fn with_window(width: i32, height: i32, window_rows: i32) -> Self {
        let grid = ScreenGrid::new(width, height, Attr::DEFAULT);
        let window_size = Coord::new(grid.width(), window_rows.clamp(1, grid.height()));
        Self {
            grid,
            window_origin: Coord::default(),
            window_size,
            cursor: Coord::default(),
            cursor_shape: CursorShape::default(),
            default_attr: Attr::DEFAULT,
            popup_attr: None,
            script: VecDeque::new(),
            idle_timeouts: 0,
            waits: Vec::new(),
            clipboard: None,
            clipboard_available: true,
            copies: Vec::new(),
        }
    }

    // ==================== Scripting ====================

    pub fn push_event(&mut self, event: InputEvent) {
        self.script.push_back(Scripted::Event(event));
    }

    pub fn push_key(&mut self, key: KeyEvent) {
        self.push_event(InputEvent::Key(key));
    }

    /// Queues one key press per character.
    pub fn push_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.push_key(KeyEvent::char(ch));
        }
    }

    /// Queues an idle period: the next timed wait times out.
    pub fn push_pause(&mut self) {
        self.script.push_back(Scripted::Pause);
    }

    pub fn pending_events(&self) -> usize {
        self.script
            .iter()
            .filter(|s| matches!(s, Scripted::Event(_)))
            .count()
    }

    /// Timeouts passed to each `wait_for_input` call, in order.
    pub fn waits(&self) -> &[Option<Duration>] {
        &self.waits
    }

    // ==================== Setup ====================

    pub fn set_cursor(&mut self, at: Coord) {
        self.cursor = at;
    }

    pub fn set_popup_attr(&mut self, attr: Option<Attr>) {
        self.popup_attr = attr;
    }

    pub fn set_default_attr(&mut self, attr: Attr) {
        self.default_attr = attr;
    }

    /// Writes `text` at `at` in `attr`, as program output would.
    pub fn write_text(&mut self, at: Coord, text: &str, attr: Attr) {
        let chars: Vec<char> = text.chars().collect();
        let written = self.grid.write_chars(at, &chars);
        self.grid.fill_attr(at, written, attr);
    }

    pub fn set_clipboard(&mut self, text: Option<&str>) {
        self.clipboard = text.map(str::to_string);
    }

    /// Makes clipboard writes fail, as when another process holds it.
    pub fn set_clipboard_available(&mut self, available: bool) {
        self.clipboard_available = available;
    }

    /// Resizes the buffer and queues the matching resize event.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.grid.resize(width, height);
        self.window_size = Coord::new(self.grid.width(), self.window_size.y.min(self.grid.height()));
        self.window_origin = clamp_window_origin(self.window_origin, self.window_size, self.grid.size());
        self.push_event(InputEvent::Resize {
            cols: width,
            rows: height,
        });
    }

    // ==================== Inspection ====================

    pub fn copies(&self) -> &[ClipboardCopy] {
        &self.copies
    }

    pub fn cell(&self, at: Coord) -> Option<Cell> {
        self.grid.cell(at)
    }

    pub fn row_text(&self, y: i32) -> String {
        self.grid.row_text(y)
    }

    pub fn grid(&self) -> &ScreenGrid {
        &self.grid
    }

    /// All attributes of the buffer, row-major.
    pub fn all_attrs(&self) -> Vec<Attr> {
        let size = self.grid.size();
        self.grid
            .read_attrs(Coord::new(0, 0), (size.x * size.y) as usize)
    }
}

impl ConsoleSurface for MemoryConsole {
    fn peek_events(&mut self, max: usize) -> io::Result<Vec<InputEvent>> {
        Ok(self
            .script
            .iter()
            .map_while(|s| match s {
                Scripted::Event(e) => Some(e.clone()),
                Scripted::Pause => None,
            })
            .take(max)
            .collect())
    }

    fn consume_events(&mut self, count: usize) {
        for _ in 0..count {
            match self.script.front() {
                Some(Scripted::Event(_)) => {
                    self.script.pop_front();
                }
                _ => break,
            }
        }
    }

    fn wait_for_input(&mut self, timeout: Option<Duration>) -> WaitResult {
        self.waits.push(timeout);
        loop {
            match self.script.front() {
                Some(Scripted::Event(_)) => {
                    self.idle_timeouts = 0;
                    return WaitResult::Ready;
                }
                Some(Scripted::Pause) => {
                    self.script.pop_front();
                    if timeout.is_some() {
                        return WaitResult::Timeout;
                    }
                }
                None => {
                    if timeout.is_none() {
                        return WaitResult::Error;
                    }
                    self.idle_timeouts += 1;
                    if self.idle_timeouts > MAX_IDLE_TIMEOUTS {
                        return WaitResult::Error;
                    }
                    return WaitResult::Timeout;
                }
            }
        }
    }

    fn cursor_position(&self) -> Coord {
        self.cursor
    }

    fn set_cursor_position(&mut self, at: Coord) -> io::Result<()> {
        let size = self.grid.size();
        if at.x < 0 || at.x >= size.x || at.y < 0 || at.y >= size.y {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cursor position {},{} outside buffer", at.x, at.y),
            ));
        }
        self.cursor = at;
        Ok(())
    }

    fn window_rect(&self) -> Rect {
        Rect::new(
            self.window_origin.x,
            self.window_origin.y,
            self.window_origin.x + self.window_size.x - 1,
            self.window_origin.y + self.window_size.y - 1,
        )
    }

    fn set_window_origin(&mut self, top_left: Coord) -> io::Result<()> {
        self.window_origin = clamp_window_origin(top_left, self.window_size, self.grid.size());
        Ok(())
    }

    fn buffer_size(&self) -> Coord {
        self.grid.size()
    }

    fn default_attr(&self) -> Attr {
        self.default_attr
    }

    fn popup_attr(&self) -> Option<Attr> {
        self.popup_attr
    }

    fn write_chars(&mut self, at: Coord, chars: &[char]) -> io::Result<()> {
        self.grid.write_chars(at, chars);
        Ok(())
    }

    fn write_attrs(&mut self, at: Coord, attrs: &[Attr]) -> io::Result<()> {
        self.grid.write_attrs(at, attrs);
        Ok(())
    }

    fn fill_attr(&mut self, at: Coord, count: usize, attr: Attr) -> io::Result<()> {
        self.grid.fill_attr(at, count, attr);
        Ok(())
    }

    fn read_chars(&self, at: Coord, count: usize) -> io::Result<Vec<char>> {
        Ok(self.grid.read_chars(at, count))
    }

    fn read_attrs(&self, at: Coord, count: usize) -> io::Result<Vec<Attr>> {
        Ok(self.grid.read_attrs(at, count))
    }

    fn scroll_buffer_up(&mut self, lines: i32) -> io::Result<()> {
        self.grid.scroll_up(lines);
        Ok(())
    }

    fn cursor_shape(&self) -> CursorShape {
        self.cursor_shape
    }

    fn set_cursor_shape(&mut self, shape: CursorShape) -> io::Result<()> {
        self.cursor_shape = shape;
        Ok(())
    }

    fn paste_text(&mut self) -> Option<String> {
        self.clipboard.clone()
    }

    fn copy_text_and_html(&mut self, text: &str, html: &str) -> Result<(), EditorError> {
        if !self.clipboard_available {
            return Err(EditorError::Clipboard("clipboard is locked".to_string()));
        }
        self.clipboard = Some(text.to_string());
        self.copies.push(ClipboardCopy {
            text: text.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_stops_at_pause() {
        let mut console = MemoryConsole::new(10, 5);
        console.push_text("ab");
        console.push_pause();
        console.push_text("c");

        assert_eq!(console.peek_events(20).unwrap().len(), 2);
        console.consume_events(2);
        assert_eq!(console.wait_for_input(Some(Duration::from_millis(10))), WaitResult::Timeout);
        assert_eq!(console.peek_events(20).unwrap().len(), 1);
    }

    #[test]
    fn test_untimed_wait_skips_pause() {
        let mut console = MemoryConsole::new(10, 5);
        console.push_pause();
        console.push_text("x");
        assert_eq!(console.wait_for_input(None), WaitResult::Ready);
    }

    #[test]
    fn test_empty_queue_is_lost_input() {
        let mut console = MemoryConsole::new(10, 5);
        assert_eq!(console.wait_for_input(None), WaitResult::Error);
        assert_eq!(console.wait_for_input(Some(Duration::from_secs(1))), WaitResult::Timeout);
    }

    #[test]
    fn test_window_origin_is_clamped() {
        let mut console = MemoryConsole::with_window(10, 50, 10);
        console.set_window_origin(Coord::new(0, 45)).unwrap();
        assert_eq!(console.window_rect(), Rect::new(0, 40, 9, 49));
    }

    #[test]
    fn test_clipboard_failure() {
        let mut console = MemoryConsole::new(10, 5);
        console.set_clipboard_available(false);
        assert!(console.copy_text_and_html("a", "<b>a</b>").is_err());
        assert!(console.copies().is_empty());
    }
}
