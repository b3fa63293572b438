// Chunk: docs/chunks/line_editor - Console line editor
//!
//! Repainting the input line.
//!
//! A paint brings the console in line with the editor state using as few
//! writes as possible:
//!
//! 1. selection changes are rendered first, so a moving cursor does not
//!    disturb them
//! 2. the dirty part of the line is rewritten, the suggestion is drawn after
//!    the line in the suggestion colour, and cells that used to be occupied
//!    are blanked
//! 3. the cursor is moved to its new cell
//!
//! The line is located on screen relative to where the cursor was left by
//! the previous paint, so output that moved the cursor between paints is
//! never overwritten.
//!
//! When the line grows past the bottom of the buffer the contents scroll up
//! and a selection moves with them. A selection reaching into the rows that
//! scroll off is restored first. A line longer than the whole buffer keeps
//! only its tail on screen.

use std::io;

use conline_buffer::Attr;
use conline_input::Coord;

use crate::console::ConsoleSurface;
use crate::error::EditorError;
use crate::line_editor::Session;

impl Session<'_, '_> {
    pub(crate) fn paint(&mut self) -> Result<(), EditorError> {
        self.state.redisplay_required = false;
        let size = self.console.buffer_size();
        let width = size.x;
        let default_attr = self.console.default_attr();

        let len = self.state.line.len();
        let suggestion_len = self.state.suggestion.len();
        let displayed = len + suggestion_len;

        // Make room below the line before writing anything.
        let furthest = displayed
            .max(self.state.previous_displayed_length)
            .max(self.state.line.cursor());
        let mut anchor = self.state.anchor(width);
        let last_cell = anchor.offset_by(furthest as i64, width);
        if last_cell.y >= size.y {
            let lines = last_cell.y - size.y + 1;
            self.update_selection()?;
            if self.state.has_selection() && self.state.selection_current.top < lines {
                self.state.clear_selection();
                self.update_selection()?;
            }
            self.console.scroll_buffer_up(lines)?;
            self.state.scroll_selection_up(lines);
            self.state.cursor_cell.y -= lines;
            anchor.y -= lines;
        }

        self.update_selection()?;

        let dirty = self.state.line.take_dirty();
        let write_begin = dirty.begin.min(len);
        let write_count = if dirty.is_clean() {
            0
        } else {
            dirty.length.min(len - write_begin)
        };
        if write_count > 0 {
            let at = anchor.offset_by(write_begin as i64, width);
            let chars = &self.state.line.chars()[write_begin..write_begin + write_count];
            write_run(&mut *self.console, at, chars, default_attr, width)?;
        }

        if suggestion_len > 0 && (self.state.suggestion_dirty || !dirty.is_clean()) {
            let at = anchor.offset_by(len as i64, width);
            let attr = Attr::suggestion(default_attr);
            write_run(&mut *self.console, at, &self.state.suggestion, attr, width)?;
        }

        let fill_count = self.state.previous_displayed_length.saturating_sub(displayed);
        if fill_count > 0 {
            let at = anchor.offset_by(displayed as i64, width);
            write_run(&mut *self.console, at, &vec![' '; fill_count], default_attr, width)?;
        }

        let cursor = self.state.line.cursor();
        let cell = anchor.offset_by(cursor as i64, width);
        if cell != self.state.cursor_cell || self.console.cursor_position() != cell {
            self.console.set_cursor_position(clamp_to_buffer(cell, size))?;
        }

        self.state.cursor_cell = cell;
        self.state.previous_cursor = cursor;
        self.state.previous_displayed_length = displayed;
        self.state.suggestion_dirty = false;
        Ok(())
    }

    /// Renders the difference between the painted and the current selection.
    pub(crate) fn update_selection(&mut self) -> Result<(), EditorError> {
        let previous = self.state.selection_previous;
        let current = self.state.selection_current;
        if previous == current {
            return Ok(());
        }
        self.state
            .renderer
            .update(&mut *self.console, previous, current)?;
        self.state.selection_previous = current;
        Ok(())
    }

    /// Moves the cursor to the start of the row after the line, scrolling
    /// the buffer if the line ends on its last row.
    pub(crate) fn emit_newline(&mut self) -> Result<(), EditorError> {
        let size = self.console.buffer_size();
        let end = self
            .state
            .anchor(size.x)
            .offset_by(self.state.line.len() as i64, size.x);
        let mut next = Coord::new(0, end.y + 1);
        if next.y >= size.y {
            let lines = next.y - size.y + 1;
            self.console.scroll_buffer_up(lines)?;
            next.y -= lines;
        }
        let next = clamp_to_buffer(next, size);
        self.console.set_cursor_position(next)?;
        self.state.cursor_cell = next;
        self.state.previous_cursor = 0;
        self.state.previous_displayed_length = 0;
        Ok(())
    }
}

/// Writes `chars` in `attr` from `at`, dropping whatever falls above the
/// top of the buffer.
fn write_run(
    console: &mut dyn ConsoleSurface,
    at: Coord,
    chars: &[char],
    attr: Attr,
    width: i32,
) -> io::Result<()> {
    let above_top = (-at.to_linear(width)).max(0) as usize;
    let visible = chars.get(above_top..).unwrap_or_default();
    if visible.is_empty() {
        return Ok(());
    }
    let at = if above_top > 0 { Coord::new(0, 0) } else { at };
    console.write_chars(at, visible)?;
    console.fill_attr(at, visible.len(), attr)
}

/// The line may extend above the buffer after scrolling; the console cursor
/// cannot.
fn clamp_to_buffer(cell: Coord, size: Coord) -> Coord {
    Coord::new(cell.x.clamp(0, size.x - 1), cell.y.clamp(0, size.y - 1))
}
