// Chunk: docs/chunks/line_editor - Console line editor
//!
//! Per-call state of a `read_line` session.
//!
//! Everything here is created when a line read starts and dropped when it
//! returns. The fields fall into four groups: the line and what was last
//! painted of it, completion and suggestion state, keypad entry, and mouse
//! selection.

use conline_buffer::LineBuffer;
use conline_input::{Coord, MouseButtons, Rect};

use crate::completion::TabContext;
use crate::numeric_entry::NumericEntry;
use crate::selection::SelectionRenderer;

/// How a read ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Termination {
    Submit,
    Cancel,
}

pub(crate) struct EditorState {
    // ==================== Line and display ====================
    pub line: LineBuffer,
    /// Cursor offset at the last paint.
    pub previous_cursor: usize,
    /// Cells occupied by line plus suggestion at the last paint.
    pub previous_displayed_length: usize,
    /// Console cell that held the cursor at the last paint. The line starts
    /// `previous_cursor` cells before it.
    pub cursor_cell: Coord,
    pub insert_mode: bool,

    // ==================== Completion ====================
    pub suggestion: Vec<char>,
    pub suggestion_dirty: bool,
    /// Whether the suggestion was computed for the current text.
    pub suggestion_computed: bool,
    pub tab_context: Option<TabContext>,
    pub tab_count: usize,
    /// Index into the history source; `None` is the line being typed.
    pub history_cursor: Option<usize>,

    // ==================== Keypad entry ====================
    pub numeric: NumericEntry,

    // ==================== Selection ====================
    pub selection_current: Rect,
    /// Selection as last painted.
    pub selection_previous: Rect,
    pub initial_selection_point: Coord,
    /// Auto-scroll step, in cells per tick, while dragging outside the window.
    pub periodic_scroll: Coord,
    pub mouse_buttons_last: MouseButtons,
    pub renderer: SelectionRenderer,

    // ==================== Loop control ====================
    pub restart_saved: bool,
    pub redisplay_required: bool,
    pub terminate: Option<Termination>,
}

impl EditorState {
    pub fn new(line: LineBuffer, cursor_cell: Coord, insert_mode: bool, renderer: SelectionRenderer) -> Self {
        Self {
            line,
            previous_cursor: 0,
            previous_displayed_length: 0,
            cursor_cell,
            insert_mode,
            suggestion: Vec::new(),
            suggestion_dirty: false,
            suggestion_computed: false,
            tab_context: None,
            tab_count: 0,
            history_cursor: None,
            numeric: NumericEntry::new(),
            selection_current: Rect::EMPTY,
            selection_previous: Rect::EMPTY,
            initial_selection_point: Coord::default(),
            periodic_scroll: Coord::default(),
            mouse_buttons_last: MouseButtons::empty(),
            renderer,
            restart_saved: false,
            redisplay_required: false,
            terminate: None,
        }
    }

    pub fn has_selection(&self) -> bool {
        !self.selection_current.is_empty()
    }

    /// Drops any outstanding suggestion so it is erased at the next paint.
    pub fn discard_suggestion(&mut self) {
        if !self.suggestion.is_empty() {
            self.suggestion.clear();
            self.suggestion_dirty = true;
        }
        self.suggestion_computed = false;
    }

    pub fn clear_selection(&mut self) {
        self.selection_current = Rect::EMPTY;
        self.periodic_scroll = Coord::default();
    }

    /// Follows buffer contents that scrolled up by `lines` rows.
    pub fn scroll_selection_up(&mut self, lines: i32) {
        let shift = |rect: Rect| {
            if rect.is_empty() {
                rect
            } else {
                Rect::new(rect.left, rect.top - lines, rect.right, rect.bottom - lines)
            }
        };
        self.selection_current = shift(self.selection_current);
        self.selection_previous = shift(self.selection_previous);
        self.initial_selection_point.y -= lines;
        self.renderer.scroll_up(lines);
    }

    /// Console cell of `line[0]`, derived from the last paint.
    pub fn anchor(&self, width: i32) -> Coord {
        self.cursor_cell.offset_by(-(self.previous_cursor as i64), width)
    }

    /// Maps a console cell back to an offset in the line. The cell right
    /// after the last character is valid; anything else outside the line is
    /// `None`.
    pub fn offset_for_cell(&self, cell: Coord, width: i32) -> Option<usize> {
        let distance = cell.to_linear(width) - self.anchor(width).to_linear(width);
        if distance < 0 || distance > self.line.len() as i64 {
            return None;
        }
        Some(distance as usize)
    }

    /// Range of the line covered by the current selection, as
    /// `[start, end)` offsets.
    pub fn selected_input_range(&self, width: i32) -> Option<(usize, usize)> {
        if !self.has_selection() {
            return None;
        }
        let anchor = self.anchor(width);
        let mut covered = (0..self.line.len()).filter(|&offset| {
            self.selection_current
                .contains(anchor.offset_by(offset as i64, width))
        });
        let start = covered.next()?;
        let end = covered.last().unwrap_or(start) + 1;
        Some((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(text: &str, cursor_cell: Coord) -> EditorState {
        let mut state = EditorState::new(LineBuffer::from_str(text), cursor_cell, true, SelectionRenderer::new());
        state.previous_cursor = text.chars().count();
        state
    }

    #[test]
    fn test_offset_for_cell_maps_across_rows() {
        // "hello world" painted from (6, 0) on a 10-column buffer wraps after
        // four characters; the cursor sits after the last character.
        let st = state("hello world", Coord::new(7, 1));
        assert_eq!(st.anchor(10), Coord::new(6, 0));
        assert_eq!(st.offset_for_cell(Coord::new(6, 0), 10), Some(0));
        assert_eq!(st.offset_for_cell(Coord::new(0, 1), 10), Some(4));
        assert_eq!(st.offset_for_cell(Coord::new(7, 1), 10), Some(11));
        assert_eq!(st.offset_for_cell(Coord::new(8, 1), 10), None);
        assert_eq!(st.offset_for_cell(Coord::new(5, 0), 10), None);
    }

    #[test]
    fn test_selected_input_range() {
        let mut st = state("cmd arg1 arg2", Coord::new(15, 0));
        assert_eq!(st.selected_input_range(80), None);

        st.selection_current = Rect::new(6, 0, 10, 0);
        assert_eq!(st.selected_input_range(80), Some((4, 9)));

        // A selection ending past the line covers up to the last character.
        st.selection_current = Rect::new(12, 0, 40, 3);
        assert_eq!(st.selected_input_range(80), Some((10, 13)));

        st.selection_current = Rect::new(0, 2, 5, 3);
        assert_eq!(st.selected_input_range(80), None);
    }

    #[test]
    fn test_discard_suggestion_marks_dirty() {
        let mut st = state("di", Coord::new(2, 0));
        st.suggestion = vec!['r'];
        st.suggestion_computed = true;
        st.discard_suggestion();
        assert!(st.suggestion.is_empty());
        assert!(st.suggestion_dirty);
        assert!(!st.suggestion_computed);
    }
}
