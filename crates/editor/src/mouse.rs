// Chunk: docs/chunks/selection_rendering - Selection rendering and clipboard
//!
//! Mouse handling and copying the selection.
//!
//! Mouse events carry the full button state, so presses and releases are
//! found by comparing against the buttons seen last time. Selections are
//! rectangles in buffer coordinates; dragging past the window edge starts
//! auto-scroll, which the read loop drives on a timer.

use conline_input::{Coord, MouseButtons, MouseEvent, MouseEventFlags, Rect};
use tracing::{debug, warn};

use crate::config::WHEEL_UNITS_PER_LINE;
use crate::copy_format::{plain_text, vt_stream, vt_to_html, SelectedRow};
use crate::error::EditorError;
use crate::line_editor::Session;
use crate::selection::{distance_outside, scroll_window};

/// Characters that end a double-click word selection.
const BREAK_CHARS: [char; 5] = [' ', '>', '<', '|', '│'];

fn is_break_char(ch: char) -> bool {
    BREAK_CHARS.contains(&ch)
}

impl Session<'_, '_> {
    pub(crate) fn on_mouse(&mut self, event: &MouseEvent) -> Result<(), EditorError> {
        let last = self.state.mouse_buttons_last;
        let pressed = event.buttons & !last;
        let released = last & !event.buttons;
        self.state.mouse_buttons_last = event.buttons;

        if event.flags.contains(MouseEventFlags::WHEELED) {
            return self.on_wheel(event.wheel_delta);
        }
        if event.flags.contains(MouseEventFlags::DOUBLE_CLICK) {
            if event.buttons.contains(MouseButtons::LEFT) {
                self.on_double_click(event.position)?;
            }
            return Ok(());
        }

        if pressed.contains(MouseButtons::LEFT) {
            self.on_left_press(event.position);
        }
        if event.flags.contains(MouseEventFlags::MOVED) && event.buttons.contains(MouseButtons::LEFT) {
            self.on_drag(event.position)?;
        }
        if released.contains(MouseButtons::LEFT) {
            self.state.periodic_scroll = Coord::default();
        }
        if pressed.contains(MouseButtons::RIGHT) {
            self.on_right_press()?;
        }
        Ok(())
    }

    fn on_left_press(&mut self, position: Coord) {
        self.state.clear_selection();
        self.state.initial_selection_point = position;
        let width = self.console.buffer_size().x;
        if let Some(offset) = self.state.offset_for_cell(position, width) {
            self.state.line.set_cursor(offset);
        }
        self.state.redisplay_required = true;
    }

    fn on_drag(&mut self, position: Coord) -> Result<(), EditorError> {
        self.state.selection_current = Rect::spanning(self.state.initial_selection_point, position);
        let outside = distance_outside(self.console.window_rect(), position);
        self.state.periodic_scroll = outside;
        if outside != Coord::default() {
            scroll_window(&mut *self.console, outside)?;
        }
        self.state.redisplay_required = true;
        Ok(())
    }

    fn on_double_click(&mut self, position: Coord) -> Result<(), EditorError> {
        let width = self.console.buffer_size().x;
        let row = self.console.read_chars(Coord::new(0, position.y), width as usize)?;
        let x = position.x as usize;
        let Some(&clicked) = row.get(x) else {
            return Ok(());
        };
        if is_break_char(clicked) {
            return Ok(());
        }

        let left = row[..x]
            .iter()
            .rposition(|&c| is_break_char(c))
            .map_or(0, |i| i + 1);
        let right = row[x..]
            .iter()
            .position(|&c| is_break_char(c))
            .map_or(row.len() - 1, |i| x + i - 1);

        self.state.selection_current = Rect::new(left as i32, position.y, right as i32, position.y);
        self.state.periodic_scroll = Coord::default();
        if let Some(offset) = self.state.offset_for_cell(position, width) {
            self.state.line.set_cursor(offset);
        }
        self.state.redisplay_required = true;
        Ok(())
    }

    fn on_right_press(&mut self) -> Result<(), EditorError> {
        if self.state.has_selection() {
            self.copy_selection()?;
        } else {
            let Some(text) = self.console.paste_text() else {
                return Ok(());
            };
            let chars = crate::line_editor::normalize_paste(&text);
            self.insert_chars(&chars);
        }
        self.state.redisplay_required = true;
        Ok(())
    }

    fn on_wheel(&mut self, delta: i16) -> Result<(), EditorError> {
        let lines = i32::from(delta) / WHEEL_UNITS_PER_LINE;
        // Positive deltas roll away from the user, towards older output.
        scroll_window(&mut *self.console, Coord::new(0, -lines))?;
        Ok(())
    }

    /// The buffer was resized: saved attributes no longer describe the screen.
    pub(crate) fn on_resize(&mut self) {
        self.state.clear_selection();
        self.state.selection_previous = Rect::EMPTY;
        self.state.renderer.invalidate();
        self.state.redisplay_required = true;
    }

    // =========================================================================
    // Copy
    // =========================================================================

    /// Copies the selection as plain text and HTML and clears it.
    ///
    /// If no attributes were saved for the selection, or the clipboard
    /// refuses the write, the selection is kept so the user can retry.
    pub(crate) fn copy_selection(&mut self) -> Result<(), EditorError> {
        self.update_selection()?;
        match self.selected_rows() {
            Ok(rows) => {
                let text = plain_text(&rows);
                let html = vt_to_html(&vt_stream(&rows));
                match self.console.copy_text_and_html(&text, &html) {
                    Ok(()) => {
                        debug!(rows = rows.len(), "copied selection");
                        self.state.clear_selection();
                        self.state.redisplay_required = true;
                    }
                    Err(e) => warn!(error = %e, "copy failed"),
                }
                Ok(())
            }
            Err(EditorError::NoSavedAttributes) => {
                warn!("copy failed: no saved attributes");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Characters from the console and attributes from the saved buffer for
    /// each selected row.
    fn selected_rows(&self) -> Result<Vec<SelectedRow>, EditorError> {
        let (rect, saved) = self
            .state
            .renderer
            .saved()
            .ok_or(EditorError::NoSavedAttributes)?;
        let width = rect.width() as usize;
        (rect.top..=rect.bottom)
            .zip(saved.chunks(width))
            .map(|(y, attrs)| {
                let chars = self.console.read_chars(Coord::new(rect.left, y), width)?;
                Ok(SelectedRow {
                    chars,
                    attrs: attrs.to_vec(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasMap;
    use crate::console::ConsoleSurface;
    use crate::history::History;
    use crate::line_editor::LineEditor;
    use crate::memory_console::MemoryConsole;
    use conline_buffer::Attr;
    use conline_input::InputEvent;

    fn mouse(session: &mut Session<'_, '_>, event: MouseEvent) {
        session.on_mouse(&event).expect("mouse event should succeed");
        session.paint().expect("paint should succeed");
    }

    fn console_with_output() -> MemoryConsole {
        let mut console = MemoryConsole::with_window(30, 40, 10);
        console.write_text(Coord::new(0, 0), "dir  foo.txt  bar|baz", Attr::DEFAULT);
        console.write_text(Coord::new(0, 1), "alpha beta", Attr(0x0A));
        console.set_cursor(Coord::new(0, 3));
        console
    }

    // ==================== Selection ====================

    #[test]
    fn test_drag_selects_and_release_stops_scroll() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = console_with_output();
        let mut s = Session::for_test(&mut editor, &mut console, &history, &aliases);

        mouse(&mut s, MouseEvent::buttons(Coord::new(1, 0), MouseButtons::LEFT));
        mouse(&mut s, MouseEvent::moved(Coord::new(4, 1), MouseButtons::LEFT));
        assert_eq!(s.state.selection_current, Rect::new(1, 0, 4, 1));
        assert_eq!(s.console.read_attrs(Coord::new(2, 1), 1).expect("read")[0], Attr::SELECTION_FALLBACK);

        mouse(&mut s, MouseEvent::moved(Coord::new(4, 12), MouseButtons::LEFT));
        assert_eq!(s.state.periodic_scroll, Coord::new(0, 3));
        assert_eq!(s.console.window_rect().top, 3);

        mouse(&mut s, MouseEvent::buttons(Coord::new(4, 12), MouseButtons::empty()));
        assert_eq!(s.state.periodic_scroll, Coord::default());
        assert!(s.state.has_selection());
    }

    #[test]
    fn test_press_clears_selection_and_places_cursor() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = console_with_output();
        let mut s = Session::for_test(&mut editor, &mut console, &history, &aliases);
        for ch in "copy a b".chars() {
            s.insert_chars(&[ch]);
        }
        s.paint().expect("paint");

        mouse(&mut s, MouseEvent::buttons(Coord::new(0, 0), MouseButtons::LEFT));
        mouse(&mut s, MouseEvent::moved(Coord::new(3, 0), MouseButtons::LEFT));
        mouse(&mut s, MouseEvent::buttons(Coord::new(3, 0), MouseButtons::empty()));
        assert!(s.state.has_selection());

        mouse(&mut s, MouseEvent::buttons(Coord::new(5, 3), MouseButtons::LEFT));
        assert!(!s.state.has_selection());
        assert_eq!(s.state.line.cursor(), 5);
        assert_eq!(s.console.cursor_position(), Coord::new(5, 3));
        assert_eq!(s.console.read_attrs(Coord::new(0, 0), 4).expect("read"), vec![Attr::DEFAULT; 4]);
    }

    #[test]
    fn test_double_click_selects_word() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = console_with_output();
        let mut s = Session::for_test(&mut editor, &mut console, &history, &aliases);

        mouse(&mut s, MouseEvent::double_click(Coord::new(8, 0), MouseButtons::LEFT));
        assert_eq!(s.state.selection_current, Rect::new(5, 0, 11, 0));

        mouse(&mut s, MouseEvent::buttons(Coord::new(8, 0), MouseButtons::empty()));
        mouse(&mut s, MouseEvent::double_click(Coord::new(19, 0), MouseButtons::LEFT));
        assert_eq!(s.state.selection_current, Rect::new(18, 0, 20, 0));
    }

    #[test]
    fn test_double_click_on_break_char_does_nothing() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = console_with_output();
        let mut s = Session::for_test(&mut editor, &mut console, &history, &aliases);

        mouse(&mut s, MouseEvent::double_click(Coord::new(3, 0), MouseButtons::LEFT));
        assert!(!s.state.has_selection());
        mouse(&mut s, MouseEvent::double_click(Coord::new(17, 0), MouseButtons::LEFT));
        assert!(!s.state.has_selection());
    }

    #[test]
    fn test_wheel_scrolls_by_lines() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = console_with_output();
        let mut s = Session::for_test(&mut editor, &mut console, &history, &aliases);

        mouse(&mut s, MouseEvent::wheel(Coord::new(0, 0), -96));
        assert_eq!(s.console.window_rect().top, 3);
        mouse(&mut s, MouseEvent::wheel(Coord::new(0, 3), 64));
        assert_eq!(s.console.window_rect().top, 1);
        mouse(&mut s, MouseEvent::wheel(Coord::new(0, 1), 640));
        assert_eq!(s.console.window_rect().top, 0);
    }

    // ==================== Copy ====================

    #[test]
    fn test_right_click_copies_then_pastes() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = console_with_output();
        {
            let mut s = Session::for_test(&mut editor, &mut console, &history, &aliases);
            mouse(&mut s, MouseEvent::buttons(Coord::new(0, 0), MouseButtons::LEFT));
            mouse(&mut s, MouseEvent::moved(Coord::new(11, 1), MouseButtons::LEFT));
            mouse(&mut s, MouseEvent::buttons(Coord::new(11, 1), MouseButtons::empty()));

            mouse(&mut s, MouseEvent::buttons(Coord::new(11, 1), MouseButtons::RIGHT));
            assert!(!s.state.has_selection());
            mouse(&mut s, MouseEvent::buttons(Coord::new(11, 1), MouseButtons::empty()));

            mouse(&mut s, MouseEvent::buttons(Coord::new(11, 1), MouseButtons::RIGHT));
            assert_eq!(s.state.line.text(), "dir  foo.txt alpha beta");
        }

        let copy = &console.copies()[0];
        assert_eq!(copy.text, "dir  foo.txt\r\nalpha beta");
        assert!(copy.html.contains(&format!("color:{}", Attr(0x0A).fg().html_hex())));
        assert_eq!(console.cell(Coord::new(0, 1)).expect("cell").attr, Attr(0x0A));
    }

    #[test]
    fn test_copy_failure_keeps_selection() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = console_with_output();
        console.set_clipboard_available(false);
        let mut s = Session::for_test(&mut editor, &mut console, &history, &aliases);

        mouse(&mut s, MouseEvent::buttons(Coord::new(0, 0), MouseButtons::LEFT));
        mouse(&mut s, MouseEvent::moved(Coord::new(2, 0), MouseButtons::LEFT));
        s.copy_selection().expect("copy failure is handled");
        assert!(s.state.has_selection());
    }

    #[test]
    fn test_copy_without_saved_attributes_keeps_selection() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default().with_selection_limit(4);
        let mut console = console_with_output();
        let mut s = Session::for_test(&mut editor, &mut console, &history, &aliases);

        mouse(&mut s, MouseEvent::buttons(Coord::new(0, 0), MouseButtons::LEFT));
        mouse(&mut s, MouseEvent::moved(Coord::new(9, 1), MouseButtons::LEFT));
        s.copy_selection().expect("missing attributes are handled");
        assert!(s.state.has_selection());
        assert!(s.console.paste_text().is_none());
    }

    #[test]
    fn test_resize_drops_selection() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = console_with_output();
        let mut s = Session::for_test(&mut editor, &mut console, &history, &aliases);

        mouse(&mut s, MouseEvent::buttons(Coord::new(0, 0), MouseButtons::LEFT));
        mouse(&mut s, MouseEvent::moved(Coord::new(2, 0), MouseButtons::LEFT));
        s.dispatch(&InputEvent::Resize { cols: 30, rows: 40 })
            .expect("resize should succeed");
        assert!(!s.state.has_selection());
        assert!(s.state.renderer.saved().is_none());
    }
}
