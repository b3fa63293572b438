// Chunk: docs/chunks/console_surface - Console surface abstraction
//!
//! A [`ConsoleSurface`] backed by the real terminal through crossterm.
//!
//! Terminals cannot be read back, so the console keeps a shadow
//! [`ScreenGrid`] of everything written through it and serves cell reads
//! from that. Cells the console never wrote read back as blanks, which is
//! why [`CrosstermConsole::print`] exists for prompts and why
//! [`CrosstermConsole::resume`] forgets the shadow contents after a child
//! process had the terminal.
//!
//! The terminal has no scrollback buffer the editor can address, so the
//! buffer and the window are the same size and the window origin is always
//! the top-left cell.

use std::collections::VecDeque;
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::{self, MoveTo, SetCursorStyle};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode, KeyEventKind,
    KeyEventState, KeyModifiers, KeyboardEnhancementFlags, ModifierKeyCode, MouseButton,
    MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::style::Print;
use crossterm::terminal::{self, ScrollUp};
use crossterm::{execute, queue};
use tracing::{debug, warn};

use conline_buffer::Attr;
use conline_input::{
    ControlKeyState, Coord, InputEvent, Key, KeyEvent, MouseButtons, MouseEvent, Rect,
};

use crate::clipboard::SystemClipboard;
use crate::console::{ConsoleSurface, CursorShape, WaitResult};
use crate::error::EditorError;
use crate::screen::ScreenGrid;

/// Two presses on the same cell within this interval form a double click.
const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(500);

/// One wheel notch, in the units mouse wheel events report.
const WHEEL_NOTCH: i16 = 120;

pub struct CrosstermConsole {
    out: Stdout,
    grid: ScreenGrid,
    pending: VecDeque<InputEvent>,
    cursor: Coord,
    cursor_shape: CursorShape,
    default_attr: Attr,
    mouse: MouseTranslator,
    clipboard: SystemClipboard,
    keyboard_enhanced: bool,
    raw: bool,
}

impl CrosstermConsole {
    /// Puts the terminal in raw mode with mouse capture and, where the
    /// terminal supports it, key release reporting.
    pub fn new() -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        let default_attr = Attr::DEFAULT;
        let mut console = Self {
            out: io::stdout(),
            grid: ScreenGrid::new(i32::from(cols), i32::from(rows), default_attr),
            pending: VecDeque::new(),
            cursor: Coord::default(),
            cursor_shape: CursorShape::default(),
            default_attr,
            mouse: MouseTranslator::default(),
            clipboard: SystemClipboard::new(),
            keyboard_enhanced: false,
            raw: false,
        };
        console.resume()?;
        Ok(console)
    }

    /// Hands the terminal back in cooked mode, e.g. while a child process
    /// runs in the foreground.
    pub fn suspend(&mut self) -> io::Result<()> {
        if !self.raw {
            return Ok(());
        }
        if self.keyboard_enhanced {
            execute!(self.out, PopKeyboardEnhancementFlags)?;
            self.keyboard_enhanced = false;
        }
        execute!(
            self.out,
            DisableMouseCapture,
            SetCursorStyle::DefaultUserShape,
            cursor::Show
        )?;
        terminal::disable_raw_mode()?;
        self.raw = false;
        Ok(())
    }

    /// Takes the terminal back after [`suspend`](Self::suspend). The shadow
    /// grid is cleared because whatever ran in between may have drawn
    /// anywhere.
    pub fn resume(&mut self) -> io::Result<()> {
        if self.raw {
            return Ok(());
        }
        terminal::enable_raw_mode()?;
        self.raw = true;
        execute!(self.out, EnableMouseCapture)?;
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.out,
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                )
            )?;
            self.keyboard_enhanced = true;
        }
        debug!(enhanced = self.keyboard_enhanced, "terminal in raw mode");

        let (cols, rows) = terminal::size()?;
        self.grid = ScreenGrid::new(i32::from(cols), i32::from(rows), self.default_attr);
        let (x, y) = cursor::position()?;
        self.cursor = Coord::new(i32::from(x), i32::from(y));
        self.pending.clear();
        self.apply_cursor_shape()
    }

    /// Writes text at the cursor in the default colours, handling line
    /// breaks and scrolling. Used for prompts and messages so they can be
    /// selected and copied like everything else.
    pub fn print(&mut self, text: &str) -> io::Result<()> {
        let size = self.grid.size();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.cursor = Coord::new(0, self.cursor.y + 1);
                if self.cursor.y >= size.y {
                    self.scroll_buffer_up(1)?;
                    self.cursor.y = size.y - 1;
                }
            }
            let chars: Vec<char> = line.trim_end_matches('\r').chars().collect();
            if chars.is_empty() {
                continue;
            }
            let end = self.cursor.offset_by(chars.len() as i64, size.x);
            let overflow = (end.y - size.y + 1).max(0);
            if overflow > 0 {
                self.scroll_buffer_up(overflow)?;
                self.cursor.y -= overflow;
            }
            self.write_chars(self.cursor, &chars)?;
            self.fill_attr(self.cursor, chars.len(), self.default_attr)?;
            let next = self.cursor.offset_by(chars.len() as i64, size.x);
            self.set_cursor_position(Coord::new(next.x.min(size.x - 1), next.y.min(size.y - 1)))?;
        }
        Ok(())
    }

    /// Re-emits `count` cells of the shadow grid from `at`, grouping runs of
    /// equal attributes into a single print.
    fn redraw(&mut self, at: Coord, count: usize) -> io::Result<()> {
        let width = self.grid.size().x;
        let cells = self.grid.cells(at, count).to_vec();
        let start = at.to_linear(width);

        let mut run = String::new();
        let mut run_attr: Option<Attr> = None;
        for (i, cell) in cells.iter().enumerate() {
            let pos = Coord::from_linear(start + i as i64, width);
            if i == 0 || pos.x == 0 {
                if !run.is_empty() {
                    queue!(self.out, Print(std::mem::take(&mut run)))?;
                }
                queue!(self.out, MoveTo(pos.x as u16, pos.y as u16))?;
            }
            if run_attr != Some(cell.attr) {
                if !run.is_empty() {
                    queue!(self.out, Print(std::mem::take(&mut run)))?;
                }
                queue!(self.out, Print(cell.attr.to_sgr()))?;
                run_attr = Some(cell.attr);
            }
            run.push(cell.ch);
        }
        if !run.is_empty() {
            queue!(self.out, Print(run))?;
        }
        queue!(
            self.out,
            Print("\x1b[0m"),
            MoveTo(self.cursor.x as u16, self.cursor.y as u16)
        )?;
        self.out.flush()
    }

    fn apply_cursor_shape(&mut self) -> io::Result<()> {
        match self.cursor_shape {
            CursorShape::Hidden => execute!(self.out, cursor::Hide),
            CursorShape::Insert => {
                execute!(self.out, SetCursorStyle::SteadyUnderScore, cursor::Show)
            }
            CursorShape::Overwrite => execute!(self.out, SetCursorStyle::SteadyBlock, cursor::Show),
        }
    }

    /// Translates one terminal event and queues it; events the editor has
    /// no use for are dropped.
    fn enqueue(&mut self, event: CrosstermEvent) {
        let translated = match event {
            CrosstermEvent::Key(key) => translate_key(key).map(InputEvent::Key),
            CrosstermEvent::Mouse(mouse) => self.mouse.translate(mouse, Instant::now()).map(InputEvent::Mouse),
            CrosstermEvent::Resize(cols, rows) => {
                self.grid.resize(i32::from(cols), i32::from(rows));
                Some(InputEvent::Resize {
                    cols: i32::from(cols),
                    rows: i32::from(rows),
                })
            }
            _ => None,
        };
        if let Some(event) = translated {
            self.pending.push_back(event);
        }
    }
}

impl Drop for CrosstermConsole {
    fn drop(&mut self) {
        if let Err(e) = self.suspend() {
            warn!(error = %e, "failed to restore terminal");
        }
    }
}

impl ConsoleSurface for CrosstermConsole {
    fn peek_events(&mut self, max: usize) -> io::Result<Vec<InputEvent>> {
        while self.pending.len() < max && event::poll(Duration::ZERO)? {
            let event = event::read()?;
            self.enqueue(event);
        }
        Ok(self.pending.iter().take(max).cloned().collect())
    }

    fn consume_events(&mut self, count: usize) {
        let count = count.min(self.pending.len());
        self.pending.drain(..count);
    }

    fn wait_for_input(&mut self, timeout: Option<Duration>) -> WaitResult {
        let deadline = timeout.map(|t| Instant::now() + t);
        while self.pending.is_empty() {
            let ready = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    match event::poll(left) {
                        Ok(ready) => ready,
                        Err(e) => {
                            warn!(error = %e, "polling terminal input failed");
                            return WaitResult::Error;
                        }
                    }
                }
                None => true,
            };
            if !ready {
                return WaitResult::Timeout;
            }
            match event::read() {
                Ok(event) => self.enqueue(event),
                Err(e) => {
                    warn!(error = %e, "reading terminal input failed");
                    return WaitResult::Error;
                }
            }
        }
        WaitResult::Ready
    }

    fn cursor_position(&self) -> Coord {
        self.cursor
    }

    fn set_cursor_position(&mut self, at: Coord) -> io::Result<()> {
        self.cursor = at;
        execute!(self.out, MoveTo(at.x.max(0) as u16, at.y.max(0) as u16))
    }

    fn window_rect(&self) -> Rect {
        let size = self.grid.size();
        Rect::new(0, 0, size.x - 1, size.y - 1)
    }

    fn set_window_origin(&mut self, _top_left: Coord) -> io::Result<()> {
        Ok(())
    }

    fn buffer_size(&self) -> Coord {
        self.grid.size()
    }

    fn default_attr(&self) -> Attr {
        self.default_attr
    }

    fn popup_attr(&self) -> Option<Attr> {
        None
    }

    fn write_chars(&mut self, at: Coord, chars: &[char]) -> io::Result<()> {
        let written = self.grid.write_chars(at, chars);
        self.redraw(at, written)
    }

    fn write_attrs(&mut self, at: Coord, attrs: &[Attr]) -> io::Result<()> {
        let written = self.grid.write_attrs(at, attrs);
        self.redraw(at, written)
    }

    fn fill_attr(&mut self, at: Coord, count: usize, attr: Attr) -> io::Result<()> {
        let written = self.grid.fill_attr(at, count, attr);
        self.redraw(at, written)
    }

    fn read_chars(&self, at: Coord, count: usize) -> io::Result<Vec<char>> {
        Ok(self.grid.read_chars(at, count))
    }

    fn read_attrs(&self, at: Coord, count: usize) -> io::Result<Vec<Attr>> {
        Ok(self.grid.read_attrs(at, count))
    }

    fn scroll_buffer_up(&mut self, lines: i32) -> io::Result<()> {
        if lines <= 0 {
            return Ok(());
        }
        self.grid.scroll_up(lines);
        execute!(self.out, ScrollUp(lines as u16))
    }

    fn cursor_shape(&self) -> CursorShape {
        self.cursor_shape
    }

    fn set_cursor_shape(&mut self, shape: CursorShape) -> io::Result<()> {
        self.cursor_shape = shape;
        self.apply_cursor_shape()
    }

    fn paste_text(&mut self) -> Option<String> {
        self.clipboard.paste_text()
    }

    fn copy_text_and_html(&mut self, text: &str, html: &str) -> Result<(), EditorError> {
        self.clipboard.copy_text_and_html(text, html)
    }
}

// =============================================================================
// Event translation
// =============================================================================

/// Converts a crossterm key event into the console key model.
///
/// Returns `None` for keys the editor has no binding for and that carry no
/// character.
pub(crate) fn translate_key(event: event::KeyEvent) -> Option<KeyEvent> {
    let keypad = event.state.contains(KeyEventState::KEYPAD);
    let key = match event.code {
        KeyCode::Char(c) if keypad && c.is_ascii_digit() => Key::Numpad(c as u8 - b'0'),
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Tab | KeyCode::BackTab => Key::Tab,
        KeyCode::Enter => Key::Return,
        KeyCode::Esc => Key::Escape,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::KeypadBegin => Key::Clear,
        KeyCode::F(n) => Key::function(n)?,
        KeyCode::Modifier(ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt) => Key::Alt,
        KeyCode::Modifier(ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl) => {
            Key::Control
        }
        KeyCode::Modifier(ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift) => Key::Shift,
        _ => return None,
    };

    let mut modifiers = translate_modifiers(event.modifiers);
    if event.code == KeyCode::BackTab {
        modifiers |= ControlKeyState::SHIFT;
    }
    let navigation = matches!(
        key,
        Key::Left
            | Key::Right
            | Key::Up
            | Key::Down
            | Key::Home
            | Key::End
            | Key::PageUp
            | Key::PageDown
            | Key::Insert
            | Key::Delete
    );
    if navigation && !keypad {
        modifiers |= ControlKeyState::ENHANCED;
    }

    let translated = KeyEvent::new(key, modifiers);
    Some(match event.kind {
        KeyEventKind::Release => KeyEvent::release(key, modifiers),
        KeyEventKind::Press | KeyEventKind::Repeat => translated,
    })
}

fn translate_modifiers(modifiers: KeyModifiers) -> ControlKeyState {
    let mut state = ControlKeyState::empty();
    if modifiers.contains(KeyModifiers::SHIFT) {
        state |= ControlKeyState::SHIFT;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        state |= ControlKeyState::LEFT_CTRL;
    }
    if modifiers.contains(KeyModifiers::ALT) {
        state |= ControlKeyState::LEFT_ALT;
    }
    state
}

/// Tracks held buttons and recent clicks; terminals report neither.
#[derive(Debug, Default)]
pub(crate) struct MouseTranslator {
    buttons: MouseButtons,
    last_click: Option<(Coord, Instant)>,
}

impl MouseTranslator {
    pub(crate) fn translate(&mut self, event: event::MouseEvent, now: Instant) -> Option<MouseEvent> {
        let position = Coord::new(i32::from(event.column), i32::from(event.row));
        let modifiers = translate_modifiers(event.modifiers);
        let translated = match event.kind {
            MouseEventKind::Down(button) => {
                self.buttons |= button_flag(button);
                let double = button == MouseButton::Left
                    && self.last_click.is_some_and(|(at, when)| {
                        at == position && now.duration_since(when) <= DOUBLE_CLICK_INTERVAL
                    });
                if button == MouseButton::Left {
                    // A third click starts a new pair.
                    self.last_click = if double { None } else { Some((position, now)) };
                }
                if double {
                    MouseEvent::double_click(position, self.buttons)
                } else {
                    MouseEvent::buttons(position, self.buttons)
                }
            }
            MouseEventKind::Up(button) => {
                self.buttons.remove(button_flag(button));
                MouseEvent::buttons(position, self.buttons)
            }
            MouseEventKind::Drag(button) => {
                self.buttons |= button_flag(button);
                MouseEvent::moved(position, self.buttons)
            }
            MouseEventKind::Moved => MouseEvent::moved(position, self.buttons),
            MouseEventKind::ScrollUp => MouseEvent::wheel(position, WHEEL_NOTCH),
            MouseEventKind::ScrollDown => MouseEvent::wheel(position, -WHEEL_NOTCH),
            MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => return None,
        };
        Some(MouseEvent {
            modifiers,
            ..translated
        })
    }
}

fn button_flag(button: MouseButton) -> MouseButtons {
    match button {
        MouseButton::Left => MouseButtons::LEFT,
        MouseButton::Right => MouseButtons::RIGHT,
        MouseButton::Middle => MouseButtons::MIDDLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conline_input::MouseEventFlags;
    use crossterm::event::{KeyEvent as CtKeyEvent, MouseEvent as CtMouseEvent};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> CtKeyEvent {
        CtKeyEvent::new(code, modifiers)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> CtMouseEvent {
        CtMouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    // ==================== Keys ====================

    #[test]
    fn test_plain_character() {
        let event = translate_key(key(KeyCode::Char('a'), KeyModifiers::NONE)).expect("key");
        assert_eq!(event, KeyEvent::char('a'));
    }

    #[test]
    fn test_navigation_keys_are_enhanced() {
        let event = translate_key(key(KeyCode::Left, KeyModifiers::CONTROL)).expect("key");
        assert_eq!(event.key, Key::Left);
        assert_eq!(
            event.modifiers,
            ControlKeyState::LEFT_CTRL | ControlKeyState::ENHANCED
        );
    }

    #[test]
    fn test_keypad_digit_with_alt() {
        let mut raw = key(KeyCode::Char('6'), KeyModifiers::ALT);
        raw.state = KeyEventState::KEYPAD;
        let event = translate_key(raw).expect("key");
        assert_eq!(event.key, Key::Numpad(6));
        assert_eq!(event.keypad_digit(), Some(6));
        assert!(event.modifiers.alt());
    }

    #[test]
    fn test_alt_release() {
        let mut raw = key(KeyCode::Modifier(ModifierKeyCode::LeftAlt), KeyModifiers::NONE);
        raw.kind = KeyEventKind::Release;
        let event = translate_key(raw).expect("key");
        assert_eq!(event.key, Key::Alt);
        assert!(!event.key_down);
    }

    #[test]
    fn test_back_tab_is_shift_tab() {
        let event = translate_key(key(KeyCode::BackTab, KeyModifiers::SHIFT)).expect("key");
        assert_eq!(event.key, Key::Tab);
        assert!(event.modifiers.shift());
    }

    #[test]
    fn test_unmapped_key_dropped() {
        assert!(translate_key(key(KeyCode::CapsLock, KeyModifiers::NONE)).is_none());
        assert!(translate_key(key(KeyCode::F(13), KeyModifiers::NONE)).is_none());
    }

    // ==================== Mouse ====================

    #[test]
    fn test_press_drag_release_tracks_buttons() {
        let mut translator = MouseTranslator::default();
        let now = Instant::now();

        let down = translator
            .translate(mouse(MouseEventKind::Down(MouseButton::Left), 3, 1), now)
            .expect("down");
        assert_eq!(down.buttons, MouseButtons::LEFT);
        assert!(down.flags.is_empty());

        let drag = translator
            .translate(mouse(MouseEventKind::Drag(MouseButton::Left), 9, 2), now)
            .expect("drag");
        assert_eq!(drag.position, Coord::new(9, 2));
        assert_eq!(drag.flags, MouseEventFlags::MOVED);
        assert_eq!(drag.buttons, MouseButtons::LEFT);

        let up = translator
            .translate(mouse(MouseEventKind::Up(MouseButton::Left), 9, 2), now)
            .expect("up");
        assert!(up.buttons.is_empty());
    }

    #[test]
    fn test_double_click_synthesised() {
        let mut translator = MouseTranslator::default();
        let start = Instant::now();
        let press = |t: &mut MouseTranslator, at: Instant, x: u16| {
            let down = t
                .translate(mouse(MouseEventKind::Down(MouseButton::Left), x, 0), at)
                .expect("down");
            t.translate(mouse(MouseEventKind::Up(MouseButton::Left), x, 0), at);
            down
        };

        assert!(press(&mut translator, start, 4).flags.is_empty());
        let second = press(&mut translator, start + Duration::from_millis(200), 4);
        assert_eq!(second.flags, MouseEventFlags::DOUBLE_CLICK);

        // Too slow, and a different cell.
        assert!(press(&mut translator, start + Duration::from_secs(2), 4).flags.is_empty());
        assert!(press(&mut translator, start + Duration::from_millis(2100), 5).flags.is_empty());
    }

    #[test]
    fn test_wheel_notches() {
        let mut translator = MouseTranslator::default();
        let now = Instant::now();
        let up = translator
            .translate(mouse(MouseEventKind::ScrollUp, 0, 0), now)
            .expect("wheel");
        assert_eq!(up.flags, MouseEventFlags::WHEELED);
        assert_eq!(up.wheel_delta, 120);
        let down = translator
            .translate(mouse(MouseEventKind::ScrollDown, 0, 0), now)
            .expect("wheel");
        assert_eq!(down.wheel_delta, -120);
    }
}
