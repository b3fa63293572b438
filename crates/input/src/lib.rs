// Chunk: docs/chunks/console_input_records - Shared console input types
//!
//! Input event types for console keyboard, mouse and window events.
//!
//! These types abstract over the console input record and provide a clean
//! Rust-native interface for input handling. This crate is shared between
//! the editor, the buffer and the console surface implementations to avoid
//! circular dependencies.
//!
//! Cell geometry ([`Coord`], [`Rect`]) lives here too, since mouse events
//! are reported in buffer cell coordinates.

use bitflags::bitflags;

// =============================================================================
// Geometry
// =============================================================================

/// A cell position in the console screen buffer.
///
/// Coordinates are buffer-relative, not window-relative: row 0 is the first
/// row of the buffer even when the window has been scrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the linear cell index of this position for a buffer of the
    /// given width.
    pub fn to_linear(self, width: i32) -> i64 {
        self.y as i64 * width as i64 + self.x as i64
    }

    /// Inverse of [`Coord::to_linear`].
    pub fn from_linear(index: i64, width: i32) -> Self {
        let width = width.max(1) as i64;
        Self {
            x: index.rem_euclid(width) as i32,
            y: index.div_euclid(width) as i32,
        }
    }

    /// Moves this position by `delta` cells, wrapping across rows.
    pub fn offset_by(self, delta: i64, width: i32) -> Self {
        Self::from_linear(self.to_linear(width) + delta, width)
    }
}

/// An inclusive rectangle of cells.
///
/// A rectangle whose corners coincide is considered empty. This mirrors how
/// a click without a drag is not a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const EMPTY: Rect = Rect {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Returns the rectangle spanning two corner points, normalised so that
    /// `left <= right` and `top <= bottom`.
    pub fn spanning(a: Coord, b: Coord) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    /// A rectangle is empty when both of its corners are the same cell.
    pub fn is_empty(&self) -> bool {
        self.left == self.right && self.top == self.bottom
    }

    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }

    /// Number of cells covered by the rectangle.
    pub fn cell_count(&self) -> usize {
        (self.width().max(0) as usize) * (self.height().max(0) as usize)
    }

    pub fn contains(&self, point: Coord) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }

    pub fn contains_row(&self, row: i32) -> bool {
        row >= self.top && row <= self.bottom
    }

    pub fn top_left(&self) -> Coord {
        Coord::new(self.left, self.top)
    }
}

// =============================================================================
// Keyboard
// =============================================================================

bitflags! {
    /// Modifier and lock key state attached to every key and mouse event.
    ///
    /// The bit values follow the console input record layout so that a real
    /// console backend can pass them through unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ControlKeyState: u32 {
        const RIGHT_ALT = 0x0001;
        const LEFT_ALT = 0x0002;
        const RIGHT_CTRL = 0x0004;
        const LEFT_CTRL = 0x0008;
        const SHIFT = 0x0010;
        const NUMLOCK = 0x0020;
        const SCROLLLOCK = 0x0040;
        const CAPSLOCK = 0x0080;
        /// The key came from the dedicated navigation cluster rather than
        /// the numeric keypad.
        const ENHANCED = 0x0100;

        const ALT = Self::LEFT_ALT.bits() | Self::RIGHT_ALT.bits();
        const CTRL = Self::LEFT_CTRL.bits() | Self::RIGHT_CTRL.bits();
    }
}

impl ControlKeyState {
    /// Returns only the modifier bits that participate in key classification
    /// (lock keys are stripped).
    pub fn modifier_mask(self) -> Self {
        self & (Self::ALT | Self::CTRL | Self::SHIFT | Self::ENHANCED)
    }

    pub fn ctrl(self) -> bool {
        self.intersects(Self::CTRL)
    }

    pub fn alt(self) -> bool {
        self.intersects(Self::ALT)
    }

    pub fn shift(self) -> bool {
        self.contains(Self::SHIFT)
    }

    pub fn enhanced(self) -> bool {
        self.contains(Self::ENHANCED)
    }

    /// Returns true if no Ctrl or Alt key is held (Shift is allowed).
    pub fn is_plain(self) -> bool {
        !self.ctrl() && !self.alt()
    }
}

/// Keys that can be pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A key producing a character (already accounts for shift state).
    /// With Ctrl held this is the unshifted letter, e.g. `Char('c')`.
    Char(char),
    Backspace,
    Tab,
    Return,
    Escape,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    /// Keypad 5 with numlock off.
    Clear,
    /// Numeric keypad digit with numlock on.
    Numpad(u8),
    /// The Alt key itself (its release completes numeric-keypad entry).
    Alt,
    /// The Ctrl key itself.
    Control,
    /// The Shift key itself.
    Shift,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    /// Any other virtual key code.
    Other(u16),
}

impl Key {
    /// Returns the function key number (1-12) for `F1`..`F12`.
    pub fn function_number(&self) -> Option<u8> {
        let n = match self {
            Key::F1 => 1,
            Key::F2 => 2,
            Key::F3 => 3,
            Key::F4 => 4,
            Key::F5 => 5,
            Key::F6 => 6,
            Key::F7 => 7,
            Key::F8 => 8,
            Key::F9 => 9,
            Key::F10 => 10,
            Key::F11 => 11,
            Key::F12 => 12,
            _ => return None,
        };
        Some(n)
    }

    /// Builds `F1`..`F12` from a function key number.
    pub fn function(n: u8) -> Option<Key> {
        let key = match n {
            1 => Key::F1,
            2 => Key::F2,
            3 => Key::F3,
            4 => Key::F4,
            5 => Key::F5,
            6 => Key::F6,
            7 => Key::F7,
            8 => Key::F8,
            9 => Key::F9,
            10 => Key::F10,
            11 => Key::F11,
            12 => Key::F12,
            _ => return None,
        };
        Some(key)
    }
}

/// A keyboard event.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    /// The key that was pressed or released
    pub key: Key,
    /// Modifier keys held during the event
    pub modifiers: ControlKeyState,
    /// True for a press, false for a release
    pub key_down: bool,
    /// Number of times the key auto-repeated into this one event
    pub repeat_count: u16,
}

impl KeyEvent {
    /// Creates a new key press with the given key and modifiers.
    pub fn new(key: Key, modifiers: ControlKeyState) -> Self {
        Self {
            key,
            modifiers,
            key_down: true,
            repeat_count: 1,
        }
    }

    /// Creates a key press for a single character with no modifiers.
    pub fn char(ch: char) -> Self {
        Self::new(Key::Char(ch), ControlKeyState::empty())
    }

    /// Creates a key press for a key on the navigation cluster.
    pub fn enhanced(key: Key) -> Self {
        Self::new(key, ControlKeyState::ENHANCED)
    }

    /// Creates a key press with left Ctrl held.
    pub fn ctrl(key: Key) -> Self {
        Self::new(key, ControlKeyState::LEFT_CTRL)
    }

    /// Creates a key release.
    pub fn release(key: Key, modifiers: ControlKeyState) -> Self {
        Self {
            key,
            modifiers,
            key_down: false,
            repeat_count: 1,
        }
    }

    /// Returns the same event with a different repeat count.
    pub fn with_repeat(mut self, repeat_count: u16) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    /// Returns the digit this key contributes to Alt+keypad entry.
    ///
    /// Keypad digits with numlock on arrive as [`Key::Numpad`]; with numlock
    /// off the same physical keys arrive as non-enhanced navigation keys and
    /// are mapped back to the digit printed on them.
    pub fn keypad_digit(&self) -> Option<u8> {
        if let Key::Numpad(d) = self.key {
            return Some(d);
        }
        if self.modifiers.enhanced() {
            return None;
        }
        match self.key {
            Key::Insert => Some(0),
            Key::End => Some(1),
            Key::Down => Some(2),
            Key::PageDown => Some(3),
            Key::Left => Some(4),
            Key::Clear => Some(5),
            Key::Right => Some(6),
            Key::Home => Some(7),
            Key::Up => Some(8),
            Key::PageUp => Some(9),
            _ => None,
        }
    }
}

// =============================================================================
// Mouse
// =============================================================================

bitflags! {
    /// Mouse buttons currently held.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseButtons: u32 {
        const LEFT = 0x0001;
        const RIGHT = 0x0002;
        const MIDDLE = 0x0004;
    }
}

bitflags! {
    /// What kind of mouse activity produced the event. An empty set means a
    /// button was pressed or released.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseEventFlags: u32 {
        const MOVED = 0x0001;
        const DOUBLE_CLICK = 0x0002;
        const WHEELED = 0x0004;
        const HWHEELED = 0x0008;
    }
}

/// A mouse event, already translated to buffer cell coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    /// Cell under the pointer
    pub position: Coord,
    /// Buttons held after this event
    pub buttons: MouseButtons,
    /// Event kind
    pub flags: MouseEventFlags,
    /// Wheel movement; positive is away from the user
    pub wheel_delta: i16,
    /// Modifier keys held during the event
    pub modifiers: ControlKeyState,
}

impl MouseEvent {
    /// A button state change at `position`.
    pub fn buttons(position: Coord, buttons: MouseButtons) -> Self {
        Self {
            position,
            buttons,
            flags: MouseEventFlags::empty(),
            wheel_delta: 0,
            modifiers: ControlKeyState::empty(),
        }
    }

    /// Pointer movement with the given buttons held.
    pub fn moved(position: Coord, buttons: MouseButtons) -> Self {
        Self {
            flags: MouseEventFlags::MOVED,
            ..Self::buttons(position, buttons)
        }
    }

    /// A double click of the given buttons.
    pub fn double_click(position: Coord, buttons: MouseButtons) -> Self {
        Self {
            flags: MouseEventFlags::DOUBLE_CLICK,
            ..Self::buttons(position, buttons)
        }
    }

    /// A vertical wheel movement.
    pub fn wheel(position: Coord, delta: i16) -> Self {
        Self {
            flags: MouseEventFlags::WHEELED,
            wheel_delta: delta,
            ..Self::buttons(position, MouseButtons::empty())
        }
    }
}

/// Any event read from the console input queue.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// The screen buffer was resized to the given dimensions.
    Resize { cols: i32, rows: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_event_char() {
        let event = KeyEvent::char('a');
        assert_eq!(event.key, Key::Char('a'));
        assert!(event.modifiers.is_empty());
        assert!(event.key_down);
        assert_eq!(event.repeat_count, 1);
    }

    #[test]
    fn test_modifier_mask_strips_locks() {
        let state = ControlKeyState::NUMLOCK | ControlKeyState::CAPSLOCK | ControlKeyState::LEFT_CTRL;
        assert_eq!(state.modifier_mask(), ControlKeyState::LEFT_CTRL);
        assert!(state.ctrl());
        assert!(!state.alt());
    }

    #[test]
    fn test_is_plain_allows_shift() {
        assert!(ControlKeyState::SHIFT.is_plain());
        assert!(!ControlKeyState::RIGHT_ALT.is_plain());
    }

    #[test]
    fn test_keypad_digit_numlock_on() {
        let event = KeyEvent::new(Key::Numpad(6), ControlKeyState::LEFT_ALT);
        assert_eq!(event.keypad_digit(), Some(6));
    }

    #[test]
    fn test_keypad_digit_numlock_off() {
        let event = KeyEvent::new(Key::Home, ControlKeyState::LEFT_ALT);
        assert_eq!(event.keypad_digit(), Some(7));

        // The navigation cluster never contributes digits
        let event = KeyEvent::new(Key::Home, ControlKeyState::LEFT_ALT | ControlKeyState::ENHANCED);
        assert_eq!(event.keypad_digit(), None);
    }

    #[test]
    fn test_function_key_numbers() {
        for n in 1..=12 {
            let key = Key::function(n).unwrap();
            assert_eq!(key.function_number(), Some(n));
        }
        assert_eq!(Key::function(13), None);
        assert_eq!(Key::Tab.function_number(), None);
    }

    #[test]
    fn test_rect_spanning_normalises() {
        let rect = Rect::spanning(Coord::new(5, 7), Coord::new(2, 3));
        assert_eq!(rect, Rect::new(2, 3, 5, 7));
        assert_eq!(rect.width(), 4);
        assert_eq!(rect.height(), 5);
        assert_eq!(rect.cell_count(), 20);
    }

    #[test]
    fn test_rect_single_cell_is_empty() {
        assert!(Rect::spanning(Coord::new(3, 3), Coord::new(3, 3)).is_empty());
        assert!(!Rect::new(3, 3, 4, 3).is_empty());
    }

    #[test]
    fn test_coord_linear_roundtrip_wraps_rows() {
        let c = Coord::new(78, 2);
        assert_eq!(c.offset_by(3, 80), Coord::new(1, 3));
        assert_eq!(Coord::new(1, 3).offset_by(-3, 80), c);
    }
}
