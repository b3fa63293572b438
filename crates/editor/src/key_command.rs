// Chunk: docs/chunks/line_editor - Console line editor
//!
//! Key-down resolution.
//!
//! Every binding is a single key plus a modifier combination, so resolution
//! is a pure stateless function from a key event to a [`Command`]. Key-up
//! events are not resolved here; the only release the editor cares about is
//! Alt, which completes numeric entry.

use conline_input::{Key, KeyEvent};

use crate::alias::hotkey_name;

/// Editing commands produced by key presses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Insert (or overwrite with) a character at the cursor
    InsertChar(char),
    /// Enter: copy an active selection, otherwise submit the line
    Submit,
    /// Escape: clear the line and any selection
    ClearInput,
    /// Ctrl+C: clear the line and return it as cancelled
    Cancel,
    /// Backspace
    DeleteBackward,
    /// Delete
    DeleteForward,
    /// Tab family; Ctrl selects full-path completion
    Complete { forward: bool, full_path: bool },
    /// Ctrl+Up/Down: complete the line from history
    CompleteFromHistory { forward: bool },
    /// Up: older history entry
    HistoryPrevious,
    /// Down: newer history entry
    HistoryNext,
    MoveLeft,
    MoveRight,
    MoveToStart,
    MoveToEnd,
    /// Ctrl+Left: start of the current or previous argument
    MoveArgumentLeft,
    /// Ctrl+Right: start of the next argument
    MoveArgumentRight,
    /// Insert: toggle insert/overwrite
    ToggleInsertMode,
    /// Ctrl+V, Shift+Insert
    Paste,
    /// Ctrl+Insert
    CopySelection,
    /// Alt+digit on the main row or keypad
    NumericDigit(u8),
    /// F1-F12, with the alias name to look up
    Hotkey(String),
}

/// Resolves a key press to a command.
///
/// Returns `None` for keys the editor ignores, including key releases.
pub(crate) fn resolve_command(event: &KeyEvent) -> Option<Command> {
    if !event.key_down {
        return None;
    }
    let mods = event.modifiers;
    let ctrl = mods.ctrl();
    let alt = mods.alt();
    let shift = mods.shift();
    // AltGr arrives as Ctrl+Alt and produces ordinary characters.
    let alt_gr = ctrl && alt;

    // Alt+digit accumulates a character code.
    if alt && !ctrl {
        if let Key::Char(ch @ '0'..='9') = event.key {
            return Some(Command::NumericDigit(ch as u8 - b'0'));
        }
        if let Some(digit) = event.keypad_digit() {
            return Some(Command::NumericDigit(digit));
        }
    }

    if let Some(name) = hotkey_name(&event.key, mods) {
        return Some(Command::Hotkey(name));
    }

    match &event.key {
        // Ctrl letter bindings
        Key::Char(c) if ctrl && !alt_gr => match c.to_ascii_lowercase() {
            'c' => Some(Command::Cancel),
            'e' => Some(Command::InsertChar('\x1b')),
            'v' => Some(Command::Paste),
            _ => None,
        },

        // Printable characters
        Key::Char(c) if (!ctrl && !alt) || alt_gr => {
            if *c == '\0' || c.is_control() {
                None
            } else {
                Some(Command::InsertChar(*c))
            }
        }

        Key::Return if !ctrl && !alt => Some(Command::Submit),
        Key::Escape => Some(Command::ClearInput),

        Key::Tab if !alt => Some(Command::Complete {
            forward: !shift,
            full_path: ctrl,
        }),

        Key::Backspace if !ctrl && !alt => Some(Command::DeleteBackward),
        Key::Delete if !ctrl && !alt => Some(Command::DeleteForward),

        // Navigation cluster
        Key::Left if ctrl => Some(Command::MoveArgumentLeft),
        Key::Right if ctrl => Some(Command::MoveArgumentRight),
        Key::Up if ctrl => Some(Command::CompleteFromHistory { forward: true }),
        Key::Down if ctrl => Some(Command::CompleteFromHistory { forward: false }),
        Key::Left if !alt => Some(Command::MoveLeft),
        Key::Right if !alt => Some(Command::MoveRight),
        Key::Up if !alt => Some(Command::HistoryPrevious),
        Key::Down if !alt => Some(Command::HistoryNext),
        Key::Home if !alt => Some(Command::MoveToStart),
        Key::End if !alt => Some(Command::MoveToEnd),

        Key::Insert if shift && !ctrl => Some(Command::Paste),
        Key::Insert if ctrl && !shift => Some(Command::CopySelection),
        Key::Insert if !alt && !ctrl => Some(Command::ToggleInsertMode),

        // Unhandled
        _ => None,
    }
}
