// Chunk: docs/chunks/line_editor - Console line editor
// Chunk: docs/chunks/selection_rendering - Selection rendering and clipboard

//! conline-editor: the interactive line editor of the conline shell.
//!
//! [`LineEditor::read_line`] reads one line of input from a
//! [`ConsoleSurface`]. While it runs it handles:
//!
//! - insert/overwrite editing, word and argument navigation
//! - history recall, tab completion and inline suggestions
//! - Alt+keypad character entry and alias hotkeys
//! - mouse selection with auto-scroll, and copy as plain text plus HTML
//!
//! # Example
//!
//! ```
//! use conline_editor::{AliasMap, EditorHooks, History, LineEditor, MemoryConsole};
//! use conline_input::{ControlKeyState, Key, KeyEvent};
//!
//! let mut console = MemoryConsole::new(80, 25);
//! console.push_text("dir");
//! console.push_key(KeyEvent::new(Key::Return, ControlKeyState::empty()));
//! let history = History::new();
//! let aliases = AliasMap::new();
//!
//! let mut editor = LineEditor::default();
//! let outcome = editor
//!     .read_line(&mut console, EditorHooks::new(&history, &aliases))
//!     .unwrap();
//! assert_eq!(outcome.line, "dir");
//! ```

mod alias;
mod clipboard;
mod completion;
mod config;
mod console;
mod copy_format;
mod crossterm_console;
mod error;
mod history;
mod key_command;
mod line_editor;
mod memory_console;
mod mouse;
mod numeric_entry;
mod paint;
mod parser;
mod screen;
mod selection;
mod state;
mod suggestion;

pub use alias::{hotkey_name, AliasMap, AliasTable};
pub use clipboard::SystemClipboard;
pub use completion::{CompletionEngine, CompletionRequest, ListCompletion};
pub use config::{EditorConfig, EVENT_BATCH, RESTART_IDLE, SCROLL_TICK, WHEEL_UNITS_PER_LINE};
pub use console::{clamp_window_origin, ConsoleSurface, CursorShape, WaitResult};
pub use copy_format::{plain_text, vt_stream, vt_to_html, SelectedRow};
pub use crossterm_console::CrosstermConsole;
pub use error::EditorError;
pub use history::{History, HistorySource, DEFAULT_HISTORY_CAPACITY};
pub use line_editor::{EditorHooks, LineEditor, ReadLineOutcome};
pub use memory_console::{ClipboardCopy, MemoryConsole};
pub use numeric_entry::{NumericEntry, NumericMode};
pub use parser::{ArgRange, ArgumentParser, DefaultArgumentParser};
pub use screen::{Cell, ScreenGrid};
pub use selection::{distance_outside, scroll_window, SelectionRenderer};
