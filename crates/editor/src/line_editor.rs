// Chunk: docs/chunks/line_editor - Console line editor
//!
//! The line editor's read loop and key handling.
//!
//! [`LineEditor::read_line`] runs a single-threaded loop over a
//! [`ConsoleSurface`]:
//!
//! 1. peek a batch of pending events
//! 2. dispatch each one, stopping early if the line was committed
//! 3. repaint if anything changed
//! 4. consume the processed events
//! 5. wait for more input, with a timeout chosen by what is pending
//!    (auto-scroll tick, suggestion delay, restart-state save)
//!
//! Waiting in step 5 is the only place the loop blocks. Painting lives in
//! `paint.rs`, mouse handling in `mouse.rs` and suggestions in
//! `suggestion.rs`; all of them are `impl` blocks on the same [`Session`].

use conline_buffer::LineBuffer;
use conline_input::{InputEvent, Key, KeyEvent};
use tracing::{debug, error, warn};

use crate::alias::AliasTable;
use crate::completion::{quote_if_needed, CompletionEngine, CompletionRequest, ListCompletion, TabContext};
use crate::config::{EditorConfig, EVENT_BATCH, RESTART_IDLE, SCROLL_TICK};
use crate::console::{ConsoleSurface, CursorShape, WaitResult};
use crate::error::EditorError;
use crate::history::{step_back, step_forward, HistorySource};
use crate::key_command::{resolve_command, Command};
use crate::parser::{argument_at, next_argument_start, previous_argument_start, ArgumentParser, DefaultArgumentParser};
use crate::selection::{scroll_window, SelectionRenderer};
use crate::state::{EditorState, Termination};

// =============================================================================
// Public interface
// =============================================================================

/// Result of a completed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadLineOutcome {
    /// The committed line; empty when cancelled.
    pub line: String,
    /// True when the read ended with Ctrl+C.
    pub cancelled: bool,
}

/// Collaborators the editor consults during one read.
pub struct EditorHooks<'h> {
    pub history: &'h dyn HistorySource,
    pub aliases: &'h dyn AliasTable,
    /// Called once, after the user has been idle long enough.
    pub save_restart_state: Option<&'h mut dyn FnMut()>,
}

impl<'h> EditorHooks<'h> {
    pub fn new(history: &'h dyn HistorySource, aliases: &'h dyn AliasTable) -> Self {
        Self {
            history,
            aliases,
            save_restart_state: None,
        }
    }

    pub fn with_restart_hook(mut self, hook: &'h mut dyn FnMut()) -> Self {
        self.save_restart_state = Some(hook);
        self
    }
}

/// A console line editor.
///
/// The editor itself only carries what outlives a single read: its
/// configuration, the parser and completion engine, and the insert mode.
pub struct LineEditor {
    config: EditorConfig,
    parser: Box<dyn ArgumentParser>,
    completion: Box<dyn CompletionEngine>,
    insert_mode: bool,
    line_limit: Option<usize>,
    selection_limit: Option<usize>,
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl LineEditor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            parser: Box::new(DefaultArgumentParser),
            completion: Box::new(ListCompletion::default()),
            insert_mode: true,
            line_limit: None,
            selection_limit: None,
        }
    }

    pub fn with_parser(mut self, parser: Box<dyn ArgumentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_completion(mut self, completion: Box<dyn CompletionEngine>) -> Self {
        self.completion = completion;
        self
    }

    /// Caps the input line's allocation. Keys that would grow it further
    /// are dropped.
    pub fn with_line_limit(mut self, cells: usize) -> Self {
        self.line_limit = Some(cells);
        self
    }

    /// Caps the selection attribute buffers.
    pub fn with_selection_limit(mut self, cells: usize) -> Self {
        self.selection_limit = Some(cells);
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn insert_mode(&self) -> bool {
        self.insert_mode
    }

    /// Reads one line from `console`.
    ///
    /// Returns when the user presses Enter with no selection active, presses
    /// Ctrl+C (the outcome is marked cancelled), or a hotkey alias expands.
    /// A console failure ends the read with an error.
    pub fn read_line(
        &mut self,
        console: &mut dyn ConsoleSurface,
        hooks: EditorHooks<'_>,
    ) -> Result<ReadLineOutcome, EditorError> {
        let mut session = Session::new(self, console, hooks)?;
        let result = session.run();
        let insert_mode = session.state.insert_mode;
        self.insert_mode = insert_mode;
        result
    }
}

// =============================================================================
// Session
// =============================================================================

/// Which idle action a timed wait is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdleAction {
    Scroll,
    Suggest,
    SaveRestart,
}

/// One `read_line` call: the editor's collaborators plus per-call state.
pub(crate) struct Session<'s, 'h> {
    pub config: EditorConfig,
    pub parser: &'s dyn ArgumentParser,
    pub completion: &'s mut dyn CompletionEngine,
    pub console: &'s mut dyn ConsoleSurface,
    pub hooks: EditorHooks<'h>,
    pub state: EditorState,
}

impl<'s, 'h> Session<'s, 'h> {
    fn new(
        editor: &'s mut LineEditor,
        console: &'s mut dyn ConsoleSurface,
        hooks: EditorHooks<'h>,
    ) -> Result<Self, EditorError> {
        let mut line = LineBuffer::new();
        line.set_limit(editor.line_limit);
        let mut renderer = SelectionRenderer::new();
        renderer.set_capacity_limit(editor.selection_limit);

        let state = EditorState::new(line, console.cursor_position(), editor.insert_mode, renderer);
        console.set_cursor_shape(CursorShape::for_insert_mode(editor.insert_mode))?;

        Ok(Self {
            config: editor.config,
            parser: editor.parser.as_ref(),
            completion: editor.completion.as_mut(),
            console,
            hooks,
            state,
        })
    }

    fn run(&mut self) -> Result<ReadLineOutcome, EditorError> {
        loop {
            let events = self.console.peek_events(EVENT_BATCH)?;
            let mut processed = 0;
            for event in &events {
                processed += 1;
                self.dispatch(event)?;
                if self.state.terminate.is_some() {
                    break;
                }
            }

            if let Some(termination) = self.state.terminate {
                self.console.consume_events(processed);
                return self.finish(termination);
            }
            if self.state.redisplay_required {
                self.paint()?;
            }
            self.console.consume_events(processed);
            self.wait()?;
        }
    }

    /// Picks the timeout for the next wait, most urgent first.
    fn next_idle_action(&self) -> Option<IdleAction> {
        if self.state.periodic_scroll != Default::default() {
            Some(IdleAction::Scroll)
        } else if !self.state.suggestion_computed && self.config.suggestions_enabled() {
            Some(IdleAction::Suggest)
        } else if !self.state.restart_saved && self.hooks.save_restart_state.is_some() {
            Some(IdleAction::SaveRestart)
        } else {
            None
        }
    }

    fn wait(&mut self) -> Result<(), EditorError> {
        let action = self.next_idle_action();
        let timeout = action.map(|action| match action {
            IdleAction::Scroll => SCROLL_TICK,
            IdleAction::Suggest => self.config.suggestion_delay(),
            IdleAction::SaveRestart => RESTART_IDLE,
        });

        match self.console.wait_for_input(timeout) {
            WaitResult::Ready => Ok(()),
            WaitResult::Timeout => match action {
                Some(IdleAction::Scroll) => {
                    scroll_window(&mut *self.console, self.state.periodic_scroll)?;
                    Ok(())
                }
                Some(IdleAction::Suggest) => {
                    self.populate_suggestion();
                    Ok(())
                }
                Some(IdleAction::SaveRestart) => {
                    self.state.restart_saved = true;
                    if let Some(hook) = self.hooks.save_restart_state.as_deref_mut() {
                        debug!("saving restart state");
                        hook();
                    }
                    Ok(())
                }
                None => Ok(()),
            },
            WaitResult::Error => {
                error!("console input lost during read_line");
                Err(EditorError::InputLost)
            }
        }
    }

    pub(crate) fn dispatch(&mut self, event: &InputEvent) -> Result<(), EditorError> {
        match event {
            InputEvent::Key(key) if key.key_down => self.on_key_down(key),
            InputEvent::Key(key) => {
                self.on_key_up(key);
                Ok(())
            }
            InputEvent::Mouse(mouse) => self.on_mouse(mouse),
            InputEvent::Resize { .. } => {
                self.on_resize();
                Ok(())
            }
        }
    }

    /// Commits the line: final paint without suggestion or selection, then a
    /// newline.
    fn finish(&mut self, termination: Termination) -> Result<ReadLineOutcome, EditorError> {
        self.state.discard_suggestion();
        self.state.clear_selection();
        self.state.tab_context = None;
        let len = self.state.line.len();
        self.state.line.set_cursor(len);
        self.paint()?;
        self.emit_newline()?;

        let cancelled = termination == Termination::Cancel;
        let line = if cancelled {
            String::new()
        } else {
            self.state.line.text()
        };
        Ok(ReadLineOutcome { line, cancelled })
    }

    // =========================================================================
    // Keyboard
    // =========================================================================

    fn on_key_up(&mut self, key: &KeyEvent) {
        if key.key != Key::Alt || !self.state.numeric.is_active() {
            return;
        }
        if let Some(ch) = self.state.numeric.finish() {
            self.insert_chars(&[ch]);
        }
    }

    fn on_key_down(&mut self, key: &KeyEvent) -> Result<(), EditorError> {
        let Some(command) = resolve_command(key) else {
            return Ok(());
        };
        let tab_count_before = self.state.tab_count;
        let repeat = usize::from(key.repeat_count.max(1));

        self.execute(command, repeat)?;
        self.state.redisplay_required = true;

        if self.state.tab_count == tab_count_before && self.state.suggestion.is_empty() {
            self.state.tab_context = None;
            self.state.tab_count = 0;
        }
        Ok(())
    }

    fn execute(&mut self, command: Command, repeat: usize) -> Result<(), EditorError> {
        match command {
            Command::InsertChar(ch) => self.insert_chars(&vec![ch; repeat]),
            Command::Submit => {
                if self.state.has_selection() {
                    self.copy_selection()?;
                } else {
                    self.state.terminate = Some(Termination::Submit);
                }
            }
            Command::ClearInput => self.clear_input(),
            Command::Cancel => self.state.terminate = Some(Termination::Cancel),
            Command::DeleteBackward => self.delete(repeat, false),
            Command::DeleteForward => self.delete(repeat, true),
            Command::Complete { forward, full_path } => self.complete(forward, full_path, false),
            Command::CompleteFromHistory { forward } => self.complete(forward, false, true),
            Command::HistoryPrevious => {
                let cursor = step_back(self.state.history_cursor, self.hooks.history.len());
                self.recall_history(cursor);
            }
            Command::HistoryNext => {
                let cursor = step_forward(self.state.history_cursor, self.hooks.history.len());
                self.recall_history(cursor);
            }
            Command::MoveLeft => {
                self.state.line.move_left();
            }
            Command::MoveRight => {
                let line = &self.state.line;
                if line.cursor() == line.len() && !self.state.suggestion.is_empty() {
                    self.accept_suggestion();
                } else {
                    self.state.line.move_right();
                }
            }
            Command::MoveToStart => self.state.line.move_to_start(),
            Command::MoveToEnd => self.state.line.move_to_end(),
            Command::MoveArgumentLeft => {
                let args = self.parser.parse(self.state.line.chars());
                let target = previous_argument_start(&args, self.state.line.cursor());
                self.state.line.set_cursor(target);
            }
            Command::MoveArgumentRight => {
                let line = &self.state.line;
                let args = self.parser.parse(line.chars());
                let target = next_argument_start(&args, line.cursor(), line.len());
                self.state.line.set_cursor(target);
            }
            Command::ToggleInsertMode => {
                self.state.insert_mode = !self.state.insert_mode;
                self.console
                    .set_cursor_shape(CursorShape::for_insert_mode(self.state.insert_mode))?;
            }
            Command::Paste => self.paste(),
            Command::CopySelection => {
                if self.state.has_selection() {
                    self.copy_selection()?;
                }
            }
            Command::NumericDigit(digit) => self.state.numeric.push_digit(digit),
            Command::Hotkey(name) => self.expand_hotkey(&name),
        }
        Ok(())
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Inserts characters at the cursor, replacing the part of the line
    /// under a selection if there is one. An allocation failure drops the
    /// input and leaves the line unchanged.
    pub(crate) fn insert_chars(&mut self, chars: &[char]) {
        if chars.is_empty() {
            return;
        }
        let width = self.console.buffer_size().x;
        if let Some((start, end)) = self.state.selected_input_range(width) {
            if let Err(e) = self.state.line.replace_range(start, end, chars) {
                debug!(error = %e, "dropped input");
                return;
            }
            self.state.clear_selection();
            self.state.discard_suggestion();
            return;
        }

        let keeps_suggestion = self.typed_into_suggestion(chars);
        if let Err(e) = self.state.line.insert(chars, self.state.insert_mode) {
            debug!(error = %e, "dropped input");
            return;
        }
        if keeps_suggestion {
            self.state.suggestion.drain(..chars.len());
            self.state.suggestion_dirty = true;
        } else {
            self.state.discard_suggestion();
        }
    }

    /// True if typing `chars` at the end of the line matches the start of
    /// the suggestion.
    fn typed_into_suggestion(&self, chars: &[char]) -> bool {
        let line = &self.state.line;
        let suggestion = &self.state.suggestion;
        line.cursor() == line.len()
            && suggestion.len() > chars.len()
            && chars
                .iter()
                .zip(suggestion)
                .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
    }

    fn delete(&mut self, count: usize, forward: bool) {
        let width = self.console.buffer_size().x;
        if let Some((start, end)) = self.state.selected_input_range(width) {
            self.state.line.delete_range(start, end);
            self.state.line.set_cursor(start);
            self.state.clear_selection();
            self.state.discard_suggestion();
            return;
        }
        let removed = if forward {
            self.state.line.delete_forward(count)
        } else {
            self.state.line.delete_backward(count)
        };
        if removed > 0 {
            self.state.discard_suggestion();
        }
    }

    fn clear_input(&mut self) {
        self.state.line.clear();
        self.state.line.mark_all_dirty();
        self.state.clear_selection();
        self.state.discard_suggestion();
        self.state.tab_context = None;
        self.state.history_cursor = None;
        self.state.numeric.reset();
    }

    fn replace_line(&mut self, text: &str) -> bool {
        match self.state.line.set_text(text) {
            Ok(()) => {
                self.state.discard_suggestion();
                true
            }
            Err(e) => {
                debug!(error = %e, "line replacement dropped");
                false
            }
        }
    }

    fn recall_history(&mut self, cursor: Option<usize>) {
        let text = match cursor {
            Some(index) => match self.hooks.history.entry(index) {
                Some(entry) => entry.to_string(),
                None => return,
            },
            None => String::new(),
        };
        if self.replace_line(&text) {
            self.state.history_cursor = cursor;
        }
    }

    fn accept_suggestion(&mut self) {
        let suggestion = std::mem::take(&mut self.state.suggestion);
        if let Err(e) = self.state.line.insert(&suggestion, true) {
            debug!(error = %e, "suggestion not accepted");
            self.state.suggestion = suggestion;
            return;
        }
        self.state.suggestion_dirty = true;
        self.state.suggestion_computed = false;
    }

    fn paste(&mut self) {
        let Some(text) = self.console.paste_text() else {
            return;
        };
        let chars = normalize_paste(&text);
        self.insert_chars(&chars);
    }

    fn expand_hotkey(&mut self, name: &str) {
        let Some(expansion) = self.hooks.aliases.expand(name) else {
            debug!(hotkey = name, "no alias for hotkey");
            return;
        };
        if self.replace_line(&expansion) {
            self.state.terminate = Some(Termination::Submit);
        }
    }

    // =========================================================================
    // Tab completion
    // =========================================================================

    fn complete(&mut self, forward: bool, full_path: bool, from_history: bool) {
        self.state.tab_count += 1;
        let line_len = self.state.line.len();

        let cycling = matches!(&self.state.tab_context, Some(ctx) if ctx.end <= line_len);
        if cycling {
            if let Some(ctx) = self.state.tab_context.as_mut() {
                ctx.advance(forward);
            }
        } else {
            let (start, end) = if from_history {
                (0, line_len)
            } else {
                let cursor = self.state.line.cursor();
                let args = self.parser.parse(self.state.line.chars());
                argument_at(&args, cursor).map_or((cursor, cursor), |arg| (arg.start, arg.end))
            };
            let typed = self.state.line.slice(start, end);
            let request = CompletionRequest {
                arg: typed.trim_matches('"'),
                forward,
                full_path,
                from_history,
            };
            let matches = self.completion.complete(&request, self.hooks.history);
            self.state.tab_context = TabContext::new(matches, forward, start, end);
        }

        let Some(ctx) = self.state.tab_context.as_mut() else {
            return;
        };
        let text = if from_history {
            ctx.current().to_string()
        } else {
            quote_if_needed(ctx.current())
        };
        let chars: Vec<char> = text.chars().collect();
        match self.state.line.replace_range(ctx.start, ctx.end, &chars) {
            Ok(()) => ctx.end = ctx.start + chars.len(),
            Err(e) => {
                warn!(error = %e, "completion dropped");
                return;
            }
        }
        self.state.discard_suggestion();
    }
}

#[cfg(test)]
impl<'s, 'h> Session<'s, 'h> {
    pub(crate) fn for_test(
        editor: &'s mut LineEditor,
        console: &'s mut dyn ConsoleSurface,
        history: &'h dyn HistorySource,
        aliases: &'h dyn AliasTable,
    ) -> Self {
        match Self::new(editor, console, EditorHooks::new(history, aliases)) {
            Ok(session) => session,
            Err(e) => panic!("session setup failed: {e}"),
        }
    }
}

/// Prepares clipboard text for the single input line: trailing line breaks
/// are dropped, interior ones become a single space, and other control
/// characters are removed.
pub(crate) fn normalize_paste(text: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(text.len());
    let mut in_break = false;
    for ch in text.trim_end_matches(['\r', '\n']).chars() {
        if ch == '\r' || ch == '\n' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
            continue;
        }
        in_break = false;
        if !ch.is_control() {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasMap;
    use crate::history::History;
    use crate::memory_console::MemoryConsole;
    use conline_input::{ControlKeyState, Coord};

    fn session<'s, 'h>(
        editor: &'s mut LineEditor,
        console: &'s mut MemoryConsole,
        hooks: EditorHooks<'h>,
    ) -> Session<'s, 'h> {
        match Session::new(editor, console, hooks) {
            Ok(session) => session,
            Err(e) => panic!("session setup failed: {e}"),
        }
    }

    fn press(session: &mut Session<'_, '_>, key: KeyEvent) {
        session
            .dispatch(&InputEvent::Key(key))
            .expect("dispatch should succeed");
        session.paint().expect("paint should succeed");
    }

    fn type_text(session: &mut Session<'_, '_>, text: &str) {
        for ch in text.chars() {
            press(session, KeyEvent::char(ch));
        }
    }

    fn assert_line_invariant(state: &EditorState) {
        let line = &state.line;
        assert!(line.cursor() <= line.len());
        assert!(line.len() < line.capacity());
    }

    // ==================== Normalisation ====================

    #[test]
    fn test_normalize_paste() {
        let s = |v: Vec<char>| v.into_iter().collect::<String>();
        assert_eq!(s(normalize_paste("dir\r\n")), "dir");
        assert_eq!(s(normalize_paste("a\r\nb\nc")), "a b c");
        assert_eq!(s(normalize_paste("a\tb\x07")), "ab");
        assert_eq!(s(normalize_paste("\r\n\r\n")), "");
    }

    // ==================== Editing ====================

    #[test]
    fn test_typing_then_backspacing_restores_line() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = MemoryConsole::new(40, 5);
        let mut s = session(&mut editor, &mut console, EditorHooks::new(&history, &aliases));

        type_text(&mut s, "ab");
        press(&mut s, KeyEvent::enhanced(Key::Left));
        let before = (s.state.line.text(), s.state.line.cursor());

        type_text(&mut s, "xyz");
        assert_eq!(s.state.line.text(), "axyzb");
        for _ in 0..3 {
            press(&mut s, KeyEvent::new(Key::Backspace, ControlKeyState::empty()));
            assert_line_invariant(&s.state);
        }
        assert_eq!((s.state.line.text(), s.state.line.cursor()), before);
    }

    #[test]
    fn test_insert_then_delete_restores_line() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = MemoryConsole::new(40, 5);
        let mut s = session(&mut editor, &mut console, EditorHooks::new(&history, &aliases));

        type_text(&mut s, "hello");
        press(&mut s, KeyEvent::enhanced(Key::Home));
        press(&mut s, KeyEvent::char('>'));
        press(&mut s, KeyEvent::enhanced(Key::Left));
        press(&mut s, KeyEvent::enhanced(Key::Delete));
        assert_eq!(s.state.line.text(), "hello");
    }

    #[test]
    fn test_overwrite_mode() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = MemoryConsole::new(40, 5);
        let mut s = session(&mut editor, &mut console, EditorHooks::new(&history, &aliases));

        type_text(&mut s, "abc");
        press(&mut s, KeyEvent::enhanced(Key::Home));
        press(&mut s, KeyEvent::enhanced(Key::Insert));
        assert!(!s.state.insert_mode);
        type_text(&mut s, "XY");
        assert_eq!(s.state.line.text(), "XYc");
        assert_eq!(s.console.cursor_shape(), CursorShape::Overwrite);
    }

    #[test]
    fn test_repeat_count_is_honoured() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = MemoryConsole::new(40, 5);
        let mut s = session(&mut editor, &mut console, EditorHooks::new(&history, &aliases));

        press(&mut s, KeyEvent::char('z').with_repeat(4));
        assert_eq!(s.state.line.text(), "zzzz");
        press(&mut s, KeyEvent::new(Key::Backspace, ControlKeyState::empty()).with_repeat(3));
        assert_eq!(s.state.line.text(), "z");
    }

    #[test]
    fn test_allocation_failure_drops_key() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default().with_line_limit(256);
        let mut console = MemoryConsole::new(300, 5);
        let mut s = session(&mut editor, &mut console, EditorHooks::new(&history, &aliases));

        for _ in 0..300 {
            press(&mut s, KeyEvent::char('x'));
            assert_line_invariant(&s.state);
        }
        assert_eq!(s.state.line.len(), 255);
    }

    // ==================== History ====================

    #[test]
    fn test_history_walk() {
        let history: History = ["dir", "cd ..", "echo hi"].into_iter().map(String::from).collect();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = MemoryConsole::new(40, 5);
        let mut s = session(&mut editor, &mut console, EditorHooks::new(&history, &aliases));

        press(&mut s, KeyEvent::enhanced(Key::Up));
        assert_eq!(s.state.line.text(), "echo hi");
        press(&mut s, KeyEvent::enhanced(Key::Up));
        press(&mut s, KeyEvent::enhanced(Key::Up));
        press(&mut s, KeyEvent::enhanced(Key::Up));
        assert_eq!(s.state.line.text(), "dir");
        press(&mut s, KeyEvent::enhanced(Key::Down));
        assert_eq!(s.state.line.text(), "cd ..");
        press(&mut s, KeyEvent::enhanced(Key::Down));
        press(&mut s, KeyEvent::enhanced(Key::Down));
        assert_eq!(s.state.line.text(), "");
        assert_eq!(console_row(&s, 0), "");
    }

    fn console_row(s: &Session<'_, '_>, y: i32) -> String {
        let chars = s.console.read_chars(Coord::new(0, y), 40).expect("read");
        chars.into_iter().collect::<String>().trim_end().to_string()
    }

    // ==================== Tab completion ====================

    #[test]
    fn test_tab_cycles_and_stops_after_other_keys() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor =
            LineEditor::default().with_completion(Box::new(ListCompletion::new(["readme.md", "release notes.txt"])));
        let mut console = MemoryConsole::new(60, 5);
        let mut s = session(&mut editor, &mut console, EditorHooks::new(&history, &aliases));

        type_text(&mut s, "type re");
        press(&mut s, KeyEvent::new(Key::Tab, ControlKeyState::empty()));
        assert_eq!(s.state.line.text(), "type readme.md");
        press(&mut s, KeyEvent::new(Key::Tab, ControlKeyState::empty()));
        assert_eq!(s.state.line.text(), "type \"release notes.txt\"");
        press(&mut s, KeyEvent::new(Key::Tab, ControlKeyState::SHIFT));
        assert_eq!(s.state.line.text(), "type readme.md");

        press(&mut s, KeyEvent::char(' '));
        assert!(s.state.tab_context.is_none());
        assert_eq!(s.state.tab_count, 0);
    }

    #[test]
    fn test_history_completion_replaces_whole_line() {
        let history: History = ["git status", "git stash", "ls"].into_iter().map(String::from).collect();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default();
        let mut console = MemoryConsole::new(60, 5);
        let mut s = session(&mut editor, &mut console, EditorHooks::new(&history, &aliases));

        type_text(&mut s, "git st");
        press(&mut s, KeyEvent::new(Key::Up, ControlKeyState::LEFT_CTRL | ControlKeyState::ENHANCED));
        assert_eq!(s.state.line.text(), "git stash");
        press(&mut s, KeyEvent::new(Key::Up, ControlKeyState::LEFT_CTRL | ControlKeyState::ENHANCED));
        assert_eq!(s.state.line.text(), "git status");
    }

    // ==================== Suggestions ====================

    #[test]
    fn test_typing_into_suggestion_trims_it() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default().with_completion(Box::new(ListCompletion::new(["directory"])));
        let mut console = MemoryConsole::new(60, 5);
        let mut s = session(&mut editor, &mut console, EditorHooks::new(&history, &aliases));

        type_text(&mut s, "di");
        s.populate_suggestion();
        s.paint().expect("paint");
        assert_eq!(s.state.suggestion.iter().collect::<String>(), "rectory");
        assert_eq!(console_row(&s, 0), "directory");

        press(&mut s, KeyEvent::char('R'));
        assert_eq!(s.state.suggestion.iter().collect::<String>(), "ectory");
        assert_eq!(console_row(&s, 0), "diRectory");

        press(&mut s, KeyEvent::char('x'));
        assert!(s.state.suggestion.is_empty());
        assert_eq!(console_row(&s, 0), "diRx");
    }

    #[test]
    fn test_right_accepts_suggestion() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default().with_completion(Box::new(ListCompletion::new(["directory"])));
        let mut console = MemoryConsole::new(60, 5);
        let mut s = session(&mut editor, &mut console, EditorHooks::new(&history, &aliases));

        type_text(&mut s, "dir");
        s.populate_suggestion();
        press(&mut s, KeyEvent::enhanced(Key::Right));
        assert_eq!(s.state.line.text(), "directory");
        assert_eq!(s.state.line.cursor(), 9);
        assert!(s.state.suggestion.is_empty());
    }

    #[test]
    fn test_no_suggestion_below_min_chars_or_mid_line() {
        let history = History::new();
        let aliases = AliasMap::new();
        let mut editor = LineEditor::default().with_completion(Box::new(ListCompletion::new(["directory"])));
        let mut console = MemoryConsole::new(60, 5);
        let mut s = session(&mut editor, &mut console, EditorHooks::new(&history, &aliases));

        type_text(&mut s, "d");
        s.populate_suggestion();
        assert!(s.state.suggestion.is_empty());

        type_text(&mut s, "i");
        press(&mut s, KeyEvent::enhanced(Key::Left));
        s.populate_suggestion();
        assert!(s.state.suggestion.is_empty());
    }
}
