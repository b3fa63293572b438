// Chunk: docs/chunks/suggestions - Inline suggestions
//!
//! Inline suggestions.
//!
//! After the configured idle delay the editor asks the completion engine
//! for the most likely continuation of the argument being typed and draws
//! it, dimmed, after the line. The suggestion is never part of the line
//! until accepted.

use tracing::trace;

use crate::completion::has_prefix_ignore_case;
use crate::line_editor::Session;
use crate::parser::argument_at;

impl Session<'_, '_> {
    /// Computes the suggestion for the current line and schedules a repaint
    /// if it changed.
    pub(crate) fn populate_suggestion(&mut self) {
        self.state.suggestion_computed = true;
        let suggestion = self.compute_suggestion().unwrap_or_default();
        if suggestion != self.state.suggestion {
            trace!(len = suggestion.len(), "suggestion changed");
            self.state.suggestion = suggestion;
            self.state.suggestion_dirty = true;
            self.state.redisplay_required = true;
        }
    }

    fn compute_suggestion(&mut self) -> Option<Vec<char>> {
        let line = &self.state.line;
        if self.state.tab_context.is_some() || line.is_empty() || line.cursor() != line.len() {
            return None;
        }

        let args = self.parser.parse(line.chars());
        let arg = argument_at(&args, line.cursor())?;
        if arg.end != line.len() || arg.len() < self.config.suggestion_min_chars {
            return None;
        }

        let typed = line.slice(arg.start, arg.end);
        let full = self.completion.suggest(&typed, self.hooks.history)?;
        if !has_prefix_ignore_case(&full, &typed) {
            return None;
        }
        let rest: Vec<char> = full.chars().skip(typed.chars().count()).collect();
        (!rest.is_empty()).then_some(rest)
    }
}
