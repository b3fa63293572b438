// Chunk: docs/chunks/tab_completion - Tab completion and inline suggestions
//!
//! Completion sources and tab-cycling state.
//!
//! Where matches come from is up to the [`CompletionEngine`]; the editor
//! only decides which argument is being completed and cycles through what
//! the engine returns. [`ListCompletion`] is a simple engine over a fixed
//! candidate list plus history.

use crate::history::HistorySource;

/// What the editor is asking to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRequest<'a> {
    /// Text of the argument under the cursor, quotes removed. For history
    /// completion this is the whole line.
    pub arg: &'a str,
    /// Tab (true) or Shift+Tab (false).
    pub forward: bool,
    /// Ctrl+Tab: complete to a full path rather than a relative one.
    pub full_path: bool,
    /// Ctrl+Up/Down: match against history entries.
    pub from_history: bool,
}

/// Source of tab completions and inline suggestions.
pub trait CompletionEngine {
    /// All matches for the request, in presentation order.
    fn complete(&mut self, request: &CompletionRequest<'_>, history: &dyn HistorySource) -> Vec<String>;

    /// The single most likely completion of `arg`, including `arg` itself.
    fn suggest(&mut self, arg: &str, history: &dyn HistorySource) -> Option<String>;
}

/// Case-insensitive prefix test on characters.
pub(crate) fn has_prefix_ignore_case(text: &str, prefix: &str) -> bool {
    let mut text = text.chars().flat_map(char::to_lowercase);
    prefix
        .chars()
        .flat_map(char::to_lowercase)
        .all(|p| text.next() == Some(p))
}

/// Completes against a fixed list of candidates and the history.
///
/// Candidates are matched by case-insensitive prefix. For full-path
/// requests, relative candidates are joined onto `base_dir`.
#[derive(Debug, Clone, Default)]
pub struct ListCompletion {
    candidates: Vec<String>,
    base_dir: Option<String>,
}

impl ListCompletion {
    pub fn new(candidates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut candidates: Vec<String> = candidates.into_iter().map(Into::into).collect();
        candidates.sort_by_key(|c| c.to_lowercase());
        candidates.dedup();
        Self {
            candidates,
            base_dir: None,
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<String>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    fn is_absolute(candidate: &str) -> bool {
        candidate.starts_with(['/', '\\']) || candidate.chars().nth(1) == Some(':')
    }

    fn full_path(&self, candidate: &str) -> String {
        match &self.base_dir {
            Some(base) if !Self::is_absolute(candidate) => {
                let base = base.trim_end_matches(['/', '\\']);
                format!("{base}{}{candidate}", std::path::MAIN_SEPARATOR)
            }
            _ => candidate.to_string(),
        }
    }
}

impl CompletionEngine for ListCompletion {
    fn complete(&mut self, request: &CompletionRequest<'_>, history: &dyn HistorySource) -> Vec<String> {
        if request.from_history {
            // Newest first, without duplicates.
            let mut matches: Vec<String> = Vec::new();
            for i in (0..history.len()).rev() {
                if let Some(entry) = history.entry(i) {
                    if has_prefix_ignore_case(entry, request.arg) && !matches.iter().any(|m| m == entry) {
                        matches.push(entry.to_string());
                    }
                }
            }
            return matches;
        }

        let arg_is_full = Self::is_absolute(request.arg);
        self.candidates
            .iter()
            .filter_map(|c| {
                let text = if request.full_path || arg_is_full {
                    self.full_path(c)
                } else {
                    c.clone()
                };
                has_prefix_ignore_case(&text, request.arg).then_some(text)
            })
            .collect()
    }

    fn suggest(&mut self, arg: &str, history: &dyn HistorySource) -> Option<String> {
        let longer = |s: &&str| s.chars().count() > arg.chars().count() && has_prefix_ignore_case(s, arg);

        // Arguments from recent commands first, then the candidate list.
        let from_history = (0..history.len())
            .rev()
            .filter_map(|i| history.entry(i))
            .flat_map(str::split_whitespace)
            .find(longer);
        from_history
            .or_else(|| self.candidates.iter().map(String::as_str).find(longer))
            .map(str::to_string)
    }
}

/// Tab-cycling state for the argument being completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TabContext {
    pub matches: Vec<String>,
    pub index: usize,
    /// Range of the line currently occupied by the inserted match.
    pub start: usize,
    pub end: usize,
}

impl TabContext {
    /// Starts cycling at the first match (forward) or the last (backward).
    pub fn new(matches: Vec<String>, forward: bool, start: usize, end: usize) -> Option<Self> {
        if matches.is_empty() {
            return None;
        }
        let index = if forward { 0 } else { matches.len() - 1 };
        Some(Self {
            matches,
            index,
            start,
            end,
        })
    }

    pub fn advance(&mut self, forward: bool) {
        let len = self.matches.len();
        self.index = if forward {
            (self.index + 1) % len
        } else {
            (self.index + len - 1) % len
        };
    }

    pub fn current(&self) -> &str {
        &self.matches[self.index]
    }
}

/// Text to insert for a completion: quoted if it contains spaces.
pub(crate) fn quote_if_needed(text: &str) -> String {
    if text.contains(' ') && !text.starts_with('"') {
        format!("\"{text}\"")
    } else {
        text.to_string()
    }
}
