// Chunk: docs/chunks/argument_navigation - Argument boundaries for word movement
//!
//! Argument boundaries within the input line.
//!
//! The editor does not interpret command syntax itself. It asks an
//! [`ArgumentParser`] where the arguments of the current line start and end,
//! and uses those ranges for Ctrl+Left/Right, tab completion and
//! suggestions.

/// A half-open range `[start, end)` of character offsets in the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgRange {
    pub start: usize,
    pub end: usize,
}

impl ArgRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `offset` is inside the argument or directly after it.
    pub fn touches(&self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end
    }
}

/// Splits a command line into argument ranges.
pub trait ArgumentParser {
    /// Returns the arguments of `line` in order.
    fn parse(&self, line: &[char]) -> Vec<ArgRange>;
}

/// Whitespace-separated arguments with double-quote grouping.
///
/// Outside quotes, `|`, `<` and `>` are arguments of their own (`>>` is kept
/// together), so `dir>out` splits into `dir`, `>`, `out`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultArgumentParser;

fn is_operator(ch: char) -> bool {
    matches!(ch, '|' | '<' | '>')
}

impl ArgumentParser for DefaultArgumentParser {
    fn parse(&self, line: &[char]) -> Vec<ArgRange> {
        let mut args = Vec::new();
        let mut start: Option<usize> = None;
        let mut quoted = false;
        let mut i = 0;

        while i < line.len() {
            let ch = line[i];
            if ch == '"' {
                quoted = !quoted;
                start.get_or_insert(i);
            } else if !quoted && ch.is_whitespace() {
                if let Some(s) = start.take() {
                    args.push(ArgRange::new(s, i));
                }
            } else if !quoted && is_operator(ch) {
                if let Some(s) = start.take() {
                    args.push(ArgRange::new(s, i));
                }
                let len = if ch == '>' && line.get(i + 1) == Some(&'>') { 2 } else { 1 };
                args.push(ArgRange::new(i, i + len));
                i += len;
                continue;
            } else {
                start.get_or_insert(i);
            }
            i += 1;
        }
        if let Some(s) = start {
            args.push(ArgRange::new(s, line.len()));
        }
        args
    }
}

/// The argument containing `offset` or ending right at it.
///
/// Returns `None` when `offset` sits in whitespace away from any argument.
pub fn argument_at(args: &[ArgRange], offset: usize) -> Option<ArgRange> {
    args.iter().rev().find(|a| a.touches(offset)).copied()
}

/// Target of Ctrl+Left: the start of the argument the cursor is in, or of
/// the previous one if the cursor is already at a start.
pub fn previous_argument_start(args: &[ArgRange], cursor: usize) -> usize {
    args.iter()
        .rev()
        .find(|a| a.start < cursor)
        .map_or(0, |a| a.start)
}

/// Target of Ctrl+Right: the start of the next argument, or the end of the
/// line if there is none.
pub fn next_argument_start(args: &[ArgRange], cursor: usize, line_len: usize) -> usize {
    args.iter()
        .find(|a| a.start > cursor)
        .map_or(line_len, |a| a.start)
}
