// Chunk: docs/chunks/input_line - Input line storage with dirty range tracking

//! Storage for the single line being edited at the prompt.
//!
//! The line is a flat array of characters with a logical allocation size
//! that grows by a factor of four when full. One slot is always held back
//! so the line can be handed to consumers that expect a terminator, which
//! gives the invariant `len() <= capacity() - 1`.
//!
//! Every mutation records which part of the line changed in a
//! [`DirtyRange`], so the painter only rewrites cells that differ.

use crate::types::DirtyRange;
use thiserror::Error;

const INITIAL_CAPACITY: usize = 256;
const GROWTH_FACTOR: usize = 4;

/// Growing the line storage failed. The line is left exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unable to grow the input line to hold {requested} characters")]
pub struct AllocError {
    pub requested: usize,
}

/// The editable input line.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    /// Line contents; `chars.len()` is the line length.
    chars: Vec<char>,
    /// Logical allocation size, always greater than the line length.
    allocated: usize,
    /// Cursor offset in `[0, len]`.
    cursor: usize,
    /// Text changed since the last `take_dirty`.
    dirty: DirtyRange,
    /// Optional upper bound on `allocated`, beyond which growth fails.
    limit: Option<usize>,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    /// Creates an empty line with the default allocation.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Creates an empty line with a specific initial allocation.
    pub fn with_capacity(allocated: usize) -> Self {
        let allocated = allocated.max(2);
        Self {
            chars: Vec::with_capacity(allocated),
            allocated,
            cursor: 0,
            dirty: DirtyRange::CLEAN,
            limit: None,
        }
    }

    /// Creates a line holding `text` with the cursor at its end.
    pub fn from_str(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut allocated = INITIAL_CAPACITY;
        while chars.len() >= allocated {
            allocated = allocated.saturating_mul(GROWTH_FACTOR);
        }
        let len = chars.len();
        Self {
            chars,
            allocated,
            cursor: len,
            dirty: DirtyRange::new(0, len),
            limit: None,
        }
    }

    /// Caps the allocation size. Growth past the cap fails with
    /// [`AllocError`], which is how allocation failure is exercised.
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
    }

    // ==================== Queries ====================

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Logical allocation size.
    pub fn capacity(&self) -> usize {
        self.allocated
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.chars.get(offset).copied()
    }

    /// The line as a `String`.
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// A substring of the line by character offsets (clamped).
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        self.chars[start..end].iter().collect()
    }

    /// Returns the accumulated dirty range without clearing it.
    pub fn dirty(&self) -> DirtyRange {
        self.dirty
    }

    /// Returns the accumulated dirty range and resets it.
    pub fn take_dirty(&mut self) -> DirtyRange {
        std::mem::take(&mut self.dirty)
    }

    /// Marks a span as needing repaint.
    pub fn mark_dirty(&mut self, begin: usize, length: usize) {
        self.dirty.merge(DirtyRange::new(begin, length));
    }

    /// Marks the whole line as needing repaint.
    pub fn mark_all_dirty(&mut self) {
        let len = self.chars.len();
        self.mark_dirty(0, len);
    }

    // ==================== Cursor movement ====================

    /// Places the cursor, clamping to `[0, len]`.
    pub fn set_cursor(&mut self, offset: usize) {
        self.cursor = offset.min(self.chars.len());
    }

    /// Returns true if the cursor moved.
    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Returns true if the cursor moved.
    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.chars.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn move_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_end(&mut self) {
        self.cursor = self.chars.len();
    }

    // ==================== Mutation ====================

    /// Ensures the line can hold `required_len` characters while keeping the
    /// terminator slot free. Grows by quadrupling.
    fn ensure_capacity(&mut self, required_len: usize) -> Result<(), AllocError> {
        if required_len < self.allocated {
            return Ok(());
        }
        let err = AllocError {
            requested: required_len,
        };

        let mut new_allocated = self.allocated;
        while required_len >= new_allocated {
            new_allocated = new_allocated.checked_mul(GROWTH_FACTOR).ok_or(err)?;
        }
        if self.limit.is_some_and(|limit| new_allocated > limit) {
            return Err(err);
        }

        self.chars
            .try_reserve_exact(new_allocated - self.chars.len())
            .map_err(|_| err)?;
        self.allocated = new_allocated;
        Ok(())
    }

    /// Inserts `text` at the cursor, shifting existing text right when
    /// `insert_mode` is set and overwriting it otherwise. The cursor ends up
    /// after the new text.
    pub fn insert(&mut self, text: &[char], insert_mode: bool) -> Result<(), AllocError> {
        if text.is_empty() {
            return Ok(());
        }
        let cursor = self.cursor;

        if insert_mode {
            self.ensure_capacity(self.chars.len() + text.len())?;
            self.chars.splice(cursor..cursor, text.iter().copied());
            let tail = self.chars.len() - cursor;
            self.mark_dirty(cursor, tail);
        } else {
            let end = cursor + text.len();
            self.ensure_capacity(end.max(self.chars.len()))?;
            let overlap = (self.chars.len() - cursor).min(text.len());
            self.chars[cursor..cursor + overlap].copy_from_slice(&text[..overlap]);
            self.chars.extend_from_slice(&text[overlap..]);
            self.mark_dirty(cursor, text.len());
        }

        self.cursor = cursor + text.len();
        Ok(())
    }

    /// Convenience wrapper around [`LineBuffer::insert`] for a `&str`.
    pub fn insert_str(&mut self, text: &str, insert_mode: bool) -> Result<(), AllocError> {
        let chars: Vec<char> = text.chars().collect();
        self.insert(&chars, insert_mode)
    }

    /// Deletes up to `count` characters before the cursor. Returns the number
    /// of characters removed.
    pub fn delete_backward(&mut self, count: usize) -> usize {
        let count = count.min(self.cursor);
        if count == 0 {
            return 0;
        }
        let start = self.cursor - count;
        self.chars.drain(start..self.cursor);
        self.cursor = start;
        let tail = self.chars.len() - start;
        self.mark_dirty(start, tail);
        count
    }

    /// Deletes up to `count` characters at and after the cursor. Returns the
    /// number of characters removed.
    pub fn delete_forward(&mut self, count: usize) -> usize {
        let end = (self.cursor + count).min(self.chars.len());
        let removed = end - self.cursor;
        if removed == 0 {
            return 0;
        }
        self.chars.drain(self.cursor..end);
        let tail = self.chars.len() - self.cursor;
        self.mark_dirty(self.cursor, tail);
        removed
    }

    /// Deletes `[start, end)`, keeping the cursor on the same character where
    /// possible.
    pub fn delete_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.chars.len());
        if start >= end {
            return;
        }
        self.chars.drain(start..end);
        if self.cursor >= end {
            self.cursor -= end - start;
        } else if self.cursor > start {
            self.cursor = start;
        }
        let tail = self.chars.len() - start;
        self.mark_dirty(start, tail);
    }

    /// Replaces `[start, end)` with `text` and places the cursor after it.
    pub fn replace_range(&mut self, start: usize, end: usize, text: &[char]) -> Result<(), AllocError> {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        let new_len = self.chars.len() - (end - start) + text.len();
        self.ensure_capacity(new_len)?;
        self.chars.splice(start..end, text.iter().copied());
        self.cursor = start + text.len();
        let tail = self.chars.len() - start;
        self.mark_dirty(start, tail);
        Ok(())
    }

    /// Replaces the whole line, leaving the cursor at the end.
    pub fn set_text(&mut self, text: &str) -> Result<(), AllocError> {
        let chars: Vec<char> = text.chars().collect();
        let len = self.chars.len();
        self.replace_range(0, len, &chars)
    }

    /// Empties the line.
    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
        self.dirty = DirtyRange::CLEAN;
    }
}
