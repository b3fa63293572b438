// Chunk: docs/chunks/selection_rendering - Selection rendering and clipboard
//!
//! Incremental selection rendering.
//!
//! A selection is shown by repainting the attributes of the selected cells.
//! To undo that later the renderer keeps the original attributes of every
//! selected cell. Two attribute buffers are used: one holds the attributes
//! under the selection currently on screen, the other is scratch for the
//! next one. Each update fills the scratch buffer, repaints only the cells
//! whose membership changed, and flips the two. Dragging a selection
//! therefore repaints a strip at a time and allocates nothing once the
//! buffers have grown.
//!
//! # Delta rules
//!
//! For every row touched by either the previous or the current rectangle:
//!
//! - row only in the previous selection: restore the saved attributes
//! - row only in the current selection: capture the row, then paint it
//! - row in both: capture and paint the new cells on either side, move the
//!   saved attributes of the shared cells across without touching the
//!   console, and restore the cells that dropped out on either side
//!
//! If saved attributes are unavailable (the buffer could not be allocated)
//! restored cells get the default grey-on-black attribute.

use std::io;

use conline_buffer::Attr;
use conline_input::{Coord, Rect};
use tracing::warn;

use crate::console::{clamp_window_origin, ConsoleSurface};

/// Double-buffered attribute storage for the selection.
#[derive(Debug, Default)]
pub struct SelectionRenderer {
    buffers: [Vec<Attr>; 2],
    /// Buffer holding the attributes under `saved_rect`.
    current: usize,
    saved_rect: Rect,
    saved_valid: bool,
    /// Largest buffer, in cells, the renderer may allocate.
    limit: Option<usize>,
}

impl SelectionRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps attribute buffer growth. Selections larger than this are painted
    /// but their original attributes are not saved.
    pub fn set_capacity_limit(&mut self, cells: Option<usize>) {
        self.limit = cells;
    }

    /// The rectangle on screen and the attributes saved from under it.
    pub fn saved(&self) -> Option<(Rect, &[Attr])> {
        if !self.saved_valid || self.saved_rect.is_empty() {
            return None;
        }
        Some((self.saved_rect, &self.buffers[self.current]))
    }

    /// Forgets the saved attributes, e.g. after the console was resized and
    /// they no longer describe what is on screen.
    pub fn invalidate(&mut self) {
        self.saved_rect = Rect::EMPTY;
        self.saved_valid = false;
    }

    /// Moves the saved rectangle with buffer contents that scrolled up by
    /// `lines` rows. The saved attributes scroll with the cells.
    pub fn scroll_up(&mut self, lines: i32) {
        if !self.saved_rect.is_empty() {
            self.saved_rect.top -= lines;
            self.saved_rect.bottom -= lines;
        }
    }

    /// Sizes `scratch` for `cells` attributes, growing capacity in 2x steps.
    fn prepare_scratch(&self, scratch: &mut Vec<Attr>, cells: usize) -> bool {
        scratch.clear();
        if cells > scratch.capacity() {
            let mut target = cells.max(scratch.capacity() * 2);
            if let Some(limit) = self.limit {
                if cells > limit {
                    return false;
                }
                target = target.min(limit);
            }
            if scratch.try_reserve_exact(target).is_err() {
                return false;
            }
        }
        scratch.resize(cells, Attr::DEFAULT);
        true
    }

    /// Repaints the console so that `current` is shown as selected and
    /// `previous` no longer is, then flips the buffers.
    pub fn update(&mut self, console: &mut dyn ConsoleSurface, previous: Rect, current: Rect) -> io::Result<()> {
        let selection_attr = console.popup_attr().unwrap_or(Attr::SELECTION_FALLBACK);

        let mut scratch = std::mem::take(&mut self.buffers[1 - self.current]);
        let mut scratch_valid = current.is_empty() || self.prepare_scratch(&mut scratch, current.cell_count());
        if !scratch_valid {
            warn!(cells = current.cell_count(), "no room to save attributes under selection");
        }

        let old: &[Attr] = &self.buffers[self.current];
        let old_valid = self.saved_valid && self.saved_rect == previous && !previous.is_empty();

        let mut rows = RowPainter {
            console,
            selection_attr,
            previous,
            current,
            old,
            old_valid,
            scratch: &mut scratch,
            scratch_valid: &mut scratch_valid,
        };

        let top = bound(previous, current, |r| r.top, i32::min);
        let bottom = bound(previous, current, |r| r.bottom, i32::max);
        if let (Some(top), Some(bottom)) = (top, bottom) {
            for row in top..=bottom {
                rows.paint_row(row)?;
            }
        }

        self.buffers[1 - self.current] = scratch;
        self.current = 1 - self.current;
        self.saved_rect = current;
        self.saved_valid = scratch_valid && !current.is_empty();
        Ok(())
    }
}

/// Combines an edge of the non-empty rectangles among `a` and `b`.
fn bound(a: Rect, b: Rect, edge: impl Fn(&Rect) -> i32, pick: fn(i32, i32) -> i32) -> Option<i32> {
    [a, b]
        .iter()
        .filter(|r| !r.is_empty())
        .map(edge)
        .reduce(pick)
}

/// Per-update painting context.
struct RowPainter<'a> {
    console: &'a mut dyn ConsoleSurface,
    selection_attr: Attr,
    previous: Rect,
    current: Rect,
    old: &'a [Attr],
    old_valid: bool,
    scratch: &'a mut Vec<Attr>,
    scratch_valid: &'a mut bool,
}

impl RowPainter<'_> {
    fn paint_row(&mut self, row: i32) -> io::Result<()> {
        let (prev, cur) = (self.previous, self.current);
        let in_prev = !prev.is_empty() && prev.contains_row(row);
        let in_cur = !cur.is_empty() && cur.contains_row(row);

        match (in_prev, in_cur) {
            (true, false) => self.restore(row, prev.left, prev.right),
            (false, true) => self.capture(row, cur.left, cur.right),
            (true, true) => {
                self.capture(row, cur.left, cur.right.min(prev.left - 1))?;
                self.capture(row, cur.left.max(prev.right + 1), cur.right)?;
                self.migrate(row, cur.left.max(prev.left), cur.right.min(prev.right));
                self.restore(row, prev.left, prev.right.min(cur.left - 1))?;
                self.restore(row, prev.left.max(cur.right + 1), prev.right)
            }
            (false, false) => Ok(()),
        }
    }

    fn scratch_index(&self, row: i32, x: i32) -> usize {
        let cur = self.current;
        ((row - cur.top) * cur.width() + (x - cur.left)) as usize
    }

    fn old_index(&self, row: i32, x: i32) -> usize {
        let prev = self.previous;
        ((row - prev.top) * prev.width() + (x - prev.left)) as usize
    }

    /// Saves the attributes of `[x0, x1]` into the scratch buffer and paints
    /// the selection colour over them.
    fn capture(&mut self, row: i32, x0: i32, x1: i32) -> io::Result<()> {
        if x0 > x1 {
            return Ok(());
        }
        let at = Coord::new(x0, row);
        let count = (x1 - x0 + 1) as usize;
        if *self.scratch_valid {
            let attrs = self.console.read_attrs(at, count)?;
            let start = self.scratch_index(row, x0);
            let end = (start + attrs.len()).min(self.scratch.len());
            self.scratch[start..end].copy_from_slice(&attrs[..end - start]);
        }
        self.console.fill_attr(at, count, self.selection_attr)
    }

    /// Moves saved attributes of `[x0, x1]` from the old buffer to the
    /// scratch buffer. The console is not touched.
    fn migrate(&mut self, row: i32, x0: i32, x1: i32) {
        if x0 > x1 || !*self.scratch_valid {
            return;
        }
        if !self.old_valid {
            *self.scratch_valid = false;
            return;
        }
        for x in x0..=x1 {
            let from = self.old_index(row, x);
            let to = self.scratch_index(row, x);
            self.scratch[to] = self.old[from];
        }
    }

    /// Puts the saved attributes of `[x0, x1]` back on screen.
    fn restore(&mut self, row: i32, x0: i32, x1: i32) -> io::Result<()> {
        if x0 > x1 {
            return Ok(());
        }
        let at = Coord::new(x0, row);
        let count = (x1 - x0 + 1) as usize;
        if self.old_valid {
            let start = self.old_index(row, x0);
            self.console.write_attrs(at, &self.old[start..start + count])
        } else {
            self.console.fill_attr(at, count, Attr::DEFAULT)
        }
    }
}

/// One auto-scroll step: moves the window by `delta` cells, clamped to the
/// buffer. Returns true if the window moved.
pub fn scroll_window(console: &mut dyn ConsoleSurface, delta: Coord) -> io::Result<bool> {
    if delta == Coord::default() {
        return Ok(false);
    }
    let window = console.window_rect();
    let size = Coord::new(window.width(), window.height());
    let origin = clamp_window_origin(
        Coord::new(window.left + delta.x, window.top + delta.y),
        size,
        console.buffer_size(),
    );
    if origin == window.top_left() {
        return Ok(false);
    }
    console.set_window_origin(origin)?;
    Ok(true)
}

/// Signed distance of `point` outside `window` on each axis; zero on an
/// axis where it is inside.
pub fn distance_outside(window: Rect, point: Coord) -> Coord {
    let axis = |p: i32, lo: i32, hi: i32| {
        if p < lo {
            p - lo
        } else if p > hi {
            p - hi
        } else {
            0
        }
    };
    Coord::new(
        axis(point.x, window.left, window.right),
        axis(point.y, window.top, window.bottom),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_console::MemoryConsole;

    /// A console with a distinct attribute in every cell.
    fn patterned_console() -> MemoryConsole {
        let mut console = MemoryConsole::new(12, 8);
        for y in 0..8 {
            for x in 0..12 {
                let attr = Attr(((x * 7 + y * 3) % 0x70) as u8);
                console.fill_attr(Coord::new(x, y), 1, attr).unwrap();
            }
        }
        console
    }

    fn attr_at(console: &MemoryConsole, x: i32, y: i32) -> Attr {
        console.cell(Coord::new(x, y)).unwrap().attr
    }

    #[test]
    fn test_select_then_clear_restores_everything() {
        let mut console = patterned_console();
        let before = console.all_attrs();
        let mut renderer = SelectionRenderer::new();

        let rect = Rect::new(2, 1, 6, 4);
        renderer.update(&mut console, Rect::EMPTY, rect).unwrap();
        assert_eq!(attr_at(&console, 2, 1), Attr::SELECTION_FALLBACK);
        assert_eq!(attr_at(&console, 6, 4), Attr::SELECTION_FALLBACK);
        assert_ne!(console.all_attrs(), before);

        renderer.update(&mut console, rect, Rect::EMPTY).unwrap();
        assert_eq!(console.all_attrs(), before);
    }

    #[test]
    fn test_uses_popup_colours() {
        let mut console = patterned_console();
        console.set_popup_attr(Some(Attr(0xF5)));
        let mut renderer = SelectionRenderer::new();
        renderer.update(&mut console, Rect::EMPTY, Rect::new(0, 0, 1, 0)).unwrap();
        assert_eq!(attr_at(&console, 0, 0), Attr(0xF5));
        assert_eq!(attr_at(&console, 1, 0), Attr(0xF5));
    }

    #[test]
    fn test_drag_sequence_preserves_unselected_cells() {
        let mut console = patterned_console();
        let original = console.all_attrs();
        let mut renderer = SelectionRenderer::new();

        let anchor = Coord::new(5, 3);
        let drag = [
            Coord::new(7, 3),
            Coord::new(9, 5),
            Coord::new(2, 6),
            Coord::new(1, 0),
            Coord::new(11, 7),
            Coord::new(5, 4),
            Coord::new(0, 3),
        ];

        let mut previous = Rect::EMPTY;
        for point in drag {
            let current = Rect::spanning(anchor, point);
            renderer.update(&mut console, previous, current).unwrap();

            let attrs = console.all_attrs();
            for y in 0..8 {
                for x in 0..12 {
                    let i = (y * 12 + x) as usize;
                    if current.contains(Coord::new(x, y)) {
                        assert_eq!(attrs[i], Attr::SELECTION_FALLBACK, "cell {x},{y} should be selected");
                    } else {
                        assert_eq!(attrs[i], original[i], "cell {x},{y} lost its attribute");
                    }
                }
            }

            let (saved_rect, saved) = renderer.saved().unwrap();
            assert_eq!(saved_rect, current);
            for y in current.top..=current.bottom {
                for x in current.left..=current.right {
                    let s = ((y - current.top) * current.width() + (x - current.left)) as usize;
                    assert_eq!(saved[s], original[(y * 12 + x) as usize]);
                }
            }
            previous = current;
        }

        renderer.update(&mut console, previous, Rect::EMPTY).unwrap();
        assert_eq!(console.all_attrs(), original);
    }

    #[test]
    fn test_disjoint_selections() {
        let mut console = patterned_console();
        let original = console.all_attrs();
        let mut renderer = SelectionRenderer::new();

        let a = Rect::new(0, 0, 2, 1);
        let b = Rect::new(8, 5, 10, 6);
        renderer.update(&mut console, Rect::EMPTY, a).unwrap();
        renderer.update(&mut console, a, b).unwrap();
        assert_eq!(attr_at(&console, 0, 0), original[0]);
        assert_eq!(attr_at(&console, 8, 5), Attr::SELECTION_FALLBACK);
        renderer.update(&mut console, b, Rect::EMPTY).unwrap();
        assert_eq!(console.all_attrs(), original);
    }

    #[test]
    fn test_failed_allocation_restores_default() {
        let mut console = patterned_console();
        let mut renderer = SelectionRenderer::new();
        renderer.set_capacity_limit(Some(4));

        let rect = Rect::new(0, 0, 4, 1);
        renderer.update(&mut console, Rect::EMPTY, rect).unwrap();
        assert!(renderer.saved().is_none());
        assert_eq!(attr_at(&console, 3, 1), Attr::SELECTION_FALLBACK);

        renderer.update(&mut console, rect, Rect::EMPTY).unwrap();
        assert_eq!(attr_at(&console, 3, 1), Attr::DEFAULT);
    }

    #[test]
    fn test_buffers_grow_in_doubling_steps() {
        let mut console = patterned_console();
        let mut renderer = SelectionRenderer::new();
        renderer.update(&mut console, Rect::EMPTY, Rect::new(0, 0, 2, 0)).unwrap();
        let first = renderer.buffers[1].capacity();
        renderer.update(&mut console, Rect::new(0, 0, 2, 0), Rect::new(0, 0, 3, 0)).unwrap();
        renderer.update(&mut console, Rect::new(0, 0, 3, 0), Rect::new(0, 0, 3, 0)).unwrap();
        assert!(renderer.buffers[1].capacity() >= first * 2);
    }

    #[test]
    fn test_invalidate_forgets_saved() {
        let mut console = patterned_console();
        let mut renderer = SelectionRenderer::new();
        renderer.update(&mut console, Rect::EMPTY, Rect::new(0, 0, 1, 1)).unwrap();
        assert!(renderer.saved().is_some());
        renderer.invalidate();
        assert!(renderer.saved().is_none());
    }

    #[test]
    fn test_distance_outside() {
        let window = Rect::new(0, 10, 79, 34);
        assert_eq!(distance_outside(window, Coord::new(5, 20)), Coord::new(0, 0));
        assert_eq!(distance_outside(window, Coord::new(5, 8)), Coord::new(0, -2));
        assert_eq!(distance_outside(window, Coord::new(82, 36)), Coord::new(3, 2));
    }

    #[test]
    fn test_scroll_window_clamps() {
        let mut console = MemoryConsole::with_window(10, 40, 10);
        assert!(scroll_window(&mut console, Coord::new(0, 5)).unwrap());
        assert_eq!(console.window_rect().top, 5);
        assert!(scroll_window(&mut console, Coord::new(0, 100)).unwrap());
        assert_eq!(console.window_rect().top, 30);
        assert!(!scroll_window(&mut console, Coord::new(0, 1)).unwrap());
        assert!(!scroll_window(&mut console, Coord::default()).unwrap());
    }
}
