// Chunk: docs/chunks/console_surface - Console surface abstraction
//!
//! A grid of character cells with attributes.
//!
//! `ScreenGrid` backs the in-memory console and is the shadow copy the
//! crossterm console keeps so that cells it has written can be read back.

use conline_buffer::Attr;
use conline_input::Coord;

/// One character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub attr: Attr,
}

impl Cell {
    pub fn blank(attr: Attr) -> Self {
        Self { ch: ' ', attr }
    }
}

/// A row-major buffer of cells.
#[derive(Debug, Clone)]
pub struct ScreenGrid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    blank_attr: Attr,
}

impl ScreenGrid {
    pub fn new(width: i32, height: i32, blank_attr: Attr) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            cells: vec![Cell::blank(blank_attr); (width * height) as usize],
            blank_attr,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Dimensions as (columns, rows).
    pub fn size(&self) -> Coord {
        Coord::new(self.width, self.height)
    }

    /// Linear index of `at`, or `None` if it lies outside the grid.
    fn index(&self, at: Coord) -> Option<usize> {
        if at.x < 0 || at.x >= self.width || at.y < 0 || at.y >= self.height {
            return None;
        }
        Some(at.to_linear(self.width) as usize)
    }

    /// Range of linear indices covered by `count` cells starting at `at`,
    /// clipped to the end of the grid.
    fn span(&self, at: Coord, count: usize) -> std::ops::Range<usize> {
        match self.index(at) {
            Some(start) => start..(start + count).min(self.cells.len()),
            None => 0..0,
        }
    }

    pub fn cell(&self, at: Coord) -> Option<Cell> {
        self.index(at).map(|i| self.cells[i])
    }

    /// Writes characters from `at`, wrapping across rows. Returns the number
    /// of cells written.
    pub fn write_chars(&mut self, at: Coord, chars: &[char]) -> usize {
        let span = self.span(at, chars.len());
        let written = span.len();
        for (cell, &ch) in self.cells[span].iter_mut().zip(chars) {
            cell.ch = ch;
        }
        written
    }

    pub fn write_attrs(&mut self, at: Coord, attrs: &[Attr]) -> usize {
        let span = self.span(at, attrs.len());
        let written = span.len();
        for (cell, &attr) in self.cells[span].iter_mut().zip(attrs) {
            cell.attr = attr;
        }
        written
    }

    pub fn fill_attr(&mut self, at: Coord, count: usize, attr: Attr) -> usize {
        let span = self.span(at, count);
        let written = span.len();
        for cell in &mut self.cells[span] {
            cell.attr = attr;
        }
        written
    }

    pub fn read_chars(&self, at: Coord, count: usize) -> Vec<char> {
        self.cells[self.span(at, count)].iter().map(|c| c.ch).collect()
    }

    pub fn read_attrs(&self, at: Coord, count: usize) -> Vec<Attr> {
        self.cells[self.span(at, count)].iter().map(|c| c.attr).collect()
    }

    pub fn cells(&self, at: Coord, count: usize) -> &[Cell] {
        &self.cells[self.span(at, count)]
    }

    /// Moves every row up by `lines`; the vacated bottom rows are blanked.
    pub fn scroll_up(&mut self, lines: i32) {
        let lines = lines.clamp(0, self.height) as usize;
        if lines == 0 {
            return;
        }
        let shift = lines * self.width as usize;
        self.cells.drain(..shift);
        self.cells
            .extend(std::iter::repeat(Cell::blank(self.blank_attr)).take(shift));
    }

    /// Resizes the grid, keeping the top-left contents that still fit.
    pub fn resize(&mut self, width: i32, height: i32) {
        let mut resized = ScreenGrid::new(width, height, self.blank_attr);
        for y in 0..self.height.min(resized.height) {
            let count = self.width.min(resized.width) as usize;
            let row: Vec<Cell> = self.cells(Coord::new(0, y), count).to_vec();
            let start = Coord::new(0, y).to_linear(resized.width) as usize;
            resized.cells[start..start + count].copy_from_slice(&row);
        }
        *self = resized;
    }

    /// The characters of row `y` as a string, trailing spaces kept.
    pub fn row_text(&self, y: i32) -> String {
        self.read_chars(Coord::new(0, y), self.width as usize)
            .into_iter()
            .collect()
    }
}
