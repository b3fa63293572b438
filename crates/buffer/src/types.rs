// Chunk: docs/chunks/input_line - Input line storage with dirty range tracking

/// The span of the input line whose on-screen representation no longer
/// matches the buffer.
///
/// A zero `length` means the text is unchanged since the last paint; only
/// the cursor may have moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyRange {
    pub begin: usize,
    pub length: usize,
}

impl DirtyRange {
    pub const CLEAN: DirtyRange = DirtyRange {
        begin: 0,
        length: 0,
    };

    pub fn new(begin: usize, length: usize) -> Self {
        Self { begin, length }
    }

    /// Returns true if no text changed.
    pub fn is_clean(&self) -> bool {
        self.length == 0
    }

    /// One past the last dirty offset.
    pub fn end(&self) -> usize {
        self.begin + self.length
    }

    /// Merges another dirty range into this one, producing the smallest
    /// contiguous range that covers both.
    ///
    /// Several edits can happen between two paints (a batch of key events
    /// is drained before repainting), so ranges accumulate until the
    /// painter takes them.
    pub fn merge(&mut self, other: DirtyRange) {
        if other.is_clean() {
            return;
        }
        if self.is_clean() {
            *self = other;
            return;
        }
        let begin = self.begin.min(other.begin);
        let end = self.end().max(other.end());
        *self = DirtyRange {
            begin,
            length: end - begin,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Merge: identity ====================

    #[test]
    fn merge_clean_is_identity() {
        let mut d = DirtyRange::new(3, 4);
        d.merge(DirtyRange::CLEAN);
        assert_eq!(d, DirtyRange::new(3, 4));

        let mut d = DirtyRange::CLEAN;
        d.merge(DirtyRange::new(3, 4));
        assert_eq!(d, DirtyRange::new(3, 4));
    }

    // ==================== Merge: ranges ====================

    #[test]
    fn merge_overlapping_ranges() {
        let mut d = DirtyRange::new(3, 4);
        d.merge(DirtyRange::new(5, 5));
        assert_eq!(d, DirtyRange::new(3, 7));
    }

    #[test]
    fn merge_disjoint_ranges_covers_gap() {
        let mut d = DirtyRange::new(8, 2);
        d.merge(DirtyRange::new(1, 1));
        assert_eq!(d, DirtyRange::new(1, 9));
    }

    #[test]
    fn merge_nested_ranges() {
        let mut d = DirtyRange::new(2, 8);
        d.merge(DirtyRange::new(4, 3));
        assert_eq!(d, DirtyRange::new(2, 8));
    }
}
