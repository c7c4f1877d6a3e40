//! Row-range selection.
//!
//! One selection exists workspace-wide: anchoring is per-cell, but the
//! selected set is whole rows. Extending recomputes the span from scratch,
//! so the set always equals exactly the rows between the anchor position
//! and the extension position, inclusive.

use crate::rows::{CellRef, RowId};

/// An inclusive range of display positions, normalized so start <= end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    start: usize,
    end: usize,
}

impl RowRange {
    /// Create a range between two positions, in either order.
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of positions spanned.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false // always spans at least one position
    }

    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos <= self.end
    }

    /// Iterate over the spanned positions, ascending.
    pub fn positions(&self) -> impl Iterator<Item = usize> {
        self.start..=self.end
    }
}

/// The workspace selection: at most one window's rows at a time.
///
/// Invariant: every row in `rows` belongs to the body of `table`.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    table: Option<String>,
    anchor: Option<CellRef>,
    anchor_pos: usize,
    rows: Vec<RowId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The table the selection belongs to, if any.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn anchor(&self) -> Option<CellRef> {
        self.anchor
    }

    /// Display position the anchor had when the selection started.
    pub fn anchor_pos(&self) -> usize {
        self.anchor_pos
    }

    /// Selected row handles in display order.
    pub fn row_ids(&self) -> &[RowId] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn contains_row(&self, row: RowId) -> bool {
        self.rows.contains(&row)
    }

    /// Begin a new selection: drops any prior one and selects exactly the
    /// anchor's row.
    pub fn start(&mut self, table: &str, anchor: CellRef, anchor_pos: usize) {
        self.table = Some(table.to_string());
        self.anchor = Some(anchor);
        self.anchor_pos = anchor_pos;
        self.rows = vec![anchor.row];
    }

    /// The span from the anchor to `pos`, in either order. Returns None when
    /// no selection is active.
    pub fn range_to(&self, pos: usize) -> Option<RowRange> {
        self.anchor?;
        Some(RowRange::new(self.anchor_pos, pos))
    }

    /// Replace the selected set wholesale. Caller re-derives the rows from
    /// the window on every extension; no incremental diffing.
    pub fn set_rows(&mut self, rows: Vec<RowId>) {
        if self.anchor.is_some() {
            self.rows = rows;
        }
    }

    /// Empty the selection and forget the table.
    pub fn clear(&mut self) {
        self.table = None;
        self.anchor = None;
        self.anchor_pos = 0;
        self.rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u64, col: usize) -> CellRef {
        CellRef::new(RowId::from_raw(row), col)
    }

    #[test]
    fn test_range_normalizes() {
        let r = RowRange::new(7, 3);
        assert_eq!(r.start(), 3);
        assert_eq!(r.end(), 7);
        assert_eq!(r.len(), 5);
        assert!(r.contains(3));
        assert!(r.contains(5));
        assert!(r.contains(7));
        assert!(!r.contains(8));
    }

    #[test]
    fn test_range_single_position() {
        let r = RowRange::new(4, 4);
        assert_eq!(r.len(), 1);
        assert_eq!(r.positions().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_start_selects_one_row() {
        let mut sel = Selection::new();
        sel.start("users", cell(9, 2), 9);

        assert_eq!(sel.table(), Some("users"));
        assert_eq!(sel.anchor(), Some(cell(9, 2)));
        assert_eq!(sel.row_ids(), &[RowId::from_raw(9)]);
    }

    #[test]
    fn test_start_replaces_prior_selection() {
        let mut sel = Selection::new();
        sel.start("users", cell(1, 0), 1);
        sel.set_rows(vec![RowId::from_raw(1), RowId::from_raw(2)]);

        sel.start("orders", cell(0, 1), 0);
        assert_eq!(sel.table(), Some("orders"));
        assert_eq!(sel.row_count(), 1);
    }

    #[test]
    fn test_range_to_either_direction() {
        let mut sel = Selection::new();
        sel.start("users", cell(5, 1), 5);

        assert_eq!(sel.range_to(8), Some(RowRange::new(5, 8)));
        assert_eq!(sel.range_to(2), Some(RowRange::new(2, 5)));
    }

    #[test]
    fn test_clear_forgets_table() {
        let mut sel = Selection::new();
        sel.start("users", cell(0, 0), 0);
        sel.clear();

        assert!(sel.is_empty());
        assert_eq!(sel.table(), None);
        assert_eq!(sel.anchor(), None);
        assert_eq!(sel.range_to(3), None);
    }

    #[test]
    fn test_set_rows_requires_anchor() {
        let mut sel = Selection::new();
        sel.set_rows(vec![RowId::from_raw(1)]);
        assert!(sel.is_empty());
    }
}
