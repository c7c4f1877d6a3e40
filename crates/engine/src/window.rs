//! One table window and its incrementally loaded page cache.
//!
//! Rows are appended in arrival order and addressed by stable `RowId`
//! handles. A delete removes entries without renumbering the survivors, so
//! display positions are always resolved by lookup. At most one page fetch
//! is outstanding per window, guarded by the `is_loading` flag; the load
//! protocol is sans-IO (`begin_load` / `apply_page` / `fail_load`) so the
//! driving layer owns the actual round trip.

use rowdock_core::{CellRef, Geometry, RowId, RowIdAllocator};
use rowdock_protocol::{Page, RowData, TableInfo};

/// Fraction of the content height past which the next page is requested.
pub const LOAD_THRESHOLD: f64 = 0.95;

pub const HEADER_HEIGHT: f64 = 36.0;
pub const ROW_HEIGHT: f64 = 28.0;

/// Minimum usable window size: a header plus one visible row.
pub const MIN_WINDOW_WIDTH: f64 = 160.0;
pub const MIN_WINDOW_HEIGHT: f64 = HEADER_HEIGHT + ROW_HEIGHT;

/// One materialized row: stable handle plus values in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: RowId,
    pub cells: Vec<Option<String>>,
}

impl Row {
    /// Value of the identity column (index 0).
    pub fn identity(&self) -> Option<&str> {
        self.cells.first().and_then(|v| v.as_deref())
    }
}

/// A page fetch the driving layer should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub table: String,
    pub page: u64,
}

/// An uncommitted draft row, at most one per window. One text field per
/// column; blank fields submit as NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRow {
    values: Vec<String>,
}

impl DraftRow {
    fn new(columns: usize) -> Self {
        Self {
            values: vec![String::new(); columns],
        }
    }

    pub fn set(&mut self, col: usize, value: impl Into<String>) -> bool {
        match self.values.get_mut(col) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, col: usize) -> Option<&str> {
        self.values.get(col).map(|v| v.as_str())
    }

    /// Gather the draft into wire form, mapping empty fields to NULL.
    pub fn to_row_data(&self, columns: &[String]) -> RowData {
        columns
            .iter()
            .zip(&self.values)
            .map(|(col, value)| {
                let v = if value.is_empty() {
                    None
                } else {
                    Some(value.clone())
                };
                (col.clone(), v)
            })
            .collect()
    }
}

/// Scroll proximity trigger: true when the visible position is within 5%
/// of the bottom of the loaded content. Edge-triggered and idempotent:
/// redundant calls are absorbed by the `is_loading` guard downstream.
pub fn should_load_more(scroll_top: f64, viewport_height: f64, content_height: f64) -> bool {
    content_height > 0.0 && scroll_top + viewport_height >= content_height * LOAD_THRESHOLD
}

/// One open table window: schema snapshot, loaded rows, counters, and the
/// transient insert draft.
#[derive(Debug)]
pub struct TableWindow {
    name: String,
    columns: Vec<String>,
    total_rows: u64,
    current_page: u64,
    is_loading: bool,
    initial_load_done: bool,
    rows: Vec<Row>,
    ids: RowIdAllocator,
    geometry: Geometry,
    draft: Option<DraftRow>,
}

impl TableWindow {
    pub fn new(name: impl Into<String>, info: &TableInfo, geometry: Geometry) -> Self {
        Self {
            name: name.into(),
            columns: info.columns.clone(),
            total_rows: info.total_rows,
            current_page: 1,
            is_loading: false,
            initial_load_done: false,
            rows: Vec::new(),
            ids: RowIdAllocator::new(),
            geometry,
            draft: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Name of the identity column (index 0).
    pub fn identity_column(&self) -> &str {
        &self.columns[0]
    }

    /// Authoritative row count; mutated on insert/delete/truncate.
    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    /// Rows materialized client-side.
    pub fn loaded_rows(&self) -> u64 {
        self.rows.len() as u64
    }

    /// Next page to request; increments only on a successful load.
    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = geometry;
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    // ── Pagination ──────────────────────────────────────────────────

    /// Start a page load. Declines (None) while a load is in flight or the
    /// cache is saturated; the very first load bypasses the saturation
    /// check so an empty table still renders its header shell.
    pub fn begin_load(&mut self) -> Option<PageRequest> {
        if self.is_loading {
            return None;
        }
        if self.initial_load_done && self.loaded_rows() >= self.total_rows {
            return None;
        }
        self.is_loading = true;
        Some(PageRequest {
            table: self.name.clone(),
            page: self.current_page,
        })
    }

    /// Append a fetched page. Render order is arrival order; no client-side
    /// re-sort. Returns the number of rows appended.
    pub fn apply_page(&mut self, page: Page) -> usize {
        let appended = page.rows.len();
        for data in page.rows {
            let id = self.ids.allocate();
            self.rows.push(Row {
                id,
                cells: self.project(&data),
            });
        }
        self.current_page += 1;
        self.is_loading = false;
        self.initial_load_done = true;
        appended
    }

    /// A failed load leaves everything unchanged except the flag, so the
    /// next scroll trigger can retry.
    pub fn fail_load(&mut self) {
        self.is_loading = false;
    }

    fn project(&self, data: &RowData) -> Vec<Option<String>> {
        self.columns
            .iter()
            .map(|col| data.get(col).cloned().flatten())
            .collect()
    }

    // ── Row addressing ──────────────────────────────────────────────

    pub fn row_at(&self, pos: usize) -> Option<&Row> {
        self.rows.get(pos)
    }

    pub fn position_of(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    /// Identity value of a row, read from the cache (never from rendered
    /// text).
    pub fn identity_of(&self, id: RowId) -> Option<String> {
        let pos = self.position_of(id)?;
        self.rows[pos].identity().map(str::to_string)
    }

    /// Current value of a body cell; None when the cell does not resolve.
    pub fn cell_value(&self, cell: CellRef) -> Option<Option<String>> {
        let pos = self.position_of(cell.row)?;
        self.rows[pos].cells.get(cell.col).cloned()
    }

    /// Overwrite a cell, returning the prior value for rollback. The outer
    /// Option distinguishes "cell did not resolve" from a NULL prior.
    pub fn set_cell(&mut self, id: RowId, col: usize, value: Option<String>) -> Option<Option<String>> {
        let pos = self.position_of(id)?;
        let slot = self.rows[pos].cells.get_mut(col)?;
        Some(std::mem::replace(slot, value))
    }

    // ── Insert draft ────────────────────────────────────────────────

    /// Start a draft row; no-op (false) when one already exists.
    pub fn add_draft(&mut self) -> bool {
        if self.draft.is_some() {
            return false;
        }
        self.draft = Some(DraftRow::new(self.columns.len()));
        true
    }

    pub fn draft(&self) -> Option<&DraftRow> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut DraftRow> {
        self.draft.as_mut()
    }

    pub fn take_draft(&mut self) -> Option<DraftRow> {
        self.draft.take()
    }

    /// Put a draft back after a failed submit so it stays editable.
    pub fn restore_draft(&mut self, draft: DraftRow) {
        self.draft = Some(draft);
    }

    /// Materialize a confirmed insert at the top of the rendered rows and
    /// grow both counters.
    pub fn confirm_insert(&mut self, data: &RowData) -> RowId {
        let id = self.ids.allocate();
        let row = Row {
            id,
            cells: self.project(data),
        };
        self.rows.insert(0, row);
        self.total_rows += 1;
        id
    }

    /// Undo a `confirm_insert` (insert rollback).
    pub fn remove_confirmed(&mut self, id: RowId) {
        if let Some(pos) = self.position_of(id) {
            self.rows.remove(pos);
            self.total_rows -= 1;
        }
    }

    // ── Delete ──────────────────────────────────────────────────────

    /// Remove the given rows, shrinking both counters by the number
    /// actually removed. Returns the removed rows with their positions for
    /// rollback.
    pub fn remove_rows(&mut self, ids: &[RowId]) -> Vec<(usize, Row)> {
        let mut removed = Vec::new();
        // walk back to front so captured positions stay valid on reinsert
        for pos in (0..self.rows.len()).rev() {
            if ids.contains(&self.rows[pos].id) {
                removed.push((pos, self.rows.remove(pos)));
            }
        }
        removed.reverse();
        self.total_rows -= removed.len() as u64;
        removed
    }

    /// Reinsert rows captured by `remove_rows` (delete rollback).
    pub fn restore_rows(&mut self, removed: Vec<(usize, Row)>) {
        let count = removed.len() as u64;
        for (pos, row) in removed {
            let pos = pos.min(self.rows.len());
            self.rows.insert(pos, row);
        }
        self.total_rows += count;
    }

    // ── Truncate ────────────────────────────────────────────────────

    /// Empty the window in place: both counters drop to zero and the
    /// window keeps rendering its header shell. Any draft is discarded.
    pub fn clear_rows(&mut self) {
        self.rows.clear();
        self.total_rows = 0;
        self.current_page = 1;
        self.is_loading = false;
        self.draft = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn info(total: u64) -> TableInfo {
        TableInfo {
            columns: vec!["id".into(), "name".into(), "price".into()],
            total_rows: total,
        }
    }

    fn page(ids: std::ops::Range<u64>) -> Page {
        Page {
            rows: ids
                .map(|i| {
                    let mut row = BTreeMap::new();
                    row.insert("id".to_string(), Some(i.to_string()));
                    row.insert("name".to_string(), Some(format!("item-{}", i)));
                    row.insert("price".to_string(), None);
                    row
                })
                .collect(),
        }
    }

    fn window(total: u64) -> TableWindow {
        TableWindow::new(
            "products",
            &info(total),
            Geometry::new(0.0, 0.0, 480.0, 320.0, 1),
        )
    }

    #[test]
    fn test_begin_load_declines_while_loading() {
        let mut w = window(100);
        let first = w.begin_load();
        assert!(first.is_some());
        assert!(w.is_loading());

        // second request while in flight: no effect
        assert!(w.begin_load().is_none());
        assert_eq!(w.current_page(), 1);
        assert_eq!(w.loaded_rows(), 0);
    }

    #[test]
    fn test_apply_page_advances_counters() {
        let mut w = window(100);
        let req = w.begin_load().unwrap();
        assert_eq!(req.page, 1);

        let n = w.apply_page(page(0..50));
        assert_eq!(n, 50);
        assert_eq!(w.loaded_rows(), 50);
        assert_eq!(w.current_page(), 2);
        assert!(!w.is_loading());
    }

    #[test]
    fn test_saturation_blocks_further_loads() {
        let mut w = window(50);
        w.begin_load().unwrap();
        w.apply_page(page(0..50));

        assert!(w.begin_load().is_none());
    }

    #[test]
    fn test_initial_load_bypasses_saturation_on_empty_table() {
        let mut w = window(0);
        // 0 loaded >= 0 total, but the first load must still go out
        let req = w.begin_load();
        assert!(req.is_some());

        w.apply_page(page(0..0));
        assert_eq!(w.loaded_rows(), 0);
        // after the shell load, saturation applies
        assert!(w.begin_load().is_none());
    }

    #[test]
    fn test_failed_load_is_retryable_and_keeps_state() {
        let mut w = window(100);
        w.begin_load().unwrap();
        w.fail_load();

        assert!(!w.is_loading());
        assert_eq!(w.current_page(), 1);
        assert_eq!(w.loaded_rows(), 0);

        // retry requests the same page
        let req = w.begin_load().unwrap();
        assert_eq!(req.page, 1);
    }

    #[test]
    fn test_rows_keep_arrival_order_and_stable_ids() {
        let mut w = window(100);
        w.begin_load().unwrap();
        w.apply_page(page(0..3));

        let ids: Vec<u64> = w.rows().iter().map(|r| r.id.raw()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(w.rows()[1].identity(), Some("1"));
        assert_eq!(w.rows()[1].cells[2], None); // NULL price
    }

    #[test]
    fn test_delete_leaves_id_gaps() {
        let mut w = window(100);
        w.begin_load().unwrap();
        w.apply_page(page(0..5));

        let victim = w.rows()[2].id;
        let removed = w.remove_rows(&[victim]);
        assert_eq!(removed.len(), 1);
        assert_eq!(w.loaded_rows(), 4);
        assert_eq!(w.total_rows(), 99);

        // survivors keep their handles; position is lookup, not arithmetic
        let ids: Vec<u64> = w.rows().iter().map(|r| r.id.raw()).collect();
        assert_eq!(ids, vec![0, 1, 3, 4]);
        assert_eq!(w.position_of(RowId::from_raw(3)), Some(2));
        assert_eq!(w.position_of(victim), None);
    }

    #[test]
    fn test_restore_rows_round_trips() {
        let mut w = window(100);
        w.begin_load().unwrap();
        w.apply_page(page(0..5));
        let before: Vec<RowId> = w.rows().iter().map(|r| r.id).collect();

        let victims = vec![before[1], before[3]];
        let removed = w.remove_rows(&victims);
        w.restore_rows(removed);

        let after: Vec<RowId> = w.rows().iter().map(|r| r.id).collect();
        assert_eq!(before, after);
        assert_eq!(w.total_rows(), 100);
    }

    #[test]
    fn test_confirm_insert_prepends() {
        let mut w = window(10);
        w.begin_load().unwrap();
        w.apply_page(page(0..2));

        let mut data = BTreeMap::new();
        data.insert("id".to_string(), Some("106".to_string()));
        data.insert("name".to_string(), Some("new".to_string()));
        data.insert("price".to_string(), None);
        let id = w.confirm_insert(&data);

        assert_eq!(w.rows()[0].id, id);
        assert_eq!(w.total_rows(), 11);
        assert_eq!(w.loaded_rows(), 3);

        w.remove_confirmed(id);
        assert_eq!(w.total_rows(), 10);
        assert_eq!(w.loaded_rows(), 2);
    }

    #[test]
    fn test_draft_slot_is_single() {
        let mut w = window(10);
        assert!(w.add_draft());
        assert!(!w.add_draft());

        w.draft_mut().unwrap().set(1, "widget");
        let data = w.take_draft().unwrap().to_row_data(w.columns());
        assert_eq!(data["name"], Some("widget".to_string()));
        assert_eq!(data["id"], None); // blank -> NULL
        assert!(w.draft().is_none());
    }

    #[test]
    fn test_clear_rows_resets_everything() {
        let mut w = window(100);
        w.begin_load().unwrap();
        w.apply_page(page(0..50));
        w.add_draft();

        w.clear_rows();
        assert_eq!(w.loaded_rows(), 0);
        assert_eq!(w.total_rows(), 0);
        assert_eq!(w.current_page(), 1);
        assert!(w.draft().is_none());
        // saturated at zero: no further loads
        assert!(w.begin_load().is_none());
    }

    #[test]
    fn test_set_cell_returns_prior() {
        let mut w = window(10);
        w.begin_load().unwrap();
        w.apply_page(page(0..2));
        let id = w.rows()[0].id;

        let prior = w.set_cell(id, 1, Some("renamed".into()));
        assert_eq!(prior, Some(Some("item-0".to_string())));
        assert_eq!(
            w.cell_value(CellRef::new(id, 1)),
            Some(Some("renamed".to_string()))
        );
    }

    #[test]
    fn test_should_load_more_threshold() {
        // 1000px of content, 300px viewport
        assert!(!should_load_more(0.0, 300.0, 1000.0));
        assert!(!should_load_more(600.0, 300.0, 1000.0));
        assert!(should_load_more(650.0, 300.0, 1000.0));
        assert!(should_load_more(700.0, 300.0, 1000.0));
        // empty content never triggers
        assert!(!should_load_more(0.0, 300.0, 0.0));
    }
}
