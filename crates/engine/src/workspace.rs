//! The workspace context.
//!
//! One `Workspace` exists per data-source session. It owns the open window
//! set, the z-order counter, the single selection and edit slot, and the
//! gesture state; there are no process-wide singletons. Every operation
//! that talks to the data source takes the `RowSource` explicitly; the
//! workspace itself never holds a transport.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use rowdock_config::{LayoutSnapshot, LayoutStore};
use rowdock_core::{CellRef, Geometry, RowId, Selection};
use rowdock_protocol::Catalog;

use crate::edit::{CommitOutcome, EditController};
use crate::events::{EngineEvent, EventCollector};
use crate::gesture::{self, GestureState, Viewport};
use crate::source::{RowSource, SourceError};
use crate::window::{should_load_more, TableWindow};

pub const DEFAULT_WINDOW_WIDTH: f64 = 480.0;
pub const DEFAULT_WINDOW_HEIGHT: f64 = 320.0;
/// Cascade offset applied per already-open window.
pub const CASCADE_STEP: f64 = 40.0;

const LAYOUT_VERSION: u32 = 1;

type Rollback = Box<dyn FnOnce(&mut TableWindow)>;

/// Optimistic mutation: apply locally, capture the inverse, run the remote
/// commit, undo on failure. Shared by the edit, insert and delete paths.
fn with_rollback<R>(
    window: &mut TableWindow,
    apply: impl FnOnce(&mut TableWindow) -> Rollback,
    commit: impl FnOnce() -> Result<R, SourceError>,
) -> Result<R, SourceError> {
    let undo = apply(window);
    match commit() {
        Ok(value) => Ok(value),
        Err(err) => {
            undo(window);
            Err(err)
        }
    }
}

pub struct Workspace {
    source_key: String,
    catalog: Catalog,
    windows: BTreeMap<String, TableWindow>,
    viewport: Viewport,
    z_counter: u64,
    selection: Selection,
    edit: EditController,
    gesture: GestureState,
    store: Option<LayoutStore>,
    events: EventCollector,
}

impl Workspace {
    /// Construct a fresh workspace for one data source. `store` is the
    /// layout persistence; pass None to keep layouts in memory only.
    pub fn new(
        source_key: impl Into<String>,
        catalog: Catalog,
        viewport: Viewport,
        store: Option<LayoutStore>,
    ) -> Self {
        Self {
            source_key: source_key.into(),
            catalog,
            windows: BTreeMap::new(),
            viewport,
            z_counter: 0,
            selection: Selection::new(),
            edit: EditController::new(),
            gesture: GestureState::Idle,
            store,
            events: EventCollector::new(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn window(&self, table: &str) -> Option<&TableWindow> {
        self.windows.get(table)
    }

    pub fn windows(&self) -> impl Iterator<Item = &TableWindow> {
        self.windows.values()
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn pending_edit(&self) -> Option<&crate::edit::PendingEdit> {
        self.edit.pending()
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn events(&self) -> &[EngineEvent] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        self.events.take()
    }

    fn next_z(&mut self) -> u64 {
        // monotonic for the life of the workspace, never reset
        self.z_counter += 1;
        self.z_counter
    }

    // ── Window lifecycle ────────────────────────────────────────────

    /// Open a window for `table`, or raise and re-center the existing one.
    /// Triggers the initial page load; if that load fails the window stays
    /// open with an empty cache, retryable from the next scroll trigger.
    pub fn open_window(
        &mut self,
        source: &mut dyn RowSource,
        table: &str,
    ) -> Result<(), SourceError> {
        if self.windows.contains_key(table) {
            let z = self.next_z();
            let viewport = self.viewport;
            if let Some(window) = self.windows.get_mut(table) {
                let mut geometry =
                    window.geometry().centered_in(viewport.width, viewport.height);
                geometry.z_index = z;
                window.set_geometry(geometry);
            }
            return Ok(());
        }

        let info = match self.catalog.get(table) {
            Some(info) => info.clone(),
            None => return Err(SourceError::Rejected(format!("unknown table: {}", table))),
        };
        let geometry = self.initial_geometry(table);
        self.windows
            .insert(table.to_string(), TableWindow::new(table, &info, geometry));
        self.events.push(EngineEvent::WindowOpened {
            table: table.to_string(),
        });
        self.persist_layout();
        self.load_next_page(source, table).map(|_| ())
    }

    /// Restored geometry when layout history exists for this source,
    /// otherwise a cascaded default. A fresh z-index is assigned either way.
    fn initial_geometry(&mut self, table: &str) -> Geometry {
        let z = self.next_z();
        let restored = self
            .store
            .as_ref()
            .and_then(|s| s.load(&self.source_key))
            .and_then(|snapshot| snapshot.windows.get(table).copied());
        match restored {
            Some(mut geometry) => {
                geometry.z_index = z;
                geometry
            }
            None => {
                let offset = CASCADE_STEP + CASCADE_STEP * self.windows.len() as f64;
                Geometry::new(offset, offset, DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT, z)
            }
        }
    }

    /// Close a window, discarding its transient edit/insert drafts, and
    /// persist the reduced window set.
    pub fn close_window(&mut self, table: &str) -> bool {
        if self.windows.remove(table).is_none() {
            return false;
        }
        if self.selection.table() == Some(table) {
            self.selection.clear();
        }
        if self.edit.editing_table(table) {
            self.edit.cancel();
        }
        if self.gesture.target() == Some(table) {
            self.gesture = GestureState::Idle;
        }
        self.events.push(EngineEvent::WindowClosed {
            table: table.to_string(),
        });
        self.persist_layout();
        true
    }

    /// Raise to front: consumes the next z-index. Invoked on any pointer
    /// interaction with the window.
    pub fn raise_window(&mut self, table: &str) -> bool {
        let z = self.next_z();
        match self.windows.get_mut(table) {
            Some(window) => {
                let mut geometry = window.geometry();
                geometry.z_index = z;
                window.set_geometry(geometry);
                true
            }
            None => false,
        }
    }

    /// Reconstruct previously open windows from the persisted layout.
    /// Geometry and stacking order are restored exactly; tables missing
    /// from the catalog are skipped, and a failed initial load surfaces as
    /// an event without aborting the rest.
    pub fn restore_windows(&mut self, source: &mut dyn RowSource) {
        let Some(snapshot) = self.store.as_ref().and_then(|s| s.load(&self.source_key)) else {
            return;
        };
        self.z_counter = self.z_counter.max(snapshot.max_z_index());

        let mut entries: Vec<(String, Geometry)> = snapshot
            .windows
            .into_iter()
            .filter(|(table, _)| self.catalog.contains_key(table))
            .collect();
        entries.sort_by_key(|(_, g)| g.z_index);

        for (table, geometry) in entries {
            if self.windows.contains_key(&table) {
                continue;
            }
            let info = self.catalog[&table].clone();
            self.windows
                .insert(table.clone(), TableWindow::new(&table, &info, geometry));
            self.events.push(EngineEvent::WindowOpened {
                table: table.clone(),
            });
            // failure already recorded as a LoadFailed event
            let _ = self.load_next_page(source, &table);
        }
        self.persist_layout();
    }

    // ── Pagination ──────────────────────────────────────────────────

    /// Drive one page load. Declines silently while a load is in flight or
    /// the cache is saturated. Returns the number of rows appended.
    pub fn load_next_page(
        &mut self,
        source: &mut dyn RowSource,
        table: &str,
    ) -> Result<usize, SourceError> {
        let request = match self.windows.get_mut(table).and_then(|w| w.begin_load()) {
            Some(request) => request,
            None => return Ok(0),
        };
        debug!(table, page = request.page, "requesting page");

        let outcome = source.fetch_page(&request.table, request.page);
        let Some(window) = self.windows.get_mut(table) else {
            return Ok(0);
        };
        match outcome {
            Ok(page) => {
                let appended = window.apply_page(page);
                self.events.push(EngineEvent::PageLoaded {
                    table: table.to_string(),
                    rows: appended,
                });
                Ok(appended)
            }
            Err(err) => {
                window.fail_load();
                warn!(table, error = %err, "page load failed");
                self.events.push(EngineEvent::LoadFailed {
                    table: table.to_string(),
                    message: err.message().to_string(),
                });
                Err(err)
            }
        }
    }

    /// Scroll trigger: load the next page when the scroll position is
    /// within 5% of the bottom of the loaded content. Safe to call
    /// redundantly.
    pub fn scrolled(
        &mut self,
        source: &mut dyn RowSource,
        table: &str,
        scroll_top: f64,
        viewport_height: f64,
        content_height: f64,
    ) -> Result<usize, SourceError> {
        if !should_load_more(scroll_top, viewport_height, content_height) {
            return Ok(0);
        }
        self.load_next_page(source, table)
    }

    // ── Selection ───────────────────────────────────────────────────

    /// Select exactly one cell's row, clearing any prior selection (also
    /// across windows). Cancels an edit in progress: a selection click is
    /// a focus loss for the edited field.
    pub fn start_selection(&mut self, table: &str, cell: CellRef) -> bool {
        let Some(window) = self.windows.get(table) else {
            return false;
        };
        let Some(pos) = window.position_of(cell.row) else {
            return false;
        };
        if cell.col >= window.columns().len() {
            return false;
        }
        if self.edit.is_editing() {
            self.edit.cancel();
        }
        self.selection.start(table, cell, pos);
        true
    }

    /// Extend the selection to the full row span between the anchor and
    /// `cell`, inclusive. No-op when `cell` is outside the anchor's window
    /// body. The set is re-derived from scratch on every extension.
    pub fn extend_selection(&mut self, table: &str, cell: CellRef) -> bool {
        if self.selection.table() != Some(table) {
            return false;
        }
        let Some(window) = self.windows.get(table) else {
            return false;
        };
        let Some(pos) = window.position_of(cell.row) else {
            return false;
        };
        let Some(range) = self.selection.range_to(pos) else {
            return false;
        };
        let rows: Vec<RowId> = range
            .positions()
            .filter_map(|p| window.row_at(p).map(|r| r.id))
            .collect();
        self.selection.set_rows(rows);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ── Editing ─────────────────────────────────────────────────────

    /// Enter edit mode on a cell (double-activation). Identity-column
    /// cells, unresolvable cells, and a second concurrent edit are all
    /// rejected. A selection held by another window is cleared.
    pub fn begin_edit(&mut self, table: &str, cell: CellRef) -> bool {
        let Some(window) = self.windows.get(table) else {
            return false;
        };
        if self.edit.is_editing() {
            return false;
        }
        let Some(original) = window.cell_value(cell) else {
            return false;
        };
        if self.selection.table().map_or(false, |t| t != table) {
            self.selection.clear();
        }
        self.edit.begin(table, cell, original)
    }

    /// Replace the buffered draft text of the edit in progress.
    pub fn edit_draft(&mut self, text: &str) -> bool {
        self.edit.set_draft(text)
    }

    /// Cancel the edit (escape / focus loss): the displayed value was
    /// never touched, the draft is discarded, no network call.
    pub fn cancel_edit(&mut self) {
        self.edit.cancel();
    }

    /// Commit gesture. An unchanged draft closes the edit locally with no
    /// network round trip; otherwise the draft is applied optimistically
    /// and rolled back to the original value if the remote update fails.
    pub fn commit_edit(
        &mut self,
        source: &mut dyn RowSource,
    ) -> Result<CommitOutcome, SourceError> {
        let Some(edit) = self.edit.take() else {
            return Ok(CommitOutcome::NothingPending);
        };
        if edit.is_unchanged() {
            return Ok(CommitOutcome::Unchanged);
        }

        let table = edit.table.clone();
        let Some(window) = self.windows.get_mut(&table) else {
            return Ok(CommitOutcome::NothingPending);
        };
        let Some(pk_value) = window.identity_of(edit.cell.row) else {
            return Err(SourceError::Rejected("row has no identity value".into()));
        };
        let pk_column = window.identity_column().to_string();
        let column = window.columns()[edit.cell.col].clone();
        let cell = edit.cell;
        let draft_value = Some(edit.draft.clone());

        let result = with_rollback(
            window,
            |w| {
                let prior = w.set_cell(cell.row, cell.col, draft_value.clone());
                Box::new(move |w| {
                    if let Some(prior) = prior {
                        w.set_cell(cell.row, cell.col, prior);
                    }
                })
            },
            || {
                source.update_cell(
                    &table,
                    &pk_column,
                    &pk_value,
                    &column,
                    Some(edit.draft.as_str()),
                )
            },
        );

        match result {
            Ok(()) => {
                self.events.push(EngineEvent::CellUpdated {
                    table: table.clone(),
                });
                Ok(CommitOutcome::Updated)
            }
            Err(err) => {
                warn!(table, error = %err, "cell update failed, rolled back");
                self.events.push(EngineEvent::EditRolledBack {
                    table,
                    message: err.message().to_string(),
                });
                Err(err)
            }
        }
    }

    // ── Insert ──────────────────────────────────────────────────────

    /// Start a draft row at the top of the window. No-op when one already
    /// exists for that window.
    pub fn add_draft_row(&mut self, table: &str) -> bool {
        self.windows.get_mut(table).map_or(false, |w| w.add_draft())
    }

    /// Set one field of the draft row.
    pub fn set_draft_field(&mut self, table: &str, col: usize, value: &str) -> bool {
        self.windows
            .get_mut(table)
            .and_then(|w| w.draft_mut())
            .map_or(false, |draft| draft.set(col, value))
    }

    /// Submit the draft row. Blank fields post as NULL. On success the
    /// confirmed row appears at the top and both counters grow by one; on
    /// failure the draft stays editable and nothing is mutated. Returns
    /// false when there was no draft to submit.
    pub fn submit_draft_row(
        &mut self,
        source: &mut dyn RowSource,
        table: &str,
    ) -> Result<bool, SourceError> {
        let Some(window) = self.windows.get_mut(table) else {
            return Ok(false);
        };
        let Some(draft) = window.take_draft() else {
            return Ok(false);
        };
        let data = draft.to_row_data(window.columns());

        let result = with_rollback(
            window,
            |w| {
                let id = w.confirm_insert(&data);
                let draft = draft.clone();
                Box::new(move |w| {
                    w.remove_confirmed(id);
                    w.restore_draft(draft);
                })
            },
            || source.insert_row(table, &data),
        );

        match result {
            Ok(()) => {
                // positions shifted by the prepend; a live selection in
                // this window would go stale
                if self.selection.table() == Some(table) {
                    self.selection.clear();
                }
                self.events.push(EngineEvent::RowInserted {
                    table: table.to_string(),
                });
                Ok(true)
            }
            Err(err) => {
                warn!(table, error = %err, "row insert failed, draft kept");
                self.events.push(EngineEvent::InsertFailed {
                    table: table.to_string(),
                    message: err.message().to_string(),
                });
                Err(err)
            }
        }
    }

    // ── Delete ──────────────────────────────────────────────────────

    /// Delete the selected rows in one batch keyed on identity values read
    /// from the cache. Declines silently when nothing is selected. On
    /// success both counters shrink by the count removed and the selection
    /// clears; on failure rows and selection are left intact for a retry.
    pub fn delete_selection(
        &mut self,
        source: &mut dyn RowSource,
    ) -> Result<usize, SourceError> {
        if self.selection.is_empty() {
            return Ok(0);
        }
        let table = match self.selection.table() {
            Some(table) => table.to_string(),
            None => return Ok(0),
        };
        let Some(window) = self.windows.get_mut(&table) else {
            self.selection.clear();
            return Ok(0);
        };

        let ids: Vec<RowId> = self
            .selection
            .row_ids()
            .iter()
            .copied()
            .filter(|id| window.position_of(*id).is_some())
            .collect();
        let pk_values: Vec<String> = ids
            .iter()
            .filter_map(|id| window.identity_of(*id))
            .collect();
        if ids.is_empty() || pk_values.len() != ids.len() {
            // a row without an identity value cannot be addressed remotely
            return Err(SourceError::Rejected(
                "selection contains rows without identity values".into(),
            ));
        }
        let pk_column = window.identity_column().to_string();
        let count = ids.len();

        let result = with_rollback(
            window,
            |w| {
                let removed = w.remove_rows(&ids);
                Box::new(move |w| w.restore_rows(removed))
            },
            || source.delete_rows(&table, &pk_column, &pk_values),
        );

        match result {
            Ok(()) => {
                self.selection.clear();
                self.events.push(EngineEvent::RowsDeleted {
                    table: table.clone(),
                    count,
                });
                Ok(count)
            }
            Err(err) => {
                warn!(table, error = %err, "batched delete failed");
                self.events.push(EngineEvent::DeleteFailed {
                    table,
                    message: err.message().to_string(),
                });
                Err(err)
            }
        }
    }

    // ── Truncate / drop ─────────────────────────────────────────────

    /// Empty a table in place. On success an open window drops to zero
    /// rows but keeps rendering its header shell.
    pub fn truncate_table(
        &mut self,
        source: &mut dyn RowSource,
        table: &str,
    ) -> Result<(), SourceError> {
        if !self.catalog.contains_key(table) {
            return Ok(());
        }
        match source.truncate_table(table) {
            Ok(()) => {
                if let Some(info) = self.catalog.get_mut(table) {
                    info.total_rows = 0;
                }
                if self.selection.table() == Some(table) {
                    self.selection.clear();
                }
                if self.edit.editing_table(table) {
                    self.edit.cancel();
                }
                if let Some(window) = self.windows.get_mut(table) {
                    window.clear_rows();
                }
                self.events.push(EngineEvent::TableTruncated {
                    table: table.to_string(),
                });
                Ok(())
            }
            Err(err) => {
                self.events.push(EngineEvent::TruncateFailed {
                    table: table.to_string(),
                    message: err.message().to_string(),
                });
                Err(err)
            }
        }
    }

    /// Drop a table entirely: closes its window and removes it from the
    /// catalog snapshot.
    pub fn drop_table(
        &mut self,
        source: &mut dyn RowSource,
        table: &str,
    ) -> Result<(), SourceError> {
        if !self.catalog.contains_key(table) {
            return Ok(());
        }
        match source.drop_table(table) {
            Ok(()) => {
                self.catalog.remove(table);
                self.close_window(table);
                self.events.push(EngineEvent::TableDropped {
                    table: table.to_string(),
                });
                Ok(())
            }
            Err(err) => {
                self.events.push(EngineEvent::DropFailed {
                    table: table.to_string(),
                    message: err.message().to_string(),
                });
                Err(err)
            }
        }
    }

    // ── Gestures ────────────────────────────────────────────────────

    /// Begin dragging a window: captures the pointer's grab offset and
    /// raises the window. Starting a gesture cancels selection or edit
    /// held elsewhere. Declines while another gesture is active.
    pub fn begin_drag(&mut self, table: &str, pointer_x: f64, pointer_y: f64) -> bool {
        if self.gesture.is_active() || !self.windows.contains_key(table) {
            return false;
        }
        let geometry = self.windows[table].geometry();
        self.focus_window(table);
        self.gesture = GestureState::Dragging {
            table: table.to_string(),
            grab_dx: pointer_x - geometry.left,
            grab_dy: pointer_y - geometry.top,
        };
        true
    }

    /// Begin resizing a window. Same exclusion rules as dragging.
    pub fn begin_resize(&mut self, table: &str) -> bool {
        if self.gesture.is_active() || !self.windows.contains_key(table) {
            return false;
        }
        self.focus_window(table);
        self.gesture = GestureState::Resizing {
            table: table.to_string(),
        };
        true
    }

    /// Pointer interaction exclusion: raise the window, drop selection and
    /// edit state belonging to other windows.
    fn focus_window(&mut self, table: &str) {
        self.raise_window(table);
        if self.selection.table().map_or(false, |t| t != table) {
            self.selection.clear();
        }
        if self.edit.is_editing() && !self.edit.editing_table(table) {
            self.edit.cancel();
        }
    }

    /// Apply pointer movement to the active gesture. Dragging clamps to
    /// the viewport; resizing floors at the minimum usable size.
    pub fn pointer_moved(&mut self, pointer_x: f64, pointer_y: f64) {
        match self.gesture.clone() {
            GestureState::Idle => {}
            GestureState::Dragging {
                table,
                grab_dx,
                grab_dy,
            } => {
                let viewport = self.viewport;
                if let Some(window) = self.windows.get_mut(&table) {
                    let mut geometry = window.geometry();
                    let (left, top) = gesture::drag_position(
                        &geometry, pointer_x, pointer_y, grab_dx, grab_dy, viewport,
                    );
                    geometry.left = left;
                    geometry.top = top;
                    window.set_geometry(geometry);
                }
            }
            GestureState::Resizing { table } => {
                if let Some(window) = self.windows.get_mut(&table) {
                    let mut geometry = window.geometry();
                    let (width, height) =
                        gesture::resize_dimensions(&geometry, pointer_x, pointer_y);
                    geometry.width = width;
                    geometry.height = height;
                    window.set_geometry(geometry);
                }
            }
        }
    }

    /// End the active gesture and persist geometry for every open window
    /// in one batched write. Returns false when no gesture was active.
    pub fn end_gesture(&mut self) -> bool {
        if !self.gesture.is_active() {
            return false;
        }
        self.gesture = GestureState::Idle;
        self.persist_layout();
        true
    }

    // ── Layout persistence ──────────────────────────────────────────

    /// Current `{table -> geometry}` blob for the open window set.
    pub fn layout_snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            version: LAYOUT_VERSION,
            windows: self
                .windows
                .iter()
                .map(|(table, window)| (table.clone(), window.geometry()))
                .collect(),
        }
    }

    fn persist_layout(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = store.save(&self.source_key, &self.layout_snapshot()) {
            warn!(error = %err, "failed to persist window layout");
        }
    }
}
