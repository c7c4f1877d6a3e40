//! Single-slot cell editing.
//!
//! Workspace-wide at most one cell is in edit mode. The controller buffers
//! the draft text; the optimistic apply/rollback around the remote update
//! happens at commit time in the workspace, which owns the window state.

use rowdock_core::CellRef;

/// The cell currently in edit mode.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    pub table: String,
    pub cell: CellRef,
    /// Value snapshotted when editing began; restored on cancel/failure.
    pub original: Option<String>,
    /// The buffered field text, pre-filled from `original`.
    pub draft: String,
}

impl PendingEdit {
    /// True when committing would be a no-op (draft equals the original
    /// text; NULL edits as the empty string).
    pub fn is_unchanged(&self) -> bool {
        self.draft == self.original.clone().unwrap_or_default()
    }
}

/// Outcome of a commit gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// No edit was in progress.
    NothingPending,
    /// Draft matched the original; closed without a network round trip.
    Unchanged,
    /// Remote update succeeded and the cell kept the draft value.
    Updated,
}

#[derive(Debug, Default)]
pub struct EditController {
    pending: Option<PendingEdit>,
}

impl EditController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingEdit> {
        self.pending.as_ref()
    }

    /// Enter edit mode. Rejected while another edit is in progress, and
    /// the identity column is never editable; that is enforced here, not
    /// by convention.
    pub fn begin(&mut self, table: &str, cell: CellRef, original: Option<String>) -> bool {
        if self.pending.is_some() || cell.is_identity() {
            return false;
        }
        let draft = original.clone().unwrap_or_default();
        self.pending = Some(PendingEdit {
            table: table.to_string(),
            cell,
            original,
            draft,
        });
        true
    }

    /// Replace the buffered draft text.
    pub fn set_draft(&mut self, text: impl Into<String>) -> bool {
        match self.pending.as_mut() {
            Some(edit) => {
                edit.draft = text.into();
                true
            }
            None => false,
        }
    }

    /// Cancel (escape / focus-loss): drop the draft, no network call. The
    /// displayed value was never touched, so there is nothing to restore.
    pub fn cancel(&mut self) -> Option<PendingEdit> {
        self.pending.take()
    }

    /// Hand the edit to the commit path, leaving the slot free.
    pub fn take(&mut self) -> Option<PendingEdit> {
        self.pending.take()
    }

    /// Whether the pending edit (if any) belongs to `table`.
    pub fn editing_table(&self, table: &str) -> bool {
        self.pending.as_ref().map_or(false, |p| p.table == table)
    }
}
