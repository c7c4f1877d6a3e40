//! Stable row identity.
//!
//! A `RowId` names one loaded row for the lifetime of its window. Handles
//! come from a per-window incrementing sequence and are never reused, so a
//! delete leaves gaps instead of renumbering the survivors. "Row at
//! position N" is always resolved by lookup, never by arithmetic on ids.

use serde::{Deserialize, Serialize};

/// Opaque handle for one loaded row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(u64);

impl RowId {
    /// Reconstruct a handle from its raw sequence number.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw sequence number behind this handle.
    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row#{}", self.0)
    }
}

/// Hands out `RowId`s for one window, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct RowIdAllocator {
    next: u64,
}

impl RowIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next handle. Never returns the same id twice.
    pub fn allocate(&mut self) -> RowId {
        let id = RowId(self.next);
        self.next += 1;
        id
    }
}

/// Addresses one body cell: a row handle plus a column index.
///
/// Column 0 is the identity column by convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: RowId,
    pub col: usize,
}

impl CellRef {
    #[inline]
    pub fn new(row: RowId, col: usize) -> Self {
        Self { row, col }
    }

    /// Whether this cell sits in the identity column.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.col == 0
    }
}
