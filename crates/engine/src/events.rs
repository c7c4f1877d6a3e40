//! Engine events.
//!
//! Every surfaced failure and committed mutation is reported as an event
//! so a shell can display it without the engine knowing about rendering.
//! Tests use the collector to verify rollback and no-network invariants.

/// Events emitted by workspace operations.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    WindowOpened { table: String },
    WindowClosed { table: String },

    /// A page arrived and was appended to the cache.
    PageLoaded { table: String, rows: usize },
    LoadFailed { table: String, message: String },

    /// A cell edit committed remotely and locally.
    CellUpdated { table: String },
    /// A failed commit restored the pre-edit value.
    EditRolledBack { table: String, message: String },

    RowInserted { table: String },
    InsertFailed { table: String, message: String },

    RowsDeleted { table: String, count: usize },
    DeleteFailed { table: String, message: String },

    TableTruncated { table: String },
    TruncateFailed { table: String, message: String },
    TableDropped { table: String },
    DropFailed { table: String, message: String },
}

impl EngineEvent {
    /// The user-facing failure message, when this event reports one.
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            EngineEvent::LoadFailed { message, .. }
            | EngineEvent::EditRolledBack { message, .. }
            | EngineEvent::InsertFailed { message, .. }
            | EngineEvent::DeleteFailed { message, .. }
            | EngineEvent::TruncateFailed { message, .. }
            | EngineEvent::DropFailed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Simple event collector.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<EngineEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drain collected events for a shell to display.
    pub fn take(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Only the failure events, in order.
    pub fn failures(&self) -> Vec<&EngineEvent> {
        self.events
            .iter()
            .filter(|e| e.failure_message().is_some())
            .collect()
    }
}
