pub mod edit;
pub mod events;
pub mod gesture;
pub mod source;
pub mod window;
pub mod workspace;

#[cfg(test)]
pub mod harness;

pub use edit::{CommitOutcome, EditController, PendingEdit};
pub use events::{EngineEvent, EventCollector};
pub use gesture::{GestureState, Viewport};
pub use source::{RowSource, SourceError};
pub use window::{DraftRow, Row, TableWindow};
pub use workspace::Workspace;
