// Core types shared across the workspace

pub mod geometry;
pub mod rows;
pub mod selection;

pub use geometry::Geometry;
pub use rows::{CellRef, RowId, RowIdAllocator};
pub use selection::{RowRange, Selection};
