//! Window drag/resize gesture tracking.
//!
//! An explicit state machine replaces ambient pointer-listener flags:
//! gesture start, pointer move and gesture end are the only transitions,
//! and at most one window is the target of an active gesture.

use rowdock_core::Geometry;

use crate::window::{MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH};

/// Workspace bounds that dragging is clamped within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// Dragging with the pointer's grab offset from the window's top-left.
    Dragging {
        table: String,
        grab_dx: f64,
        grab_dy: f64,
    },
    Resizing {
        table: String,
    },
}

impl GestureState {
    pub fn is_active(&self) -> bool {
        !matches!(self, GestureState::Idle)
    }

    /// The window under the active gesture, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            GestureState::Idle => None,
            GestureState::Dragging { table, .. } | GestureState::Resizing { table } => Some(table),
        }
    }
}

/// New top-left for a dragged window, clamped inside the viewport.
pub fn drag_position(
    geometry: &Geometry,
    pointer_x: f64,
    pointer_y: f64,
    grab_dx: f64,
    grab_dy: f64,
    viewport: Viewport,
) -> (f64, f64) {
    let max_x = (viewport.width - geometry.width).max(0.0);
    let max_y = (viewport.height - geometry.height).max(0.0);
    (
        (pointer_x - grab_dx).clamp(0.0, max_x),
        (pointer_y - grab_dy).clamp(0.0, max_y),
    )
}

/// New size for a resized window: the pointer defines the bottom-right
/// corner. Floored at the minimum usable size, unbounded above.
pub fn resize_dimensions(geometry: &Geometry, pointer_x: f64, pointer_y: f64) -> (f64, f64) {
    (
        (pointer_x - geometry.left).max(MIN_WINDOW_WIDTH),
        (pointer_y - geometry.top).max(MIN_WINDOW_HEIGHT),
    )
}
