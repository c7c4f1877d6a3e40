//! Scalar layout attributes of one window.

use serde::{Deserialize, Serialize};

/// Position, size and stacking order of a table window.
///
/// Mutated continuously during drag/resize; serialized on gesture end and
/// on window open/close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub z_index: u64,
}

impl Geometry {
    pub fn new(left: f64, top: f64, width: f64, height: f64, z_index: u64) -> Self {
        Self {
            left,
            top,
            width,
            height,
            z_index,
        }
    }

    /// Re-center within a viewport, keeping size and stacking order.
    pub fn centered_in(&self, viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            left: ((viewport_width - self.width) / 2.0).max(0.0),
            top: ((viewport_height - self.height) / 2.0).max(0.0),
            ..*self
        }
    }
}
