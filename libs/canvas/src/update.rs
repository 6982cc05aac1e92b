//! Desired pixel writes produced by the diff collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tile::CanvasPoint;

/// One pixel that differs from the target image.
///
/// Serialized flat, e.g. `{"x": 50, "y": 1050, "color": "red"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredUpdate {
    /// Target coordinate.
    #[serde(flatten)]
    pub point: CanvasPoint,

    /// Palette name of the target color.
    pub color: String,
}

impl DesiredUpdate {
    /// Create a new update.
    pub fn new(x: i64, y: i64, color: impl Into<String>) -> Self {
        Self {
            point: CanvasPoint::new(x, y),
            color: color.into(),
        }
    }

    /// Translate an image-relative update by the image anchor.
    ///
    /// Returns `None` if the translated point does not fit in an `i64`.
    pub fn offset(self, anchor: CanvasPoint) -> Option<Self> {
        Some(Self {
            point: self.point.offset(anchor)?,
            color: self.color,
        })
    }
}

impl fmt::Display for DesiredUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.color, self.point)
    }
}
