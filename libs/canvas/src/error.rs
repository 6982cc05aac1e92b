//! Error types for palette lookup and tiling.

use thiserror::Error;

/// Errors raised while resolving colors or coordinates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanvasError {
    /// The color name is not part of the palette.
    #[error("unknown color: '{0}'")]
    UnknownColor(String),

    /// The coordinate lies left of or above the canvas origin.
    #[error("coordinate ({x}, {y}) is outside the canvas")]
    NegativeCoordinate { x: i64, y: i64 },

    /// The coordinate maps to a tile index past the wire range.
    #[error("coordinate ({x}, {y}) is beyond the last addressable tile")]
    OutOfRange { x: i64, y: i64 },
}
