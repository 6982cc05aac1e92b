//! # pixfleet-canvas
//!
//! Canvas-side vocabulary shared by the placer.
//!
//! ## Design Principles
//!
//! - Palette indices are wire-level constants; the table is never reordered
//! - Coordinates are absolute until the moment a write is issued, and only
//!   then mapped onto the tiled canvas grid
//! - Nothing here performs I/O
//!
//! ## Tiling
//!
//! The canvas is a grid of 1000x1000 tiles laid out two tiles wide:
//!
//! ```text
//! +---+---+
//! | 0 | 1 |
//! +---+---+
//! | 2 | 3 |
//! +---+---+
//! ```

mod error;
mod palette;
mod tile;
mod update;

pub use error::CanvasError;
pub use palette::{ColorIndex, ColorTable, PALETTE_SIZE};
pub use tile::{CanvasPoint, TilePoint, TILE_GRID_WIDTH, TILE_SIZE};
pub use update::DesiredUpdate;
