//! Absolute canvas coordinates and their mapping onto canvas tiles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CanvasError;

/// Edge length of one canvas tile.
pub const TILE_SIZE: i64 = 1000;

/// Number of tiles per row of the canvas grid.
pub const TILE_GRID_WIDTH: i64 = 2;

/// A point on the full canvas, before tiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub x: i64,
    pub y: i64,
}

impl CanvasPoint {
    /// Create a new point.
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Translate this point by `other`, or `None` if either axis overflows.
    pub fn offset(self, other: CanvasPoint) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(other.x)?,
            y: self.y.checked_add(other.y)?,
        })
    }

    /// Map the point onto a tile.
    ///
    /// Each full tile to the right adds 1 to the canvas index, each full tile
    /// downward adds [`TILE_GRID_WIDTH`].
    pub fn to_tile(self) -> Result<TilePoint, CanvasError> {
        if self.x < 0 || self.y < 0 {
            return Err(CanvasError::NegativeCoordinate {
                x: self.x,
                y: self.y,
            });
        }

        let canvas_index = self.x / TILE_SIZE + TILE_GRID_WIDTH * (self.y / TILE_SIZE);
        let canvas_index =
            u32::try_from(canvas_index).map_err(|_| CanvasError::OutOfRange {
                x: self.x,
                y: self.y,
            })?;

        Ok(TilePoint {
            canvas_index,
            x: (self.x % TILE_SIZE) as u32,
            y: (self.y % TILE_SIZE) as u32,
        })
    }
}

impl fmt::Display for CanvasPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A point inside a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePoint {
    /// Tile index in the 2-wide grid.
    pub canvas_index: u32,

    /// Column inside the tile (0..=999).
    pub x: u32,

    /// Row inside the tile (0..=999).
    pub y: u32,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_origin_tile() {
        let tile = CanvasPoint::new(0, 0).to_tile().unwrap();
        assert_eq!(
            tile,
            TilePoint {
                canvas_index: 0,
                x: 0,
                y: 0
            }
        );
    }

    #[test]
    fn test_tile_edges() {
        let tile = CanvasPoint::new(999, 999).to_tile().unwrap();
        assert_eq!((tile.canvas_index, tile.x, tile.y), (0, 999, 999));

        let tile = CanvasPoint::new(1000, 0).to_tile().unwrap();
        assert_eq!((tile.canvas_index, tile.x, tile.y), (1, 0, 0));

        let tile = CanvasPoint::new(0, 1000).to_tile().unwrap();
        assert_eq!((tile.canvas_index, tile.x, tile.y), (2, 0, 0));

        let tile = CanvasPoint::new(1999, 1999).to_tile().unwrap();
        assert_eq!((tile.canvas_index, tile.x, tile.y), (3, 999, 999));
    }

    #[test]
    fn test_lower_left_tile() {
        let tile = CanvasPoint::new(50, 1050).to_tile().unwrap();
        assert_eq!(tile.canvas_index, 2);
        assert_eq!((tile.x, tile.y), (50, 50));
    }

    #[test]
    fn test_negative_coordinate_rejected() {
        let err = CanvasPoint::new(-1, 10).to_tile().unwrap_err();
        assert_eq!(err, CanvasError::NegativeCoordinate { x: -1, y: 10 });
    }

    #[test]
    fn test_offset() {
        let anchor = CanvasPoint::new(1200, 300);
        assert_eq!(
            CanvasPoint::new(5, 7).offset(anchor),
            Some(CanvasPoint::new(1205, 307))
        );
    }

    #[test]
    fn test_offset_overflow() {
        let point = CanvasPoint::new(i64::MAX, 0);
        assert_eq!(point.offset(CanvasPoint::new(1, 0)), None);
        assert_eq!(
            CanvasPoint::new(0, i64::MAX - 5).offset(CanvasPoint::new(0, 5)),
            Some(CanvasPoint::new(0, i64::MAX))
        );
    }

    #[test]
    fn test_last_addressable_tile() {
        let last = u32::MAX as i64;
        let tile = CanvasPoint::new(last * TILE_SIZE + 999, 0).to_tile().unwrap();
        assert_eq!((tile.canvas_index, tile.x, tile.y), (u32::MAX, 999, 0));

        let point = CanvasPoint::new((last + 1) * TILE_SIZE, 0);
        assert_eq!(
            point.to_tile().unwrap_err(),
            CanvasError::OutOfRange {
                x: point.x,
                y: point.y
            }
        );
    }

    #[test]
    fn test_far_row_out_of_range() {
        let point = CanvasPoint::new(0, i64::MAX);
        assert!(matches!(
            point.to_tile(),
            Err(CanvasError::OutOfRange { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_tile_is_in_range(x in 0i64..10_000, y in 0i64..10_000) {
            let tile = CanvasPoint::new(x, y).to_tile().unwrap();
            prop_assert!(tile.x <= 999);
            prop_assert!(tile.y <= 999);
            prop_assert_eq!(tile.canvas_index as i64, x / 1000 + 2 * (y / 1000));
        }

        #[test]
        fn prop_tile_reconstructs_point(x in 0i64..1999, y in 0i64..1999) {
            let tile = CanvasPoint::new(x, y).to_tile().unwrap();
            let col = tile.canvas_index as i64 % TILE_GRID_WIDTH;
            let row = tile.canvas_index as i64 / TILE_GRID_WIDTH;
            prop_assert_eq!(col * TILE_SIZE + tile.x as i64, x);
            prop_assert_eq!(row * TILE_SIZE + tile.y as i64, y);
        }
    }
}
