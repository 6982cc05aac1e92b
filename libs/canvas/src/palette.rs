//! The fixed 32-color palette used by the write protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CanvasError;

/// Number of colors in the palette.
pub const PALETTE_SIZE: usize = 32;

/// Palette names, position is the wire index.
const NAMES: [&str; PALETTE_SIZE] = [
    "burgundy",
    "dark red",
    "red",
    "orange",
    "yellow",
    "pale yellow",
    "dark green",
    "green",
    "light green",
    "dark teal",
    "teal",
    "light teal",
    "dark blue",
    "blue",
    "light blue",
    "indigo",
    "periwinkle",
    "lavender",
    "dark purple",
    "purple",
    "pale purple",
    "magenta",
    "pink",
    "light pink",
    "dark brown",
    "brown",
    "beige",
    "black",
    "dark gray",
    "gray",
    "light gray",
    "white",
];

/// Palette index as sent on the wire (0..=31).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorIndex(u8);

impl ColorIndex {
    /// Raw index value.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ColorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bidirectional mapping between color names and palette indices.
///
/// The table is static; `ColorTable` is a zero-sized handle so callers can
/// hold one next to other state without caring where the data lives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorTable;

impl ColorTable {
    /// Create a handle to the palette.
    pub fn new() -> Self {
        Self
    }

    /// Resolve a color name to its palette index.
    ///
    /// Surrounding whitespace is ignored and ASCII case does not matter.
    pub fn index_of(&self, name: &str) -> Result<ColorIndex, CanvasError> {
        let wanted = name.trim();
        NAMES
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(wanted))
            .map(|i| ColorIndex(i as u8))
            .ok_or_else(|| CanvasError::UnknownColor(name.to_string()))
    }

    /// Resolve a palette index back to its canonical name.
    pub fn name_of(&self, index: ColorIndex) -> Option<&'static str> {
        NAMES.get(index.0 as usize).copied()
    }

    /// Iterate over `(name, index)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ColorIndex)> {
        NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, ColorIndex(i as u8)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_wire_constants() {
        let table = ColorTable::new();
        assert_eq!(table.index_of("burgundy").unwrap().get(), 0);
        assert_eq!(table.index_of("red").unwrap().get(), 2);
        assert_eq!(table.index_of("light blue").unwrap().get(), 14);
        assert_eq!(table.index_of("periwinkle").unwrap().get(), 16);
        assert_eq!(table.index_of("beige").unwrap().get(), 26);
        assert_eq!(table.index_of("black").unwrap().get(), 27);
        assert_eq!(table.index_of("white").unwrap().get(), 31);
    }

    #[test]
    fn test_bijection() {
        let table = ColorTable::new();
        let mut seen = HashSet::new();
        for (name, index) in table.iter() {
            assert!(seen.insert(index), "duplicate index {index}");
            assert_eq!(table.index_of(name).unwrap(), index);
            assert_eq!(table.name_of(index), Some(name));
        }
        assert_eq!(seen.len(), PALETTE_SIZE);
    }

    #[test]
    fn test_unknown_color() {
        let err = ColorTable::new().index_of("chartreuse").unwrap_err();
        assert_eq!(err, CanvasError::UnknownColor("chartreuse".to_string()));
    }

    #[test]
    fn test_lookup_ignores_case_and_padding() {
        let table = ColorTable::new();
        assert_eq!(table.index_of(" Dark Red ").unwrap().get(), 1);
        assert!(table.index_of("darkred").is_err());
    }

    #[test]
    fn test_name_of_out_of_range() {
        let index: ColorIndex = serde_json::from_str("40").unwrap();
        assert_eq!(ColorTable::new().name_of(index), None);
    }
}
