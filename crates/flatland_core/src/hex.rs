//! # Hex Grid
//!
//! Worlds can be partitioned into pointy-top hexagonal cells addressed by
//! axial coordinates. A flat created for a cell covers the cell's square
//! bounding box; only columns inside the (inset) hexagon are editable.

use serde::{Deserialize, Serialize};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Axial hex coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    /// Column axis.
    pub q: i32,
    /// Row axis.
    pub r: i32,
}

impl HexCoord {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }
}

/// Hex grid geometry for one world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HexGrid {
    /// Corner-to-corner diameter in blocks.
    pub diameter: f64,
}

impl HexGrid {
    /// Creates a grid with the given cell diameter.
    #[must_use]
    pub const fn new(diameter: f64) -> Self {
        Self { diameter }
    }

    /// Circumradius of one cell.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.diameter * 0.5
    }

    /// Cartesian world center of a cell.
    #[must_use]
    pub fn center(&self, hex: HexCoord) -> (f64, f64) {
        let radius = self.radius();
        let x = radius * SQRT_3 * (f64::from(hex.q) + f64::from(hex.r) * 0.5);
        let z = radius * 1.5 * f64::from(hex.r);
        (x, z)
    }

    /// Point-in-hexagon test against a cell shrunk by `inset` blocks.
    #[must_use]
    pub fn contains(&self, hex: HexCoord, x: f64, z: f64, inset: f64) -> bool {
        let radius = self.radius() - inset;
        if radius <= 0.0 {
            return false;
        }
        let (cx, cz) = self.center(hex);
        let dx = (x - cx).abs();
        let dz = (z - cz).abs();
        dx <= radius * SQRT_3 * 0.5 && dz <= radius - dx / SQRT_3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_cell_center() {
        let grid = HexGrid::new(100.0);
        assert_eq!(grid.center(HexCoord::new(0, 0)), (0.0, 0.0));
        let (x, z) = grid.center(HexCoord::new(0, 1));
        assert!((x - 43.30127).abs() < 1e-4);
        assert!((z - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_contains_center_not_far_point() {
        let grid = HexGrid::new(100.0);
        let hex = HexCoord::new(2, -1);
        let (cx, cz) = grid.center(hex);
        assert!(grid.contains(hex, cx, cz, 10.0));
        assert!(!grid.contains(hex, cx + 200.0, cz, 0.0));
        // Pointy top: the top vertex is inside, the bounding box corner is not.
        assert!(grid.contains(hex, cx, cz + 49.0, 0.0));
        assert!(!grid.contains(hex, cx + 40.0, cz + 45.0, 0.0));
    }

    #[test]
    fn test_inset_shrinks_cell() {
        let grid = HexGrid::new(100.0);
        let hex = HexCoord::new(0, 0);
        assert!(grid.contains(hex, 0.0, 45.0, 0.0));
        assert!(!grid.contains(hex, 0.0, 45.0, 10.0));
        assert!(!grid.contains(hex, 0.0, 0.0, 60.0));
    }
}
