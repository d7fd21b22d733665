//! Rectangular sub-area of a flat that a manipulator works on.

use flatland_core::{Flat, FlatError, FlatResult};

/// Rectangle in flat grid coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    /// Origin X.
    pub x: i32,
    /// Origin Z.
    pub z: i32,
    /// Width.
    pub size_x: i32,
    /// Depth.
    pub size_z: i32,
}

impl Region {
    /// Creates a region.
    #[must_use]
    pub const fn new(x: i32, z: i32, size_x: i32, size_z: i32) -> Self {
        Self { x, z, size_x, size_z }
    }

    /// The whole flat.
    #[must_use]
    pub fn whole(flat: &Flat) -> Self {
        Self::new(0, 0, flat.size_x() as i32, flat.size_z() as i32)
    }

    /// Checks origin, size and containment.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::InvalidRegion`] unless `x, z >= 0`,
    /// `size_x, size_z > 0` and the rectangle fits inside the flat.
    pub fn validate(&self, flat: &Flat) -> FlatResult<()> {
        let fits = self.x >= 0
            && self.z >= 0
            && self.size_x > 0
            && self.size_z > 0
            && i64::from(self.x) + i64::from(self.size_x) <= flat.size_x() as i64
            && i64::from(self.z) + i64::from(self.size_z) <= flat.size_z() as i64;
        if fits {
            Ok(())
        } else {
            Err(FlatError::InvalidRegion {
                x: self.x,
                z: self.z,
                size_x: self.size_x,
                size_z: self.size_z,
                flat_size_x: flat.size_x(),
                flat_size_z: flat.size_z(),
            })
        }
    }

    /// Last column (inclusive).
    #[inline]
    #[must_use]
    pub const fn max_x(&self) -> i32 {
        self.x + self.size_x - 1
    }

    /// Last row (inclusive).
    #[inline]
    #[must_use]
    pub const fn max_z(&self) -> i32 {
        self.z + self.size_z - 1
    }

    /// True if the point lies inside.
    #[inline]
    #[must_use]
    pub const fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.x && z >= self.z && x <= self.max_x() && z <= self.max_z()
    }

    /// Center point (rounded down).
    #[must_use]
    pub const fn center(&self) -> (i32, i32) {
        (self.x + self.size_x / 2, self.z + self.size_z / 2)
    }

    /// Shorter side.
    #[must_use]
    pub fn min_side(&self) -> i32 {
        self.size_x.min(self.size_z)
    }

    /// Number of columns.
    #[must_use]
    pub fn area(&self) -> i64 {
        i64::from(self.size_x.max(0)) * i64::from(self.size_z.max(0))
    }

    /// Distance from a point to the nearest region edge (0 on the edge).
    #[must_use]
    pub fn edge_distance(&self, x: i32, z: i32) -> i32 {
        (x - self.x)
            .min(self.max_x() - x)
            .min(z - self.z)
            .min(self.max_z() - z)
    }

    /// Intersection with another rectangle given by inclusive corners.
    #[must_use]
    pub fn clip(&self, x1: i32, z1: i32, x2: i32, z2: i32) -> Option<(i32, i32, i32, i32)> {
        let lx = x1.min(x2).max(self.x);
        let hx = x1.max(x2).min(self.max_x());
        let lz = z1.min(z2).max(self.z);
        let hz = z1.max(z2).min(self.max_z());
        (lx <= hx && lz <= hz).then_some((lx, lz, hx, hz))
    }

    /// Iterates all points, row by row.
    pub fn points(&self) -> impl Iterator<Item = (i32, i32)> {
        let Self { x, z, size_x, size_z } = *self;
        (z..z + size_z).flat_map(move |pz| (x..x + size_x).map(move |px| (px, pz)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds() {
        let flat = Flat::new("w", "l", "f", 10, 8);
        assert!(Region::whole(&flat).validate(&flat).is_ok());
        assert!(Region::new(2, 2, 8, 6).validate(&flat).is_ok());
        assert!(Region::new(3, 0, 8, 1).validate(&flat).is_err());
        assert!(Region::new(0, 0, 0, 1).validate(&flat).is_err());
        assert!(Region::new(-1, 0, 2, 2).validate(&flat).is_err());
        assert!(Region::new(0, 7, 1, 2).validate(&flat).is_err());
    }

    #[test]
    fn test_geometry_helpers() {
        let region = Region::new(2, 3, 5, 4);
        assert_eq!((region.max_x(), region.max_z()), (6, 6));
        assert_eq!(region.center(), (4, 5));
        assert_eq!(region.edge_distance(4, 4), 1);
        assert_eq!(region.edge_distance(2, 5), 0);
        assert_eq!(region.points().count(), 20);
        assert_eq!(region.clip(0, 0, 3, 10), Some((2, 3, 3, 6)));
        assert_eq!(region.clip(10, 10, 12, 12), None);
    }
}
