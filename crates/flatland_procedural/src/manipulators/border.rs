//! `border-smooth`: eases the outer rings of a region toward its edge values
//! so a regenerated interior meets the surrounding terrain without a step.

use flatland_core::FlatResult;

use crate::params::Params;
use crate::region::Region;
use crate::registry::{Manipulator, ManipulatorContext};

/// Read-only view of the region's levels before smoothing.
struct Snapshot {
    region: Region,
    levels: Vec<f64>,
}

impl Snapshot {
    fn at(&self, x: i32, z: i32) -> f64 {
        let i = (z - self.region.z) * self.region.size_x + (x - self.region.x);
        self.levels[i as usize]
    }
}

/// `border-smooth`
///
/// Within `depth` columns of an edge, a column moves toward the level of the
/// nearest edge column by `1 - distance / depth`. Where two edges are within
/// range the rectangular blend of both sides is averaged with a diagonal
/// blend toward the corner itself.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `depth` | a quarter of the shorter side | 1..=half the shorter side |
pub struct BorderSmooth;

impl BorderSmooth {
    fn smoothed(snap: &Snapshot, x: i32, z: i32, depth: i32) -> Option<f64> {
        let r = snap.region;
        let current = snap.at(x, z);
        let depth_f = f64::from(depth);

        // Distance to, and level at, the nearest vertical / horizontal edge.
        let (dx, edge_x) = if x - r.x <= r.max_x() - x {
            (x - r.x, r.x)
        } else {
            (r.max_x() - x, r.max_x())
        };
        let (dz, edge_z) = if z - r.z <= r.max_z() - z {
            (z - r.z, r.z)
        } else {
            (r.max_z() - z, r.max_z())
        };
        let near_x = dx < depth;
        let near_z = dz < depth;

        let ease = |d: i32, target: f64| {
            let t = f64::from(d) / depth_f;
            target * (1.0 - t) + current * t
        };

        match (near_x, near_z) {
            (false, false) => None,
            (true, false) => Some(ease(dx, snap.at(edge_x, z))),
            (false, true) => Some(ease(dz, snap.at(x, edge_z))),
            (true, true) => {
                let vx = ease(dx, snap.at(edge_x, z));
                let vz = ease(dz, snap.at(x, edge_z));
                let rectangular = if dx + dz == 0 {
                    current
                } else {
                    (vx * f64::from(dz) + vz * f64::from(dx)) / f64::from(dx + dz)
                };
                let diagonal = ease(dx.min(dz), snap.at(edge_x, edge_z));
                Some((rectangular + diagonal) / 2.0)
            }
        }
    }
}

impl Manipulator for BorderSmooth {
    fn name(&self) -> &str {
        "border-smooth"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let region = ctx.region;
        let max_depth = region.min_side() / 2;
        if max_depth < 1 {
            return Ok("region too small, nothing smoothed".into());
        }
        let depth = params.i32_clamped("depth", (region.min_side() / 4).max(1), 1, max_depth);

        let snap = Snapshot {
            region,
            levels: region
                .points()
                .map(|(x, z)| f64::from(ctx.flat.level(x as usize, z as usize)))
                .collect(),
        };

        let mut changed = 0;
        for (x, z) in region.points() {
            let Some(value) = Self::smoothed(&snap, x, z, depth) else {
                continue;
            };
            let level = value.round().clamp(0.0, 255.0) as u8;
            let (ux, uz) = (x as usize, z as usize);
            if level != ctx.flat.level(ux, uz) && ctx.flat.set_level(ux, uz, level) {
                changed += 1;
            }
        }
        Ok(format!("{changed} columns smoothed over depth {depth}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manipulators::testing::{flat_at, run};

    #[test]
    fn test_edges_pull_interior_rings() {
        let mut flat = flat_at(20, 40);
        for i in 0..20 {
            flat.set_level(0, i, 0);
            flat.set_level(19, i, 0);
            flat.set_level(i, 0, 0);
            flat.set_level(i, 19, 0);
        }
        run("border-smooth", &mut flat, &Params::new().with("depth", 4));

        // Edge rows stay as they are.
        assert_eq!(flat.level(0, 10), 0);
        // Linear ramp along the middle of the west side.
        assert_eq!(flat.level(1, 10), 10);
        assert_eq!(flat.level(2, 10), 20);
        assert_eq!(flat.level(3, 10), 30);
        assert_eq!(flat.level(4, 10), 40);
        // Interior untouched.
        assert_eq!(flat.level(10, 10), 40);
        // Corner zone is no higher than either side ramp.
        assert!(flat.level(2, 2) <= 20);
    }

    #[test]
    fn test_depth_is_clamped() {
        let mut flat = flat_at(6, 12);
        let summary = run("border-smooth", &mut flat, &Params::new().with("depth", 50));
        assert!(summary.ends_with("depth 3"), "{summary}");
    }
}
