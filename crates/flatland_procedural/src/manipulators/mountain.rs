//! # Mountains
//!
//! `mountain` grows a ridge network by recursive midpoint displacement and
//! then raises flanks around it; `sharp-peak` stamps a single steep cone.
//!
//! ## Ridge Algorithm
//!
//! A segment is split at its midpoint, which is lifted by a Gaussian sample
//! scaled by `height * roughness` and nudged sideways. Both halves recurse
//! with half the height; the midpoint also spawns `branches` side ridges of
//! half length, height and roughness. Recursion stops at `depth` or when the
//! height falls below `minHeight`.
//!
//! Ridge crests are rasterized into a scratch grid, then spread outwards with
//! a two-pass chamfer so every column sits at most `slope` below a crest per
//! block of distance. The result is painted raise-only.

use std::f64::consts::{PI, SQRT_2};

use flatland_core::FlatResult;

use crate::manipulators::{center_level, max_radius};
use crate::painter::{ColumnMode, LevelMode};
use crate::params::Params;
use crate::random::TerrainRng;
use crate::region::Region;
use crate::registry::{Manipulator, ManipulatorContext};

/// Segment budget per call; deep trees with many branches are cut off here.
const MAX_SEGMENTS: usize = 8192;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Center,
    Corner,
    LeftRight,
    TopBottom,
}

impl Direction {
    fn parse(raw: &str) -> Self {
        match raw {
            "center" => Self::Center,
            "corner" => Self::Corner,
            "left-right" => Self::LeftRight,
            "top-bottom" => Self::TopBottom,
            other => {
                tracing::warn!(direction = other, "unknown mountain direction, using left-right");
                Self::LeftRight
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct RidgePoint {
    x: f64,
    z: f64,
    level: f64,
}

struct MountainConfig {
    height: f64,
    roughness: f64,
    depth: u32,
    branches: u32,
    min_height: f64,
    slope: f64,
    direction: Direction,
}

impl MountainConfig {
    fn from_params(params: &Params) -> Self {
        Self {
            height: params.f64_clamped("height", 60.0, 1.0, 255.0),
            roughness: params.f64_clamped("roughness", 0.5, 0.0, 1.0),
            depth: params.i32_clamped("depth", 5, 0, 8) as u32,
            branches: params.i32_clamped("branches", 2, 1, 5) as u32,
            min_height: params.f64_clamped("minHeight", 4.0, 1.0, 64.0),
            slope: params.f64_clamped("slope", 1.0, 0.2, 8.0),
            direction: Direction::parse(&params.choice_or("direction", "left-right")),
        }
    }
}

/// Scratch height grid over a region.
struct Ridges {
    region: Region,
    crest: Vec<f64>,
    segments: usize,
}

impl Ridges {
    fn new(region: Region) -> Self {
        Self {
            region,
            crest: vec![f64::NEG_INFINITY; region.area() as usize],
            segments: 0,
        }
    }

    fn index(&self, x: i32, z: i32) -> Option<usize> {
        self.region
            .contains(x, z)
            .then(|| ((z - self.region.z) * self.region.size_x + (x - self.region.x)) as usize)
    }

    fn raise(&mut self, x: i32, z: i32, level: f64) {
        if let Some(i) = self.index(x, z) {
            self.crest[i] = self.crest[i].max(level);
        }
    }

    fn draw(&mut self, a: RidgePoint, b: RidgePoint) {
        let steps = (b.x - a.x).abs().max((b.z - a.z).abs()).ceil().max(1.0) as i32;
        for i in 0..=steps {
            let t = f64::from(i) / f64::from(steps);
            let x = (a.x + (b.x - a.x) * t).round() as i32;
            let z = (a.z + (b.z - a.z) * t).round() as i32;
            self.raise(x, z, a.level + (b.level - a.level) * t);
        }
    }

    fn grow(
        &mut self,
        a: RidgePoint,
        b: RidgePoint,
        height: f64,
        roughness: f64,
        depth: u32,
        config: &MountainConfig,
        rng: &mut TerrainRng,
    ) {
        self.segments += 1;
        if depth == 0 || height < config.min_height || self.segments >= MAX_SEGMENTS {
            self.draw(a, b);
            return;
        }
        let (dx, dz) = (b.x - a.x, b.z - a.z);
        let length = (dx * dx + dz * dz).sqrt();
        if length < 2.0 {
            self.draw(a, b);
            return;
        }

        let lift = height * (1.0 + roughness * rng.gaussian() * 0.5).max(0.0);
        let shift = rng.gaussian() * roughness * length * 0.15;
        let mid = RidgePoint {
            x: (a.x + b.x) / 2.0 - dz / length * shift,
            z: (a.z + b.z) / 2.0 + dx / length * shift,
            level: (a.level + b.level) / 2.0 + lift,
        };

        self.grow(a, mid, height / 2.0, roughness, depth - 1, config, rng);
        self.grow(mid, b, height / 2.0, roughness, depth - 1, config, rng);

        let heading = dz.atan2(dx);
        for _ in 0..config.branches {
            let side = if rng.chance(0.5) { 1.0 } else { -1.0 };
            let angle = heading + side * rng.uniform(PI / 6.0, PI / 2.0);
            let reach = length / 2.0;
            let tip = RidgePoint {
                x: mid.x + angle.cos() * reach,
                z: mid.z + angle.sin() * reach,
                level: mid.level - height,
            };
            self.grow(mid, tip, height / 2.0, roughness / 2.0, depth - 1, config, rng);
        }
    }

    /// Chamfer distance spread: each column ends up at most `slope` per block
    /// below its highest crest.
    fn spread(&mut self, slope: f64) {
        let (w, h) = (self.region.size_x as usize, self.region.size_z as usize);
        let straight = slope;
        let diagonal = slope * SQRT_2;
        let forward = [(-1, 0, straight), (-1, -1, diagonal), (0, -1, straight), (1, -1, diagonal)];
        let backward = [(1, 0, straight), (1, 1, diagonal), (0, 1, straight), (-1, 1, diagonal)];
        for (pass, offsets) in [forward, backward].iter().enumerate() {
            for row in 0..h {
                for col in 0..w {
                    let (x, z) = if pass == 0 { (col, row) } else { (w - 1 - col, h - 1 - row) };
                    let here = z * w + x;
                    for &(ox, oz, cost) in offsets {
                        let (nx, nz) = (x as i64 + ox, z as i64 + oz);
                        if nx < 0 || nz < 0 || nx >= w as i64 || nz >= h as i64 {
                            continue;
                        }
                        let from = self.crest[nz as usize * w + nx as usize] - cost;
                        if from > self.crest[here] {
                            self.crest[here] = from;
                        }
                    }
                }
            }
        }
    }
}

fn ridge_ends(region: Region, direction: Direction, rng: &mut TerrainRng) -> ((f64, f64), (f64, f64)) {
    let margin = f64::from(region.min_side()) / 8.0;
    let (x0, z0) = (f64::from(region.x) + margin, f64::from(region.z) + margin);
    let (x1, z1) = (f64::from(region.max_x()) - margin, f64::from(region.max_z()) - margin);
    let (cx, cz) = ((x0 + x1) / 2.0, (z0 + z1) / 2.0);
    match direction {
        Direction::Center => {
            let angle = rng.uniform(0.0, PI);
            let reach = f64::from(region.min_side()) * 0.3;
            (
                (cx - angle.cos() * reach, cz - angle.sin() * reach),
                (cx + angle.cos() * reach, cz + angle.sin() * reach),
            )
        }
        Direction::Corner => ((x0, z0), (x1, z1)),
        Direction::LeftRight => ((x0, cz), (x1, cz)),
        Direction::TopBottom => ((cx, z0), (cx, z1)),
    }
}

/// `mountain`: fractal ridge network with raised flanks.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `height` | 60 | 1..=255 |
/// | `roughness` | 0.5 | 0..=1 |
/// | `depth` | 5 | 0..=8 |
/// | `branches` | 2 | 1..=5 |
/// | `minHeight` | 4 | 1..=64 |
/// | `slope` | 1.0 | 0.2..=8 |
/// | `direction` | `left-right` | `center`, `corner`, `left-right`, `top-bottom` |
/// | `seed` | clock | u64 |
pub struct Mountain;

impl Manipulator for Mountain {
    fn name(&self) -> &str {
        "mountain"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let config = MountainConfig::from_params(params);
        let mut rng = params.rng();
        let region = ctx.region;
        let base = f64::from(center_level(ctx.flat, region));

        let ((ax, az), (bx, bz)) = ridge_ends(region, config.direction, &mut rng);
        let a = RidgePoint { x: ax, z: az, level: base };
        let b = RidgePoint { x: bx, z: bz, level: base };

        let mut ridges = Ridges::new(region);
        ridges.grow(a, b, config.height, config.roughness, config.depth, &config, &mut rng);
        ridges.spread(config.slope);

        let segments = ridges.segments;
        let mut painter = ctx
            .painter()
            .with_level(LevelMode::Higher)
            .with_column(ColumnMode::ByOcean);
        for (i, (x, z)) in region.points().enumerate() {
            let level = ridges.crest[i];
            if level.is_finite() && level > base {
                painter.paint(x, z, level.round() as i32);
            }
        }
        Ok(format!("{segments} ridge segments, {} columns raised", painter.touched()))
    }
}

/// `sharp-peak`: one steep cone, raise-only.
///
/// `level(d) = base + height * (1 - d / radius)^exponent`
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `height` | 80 | 1..=255 |
/// | `radius` | a third of the shorter side | 2..=half the shorter side |
/// | `exponent` | 2.0 | 0.5..=6 |
/// | `centerX`, `centerZ` | region center | inside the region |
pub struct SharpPeak;

impl Manipulator for SharpPeak {
    fn name(&self) -> &str {
        "sharp-peak"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let region = ctx.region;
        let limit = max_radius(region).max(2.0);
        let height = params.f64_clamped("height", 80.0, 1.0, 255.0);
        let radius = params.f64_clamped("radius", f64::from(region.min_side()) / 3.0, 2.0, limit);
        let exponent = params.f64_clamped("exponent", 2.0, 0.5, 6.0);
        let (dcx, dcz) = region.center();
        let cx = params.i32_clamped("centerX", dcx, region.x, region.max_x());
        let cz = params.i32_clamped("centerZ", dcz, region.z, region.max_z());
        let base = f64::from(ctx.flat.level(cx as usize, cz as usize));

        let mut painter = ctx
            .painter()
            .with_level(LevelMode::Higher)
            .with_column(ColumnMode::ByOcean);
        painter.fill_radial(f64::from(cx), f64::from(cz), radius, |d| {
            let t = (1.0 - d / radius).max(0.0);
            Some((base + height * t.powf(exponent)).round() as i32)
        });
        Ok(format!("peak of {height} at ({cx}, {cz}), {} columns", painter.touched()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manipulators::testing::{flat_at, min_max, run};

    #[test]
    fn test_mountain_only_raises_and_is_seeded() {
        let params = Params::new().with("seed", 21).with("depth", 8).with("branches", 5);
        let mut a = flat_at(64, 20);
        run("mountain", &mut a, &params);
        // Flanks may cover the whole region, but nothing sinks below the base.
        assert!(a.levels().iter().all(|&l| l >= 20));
        let (_, hi) = min_max(&a);
        assert!(hi > 40, "peak {hi}");

        let mut b = flat_at(64, 20);
        run("mountain", &mut b, &params);
        assert_eq!(a, b);
    }

    #[test]
    fn test_mountain_flanks_respect_slope() {
        let mut flat = flat_at(48, 0);
        run(
            "mountain",
            &mut flat,
            &Params::new().with("seed", 3).with("slope", 2).with("direction", "top-bottom"),
        );
        for z in 0..48 {
            for x in 1..48 {
                let step = (i32::from(flat.level(x, z)) - i32::from(flat.level(x - 1, z))).abs();
                // Crest interpolation may add a block of rounding on top of the slope.
                assert!(step <= 3, "step {step} at ({x}, {z})");
            }
        }
    }

    #[test]
    fn test_unknown_direction_falls_back() {
        let mut flat = flat_at(32, 5);
        run("mountain", &mut flat, &Params::new().with("direction", "sideways").with("seed", 1));
        assert!(min_max(&flat).1 > 5);
    }

    #[test]
    fn test_sharp_peak_cone() {
        let mut flat = flat_at(41, 10);
        run(
            "sharp-peak",
            &mut flat,
            &Params::new().with("height", 50).with("radius", 10).with("exponent", 1),
        );
        assert_eq!(flat.level(20, 20), 60);
        assert_eq!(flat.level(25, 20), 35);
        assert_eq!(flat.level(0, 0), 10);
    }
}
