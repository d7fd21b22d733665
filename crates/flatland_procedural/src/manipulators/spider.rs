//! `spider`: branching ridges or ravines radiating from the region center.

use std::f64::consts::TAU;

use flatland_core::FlatResult;

use crate::painter::{LevelMode, Painter};
use crate::params::Params;
use crate::random::TerrainRng;
use crate::registry::{Manipulator, ManipulatorContext};

/// Chance that a branch spawns its own sub-branches.
const CONTINUE_CHANCE: f64 = 0.7;

struct SpiderConfig {
    branches: u32,
    length: f64,
    height_delta: i32,
    depth: u32,
    angle_jitter: f64,
}

struct Legs<'p, 'a> {
    painter: &'p mut Painter<'a>,
    rng: TerrainRng,
    lines: usize,
}

impl Legs<'_, '_> {
    fn draw(&mut self, x: f64, z: f64, angle: f64, length: f64, delta: i32, depth: u32) {
        let tx = x + angle.cos() * length;
        let tz = z + angle.sin() * length;
        self.painter.line(
            x.round() as i32,
            z.round() as i32,
            tx.round() as i32,
            tz.round() as i32,
            delta,
        );
        self.lines += 1;

        if depth == 0 || !self.rng.chance(CONTINUE_CHANCE) {
            return;
        }
        let child_delta = (f64::from(delta) * 0.7).round() as i32;
        if child_delta == 0 || length * 0.6 < 1.0 {
            return;
        }
        for side in [-1.0, 1.0] {
            let turn = side * self.rng.uniform(0.3, 0.9);
            self.draw(tx, tz, angle + turn, length * 0.6, child_delta, depth - 1);
        }
    }
}

/// `spider`: `branches` evenly spaced legs with Gaussian angle jitter, drawn
/// additively; each leg forks recursively with a 70% chance per level.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `branches` | 5 | 1..=12 |
/// | `length` | 0.3 of the shorter side | 1..=shorter side |
/// | `heightDelta` | -6 | -64..=64 (negative carves) |
/// | `depth` | 3 | 0..=4 |
/// | `angleJitter` | 0.3 | 0..=PI (radians, one sigma) |
/// | `seed` | clock | u64 |
pub struct Spider;

impl Manipulator for Spider {
    fn name(&self) -> &str {
        "spider"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let region = ctx.region;
        let side = f64::from(region.min_side());
        let config = SpiderConfig {
            branches: params.i32_clamped("branches", 5, 1, 12) as u32,
            length: params.f64_clamped("length", side * 0.3, 1.0, side.max(1.0)),
            height_delta: params.i32_clamped("heightDelta", -6, -64, 64),
            depth: params.i32_clamped("depth", 3, 0, 4) as u32,
            angle_jitter: params.f64_clamped("angleJitter", 0.3, 0.0, std::f64::consts::PI),
        };
        let mut rng = params.rng();
        let (cx, cz) = region.center();
        let start = rng.uniform(0.0, TAU);
        let angles: Vec<f64> = (0..config.branches)
            .map(|i| start + TAU * f64::from(i) / f64::from(config.branches) + rng.gaussian() * config.angle_jitter)
            .collect();

        let mut painter = ctx.painter().with_level(LevelMode::Additive);
        let mut legs = Legs {
            painter: &mut painter,
            rng,
            lines: 0,
        };
        for angle in angles {
            legs.draw(
                f64::from(cx),
                f64::from(cz),
                angle,
                config.length,
                config.height_delta,
                config.depth,
            );
        }
        let lines = legs.lines;
        Ok(format!("{lines} lines, {} writes", painter.touched()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manipulators::testing::{flat_at, min_max, run};

    #[test]
    fn test_spider_carves_from_center() {
        let mut flat = flat_at(64, 40);
        run("spider", &mut flat, &Params::new().with("seed", 6).with("heightDelta", -5));
        let (lo, hi) = min_max(&flat);
        assert_eq!(hi, 40);
        assert!(lo < 40);
        // Every leg starts at the center, so it is carved once per leg.
        assert_eq!(flat.level(32, 32), 40 - 5 * 5);
    }

    #[test]
    fn test_spider_depth_zero_draws_one_line_per_branch() {
        let mut flat = flat_at(64, 0);
        let summary = run(
            "spider",
            &mut flat,
            &Params::new().with("seed", 2).with("depth", 0).with("branches", 3).with("heightDelta", 4),
        );
        assert!(summary.starts_with("3 lines"), "{summary}");
    }
}
