//! # Post-Filters
//!
//! Whole-region passes run after shaping manipulators:
//!
//! - `roughen`: additive jitter
//! - `soften` / `sharpen`: box blur and unsharp mask from the painter
//! - `soften-raster`: four checkerboard passes of an orthogonal-neighbor blur
//! - `water-soften`: blur that snaps shoreline columns instead of blending them

use flatland_core::FlatResult;

use crate::painter::Jitter;
use crate::params::Params;
use crate::random::TerrainRng;
use crate::registry::{Manipulator, ManipulatorContext};

/// `roughen`: with probability `factor`, shifts a column by up to `amount`.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `factor` | 0.5 | 0..=1 |
/// | `amount` | 3 | 0..=32 |
/// | `seed` | clock | u64 |
pub struct Roughen;

impl Manipulator for Roughen {
    fn name(&self) -> &str {
        "roughen"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let factor = params.f64_clamped("factor", 0.5, 0.0, 1.0);
        let amount = params.i32_clamped("amount", 3, 0, 32);
        let mut rng = params.rng();
        let jitter_seed = rng.range(0, i32::MAX) as u64;
        let region = ctx.region;

        let mut painter = ctx
            .painter()
            .with_level(Jitter::new(TerrainRng::new(jitter_seed), amount));
        for (x, z) in region.points() {
            if !rng.chance(factor) {
                continue;
            }
            if let Some(level) = painter.level_at(x, z) {
                painter.paint(x, z, i32::from(level));
            }
        }
        Ok(format!("{} columns roughened", painter.touched()))
    }
}

/// `soften`: box blur.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `factor` | 0.5 | 0..=1 |
/// | `radius` | 1 | 1..=8 |
pub struct Soften;

impl Manipulator for Soften {
    fn name(&self) -> &str {
        "soften"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let factor = params.f64_clamped("factor", 0.5, 0.0, 1.0);
        let radius = params.i32_clamped("radius", 1, 1, 8);
        let region = ctx.region;
        let mut painter = ctx.painter();
        painter.soften(region.x, region.z, region.max_x(), region.max_z(), factor, radius);
        Ok(format!("softened by {factor} over radius {radius}"))
    }
}

/// `sharpen`: unsharp mask.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `factor` | 0.5 | >= 0 |
/// | `radius` | 1 | 1..=8 |
pub struct Sharpen;

impl Manipulator for Sharpen {
    fn name(&self) -> &str {
        "sharpen"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let factor = params.f64_or("factor", 0.5).max(0.0);
        let radius = params.i32_clamped("radius", 1, 1, 8);
        let region = ctx.region;
        let mut painter = ctx.painter();
        painter.sharpen(region.x, region.z, region.max_x(), region.max_z(), factor, radius);
        Ok(format!("sharpened by {factor} over radius {radius}"))
    }
}

/// `soften-raster`: cheap blur in four checkerboard passes.
///
/// Each pass updates the columns with `(x + ox, z + oz)` both even, blending
/// them toward the mean of themselves and their orthogonal neighbors. Updated
/// columns are never orthogonal neighbors of each other, so a pass can write
/// in place.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `factor` | 0.5 | 0..=1 |
pub struct SoftenRaster;

impl Manipulator for SoftenRaster {
    fn name(&self) -> &str {
        "soften-raster"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        const PASSES: [(i32, i32); 4] = [(0, 0), (1, 0), (0, 1), (1, 1)];
        let factor = params.f64_clamped("factor", 0.5, 0.0, 1.0);
        let region = ctx.region;
        let flat = &mut *ctx.flat;
        let mut changed = 0;

        for (ox, oz) in PASSES {
            for (x, z) in region.points() {
                if (x + ox) % 2 != 0 || (z + oz) % 2 != 0 {
                    continue;
                }
                let mut sum = f64::from(flat.level(x as usize, z as usize));
                let mut count = 1.0;
                for (nx, nz) in [(x - 1, z), (x + 1, z), (x, z - 1), (x, z + 1)] {
                    if region.contains(nx, nz) {
                        sum += f64::from(flat.level(nx as usize, nz as usize));
                        count += 1.0;
                    }
                }
                let (ux, uz) = (x as usize, z as usize);
                let original = f64::from(flat.level(ux, uz));
                let next = (factor * sum / count + (1.0 - factor) * original).round() as u8;
                if next != flat.level(ux, uz) && flat.set_level(ux, uz, next) {
                    changed += 1;
                }
            }
        }
        Ok(format!("{changed} columns softened"))
    }
}

/// `water-soften`: box blur that keeps shorelines crisp.
///
/// A column is water when its level is at or below the ocean level. A column
/// whose 8-neighborhood mixes water and land snaps, with probability `factor`,
/// to just below the ocean level (if most neighbors are water) or just above
/// it. Every other column is blended toward its neighborhood mean by
/// `factor`. All reads use the pre-pass levels.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `factor` | 0.5 | 0..=1 |
/// | `seed` | clock | u64 |
pub struct WaterSoften;

impl Manipulator for WaterSoften {
    fn name(&self) -> &str {
        "water-soften"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let factor = params.f64_clamped("factor", 0.5, 0.0, 1.0);
        let mut rng = params.rng();
        let region = ctx.region;
        let flat = &mut *ctx.flat;
        let ocean = flat.ocean_level;
        let below = ocean.saturating_sub(1);
        let above = ocean.saturating_add(1);

        let mut next = Vec::with_capacity(region.area() as usize);
        let mut snapped = 0;
        for (x, z) in region.points() {
            let original = flat.level(x as usize, z as usize);
            let mut sum = f64::from(original);
            let mut total = 1;
            let mut water = 0;
            for nz in z - 1..=z + 1 {
                for nx in x - 1..=x + 1 {
                    if (nx, nz) == (x, z) || !region.contains(nx, nz) {
                        continue;
                    }
                    let level = flat.level(nx as usize, nz as usize);
                    sum += f64::from(level);
                    total += 1;
                    if level <= ocean {
                        water += 1;
                    }
                }
            }
            let neighbors = total - 1;
            let shoreline = water > 0 && water < neighbors;
            let value = if shoreline {
                if rng.chance(factor) {
                    snapped += 1;
                    if water * 2 >= neighbors { below } else { above }
                } else {
                    original
                }
            } else {
                let mean = sum / f64::from(total);
                (factor * mean + (1.0 - factor) * f64::from(original)).round() as u8
            };
            next.push(value);
        }

        for ((x, z), level) in region.points().zip(next) {
            flat.set_level(x as usize, z as usize, level);
        }
        Ok(format!("shoreline snapped at {snapped} columns"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manipulators::testing::{flat_at, min_max, run};

    fn checker(size: usize) -> flatland_core::Flat {
        let mut flat = flat_at(size, 0);
        for z in 0..size {
            for x in 0..size {
                flat.set_level(x, z, if (x + z) % 2 == 0 { 40 } else { 20 });
            }
        }
        flat
    }

    #[test]
    fn test_roughen_bounded() {
        let mut flat = flat_at(16, 100);
        run("roughen", &mut flat, &Params::new().with("factor", 1).with("amount", 2).with("seed", 5));
        let (lo, hi) = min_max(&flat);
        assert!(lo >= 98 && hi <= 102);
        assert!(lo < hi);
    }

    #[test]
    fn test_soften_and_sharpen_shrink_and_grow_range() {
        let mut soft = checker(12);
        run("soften", &mut soft, &Params::new().with("factor", 1));
        let (lo, hi) = min_max(&soft);
        assert!(hi - lo < 20);

        let mut sharp = checker(12);
        run("sharpen", &mut sharp, &Params::new().with("factor", 1));
        let (lo, hi) = min_max(&sharp);
        assert!(hi - lo > 20);
    }

    #[test]
    fn test_soften_raster_reduces_contrast() {
        let mut flat = checker(10);
        run("soften-raster", &mut flat, &Params::new().with("factor", 1));
        let (lo, hi) = min_max(&flat);
        assert!(hi - lo < 20, "{lo}..{hi}");
    }

    #[test]
    fn test_water_soften_keeps_shoreline_crisp() {
        // Left half sea, right half land.
        let mut flat = flat_at(10, 30);
        for z in 0..10 {
            for x in 0..5 {
                flat.set_level(x, z, 2);
            }
        }
        run("water-soften", &mut flat, &Params::new().with("factor", 1).with("seed", 1));
        for z in 1..9 {
            assert_eq!(flat.level(4, z), 9, "sea side of the shore");
            assert_eq!(flat.level(5, z), 11, "land side of the shore");
            assert_eq!(flat.level(0, z), 2);
            assert_eq!(flat.level(9, z), 30);
        }
    }
}
