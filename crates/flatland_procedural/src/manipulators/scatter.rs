//! Probabilistic per-column edits: `shaked-box` and `random-pixels`.

use flatland_core::{FlatError, FlatResult};

use crate::painter::LevelMode;
use crate::params::Params;
use crate::registry::{Manipulator, ManipulatorContext};

/// `shaked-box`: sets a constant level inside a border band, skipping each
/// column with probability `skip`. `borderWidth=-1` covers the whole region.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `level` | 64 | 0..=255 |
/// | `borderWidth` | 3 | 1..=10, or -1 |
/// | `skip` | 0.3 | 0..=1 |
/// | `seed` | clock | u64 |
pub struct ShakedBox;

impl Manipulator for ShakedBox {
    fn name(&self) -> &str {
        "shaked-box"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let level = i32::from(params.level_or("level", 64));
        let border = match params.i32_or("borderWidth", 3) {
            -1 => None,
            width => Some(width.clamp(1, 10)),
        };
        let skip = params.f64_clamped("skip", 0.3, 0.0, 1.0);
        let mut rng = params.rng();
        let region = ctx.region;

        let mut painter = ctx.painter();
        let mut skipped = 0;
        for (x, z) in region.points() {
            let in_band = border.map_or(true, |width| region.edge_distance(x, z) < width);
            if !in_band {
                continue;
            }
            if rng.chance(skip) {
                skipped += 1;
                continue;
            }
            painter.paint(x, z, level);
        }
        Ok(format!("{} columns set, {skipped} skipped", painter.touched()))
    }
}

fn parse_mode(raw: &str) -> FlatResult<LevelMode> {
    match raw {
        "set" => Ok(LevelMode::Set),
        "add" => Ok(LevelMode::Additive),
        "raise" => Ok(LevelMode::Higher),
        "lower" => Ok(LevelMode::Lower),
        other => Err(FlatError::invalid(format!(
            "mode must be one of set, add, raise, lower; got '{other}'"
        ))),
    }
}

/// `random-pixels`: `pixelCount` single-column edits at random positions,
/// level drawn from a Gaussian around `level`.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `pixelCount` | 1% of the region | 0..=region area |
/// | `level` | 64 | -255..=255 (negative only useful with `add`) |
/// | `deviation` | 4 | 0..=64 |
/// | `mode` | `set` | `set`, `add`, `raise`, `lower` |
/// | `seed` | clock | u64 |
pub struct RandomPixels;

impl Manipulator for RandomPixels {
    fn name(&self) -> &str {
        "random-pixels"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let region = ctx.region;
        let area = i32::try_from(region.area()).unwrap_or(i32::MAX);
        let count = params.i32_clamped("pixelCount", (area / 100).max(1), 0, area);
        let level = f64::from(params.i32_clamped("level", 64, -255, 255));
        let deviation = params.f64_clamped("deviation", 4.0, 0.0, 64.0);
        let mode = parse_mode(&params.choice_or("mode", "set"))?;
        let mut rng = params.rng();

        let mut painter = ctx.painter().with_level(mode);
        for _ in 0..count {
            let x = region.x + rng.index(region.size_x as usize) as i32;
            let z = region.z + rng.index(region.size_z as usize) as i32;
            let proposed = (level + rng.gaussian() * deviation).round() as i32;
            painter.paint(x, z, proposed);
        }
        Ok(format!("{count} pixels, {} writes", painter.touched()))
    }
}
