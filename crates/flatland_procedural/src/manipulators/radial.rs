//! # Radial Features
//!
//! Craters, islands and lakes: shapes defined by a level-over-distance
//! profile around a center, stamped with a raise-only or lower-only painter
//! and finished with a blur.

use flatland_core::material::WATER;
use flatland_core::FlatResult;

use crate::manipulators::{center_level, max_radius, square};
use crate::painter::{ColumnMode, Jitter, LevelMode};
use crate::params::Params;
use crate::random::TerrainRng;
use crate::region::Region;
use crate::registry::{Manipulator, ManipulatorContext};

fn region_center(region: Region) -> (f64, f64) {
    let (cx, cz) = region.center();
    (f64::from(cx), f64::from(cz))
}

struct CraterConfig {
    outer: f64,
    inner: f64,
    rim_height: f64,
    depth: f64,
    small_craters: u32,
    blur: f64,
}

impl CraterConfig {
    fn from_params(params: &Params, region: Region) -> Self {
        let limit = max_radius(region).max(3.0);
        let outer = params.f64_clamped("outerRadius", limit * 0.8, 3.0, limit);
        // The rim needs at least two blocks of ramp.
        let inner = params
            .f64_clamped("innerRadius", outer * 0.7, 1.0, limit)
            .min(outer - 2.0)
            .max(1.0);
        Self {
            outer,
            inner,
            rim_height: params.f64_clamped("rimHeight", 12.0, 0.0, 128.0),
            depth: params.f64_clamped("depth", 16.0, 0.0, 128.0),
            small_craters: params.i32_clamped("smallCraters", 3, 0, 20) as u32,
            blur: params.f64_clamped("blur", 0.5, 0.0, 1.0),
        }
    }
}

/// `crater`: raised rim, quadratic basin, scattered small craters, blur.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `outerRadius` | 0.8 of half the shorter side | 3..=half the shorter side |
/// | `innerRadius` | 0.7 of outer | at most `outerRadius - 2` |
/// | `rimHeight` | 12 | 0..=128 |
/// | `depth` | 16 | 0..=128 |
/// | `smallCraters` | 3 | 0..=20 |
/// | `blur` | 0.5 | 0..=1 |
/// | `seed` | clock | u64 |
pub struct Crater;

impl Manipulator for Crater {
    fn name(&self) -> &str {
        "crater"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let region = ctx.region;
        let config = CraterConfig::from_params(params, region);
        let mut rng = params.rng();
        let (cx, cz) = region_center(region);
        let base = f64::from(center_level(ctx.flat, region));
        let CraterConfig { outer, inner, rim_height, depth, .. } = config;

        let mut painter = ctx.painter().with_level(LevelMode::Higher);
        painter.fill_radial(cx, cz, outer, |d| {
            (d >= inner).then(|| (base + rim_height * (outer - d) / (outer - inner)).round() as i32)
        });

        painter.set_level_painter(LevelMode::Lower);
        painter.fill_radial(cx, cz, inner, |d| {
            let t = d / inner;
            Some((base + rim_height - (depth + rim_height) * (1.0 - t * t)).round() as i32)
        });

        for _ in 0..config.small_craters {
            let (ox, oz) = rng.polar_offset(0.0, inner * 0.6);
            let (sx, sz) = (cx + ox, cz + oz);
            let radius = rng.uniform(2.0, (inner * 0.3).max(2.5));
            let floor = painter
                .level_at(sx.round() as i32, sz.round() as i32)
                .map_or(base - depth, f64::from);
            let small_depth = (depth * 0.3).max(1.0);
            painter.fill_radial(sx, sz, radius, |d| {
                let t = d / radius;
                Some((floor - small_depth * (1.0 - t * t)).round() as i32)
            });
        }

        let (x1, z1, x2, z2) = square(cx, cz, outer + 1.0);
        painter.soften(x1, z1, x2, z2, config.blur, 1);
        Ok(format!(
            "crater r={outer:.1}/{inner:.1} with {} small craters, {} writes",
            config.small_craters,
            painter.touched()
        ))
    }
}

struct IslandConfig {
    radius: f64,
    height: f64,
    falloff: f64,
    satellites: u32,
    satellite_scale: f64,
    jitter: i32,
    blur: f64,
    underwater: bool,
    base: f64,
}

impl IslandConfig {
    fn from_params(params: &Params, region: Region, ocean_level: u8) -> Self {
        let limit = max_radius(region).max(2.0);
        Self {
            radius: params.f64_clamped("radius", limit * 0.6, 2.0, limit),
            height: params.f64_clamped("height", 40.0, 1.0, 255.0),
            falloff: params.f64_clamped("falloff", 3.0, 0.5, 10.0),
            satellites: params.i32_clamped("satellites", 4, 0, 20) as u32,
            satellite_scale: params.f64_clamped("satelliteScale", 0.4, 0.1, 1.0),
            jitter: params.i32_clamped("jitter", 2, 0, 10),
            blur: params.f64_clamped("blur", 0.5, 0.0, 1.0),
            underwater: params.bool_or("underwater", false),
            base: params.f64_clamped("baseLevel", f64::from(ocean_level.saturating_sub(8)), 0.0, 255.0),
        }
    }

    /// Level of a peak of `height` at distance `d` within `radius`.
    fn profile(&self, height: f64, radius: f64, d: f64) -> i32 {
        let lift = height * (-self.falloff * d / radius).exp();
        let level = if self.underwater { self.base - lift } else { self.base + lift };
        level.round() as i32
    }
}

/// `islands`: exponential peak with satellites, jitter and blur.
///
/// With `underwater=true` the profile is inverted and painted lower-only.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `radius` | 0.6 of half the shorter side | 2..=half the shorter side |
/// | `height` | 40 | 1..=255 |
/// | `falloff` | 3.0 | 0.5..=10 |
/// | `satellites` | 4 | 0..=20 |
/// | `satelliteScale` | 0.4 | 0.1..=1 |
/// | `jitter` | 2 | 0..=10 |
/// | `blur` | 0.5 | 0..=1 |
/// | `underwater` | false | bool |
/// | `baseLevel` | ocean level - 8 | 0..=255 |
/// | `seed` | clock | u64 |
pub struct Islands;

impl Manipulator for Islands {
    fn name(&self) -> &str {
        "islands"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let region = ctx.region;
        let config = IslandConfig::from_params(params, region, ctx.flat.ocean_level);
        let mut rng = params.rng();
        let (cx, cz) = region_center(region);
        let mode = if config.underwater { LevelMode::Lower } else { LevelMode::Higher };

        let mut painter = ctx.painter().with_level(mode).with_column(ColumnMode::ByOcean);
        painter.fill_radial(cx, cz, config.radius, |d| {
            Some(config.profile(config.height, config.radius, d))
        });

        let limit = max_radius(region);
        let mut placed = 0;
        for _ in 0..config.satellites {
            let radius = config.radius * config.satellite_scale * rng.uniform(0.5, 1.0);
            let height = config.height * rng.uniform(0.3, 0.7);
            if config.radius >= limit - radius {
                continue;
            }
            let (ox, oz) = rng.polar_offset(config.radius, limit - radius);
            painter.fill_radial(cx + ox, cz + oz, radius, |d| Some(config.profile(height, radius, d)));
            placed += 1;
        }

        if config.jitter > 0 {
            let seed = rng.range(0, i32::MAX) as u64;
            painter.set_level_painter(Jitter::new(TerrainRng::new(seed), config.jitter));
            for (x, z) in region.points() {
                let Some(level) = painter.level_at(x, z) else { continue };
                let shaped = if config.underwater {
                    f64::from(level) < config.base
                } else {
                    f64::from(level) > config.base
                };
                if shaped {
                    painter.paint(x, z, i32::from(level));
                }
            }
        }

        painter.soften(region.x, region.z, region.max_x(), region.max_z(), config.blur, 1);
        Ok(format!("island r={:.1} with {placed} satellites", config.radius))
    }
}

/// `lakes`: quadratic basins, lower-only, water material in the basin.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `radius` | half of half the shorter side | 2..=half the shorter side |
/// | `depth` | 10 | 1..=128 |
/// | `satellites` | 2 | 0..=10 |
/// | `blur` | 0.5 | 0..=1 |
/// | `seed` | clock | u64 |
pub struct Lakes;

impl Manipulator for Lakes {
    fn name(&self) -> &str {
        "lakes"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let region = ctx.region;
        let limit = max_radius(region).max(2.0);
        let radius = params.f64_clamped("radius", limit * 0.5, 2.0, limit);
        let depth = params.f64_clamped("depth", 10.0, 1.0, 128.0);
        let satellites = params.i32_clamped("satellites", 2, 0, 10) as u32;
        let blur = params.f64_clamped("blur", 0.5, 0.0, 1.0);
        let mut rng = params.rng();
        let (cx, cz) = region_center(region);

        let mut basins = vec![(cx, cz, radius, depth)];
        for _ in 0..satellites {
            let r = radius * rng.uniform(0.3, 0.6);
            if radius >= limit - r {
                continue;
            }
            let (ox, oz) = rng.polar_offset(radius, limit - r);
            basins.push((cx + ox, cz + oz, r, depth * rng.uniform(0.4, 0.8)));
        }

        let mut painter = ctx.painter().with_level(LevelMode::Lower);
        for &(bx, bz, r, d) in &basins {
            let surface = painter
                .level_at(bx.round() as i32, bz.round() as i32)
                .map_or(0.0, f64::from);
            painter.set_column_painter(ColumnMode::Keep);
            painter.fill_radial(bx, bz, r, |dist| {
                let t = dist / r;
                Some((surface - d * (1.0 - t * t)).round() as i32)
            });
            painter.set_column_painter(ColumnMode::Set(WATER));
            painter.fill_radial(bx, bz, r * 0.85, |_| Some(surface.round() as i32));
        }
        painter.soften(region.x, region.z, region.max_x(), region.max_z(), blur, 1);
        Ok(format!("{} lake basins", basins.len()))
    }
}
