//! Base terrain: constant ground and noise-driven rolling terrain.

use flatland_core::FlatResult;

use crate::noise::SimplexNoise;
use crate::painter::{ColumnMode, LevelMode};
use crate::params::Params;
use crate::registry::{Manipulator, ManipulatorContext};

/// `flat`: constant height over the region.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `groundLevel` | 64 | 0..=255 |
pub struct FlatGround;

impl Manipulator for FlatGround {
    fn name(&self) -> &str {
        "flat"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let level = params.level_or("groundLevel", 64);
        let region = ctx.region;
        let mut painter = ctx.painter().with_column(ColumnMode::ByOcean);
        painter.fill_rectangle(region.x, region.z, region.max_x(), region.max_z(), i32::from(level));
        Ok(format!("{} columns set to level {level}", painter.touched()))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct NoiseConfig {
    base_height: f64,
    variation: f64,
    seed: u64,
}

impl NoiseConfig {
    fn from_params(params: &Params, default_variation: f64) -> Self {
        Self {
            base_height: params.f64_clamped("baseHeight", 64.0, 0.0, 255.0),
            variation: params.f64_clamped("heightVariation", default_variation, 0.0, 128.0),
            seed: params.seed_or(0),
        }
    }
}

/// `normal` and `hilly`: base height plus three weighted simplex octaves.
///
/// Noise is sampled at world coordinates, so neighboring flats generated with
/// the same seed meet without a seam.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `baseHeight` | 64 | 0..=255 |
/// | `heightVariation` | 16 (normal), 40 (hilly) | 0..=128 |
/// | `seed` | 0 | u64 |
pub struct NoiseTerrain {
    name: &'static str,
    octaves: [(f64, f64); 3],
    default_variation: f64,
}

impl NoiseTerrain {
    /// Gentle rolling plains.
    #[must_use]
    pub const fn normal() -> Self {
        Self {
            name: "normal",
            octaves: [(96.0, 0.6), (32.0, 0.3), (12.0, 0.1)],
            default_variation: 16.0,
        }
    }

    /// Bigger, steeper features.
    #[must_use]
    pub const fn hilly() -> Self {
        Self {
            name: "hilly",
            octaves: [(192.0, 0.55), (64.0, 0.3), (24.0, 0.15)],
            default_variation: 40.0,
        }
    }
}

impl Manipulator for NoiseTerrain {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let config = NoiseConfig::from_params(params, self.default_variation);
        let noise = SimplexNoise::new(config.seed);
        let region = ctx.region;
        let (mount_x, mount_z) = (ctx.flat.mount_x, ctx.flat.mount_z);

        let mut painter = ctx
            .painter()
            .with_level(LevelMode::Set)
            .with_column(ColumnMode::ByOcean);
        for (x, z) in region.points() {
            let wx = f64::from(mount_x + x);
            let wz = f64::from(mount_z + z);
            let height = config.base_height + config.variation * noise.weighted_octaves(wx, wz, &self.octaves);
            painter.paint(x, z, height.round() as i32);
        }
        Ok(format!(
            "{} columns around {} +/- {}",
            painter.touched(),
            config.base_height,
            config.variation
        ))
    }
}

#[cfg(test)]
mod tests {
    use flatland_core::material::{GRASS, SAND};

    use super::*;
    use crate::manipulators::testing::{flat_at, min_max, run};

    #[test]
    fn test_flat_sets_level_and_material() {
        let mut flat = flat_at(10, 0);
        run("flat", &mut flat, &Params::new().with("groundLevel", 80));
        assert!(flat.levels().iter().all(|&l| l == 80));
        assert_eq!(flat.column(3, 3), GRASS);

        run("flat", &mut flat, &Params::new().with("groundLevel", 5));
        assert_eq!(flat.column(3, 3), SAND);
    }

    #[test]
    fn test_noise_stays_within_variation() {
        let mut flat = flat_at(32, 0);
        let params = Params::new()
            .with("baseHeight", 100)
            .with("heightVariation", 20)
            .with("seed", 9);
        run("hilly", &mut flat, &params);
        let (lo, hi) = min_max(&flat);
        assert!(lo >= 80 && hi <= 120, "{lo}..{hi}");
        assert!(hi > lo);
    }

    #[test]
    fn test_noise_tiles_across_mounts() {
        let params = Params::new().with("seed", 4);
        let mut wide = flat_at(32, 0);
        run("normal", &mut wide, &params);

        let mut right = flat_at(16, 0);
        right.mount_x = 16;
        run("normal", &mut right, &params);

        for z in 0..16 {
            for x in 0..16 {
                assert_eq!(wide.level(x + 16, z), right.level(x, z));
            }
        }
    }
}
