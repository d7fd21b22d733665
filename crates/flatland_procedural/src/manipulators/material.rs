//! `set-material`: assigns a material by level band.

use flatland_core::FlatResult;

use crate::params::Params;
use crate::registry::{Manipulator, ManipulatorContext};

/// `set-material`: every column whose level is in `[fromLevel, toLevel]`
/// gets `material`. Reversed bounds are swapped.
///
/// | Param | Default | Range |
/// |-------|---------|-------|
/// | `material` | required | 0..=255 |
/// | `fromLevel` | 0 | 0..=255 |
/// | `toLevel` | 255 | 0..=255 |
pub struct SetMaterial;

impl Manipulator for SetMaterial {
    fn name(&self) -> &str {
        "set-material"
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let material = params.required_u8("material")?;
        let from = params.level_or("fromLevel", 0);
        let to = params.level_or("toLevel", 255);
        let (low, high) = if from <= to { (from, to) } else { (to, from) };

        let region = ctx.region;
        let flat = &mut *ctx.flat;
        let mut assigned = 0;
        for (x, z) in region.points() {
            let (ux, uz) = (x as usize, z as usize);
            if (low..=high).contains(&flat.level(ux, uz)) && flat.set_column(ux, uz, material) {
                assigned += 1;
            }
        }
        Ok(format!("material {material} assigned to {assigned} columns in {low}..={high}"))
    }
}
