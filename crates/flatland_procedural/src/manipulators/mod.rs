//! # Built-in Manipulators
//!
//! | Name | Module |
//! |------|--------|
//! | `flat`, `normal`, `hilly` | [`terrain`] |
//! | `mountain`, `sharp-peak` | [`mountain`] |
//! | `crater`, `islands`, `lakes` | [`radial`] |
//! | `spider` | [`spider`] |
//! | `shaked-box`, `random-pixels` | [`scatter`] |
//! | `border-smooth` | [`border`] |
//! | `roughen`, `soften`, `sharpen`, `soften-raster`, `water-soften` | [`filters`] |
//! | `set-material` | [`material`] |
//! | `composition` | [`composition`] |

pub mod border;
pub mod composition;
pub mod filters;
pub mod material;
pub mod mountain;
pub mod radial;
pub mod scatter;
pub mod spider;
pub mod terrain;

use flatland_core::Flat;

use crate::region::Region;
use crate::registry::{Manipulator, ManipulatorRegistry};

/// Registers every built-in manipulator.
pub fn register_defaults(registry: &mut ManipulatorRegistry) {
    let all: Vec<Box<dyn Manipulator>> = vec![
        Box::new(terrain::FlatGround),
        Box::new(terrain::NoiseTerrain::normal()),
        Box::new(terrain::NoiseTerrain::hilly()),
        Box::new(mountain::Mountain),
        Box::new(mountain::SharpPeak),
        Box::new(radial::Crater),
        Box::new(radial::Islands),
        Box::new(radial::Lakes),
        Box::new(spider::Spider),
        Box::new(scatter::ShakedBox),
        Box::new(scatter::RandomPixels),
        Box::new(border::BorderSmooth),
        Box::new(filters::Roughen),
        Box::new(filters::Soften),
        Box::new(filters::Sharpen),
        Box::new(filters::SoftenRaster),
        Box::new(filters::WaterSoften),
        Box::new(material::SetMaterial),
        Box::new(composition::Composition),
    ];
    for manipulator in all {
        if let Err(err) = registry.register(manipulator) {
            tracing::warn!(error = %err, "built-in manipulator not registered");
        }
    }
}

/// Current level at the region's center, the usual base for radial shapes.
pub(crate) fn center_level(flat: &Flat, region: Region) -> i32 {
    let (cx, cz) = region.center();
    i32::from(flat.level(cx as usize, cz as usize))
}

/// Half the region's shorter side, the largest radius that stays inside.
pub(crate) fn max_radius(region: Region) -> f64 {
    (f64::from(region.min_side()) / 2.0).max(1.0)
}

/// Inclusive corners of a square around a point, for filter passes.
pub(crate) fn square(cx: f64, cz: f64, radius: f64) -> (i32, i32, i32, i32) {
    (
        (cx - radius).floor() as i32,
        (cz - radius).floor() as i32,
        (cx + radius).ceil() as i32,
        (cz + radius).ceil() as i32,
    )
}
