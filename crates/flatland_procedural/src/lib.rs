//! # Flatland Procedural
//!
//! Terrain algorithms over flat rasters, and the pipeline between rasters and
//! block chunks.
//!
//! ## Design Principles
//!
//! 1. **Seeded**: every random algorithm owns its generator; a `seed`
//!    parameter makes a run reproducible
//! 2. **All or nothing**: a manipulator works on a copy, the flat only
//!    changes when it succeeds
//! 3. **Bulk I/O**: chunk data is loaded once per call, never per column
//!
//! ## Core Components
//!
//! - `Painter`: lines, circles, rectangles and filters with pluggable level
//!   and material combinators
//! - `ManipulatorRegistry`: named terrain algorithms
//! - `FlatFactory`: blank, imported and hex-cell flats
//! - `FlatExporter`: raster back into block columns
//! - `FlatService`: load, manipulate, store
//!
//! ## Example
//!
//! ```rust
//! use flatland_core::{material, Flat};
//! use flatland_procedural::{ManipulatorRegistry, Params, Region};
//!
//! let mut flat = Flat::new("world", "ground", "f1", 10, 10);
//! let registry = ManipulatorRegistry::with_defaults();
//! let region = Region::whole(&flat);
//! registry
//!     .execute("flat", &mut flat, region, &Params::new().with("groundLevel", 80))
//!     .unwrap();
//! assert_eq!(flat.level(4, 4), 80);
//! assert_eq!(flat.column(4, 4), material::GRASS);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::perf)]

pub mod chunk_cache;
pub mod create;
pub mod export;
pub mod manipulators;
pub mod noise;
pub mod painter;
pub mod params;
pub mod random;
pub mod region;
pub mod registry;
pub mod service;

pub use chunk_cache::ChunkCache;
pub use create::{FlatFactory, FlatRequest, HexFill};
pub use export::{ExportOptions, ExportReport, FlatExporter, EXPORT_REASON};
pub use manipulators::composition::PRESETS;
pub use noise::SimplexNoise;
pub use painter::{ColumnMode, ColumnPainter, GaussianJitter, Jitter, LevelMode, LevelPainter, Painter};
pub use params::Params;
pub use random::TerrainRng;
pub use region::Region;
pub use registry::{Manipulator, ManipulatorContext, ManipulatorRegistry};
pub use service::{FlatService, ManipulateOutcome, ManipulateRequest};
