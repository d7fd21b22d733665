//! # Flatland Core
//!
//! Data model of the terrain raster engine.
//!
//! ## Core Components
//!
//! - `Flat`: the mutable 2D grid of (level, material) columns
//! - `MaterialDefinition`: how a material turns into blocks
//! - `Block` / `BlockDef`: the 3D side, with the compact definition syntax
//! - `Chunk` / `ChunkKey`: chunked block storage units
//! - `HexGrid`: hexagonal world partitioning
//! - `store`: repository, chunk store, classifier and notifier seams
//!
//! ## Example
//!
//! ```rust
//! use flatland_core::{Flat, material};
//!
//! let mut flat = Flat::new("world", "ground", "f1", 8, 8);
//! flat.unknown_protected = true;
//! assert!(!flat.set_level(0, 0, 10));
//! flat.unknown_protected = false;
//! assert!(flat.set_column(0, 0, material::GRASS));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::perf)]

pub mod block;
pub mod chunk;
pub mod config;
pub mod error;
pub mod flat;
pub mod hex;
pub mod material;
pub mod store;

pub use block::{face, Block, BlockDef};
pub use chunk::{Chunk, ChunkKey};
pub use config::WorldConfig;
pub use error::{FlatError, FlatResult};
pub use flat::{ExtraBlock, Flat};
pub use hex::{HexCoord, HexGrid};
pub use material::{MaterialDefinition, MaterialId};
pub use store::{
    BlockClassification, BlockClassifier, ChunkStore, DirtyEvent, DirtyNotifier, FlatRepository,
    MemoryChunkStore, MemoryFlatRepository, NoopNotifier, RecordingNotifier, StaticBlockClassifier,
};
