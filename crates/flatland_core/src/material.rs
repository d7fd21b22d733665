//! # Materials
//!
//! Every column of a flat carries a material byte:
//!
//! - `0` ([`NOT_SET`]): no generation claim, protected when the flat says so
//! - `255` ([`NOT_SET_MUTABLE`]): no generation claim, free to edit
//! - `1..=254`: a generated material, looked up in the flat's material table

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::BlockDef;

/// Material id.
pub type MaterialId = u8;

/// Unset and protected (when `unknown_protected` is on).
pub const NOT_SET: MaterialId = 0;
/// Unset but editable.
pub const NOT_SET_MUTABLE: MaterialId = 255;

/// Grass on dirt.
pub const GRASS: MaterialId = 1;
/// Dirt.
pub const DIRT: MaterialId = 2;
/// Stone.
pub const STONE: MaterialId = 3;
/// Sand.
pub const SAND: MaterialId = 4;
/// Standing water.
pub const WATER: MaterialId = 5;
/// Bedrock.
pub const BEDROCK: MaterialId = 6;
/// Snow on stone.
pub const SNOW: MaterialId = 7;

/// True for ids that carry a generation claim.
#[inline]
#[must_use]
pub const fn is_defined(id: MaterialId) -> bool {
    id != NOT_SET && id != NOT_SET_MUTABLE
}

/// How a material turns into blocks on export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialDefinition {
    /// Block at the column's level.
    pub block_def: BlockDef,
    /// Block below the level; `None` means the same as `block_def`.
    #[serde(default)]
    pub next_block_def: Option<BlockDef>,
    /// Whether ocean fill applies above this material.
    #[serde(default)]
    pub has_ocean: bool,
}

impl MaterialDefinition {
    /// Creates a definition.
    #[must_use]
    pub fn new(block_def: BlockDef, next_block_def: Option<BlockDef>, has_ocean: bool) -> Self {
        Self {
            block_def,
            next_block_def,
            has_ocean,
        }
    }

    /// Block placed below the column's level.
    #[must_use]
    pub fn below(&self) -> &BlockDef {
        self.next_block_def.as_ref().unwrap_or(&self.block_def)
    }

    /// Table installed on every new flat.
    #[must_use]
    pub fn default_table() -> BTreeMap<MaterialId, Self> {
        let def = |block: &str, next: Option<&str>, ocean: bool| {
            Self::new(BlockDef::new(block), next.map(BlockDef::new), ocean)
        };
        BTreeMap::from([
            (GRASS, def("grass", Some("dirt"), true)),
            (DIRT, def("dirt", None, true)),
            (STONE, def("stone", None, true)),
            (SAND, def("sand", None, true)),
            (WATER, def("water", Some("sand"), false)),
            (BEDROCK, def("bedrock", None, false)),
            (SNOW, def("snow", Some("stone"), true)),
        ])
    }
}
