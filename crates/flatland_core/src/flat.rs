//! # Flat Raster
//!
//! A flat is a `size_x x size_z` grid of columns, each holding a height
//! (`level`) and a material byte, mounted at a world-space origin.
//!
//! ## Protection
//!
//! When `unknown_protected` is set, columns whose material is
//! [`NOT_SET`](crate::material::NOT_SET) reject every write. Callers that must
//! touch them clear the flag first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::BlockDef;
use crate::hex::HexCoord;
use crate::material::{MaterialDefinition, MaterialId, NOT_SET, NOT_SET_MUTABLE};

/// A block layered above a column's main level, passed through on export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraBlock {
    /// World Y of the block.
    pub y: i32,
    /// Block template.
    pub def: BlockDef,
}

/// The 2D terrain raster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flat {
    id: String,
    world_id: String,
    layer_id: String,
    flat_id: String,
    /// World X of column 0.
    pub mount_x: i32,
    /// World Z of column 0.
    pub mount_z: i32,
    /// Ocean surface height.
    pub ocean_level: u8,
    /// Block used for ocean fill.
    pub ocean_block: BlockDef,
    /// Hex cell this flat was created for.
    pub hex: Option<HexCoord>,
    /// Whether [`NOT_SET`] columns are write-protected.
    pub unknown_protected: bool,
    /// Optimistic concurrency version, maintained by the repository.
    pub version: u64,
    size_x: usize,
    size_z: usize,
    levels: Vec<u8>,
    columns: Vec<MaterialId>,
    materials: BTreeMap<MaterialId, MaterialDefinition>,
    extra_blocks: BTreeMap<usize, Vec<ExtraBlock>>,
}

impl Flat {
    /// Creates a zero-filled flat with the default material table.
    #[must_use]
    pub fn new(
        world_id: impl Into<String>,
        layer_id: impl Into<String>,
        flat_id: impl Into<String>,
        size_x: usize,
        size_z: usize,
    ) -> Self {
        let world_id = world_id.into();
        let layer_id = layer_id.into();
        let flat_id = flat_id.into();
        let mut flat = Self {
            id: Self::compose_id(&world_id, &layer_id, &flat_id),
            world_id,
            layer_id,
            flat_id,
            mount_x: 0,
            mount_z: 0,
            ocean_level: 0,
            ocean_block: BlockDef::new("water"),
            hex: None,
            unknown_protected: false,
            version: 0,
            size_x: 0,
            size_z: 0,
            levels: Vec::new(),
            columns: Vec::new(),
            materials: MaterialDefinition::default_table(),
            extra_blocks: BTreeMap::new(),
        };
        flat.init_with_size(size_x, size_z);
        flat
    }

    /// Storage id derived from the logical key.
    #[must_use]
    pub fn compose_id(world_id: &str, layer_id: &str, flat_id: &str) -> String {
        format!("{world_id}/{layer_id}/{flat_id}")
    }

    /// Reallocates the grid; every column becomes level 0, material 0.
    pub fn init_with_size(&mut self, size_x: usize, size_z: usize) {
        self.size_x = size_x;
        self.size_z = size_z;
        self.levels = vec![0; size_x * size_z];
        self.columns = vec![NOT_SET; size_x * size_z];
        self.extra_blocks.clear();
    }

    /// Storage id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// World id.
    #[must_use]
    pub fn world_id(&self) -> &str {
        &self.world_id
    }

    /// Source layer id.
    #[must_use]
    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    /// Flat id within the layer.
    #[must_use]
    pub fn flat_id(&self) -> &str {
        &self.flat_id
    }

    /// Grid width.
    #[must_use]
    pub fn size_x(&self) -> usize {
        self.size_x
    }

    /// Grid depth.
    #[must_use]
    pub fn size_z(&self) -> usize {
        self.size_z
    }

    /// True if signed grid coordinates address a column.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && (x as usize) < self.size_x && (z as usize) < self.size_z
    }

    #[inline]
    fn index(&self, x: usize, z: usize) -> usize {
        assert!(
            x < self.size_x && z < self.size_z,
            "column ({x}, {z}) outside flat of size {}x{}",
            self.size_x,
            self.size_z
        );
        z * self.size_x + x
    }

    /// World X of a grid column.
    #[inline]
    #[must_use]
    pub fn world_x(&self, x: usize) -> i32 {
        self.mount_x + x as i32
    }

    /// World Z of a grid row.
    #[inline]
    #[must_use]
    pub fn world_z(&self, z: usize) -> i32 {
        self.mount_z + z as i32
    }

    /// Level of a column.
    ///
    /// # Panics
    ///
    /// Panics if the column is outside the grid.
    #[inline]
    #[must_use]
    pub fn level(&self, x: usize, z: usize) -> u8 {
        self.levels[self.index(x, z)]
    }

    /// Material of a column.
    ///
    /// # Panics
    ///
    /// Panics if the column is outside the grid.
    #[inline]
    #[must_use]
    pub fn column(&self, x: usize, z: usize) -> MaterialId {
        self.columns[self.index(x, z)]
    }

    /// True if writes to this column are rejected.
    ///
    /// # Panics
    ///
    /// Panics if the column is outside the grid.
    #[inline]
    #[must_use]
    pub fn is_protected(&self, x: usize, z: usize) -> bool {
        self.unknown_protected && self.column(x, z) == NOT_SET
    }

    /// Sets a column's level. Returns false and changes nothing when protected.
    ///
    /// # Panics
    ///
    /// Panics if the column is outside the grid.
    pub fn set_level(&mut self, x: usize, z: usize, level: u8) -> bool {
        let index = self.index(x, z);
        if self.unknown_protected && self.columns[index] == NOT_SET {
            return false;
        }
        self.levels[index] = level;
        true
    }

    /// Sets a column's material. Returns false and changes nothing when protected.
    ///
    /// # Panics
    ///
    /// Panics if the column is outside the grid.
    pub fn set_column(&mut self, x: usize, z: usize, material: MaterialId) -> bool {
        let index = self.index(x, z);
        if self.unknown_protected && self.columns[index] == NOT_SET {
            return false;
        }
        self.columns[index] = material;
        true
    }

    /// Row-major snapshot of all levels.
    #[must_use]
    pub fn levels(&self) -> &[u8] {
        &self.levels
    }

    /// Defines a material. Ids 0 and 255 are reserved and silently ignored.
    pub fn set_material(&mut self, id: MaterialId, definition: MaterialDefinition) {
        if id == NOT_SET || id == NOT_SET_MUTABLE {
            return;
        }
        self.materials.insert(id, definition);
    }

    /// Looks up a material definition.
    #[must_use]
    pub fn material(&self, id: MaterialId) -> Option<&MaterialDefinition> {
        self.materials.get(&id)
    }

    /// Removes a material definition.
    pub fn remove_material(&mut self, id: MaterialId) -> Option<MaterialDefinition> {
        self.materials.remove(&id)
    }

    /// All material definitions, ordered by id.
    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &MaterialDefinition)> {
        self.materials.iter().map(|(id, def)| (*id, def))
    }

    /// Blocks layered above a column.
    ///
    /// # Panics
    ///
    /// Panics if the column is outside the grid.
    #[must_use]
    pub fn extra_blocks(&self, x: usize, z: usize) -> &[ExtraBlock] {
        self.extra_blocks
            .get(&self.index(x, z))
            .map_or(&[], Vec::as_slice)
    }

    /// Replaces the extra blocks of a column; an empty list removes them.
    ///
    /// # Panics
    ///
    /// Panics if the column is outside the grid.
    pub fn set_extra_blocks(&mut self, x: usize, z: usize, blocks: Vec<ExtraBlock>) {
        let index = self.index(x, z);
        if blocks.is_empty() {
            self.extra_blocks.remove(&index);
        } else {
            self.extra_blocks.insert(index, blocks);
        }
    }
}
