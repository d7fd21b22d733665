//! # Create / Import
//!
//! Builds flats from scratch or seeds their levels from existing chunk data.
//!
//! ## Surface Scan
//!
//! The seed level of an imported column is, in order of preference:
//!
//! 1. the highest block whose type is classified as ground
//! 2. the highest solid block: a simple cube that is not water
//! 3. `ocean_level - 10`
//!
//! ## Replace Semantics
//!
//! Creating or importing a flat whose `(world, layer, flat)` key already
//! exists deletes the stored flat first.

use flatland_core::material::{self, MaterialId};
use flatland_core::{
    BlockClassifier, ChunkStore, Flat, FlatError, FlatRepository, FlatResult, HexCoord, WorldConfig,
};

use crate::chunk_cache::ChunkCache;

/// Distance below the ocean used when a column has no blocks at all.
const EMPTY_COLUMN_DEPTH: u8 = 10;

/// Where and how large a new flat is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatRequest {
    /// Source layer id; also the chunk layer imports read from.
    pub layer_id: String,
    /// Flat id within the layer.
    pub flat_id: String,
    /// World X of column 0.
    pub mount_x: i32,
    /// World Z of row 0.
    pub mount_z: i32,
    /// Width.
    pub size_x: usize,
    /// Depth.
    pub size_z: usize,
}

impl FlatRequest {
    /// Request mounted at the world origin.
    #[must_use]
    pub fn new(layer_id: impl Into<String>, flat_id: impl Into<String>, size_x: usize, size_z: usize) -> Self {
        Self {
            layer_id: layer_id.into(),
            flat_id: flat_id.into(),
            mount_x: 0,
            mount_z: 0,
            size_x,
            size_z,
        }
    }

    /// Moves the mount point.
    #[must_use]
    pub fn at(mut self, mount_x: i32, mount_z: i32) -> Self {
        self.mount_x = mount_x;
        self.mount_z = mount_z;
        self
    }

    fn validate(&self) -> FlatResult<()> {
        if self.layer_id.trim().is_empty() || self.flat_id.trim().is_empty() {
            return Err(FlatError::invalid("layer id and flat id must not be blank"));
        }
        if self.size_x == 0 || self.size_z == 0 {
            return Err(FlatError::invalid(format!(
                "flat size must be positive, got {}x{}",
                self.size_x, self.size_z
            )));
        }
        Ok(())
    }
}

/// Initial content of the columns inside a hex cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HexFill {
    /// Mutable, not generated yet.
    #[default]
    Empty,
    /// Bedrock floor.
    EmptyWithBedrock,
}

impl HexFill {
    const fn material(self) -> MaterialId {
        match self {
            Self::Empty => material::NOT_SET_MUTABLE,
            Self::EmptyWithBedrock => material::BEDROCK,
        }
    }
}

/// Creates and imports flats.
pub struct FlatFactory<'a> {
    config: &'a WorldConfig,
    repository: &'a dyn FlatRepository,
    chunks: &'a dyn ChunkStore,
    classifier: &'a dyn BlockClassifier,
}

impl<'a> FlatFactory<'a> {
    /// Binds the factory to its collaborators.
    #[must_use]
    pub fn new(
        config: &'a WorldConfig,
        repository: &'a dyn FlatRepository,
        chunks: &'a dyn ChunkStore,
        classifier: &'a dyn BlockClassifier,
    ) -> Self {
        Self {
            config,
            repository,
            chunks,
            classifier,
        }
    }

    fn new_flat(&self, request: &FlatRequest) -> Flat {
        let mut flat = Flat::new(
            self.config.world_id.clone(),
            request.layer_id.clone(),
            request.flat_id.clone(),
            request.size_x,
            request.size_z,
        );
        flat.mount_x = request.mount_x;
        flat.mount_z = request.mount_z;
        flat.ocean_level = self.config.ocean_level;
        flat.ocean_block = self.config.ocean_block.clone();
        flat
    }

    /// Deletes a stored flat with the same key, then stores `flat`.
    fn replace(&self, flat: Flat) -> FlatResult<Flat> {
        if let Some(existing) = self
            .repository
            .find(flat.world_id(), flat.layer_id(), flat.flat_id())?
        {
            tracing::debug!(flat = existing.id(), "replacing existing flat");
            self.repository.delete(existing.id())?;
        }
        self.repository.create(flat)
    }

    fn load_cache(&self, flat: &Flat) -> FlatResult<ChunkCache<'a>> {
        let x1 = flat.world_x(flat.size_x().saturating_sub(1));
        let z1 = flat.world_z(flat.size_z().saturating_sub(1));
        ChunkCache::load(
            self.chunks,
            flat.layer_id(),
            self.config.chunk_size_i32(),
            (flat.mount_x, flat.mount_z),
            (x1, z1),
        )
    }

    /// Seed level of a world column from chunk data.
    fn surface_level(&self, cache: &ChunkCache<'_>, x: i32, z: i32) -> u8 {
        let world = self.config.world_id.as_str();
        let water = self.config.water_block.type_id.as_str();
        let y = cache
            .highest_where(x, z, |b| self.classifier.classify(world, &b.def.type_id).is_ground)
            .or_else(|| {
                cache.highest_where(x, z, |b| {
                    b.def.type_id != water && self.classifier.classify(world, &b.def.type_id).is_simple_cube
                })
            })
            .map(|b| b.y);
        match y {
            Some(y) => y.clamp(0, 255) as u8,
            None => self.config.ocean_level.saturating_sub(EMPTY_COLUMN_DEPTH),
        }
    }

    /// Blank flat: every column at `level`, mutable and not generated yet.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::InvalidArgument`] for an empty size or blank ids,
    /// and propagates repository failures.
    pub fn create_blank(&self, request: &FlatRequest, level: u8) -> FlatResult<Flat> {
        request.validate()?;
        let mut flat = self.new_flat(request);
        for z in 0..flat.size_z() {
            for x in 0..flat.size_x() {
                flat.set_level(x, z, level);
                flat.set_column(x, z, material::NOT_SET_MUTABLE);
            }
        }
        let flat = self.replace(flat)?;
        tracing::info!(flat = flat.id(), size_x = flat.size_x(), size_z = flat.size_z(), "blank flat created");
        Ok(flat)
    }

    /// Flat whose levels follow the existing terrain. Materials stay unset;
    /// protection is off so manipulators may claim any column.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::InvalidArgument`] for an empty size or blank ids,
    /// and propagates storage failures.
    pub fn import(&self, request: &FlatRequest) -> FlatResult<Flat> {
        request.validate()?;
        let mut flat = self.new_flat(request);
        let cache = self.load_cache(&flat)?;
        for z in 0..flat.size_z() {
            for x in 0..flat.size_x() {
                let level = self.surface_level(&cache, flat.world_x(x), flat.world_z(z));
                flat.set_level(x, z, level);
            }
        }
        let flat = self.replace(flat)?;
        tracing::info!(flat = flat.id(), "flat imported");
        Ok(flat)
    }

    /// Re-seeds only the outer ring of a stored flat from current chunk data,
    /// leaving interior edits alone. Protection is lifted for the duration.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::NotFound`] for an unknown id and propagates
    /// storage failures, including [`FlatError::Conflict`].
    pub fn update_border(&self, flat_id: &str) -> FlatResult<Flat> {
        let mut flat = self
            .repository
            .find_by_id(flat_id)?
            .ok_or_else(|| FlatError::not_found("flat", flat_id))?;
        let cache = self.load_cache(&flat)?;

        let (sx, sz) = (flat.size_x(), flat.size_z());
        let protected = flat.unknown_protected;
        flat.unknown_protected = false;
        let mut updated = 0;
        for z in 0..sz {
            for x in 0..sx {
                if x != 0 && z != 0 && x != sx - 1 && z != sz - 1 {
                    continue;
                }
                let level = self.surface_level(&cache, flat.world_x(x), flat.world_z(z));
                if flat.level(x, z) != level {
                    flat.set_level(x, z, level);
                    updated += 1;
                }
            }
        }
        flat.unknown_protected = protected;

        let flat = self.repository.update(&flat)?;
        tracing::info!(flat = flat.id(), updated, "flat border re-seeded");
        Ok(flat)
    }

    fn hex_request(&self, layer_id: &str, flat_id: &str, hex: HexCoord) -> FlatRequest {
        let grid = self.config.hex_grid();
        let (cx, cz) = grid.center(hex);
        let size = self.config.hex_grid_diameter as usize;
        let half = (size / 2) as i32;
        FlatRequest::new(layer_id, flat_id, size, size).at(cx.round() as i32 - half, cz.round() as i32 - half)
    }

    /// Marks columns inside the inset hexagon with `inside`, the rest as
    /// protected, then turns protection on.
    fn apply_hex_mask(&self, flat: &mut Flat, hex: HexCoord, inside: MaterialId) -> usize {
        let grid = self.config.hex_grid();
        let inset = f64::from(self.config.hex_skirt);
        flat.unknown_protected = false;
        flat.hex = Some(hex);
        let mut editable = 0;
        for z in 0..flat.size_z() {
            for x in 0..flat.size_x() {
                let wx = f64::from(flat.world_x(x));
                let wz = f64::from(flat.world_z(z));
                if grid.contains(hex, wx, wz, inset) {
                    flat.set_column(x, z, inside);
                    editable += 1;
                } else {
                    flat.set_column(x, z, material::NOT_SET);
                }
            }
        }
        flat.unknown_protected = true;
        editable
    }

    /// Blank flat covering one hex cell; only the inset hexagon is editable.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub fn create_hex(&self, layer_id: &str, flat_id: &str, hex: HexCoord, fill: HexFill) -> FlatResult<Flat> {
        let request = self.hex_request(layer_id, flat_id, hex);
        request.validate()?;
        let mut flat = self.new_flat(&request);
        let editable = self.apply_hex_mask(&mut flat, hex, fill.material());
        let flat = self.replace(flat)?;
        tracing::info!(flat = flat.id(), q = hex.q, r = hex.r, editable, "hex flat created");
        Ok(flat)
    }

    /// Hex flat whose levels follow the existing terrain.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn import_hex(&self, layer_id: &str, flat_id: &str, hex: HexCoord) -> FlatResult<Flat> {
        let request = self.hex_request(layer_id, flat_id, hex);
        request.validate()?;
        let mut flat = self.new_flat(&request);
        let cache = self.load_cache(&flat)?;
        for z in 0..flat.size_z() {
            for x in 0..flat.size_x() {
                let level = self.surface_level(&cache, flat.world_x(x), flat.world_z(z));
                flat.set_level(x, z, level);
            }
        }
        let editable = self.apply_hex_mask(&mut flat, hex, material::NOT_SET_MUTABLE);
        let flat = self.replace(flat)?;
        tracing::info!(flat = flat.id(), q = hex.q, r = hex.r, editable, "hex flat imported");
        Ok(flat)
    }
}
