//! # Export
//!
//! Expands a flat back into block columns inside its chunk layer.
//!
//! ## Defined Columns
//!
//! Material `1..=254`. The column is cleared and rebuilt from the top:
//! extra blocks above the level, the material's block at the level, its
//! "below" block down to the fill floor, and ocean fill up to the ocean
//! level for materials that have one.
//!
//! ## Undefined Columns
//!
//! Material `0` or `255`. The highest ground block is kept as a cap
//! (bedrock is synthesized if there is none) and everything below it is
//! removed. If the fill floor lies below the cap, fixed skirt blocks are
//! added that only show the face toward the flat's edge.
//!
//! ## Fill Floor
//!
//! The lowest level among the 8 neighbors, capped at the column's own level.
//! Defined in-flat neighbors use their raster level; undefined ones (material
//! `0` or `255`) are skipped. Neighbors outside the flat use the highest block
//! in the loaded chunk data, or 0 without data.
//!
//! ## Optimizations
//!
//! Only for plain, simple-cube, unmodified ground blocks:
//!
//! - corner smoothing nudges the four top corners of the surface block
//! - face culling keeps only faces next to lower neighbors; blocks with no
//!   visible face are not written

use flatland_core::material;
use flatland_core::{
    face, Block, BlockClassifier, BlockDef, ChunkKey, ChunkStore, DirtyNotifier, Flat, FlatResult,
    WorldConfig,
};

use crate::chunk_cache::ChunkCache;
use crate::region::Region;

/// Block type that always resolves to the world's water block.
const WATER_TYPE: &str = "water";

/// Reason reported to the dirty notifier.
pub const EXPORT_REASON: &str = "flat-export";

/// Export switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Nudge top corners toward neighbor heights.
    pub smooth_corners: bool,
    /// Compute face masks and drop fully hidden blocks.
    pub optimize_faces: bool,
    /// Columns to export; the whole flat when `None`.
    pub region: Option<Region>,
}

/// What an export did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Columns processed.
    pub columns: usize,
    /// Blocks written.
    pub blocks_written: usize,
    /// Blocks dropped by face culling.
    pub blocks_culled: usize,
    /// Chunks saved, sorted.
    pub chunks: Vec<ChunkKey>,
}

/// Raster to block converter.
pub struct FlatExporter<'a> {
    config: &'a WorldConfig,
    chunks: &'a dyn ChunkStore,
    classifier: &'a dyn BlockClassifier,
    notifier: &'a dyn DirtyNotifier,
}

/// Orthogonal neighbor offsets with the face each one exposes.
const SIDES: [(i32, i32, u8); 4] = [
    (-1, 0, face::WEST),
    (1, 0, face::EAST),
    (0, -1, face::NORTH),
    (0, 1, face::SOUTH),
];

/// Corner neighbor triples (side, side, diagonal) for NW, NE, SW, SE.
const CORNERS: [[(i32, i32); 3]; 4] = [
    [(-1, 0), (0, -1), (-1, -1)],
    [(1, 0), (0, -1), (1, -1)],
    [(-1, 0), (0, 1), (-1, 1)],
    [(1, 0), (0, 1), (1, 1)],
];

/// Vertical nudge of one top corner from the level differences to its three
/// neighbors.
#[must_use]
pub fn corner_offset(diffs: [i32; 3]) -> f32 {
    let higher = diffs.iter().any(|&d| d > 0);
    let lower = diffs.iter().any(|&d| d < 0);
    if diffs.iter().all(|&d| d >= 2) {
        1.0
    } else if diffs.iter().all(|&d| d <= -2) {
        -1.0
    } else if higher && lower {
        0.0
    } else if lower {
        -0.5
    } else {
        0.5
    }
}

impl<'a> FlatExporter<'a> {
    /// Binds the exporter to its collaborators.
    #[must_use]
    pub fn new(
        config: &'a WorldConfig,
        chunks: &'a dyn ChunkStore,
        classifier: &'a dyn BlockClassifier,
        notifier: &'a dyn DirtyNotifier,
    ) -> Self {
        Self {
            config,
            chunks,
            classifier,
            notifier,
        }
    }

    /// Writes the flat's columns into its chunk layer.
    ///
    /// # Errors
    ///
    /// Returns [`flatland_core::FlatError::InvalidRegion`] for a region outside
    /// the flat and propagates storage failures. Nothing is saved when
    /// loading fails.
    pub fn export(&self, flat: &Flat, options: &ExportOptions) -> FlatResult<ExportReport> {
        let region = options.region.unwrap_or_else(|| Region::whole(flat));
        region.validate(flat)?;

        let mut cache = ChunkCache::load(
            self.chunks,
            flat.layer_id(),
            self.config.chunk_size_i32(),
            (flat.mount_x + region.x - 1, flat.mount_z + region.z - 1),
            (flat.mount_x + region.max_x() + 1, flat.mount_z + region.max_z() + 1),
        )?;

        let mut report = ExportReport::default();
        for (x, z) in region.points() {
            let id = flat.column(x as usize, z as usize);
            if material::is_defined(id) {
                self.export_defined(flat, &mut cache, x, z, options, &mut report)?;
            } else {
                self.export_undefined(flat, &mut cache, x, z, &mut report)?;
            }
            report.columns += 1;
        }

        report.chunks = cache.flush()?;
        self.notifier.mark_dirty(flat.world_id(), &report.chunks, EXPORT_REASON);
        tracing::info!(
            flat = flat.id(),
            columns = report.columns,
            written = report.blocks_written,
            culled = report.blocks_culled,
            chunks = report.chunks.len(),
            "flat exported"
        );
        Ok(report)
    }

    /// Level of a grid neighbor: the raster inside the flat, chunk data
    /// outside. `None` when nothing is known.
    fn neighbor_level(flat: &Flat, cache: &ChunkCache<'_>, x: i32, z: i32) -> Option<i32> {
        if flat.contains(x, z) {
            Some(i32::from(flat.level(x as usize, z as usize)))
        } else {
            cache
                .highest(flat.mount_x + x, flat.mount_z + z)
                .map(|b| b.y)
        }
    }

    fn fill_floor(flat: &Flat, cache: &ChunkCache<'_>, x: i32, z: i32, own: i32) -> i32 {
        let mut floor = own;
        for dz in -1..=1 {
            for dx in -1..=1 {
                let (nx, nz) = (x + dx, z + dz);
                if (dx == 0 && dz == 0)
                    || (flat.contains(nx, nz) && !material::is_defined(flat.column(nx as usize, nz as usize)))
                {
                    continue;
                }
                let level = Self::neighbor_level(flat, cache, nx, nz).unwrap_or(0);
                floor = floor.min(level);
            }
        }
        floor.max(0)
    }

    fn optimizable(&self, world: &str, def: &BlockDef) -> bool {
        if !def.is_plain() || def.is_fixed() {
            return false;
        }
        let class = self.classifier.classify(world, &def.type_id);
        class.is_ground && class.is_simple_cube && !class.has_active_modifier
    }

    /// Any water definition becomes the world's water block.
    fn substitute_water(&self, def: &BlockDef) -> BlockDef {
        if def.type_id == WATER_TYPE || def.type_id == self.config.water_block.type_id {
            self.config.water_block.clone()
        } else {
            def.clone()
        }
    }

    /// Resolves the block pair of a material, substituting the world's water
    /// block and falling back when the material is unknown.
    fn resolve(&self, flat: &Flat, id: u8) -> (BlockDef, BlockDef) {
        if let Some(definition) = flat.material(id) {
            (
                self.substitute_water(&definition.block_def),
                self.substitute_water(definition.below()),
            )
        } else {
            tracing::warn!(flat = flat.id(), material = id, "no material definition, using fallback block");
            let fallback = self.config.fallback_block.clone();
            (fallback.clone(), fallback)
        }
    }

    fn export_defined(
        &self,
        flat: &Flat,
        cache: &mut ChunkCache<'_>,
        x: i32,
        z: i32,
        options: &ExportOptions,
        report: &mut ExportReport,
    ) -> FlatResult<()> {
        let (ux, uz) = (x as usize, z as usize);
        let (wx, wz) = (flat.world_x(ux), flat.world_z(uz));
        let id = flat.column(ux, uz);
        let level = i32::from(flat.level(ux, uz));
        let floor = Self::fill_floor(flat, cache, x, z, level);
        let (top_def, below_def) = self.resolve(flat, id);
        let has_ocean = flat.material(id).is_some_and(|m| m.has_ocean);
        let ocean = i32::from(flat.ocean_level);
        let ocean_def = self.substitute_water(&flat.ocean_block);
        let extras = flat.extra_blocks(ux, uz);
        let world = flat.world_id();

        let mut column: Vec<Block> = Vec::new();
        for y in (floor..=255).rev() {
            let def = if let Some(extra) = extras.iter().find(|e| e.y == y) {
                extra.def.clone()
            } else if y > level {
                if has_ocean && y <= ocean {
                    ocean_def.clone()
                } else {
                    continue;
                }
            } else if y == level {
                top_def.clone()
            } else {
                below_def.clone()
            };
            column.push(Block::new(wx, y, wz, def));
        }
        let top_y = column.first().map_or(level, |b| b.y);

        if options.smooth_corners {
            if let Some(surface) = column.iter_mut().find(|b| b.y == level) {
                if self.optimizable(world, &surface.def) {
                    let mut offsets = [0.0f32; 4];
                    for (slot, corner) in offsets.iter_mut().zip(CORNERS) {
                        let diffs = corner.map(|(dx, dz)| {
                            Self::neighbor_level(flat, cache, x + dx, z + dz).unwrap_or(level) - level
                        });
                        *slot = corner_offset(diffs);
                    }
                    surface.corner_offsets = Some(offsets);
                }
            }
        }

        let sides = SIDES.map(|(dx, dz, bit)| {
            (Self::neighbor_level(flat, cache, x + dx, z + dz).unwrap_or(-1), bit)
        });

        let chunk = cache.chunk_mut(wx, wz)?;
        chunk.clear_column(wx, wz);
        for mut block in column {
            if options.optimize_faces && self.optimizable(world, &block.def) {
                let mut mask = 0;
                if block.y == top_y {
                    mask |= face::TOP;
                }
                for (neighbor, bit) in sides {
                    if neighbor < block.y {
                        mask |= bit;
                    }
                }
                if mask == 0 {
                    report.blocks_culled += 1;
                    continue;
                }
                block.def = block.def.with_faces(mask);
            }
            chunk.push(block);
            report.blocks_written += 1;
        }
        Ok(())
    }

    /// The only face a skirt block shows: toward the flat edge it sits on,
    /// west, east, south, north in that order, or every side off the edge.
    fn skirt_faces(flat: &Flat, x: i32, z: i32) -> u8 {
        let (max_x, max_z) = (flat.size_x() as i32 - 1, flat.size_z() as i32 - 1);
        let side = if x == 0 {
            face::WEST
        } else if x == max_x {
            face::EAST
        } else if z == max_z {
            face::SOUTH
        } else if z == 0 {
            face::NORTH
        } else {
            face::SIDES
        };
        side | face::FIXED
    }

    fn export_undefined(
        &self,
        flat: &Flat,
        cache: &mut ChunkCache<'_>,
        x: i32,
        z: i32,
        report: &mut ExportReport,
    ) -> FlatResult<()> {
        let (wx, wz) = (flat.world_x(x as usize), flat.world_z(z as usize));
        let world = flat.world_id();
        let cap = cache
            .highest_where(wx, wz, |b| self.classifier.classify(world, &b.def.type_id).is_ground)
            .cloned();
        let cap_y = cap.as_ref().map_or(0, |b| b.y);
        let floor = Self::fill_floor(flat, cache, x, z, cap_y);
        let faces = Self::skirt_faces(flat, x, z);

        let chunk = cache.chunk_mut(wx, wz)?;
        let cap = match cap {
            Some(block) => block,
            None => {
                let bedrock = Block::new(wx, 0, wz, self.config.bedrock_block.clone());
                chunk.clear_column_below(wx, wz, 1);
                chunk.push(bedrock.clone());
                report.blocks_written += 1;
                bedrock
            }
        };
        chunk.clear_column_below(wx, wz, cap.y);
        for y in floor..cap.y {
            chunk.push(Block::new(wx, y, wz, cap.def.clone().with_faces(faces)));
            report.blocks_written += 1;
        }
        Ok(())
    }
}
