//! # Pipeline Tests
//!
//! Create, manipulate and export flats end to end against the in-memory
//! collaborators.

use flatland_core::material::{GRASS, NOT_SET, NOT_SET_MUTABLE, STONE};
use flatland_core::{
    face, Block, ChunkKey, ChunkStore, Flat, FlatError, FlatRepository, HexCoord, MemoryChunkStore,
    MemoryFlatRepository, RecordingNotifier, StaticBlockClassifier, WorldConfig,
};
use flatland_procedural::{
    ExportOptions, FlatExporter, FlatFactory, FlatRequest, FlatService, HexFill, ManipulateRequest,
    ManipulatorRegistry, Params, EXPORT_REASON,
};

struct World {
    config: WorldConfig,
    repository: MemoryFlatRepository,
    chunks: MemoryChunkStore,
    classifier: StaticBlockClassifier,
    notifier: RecordingNotifier,
    registry: ManipulatorRegistry,
}

impl World {
    fn new() -> Self {
        Self {
            config: WorldConfig::default(),
            repository: MemoryFlatRepository::new(),
            chunks: MemoryChunkStore::new(),
            classifier: StaticBlockClassifier::new(),
            notifier: RecordingNotifier::new(),
            registry: ManipulatorRegistry::with_defaults(),
        }
    }

    fn factory(&self) -> FlatFactory<'_> {
        FlatFactory::new(&self.config, &self.repository, &self.chunks, &self.classifier)
    }

    fn service(&self) -> FlatService<'_> {
        FlatService::new(&self.registry, &self.repository)
    }

    fn exporter(&self) -> FlatExporter<'_> {
        FlatExporter::new(&self.config, &self.chunks, &self.classifier, &self.notifier)
    }

    /// Blocks of one world column, bottom to top.
    fn column(&self, layer: &str, x: i32, z: i32) -> Vec<Block> {
        let key = ChunkKey::from_world(x, z, self.config.chunk_size_i32());
        let mut blocks: Vec<Block> = self
            .chunks
            .load_chunk(layer, key)
            .unwrap()
            .map(|chunk| chunk.column(x, z).cloned().collect())
            .unwrap_or_default();
        blocks.sort_by_key(|b| b.y);
        blocks
    }
}

fn assert_contiguous(blocks: &[Block]) {
    for pair in blocks.windows(2) {
        assert_eq!(pair[1].y, pair[0].y + 1, "gap between {} and {}", pair[0].y, pair[1].y);
    }
}

#[test]
fn test_blank_flat_round_trip() {
    let world = World::new();
    let flat = world
        .factory()
        .create_blank(&FlatRequest::new("ground", "rt", 10, 10), 0)
        .unwrap();

    let request = ManipulateRequest::new(flat.id(), "flat")
        .with_params(Params::new().with("groundLevel", 80));
    world.service().manipulate(&request).unwrap();

    let flat = world.service().load(flat.id()).unwrap();
    for z in 0..10 {
        for x in 0..10 {
            assert_eq!(flat.level(x, z), 80);
            assert_eq!(flat.column(x, z), GRASS);
        }
    }

    let report = world.exporter().export(&flat, &ExportOptions::default()).unwrap();
    assert_eq!(report.columns, 100);
    assert_eq!(report.blocks_culled, 0);

    for z in 0..10 {
        for x in 0..10 {
            let blocks = world.column("ground", x, z);
            assert_contiguous(&blocks);
            let top = blocks.last().unwrap();
            assert_eq!((top.y, top.def.type_id.as_str()), (80, "grass"));
            assert!(blocks[..blocks.len() - 1].iter().all(|b| b.def.type_id == "dirt"));
            let on_edge = x == 0 || z == 0 || x == 9 || z == 9;
            if on_edge {
                assert_eq!(blocks.len(), 81, "edge column ({x},{z})");
            }
        }
    }
}

#[test]
fn test_fill_floor_leaves_no_gaps() {
    let world = World::new();
    let mut flat = Flat::new("main", "ground", "steps", 8, 8);
    for z in 0..8 {
        for x in 0..8 {
            flat.set_column(x, z, STONE);
            flat.set_level(x, z, (30 + 5 * x + 3 * z) as u8);
        }
    }
    world.exporter().export(&flat, &ExportOptions::default()).unwrap();

    for z in 1..7usize {
        for x in 1..7usize {
            let tall = world.column("ground", x as i32, z as i32);
            assert_contiguous(&tall);
            let bottom = tall.first().unwrap().y;
            for (nx, nz) in [(x - 1, z), (x + 1, z), (x, z - 1), (x, z + 1)] {
                let shorter = i32::from(flat.level(nx, nz));
                assert!(bottom <= shorter, "({x},{z}) starts at {bottom}, neighbor at {shorter}");
            }
        }
    }
}

#[test]
fn test_face_culling_drops_enclosed_blocks() {
    let world = World::new();
    let mut flat = Flat::new("main", "ground", "cull", 5, 5);
    for z in 0..5 {
        for x in 0..5 {
            flat.set_column(x, z, STONE);
            flat.set_level(x, z, 20);
        }
    }
    flat.set_level(2, 2, 22);
    let options = ExportOptions {
        optimize_faces: true,
        ..ExportOptions::default()
    };
    let report = world.exporter().export(&flat, &options).unwrap();
    assert_eq!(report.blocks_culled, 1);

    // y=20 of the raised column is enclosed on every side and not the top.
    let center = world.column("ground", 2, 2);
    let ys: Vec<i32> = center.iter().map(|b| b.y).collect();
    assert_eq!(ys, vec![21, 22]);
    assert_eq!(center[0].def.face_visibility, Some(face::SIDES));
    assert_eq!(center[1].def.face_visibility, Some(face::TOP | face::SIDES));

    let flat_neighbor = world.column("ground", 1, 1);
    assert_eq!(flat_neighbor.len(), 1);
    assert_eq!(flat_neighbor[0].def.face_visibility, Some(face::TOP));

    // Edge columns are open toward the unknown outside.
    let edge = world.column("ground", 0, 2);
    assert_eq!(edge.len(), 21);
    assert!(edge
        .iter()
        .all(|b| b.def.face_visibility.is_some_and(|f| f & face::WEST != 0)));
}

#[test]
fn test_export_loads_each_chunk_once() {
    let world = World::new();
    let mut flat = Flat::new("main", "ground", "bulk", 40, 40);
    for z in 0..40 {
        for x in 0..40 {
            flat.set_column(x, z, GRASS);
            flat.set_level(x, z, 12);
        }
    }

    let (loads, saves) = (world.chunks.load_count(), world.chunks.save_count());
    let report = world.exporter().export(&flat, &ExportOptions::default()).unwrap();

    // The one-column margin reaches chunk -1 on both axes: 4x4 chunks.
    assert_eq!(world.chunks.load_count() - loads, 16);
    assert_eq!(world.chunks.save_count() - saves, 9);
    assert_eq!(report.chunks.len(), 9);
    assert!(report.chunks.windows(2).all(|w| w[0] < w[1]));

    let events = world.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].reason, EXPORT_REASON);
    assert_eq!(events[0].world_id, "main");
    assert_eq!(events[0].keys, report.chunks);
}

#[test]
fn test_hex_flat_mask() {
    let world = World::new();
    let flat = world
        .factory()
        .create_hex("ground", "cell", HexCoord::new(0, 0), HexFill::Empty)
        .unwrap();
    assert_eq!((flat.size_x(), flat.size_z()), (100, 100));
    assert!(flat.unknown_protected);
    assert_eq!(flat.column(50, 50), NOT_SET_MUTABLE);
    assert_eq!(flat.column(0, 0), NOT_SET);
    assert_eq!(flat.column(99, 99), NOT_SET);

    let request = ManipulateRequest::new(flat.id(), "flat")
        .with_params(Params::new().with("groundLevel", 90));
    world.service().manipulate(&request).unwrap();
    let flat = world.service().load(flat.id()).unwrap();
    assert_eq!(flat.level(50, 50), 90);
    assert_eq!(flat.level(0, 0), 0);
    assert_eq!(flat.column(0, 0), NOT_SET);
}

#[test]
fn test_import_then_export_keeps_unclaimed_terrain() {
    let world = World::new();
    let mut chunk = flatland_core::Chunk::new(ChunkKey::new(0, 0));
    for x in 0..4 {
        for y in 0..=6 {
            chunk.push(Block::new(x, y, 0, flatland_core::BlockDef::new("stone")));
        }
    }
    world.chunks.save_chunk("ground", &chunk).unwrap();

    let flat = world
        .factory()
        .import(&FlatRequest::new("ground", "imp", 4, 1))
        .unwrap();
    assert!((0..4).all(|x| flat.level(x, 0) == 6));
    assert!((0..4).all(|x| flat.column(x, 0) == NOT_SET));

    world.exporter().export(&flat, &ExportOptions::default()).unwrap();
    let blocks = world.column("ground", 1, 0);
    assert_eq!(blocks.len(), 7);
    assert_eq!(blocks.last().map(|b| b.y), Some(6));
}

#[test]
fn test_stale_flat_update_conflicts() {
    let world = World::new();
    let flat = world
        .factory()
        .create_blank(&FlatRequest::new("ground", "race", 6, 6), 10)
        .unwrap();
    let stale = world.service().load(flat.id()).unwrap();

    world
        .service()
        .manipulate(&ManipulateRequest::new(flat.id(), "soften"))
        .unwrap();

    let err = world.repository.update(&stale).unwrap_err();
    assert!(matches!(err, FlatError::Conflict { .. }));
    let stored = world.service().load(flat.id()).unwrap();
    assert_eq!(stored.version, 2);
}
