//! # Collaborator Seams
//!
//! The raster engine never talks to a database directly. Flats, chunks,
//! block classification and dirty-chunk notification sit behind the traits in
//! this module. The in-memory implementations back tests and embedded hosts.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::chunk::{Chunk, ChunkKey};
use crate::error::{FlatError, FlatResult};
use crate::flat::Flat;

/// Persistence of flat entities.
pub trait FlatRepository: Send + Sync {
    /// Finds a flat by its logical key.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::Storage`] on backend failure.
    fn find(&self, world_id: &str, layer_id: &str, flat_id: &str) -> FlatResult<Option<Flat>>;

    /// Finds a flat by storage id.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::Storage`] on backend failure.
    fn find_by_id(&self, id: &str) -> FlatResult<Option<Flat>>;

    /// Stores a flat, atomically replacing any flat with the same key.
    /// The stored copy starts at version 1.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::Storage`] on backend failure.
    fn create(&self, flat: Flat) -> FlatResult<Flat>;

    /// Replaces a stored flat if its version still matches, then bumps it.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::NotFound`] if missing and [`FlatError::Conflict`]
    /// if someone else updated it first.
    fn update(&self, flat: &Flat) -> FlatResult<Flat>;

    /// Deletes a flat. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::Storage`] on backend failure.
    fn delete(&self, id: &str) -> FlatResult<bool>;
}

/// Chunked block storage.
pub trait ChunkStore: Send + Sync {
    /// Loads a chunk of a layer.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::Storage`] or [`FlatError::Codec`] on failure.
    fn load_chunk(&self, layer: &str, key: ChunkKey) -> FlatResult<Option<Chunk>>;

    /// Saves a chunk of a layer.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::Storage`] or [`FlatError::Codec`] on failure.
    fn save_chunk(&self, layer: &str, chunk: &Chunk) -> FlatResult<()>;
}

/// Classification of a block type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockClassification {
    /// Counts as terrain ground.
    pub is_ground: bool,
    /// Renders as a plain cube.
    pub is_simple_cube: bool,
    /// Carries a modifier that changes its geometry.
    pub has_active_modifier: bool,
}

/// Block type lookup.
pub trait BlockClassifier: Send + Sync {
    /// Classifies a block type of a world.
    fn classify(&self, world_id: &str, type_id: &str) -> BlockClassification;
}

/// Receiver of "these chunks changed" events.
pub trait DirtyNotifier: Send + Sync {
    /// Fire-and-forget notification.
    fn mark_dirty(&self, world_id: &str, keys: &[ChunkKey], reason: &str);
}

/// In-memory [`FlatRepository`].
#[derive(Default)]
pub struct MemoryFlatRepository {
    flats: RwLock<HashMap<String, Flat>>,
}

impl MemoryFlatRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored flats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flats.read().len()
    }

    /// True if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flats.read().is_empty()
    }
}

impl FlatRepository for MemoryFlatRepository {
    fn find(&self, world_id: &str, layer_id: &str, flat_id: &str) -> FlatResult<Option<Flat>> {
        self.find_by_id(&Flat::compose_id(world_id, layer_id, flat_id))
    }

    fn find_by_id(&self, id: &str) -> FlatResult<Option<Flat>> {
        Ok(self.flats.read().get(id).cloned())
    }

    fn create(&self, mut flat: Flat) -> FlatResult<Flat> {
        flat.version = 1;
        self.flats.write().insert(flat.id().to_string(), flat.clone());
        Ok(flat)
    }

    fn update(&self, flat: &Flat) -> FlatResult<Flat> {
        let mut flats = self.flats.write();
        let stored = flats
            .get_mut(flat.id())
            .ok_or_else(|| FlatError::not_found("flat", flat.id()))?;
        if stored.version != flat.version {
            return Err(FlatError::Conflict {
                id: flat.id().to_string(),
                expected: flat.version,
                found: stored.version,
            });
        }
        let mut next = flat.clone();
        next.version += 1;
        *stored = next.clone();
        Ok(next)
    }

    fn delete(&self, id: &str) -> FlatResult<bool> {
        Ok(self.flats.write().remove(id).is_some())
    }
}

/// In-memory [`ChunkStore`] holding encoded chunk blobs.
#[derive(Default)]
pub struct MemoryChunkStore {
    blobs: RwLock<HashMap<(String, ChunkKey), Vec<u8>>>,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryChunkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `load_chunk` calls so far.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Number of `save_chunk` calls so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    /// Keys stored for a layer, sorted.
    #[must_use]
    pub fn keys(&self, layer: &str) -> Vec<ChunkKey> {
        let mut keys: Vec<ChunkKey> = self
            .blobs
            .read()
            .keys()
            .filter(|(l, _)| l == layer)
            .map(|(_, k)| *k)
            .collect();
        keys.sort();
        keys
    }
}

impl ChunkStore for MemoryChunkStore {
    fn load_chunk(&self, layer: &str, key: ChunkKey) -> FlatResult<Option<Chunk>> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        let blobs = self.blobs.read();
        blobs
            .get(&(layer.to_string(), key))
            .map(|bytes| Chunk::decode(bytes))
            .transpose()
    }

    fn save_chunk(&self, layer: &str, chunk: &Chunk) -> FlatResult<()> {
        self.saves.fetch_add(1, Ordering::Relaxed);
        let bytes = chunk.encode()?;
        self.blobs.write().insert((layer.to_string(), chunk.key), bytes);
        Ok(())
    }
}

/// Table-driven [`BlockClassifier`].
///
/// Types listed as ground are simple ground cubes; types listed as modified
/// carry an active modifier. Anything else is a plain, non-ground cube.
#[derive(Clone, Debug, Default)]
pub struct StaticBlockClassifier {
    ground: HashSet<String>,
    modified: HashSet<String>,
    shaped: HashSet<String>,
}

impl StaticBlockClassifier {
    /// Classifier with the built-in ground types.
    #[must_use]
    pub fn new() -> Self {
        Self::default().with_ground(["grass", "dirt", "stone", "sand", "snow", "bedrock"])
    }

    /// Adds ground types.
    #[must_use]
    pub fn with_ground<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ground.extend(types.into_iter().map(Into::into));
        self
    }

    /// Marks types as carrying an active modifier.
    #[must_use]
    pub fn with_modified<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modified.extend(types.into_iter().map(Into::into));
        self
    }

    /// Marks types as non-cube shapes.
    #[must_use]
    pub fn with_shaped<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shaped.extend(types.into_iter().map(Into::into));
        self
    }
}

impl BlockClassifier for StaticBlockClassifier {
    fn classify(&self, _world_id: &str, type_id: &str) -> BlockClassification {
        BlockClassification {
            is_ground: self.ground.contains(type_id),
            is_simple_cube: !self.shaped.contains(type_id),
            has_active_modifier: self.modified.contains(type_id),
        }
    }
}

/// One recorded dirty notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirtyEvent {
    /// World id.
    pub world_id: String,
    /// Changed chunks.
    pub keys: Vec<ChunkKey>,
    /// Why they changed.
    pub reason: String,
}

/// [`DirtyNotifier`] that remembers every call.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<DirtyEvent>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<DirtyEvent> {
        self.events.lock().clone()
    }
}

impl DirtyNotifier for RecordingNotifier {
    fn mark_dirty(&self, world_id: &str, keys: &[ChunkKey], reason: &str) {
        self.events.lock().push(DirtyEvent {
            world_id: world_id.to_string(),
            keys: keys.to_vec(),
            reason: reason.to_string(),
        });
    }
}

/// [`DirtyNotifier`] that drops every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl DirtyNotifier for NoopNotifier {
    fn mark_dirty(&self, world_id: &str, keys: &[ChunkKey], reason: &str) {
        tracing::trace!(world_id, count = keys.len(), reason, "dirty notification dropped");
    }
}
