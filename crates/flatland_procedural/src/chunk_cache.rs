//! # Chunk Cache
//!
//! Bulk-loads every chunk a per-column loop will touch before the loop runs,
//! serves reads and writes from memory, and saves each modified chunk once.
//!
//! Storage round-trips are bounded by the number of distinct chunks in the
//! bounding box, independent of the number of columns.

use std::collections::{BTreeSet, HashMap, HashSet};

use flatland_core::{Block, Chunk, ChunkKey, ChunkStore, FlatResult};

/// In-memory view of the chunks covering one world rectangle.
pub struct ChunkCache<'s> {
    store: &'s dyn ChunkStore,
    layer: String,
    chunk_size: i32,
    chunks: HashMap<ChunkKey, Chunk>,
    requested: HashSet<ChunkKey>,
    dirty: BTreeSet<ChunkKey>,
}

impl<'s> ChunkCache<'s> {
    /// Loads all chunks covering the inclusive world rectangle.
    ///
    /// Missing chunks are remembered as absent and not asked for again.
    ///
    /// # Errors
    ///
    /// Propagates storage and codec failures.
    pub fn load(
        store: &'s dyn ChunkStore,
        layer: &str,
        chunk_size: i32,
        (x0, z0): (i32, i32),
        (x1, z1): (i32, i32),
    ) -> FlatResult<Self> {
        let keys = ChunkKey::covering(x0, z0, x1, z1, chunk_size);
        let mut chunks = HashMap::with_capacity(keys.len());
        for &key in &keys {
            if let Some(chunk) = store.load_chunk(layer, key)? {
                chunks.insert(key, chunk);
            }
        }
        tracing::debug!(
            layer,
            requested = keys.len(),
            present = chunks.len(),
            "chunks bulk-loaded"
        );
        Ok(Self {
            store,
            layer: layer.to_string(),
            chunk_size,
            chunks,
            requested: keys.into_iter().collect(),
            dirty: BTreeSet::new(),
        })
    }

    /// Chunk owning a world column.
    #[must_use]
    pub fn key_of(&self, x: i32, z: i32) -> ChunkKey {
        ChunkKey::from_world(x, z, self.chunk_size)
    }

    /// Chunk owning a world column, if it exists and was loaded.
    #[must_use]
    pub fn chunk(&self, x: i32, z: i32) -> Option<&Chunk> {
        self.chunks.get(&self.key_of(x, z))
    }

    /// Highest block of a world column.
    #[must_use]
    pub fn highest(&self, x: i32, z: i32) -> Option<&Block> {
        self.chunk(x, z).and_then(|c| c.highest(x, z))
    }

    /// Highest block of a world column satisfying `pred`.
    pub fn highest_where<F>(&self, x: i32, z: i32, pred: F) -> Option<&Block>
    where
        F: FnMut(&Block) -> bool,
    {
        self.chunk(x, z).and_then(|c| c.highest_where(x, z, pred))
    }

    /// Mutable chunk owning a world column; created empty if absent.
    /// The chunk is marked for saving.
    ///
    /// # Errors
    ///
    /// Propagates storage failures when a chunk outside the preloaded
    /// rectangle has to be fetched.
    pub fn chunk_mut(&mut self, x: i32, z: i32) -> FlatResult<&mut Chunk> {
        let key = self.key_of(x, z);
        if self.requested.insert(key) {
            tracing::debug!(%key, "chunk outside the preloaded area, loading on demand");
            if let Some(chunk) = self.store.load_chunk(&self.layer, key)? {
                self.chunks.insert(key, chunk);
            }
        }
        self.dirty.insert(key);
        Ok(self.chunks.entry(key).or_insert_with(|| Chunk::new(key)))
    }

    /// Keys of chunks modified so far, sorted.
    #[must_use]
    pub fn dirty_keys(&self) -> Vec<ChunkKey> {
        self.dirty.iter().copied().collect()
    }

    /// Saves every modified chunk exactly once and returns their keys.
    ///
    /// # Errors
    ///
    /// Propagates the first storage failure.
    pub fn flush(self) -> FlatResult<Vec<ChunkKey>> {
        let mut saved = Vec::with_capacity(self.dirty.len());
        for key in self.dirty {
            if let Some(chunk) = self.chunks.get(&key) {
                self.store.save_chunk(&self.layer, chunk)?;
                saved.push(key);
            }
        }
        tracing::debug!(layer = %self.layer, saved = saved.len(), "chunks flushed");
        Ok(saved)
    }
}
