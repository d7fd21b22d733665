//! # Chunk Model
//!
//! World blocks are grouped into square columns of `chunk_size x chunk_size`.
//! A chunk keeps an unordered list of blocks; the raster pipeline only ever
//! works on whole (x, z) columns inside it.
//!
//! ## Storage
//!
//! Chunks are persisted as LZ4-compressed JSON blobs.

use std::fmt;

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::{FlatError, FlatResult};

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey {
    /// X coordinate (in chunks, not blocks).
    pub cx: i32,
    /// Z coordinate (in chunks, not blocks).
    pub cz: i32,
}

impl ChunkKey {
    /// Creates a new chunk key.
    #[inline]
    #[must_use]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    /// Converts world block coordinates to the owning chunk.
    #[inline]
    #[must_use]
    pub const fn from_world(x: i32, z: i32, chunk_size: i32) -> Self {
        Self {
            cx: x.div_euclid(chunk_size),
            cz: z.div_euclid(chunk_size),
        }
    }

    /// All chunk keys covering the inclusive world rectangle.
    #[must_use]
    pub fn covering(x0: i32, z0: i32, x1: i32, z1: i32, chunk_size: i32) -> Vec<Self> {
        let from = Self::from_world(x0.min(x1), z0.min(z1), chunk_size);
        let to = Self::from_world(x0.max(x1), z0.max(z1), chunk_size);
        let mut keys = Vec::new();
        for cz in from.cz..=to.cz {
            for cx in from.cx..=to.cx {
                keys.push(Self::new(cx, cz));
            }
        }
        keys
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cx, self.cz)
    }
}

/// A chunk of world data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk position in the world.
    pub key: ChunkKey,
    /// Unordered block list.
    pub blocks: Vec<Block>,
}

impl Chunk {
    /// Creates an empty chunk.
    #[must_use]
    pub fn new(key: ChunkKey) -> Self {
        Self {
            key,
            blocks: Vec::new(),
        }
    }

    /// Iterates the blocks of one world column.
    pub fn column(&self, x: i32, z: i32) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| b.x == x && b.z == z)
    }

    /// Highest block of a column.
    #[must_use]
    pub fn highest(&self, x: i32, z: i32) -> Option<&Block> {
        self.column(x, z).max_by_key(|b| b.y)
    }

    /// Highest block of a column satisfying `pred`.
    pub fn highest_where<F>(&self, x: i32, z: i32, mut pred: F) -> Option<&Block>
    where
        F: FnMut(&Block) -> bool,
    {
        self.column(x, z).filter(|b| pred(b)).max_by_key(|b| b.y)
    }

    /// Removes every block of a column and returns how many were removed.
    pub fn clear_column(&mut self, x: i32, z: i32) -> usize {
        let before = self.blocks.len();
        self.blocks.retain(|b| b.x != x || b.z != z);
        before - self.blocks.len()
    }

    /// Removes the blocks of a column strictly below `y`.
    pub fn clear_column_below(&mut self, x: i32, z: i32, y: i32) -> usize {
        let before = self.blocks.len();
        self.blocks.retain(|b| b.x != x || b.z != z || b.y >= y);
        before - self.blocks.len()
    }

    /// Appends a block.
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Encodes the chunk into a compressed blob.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::Codec`] if serialization fails.
    pub fn encode(&self) -> FlatResult<Vec<u8>> {
        let json = serde_json::to_vec(self).map_err(|e| FlatError::Codec(e.to_string()))?;
        Ok(compress_prepend_size(&json))
    }

    /// Decodes a blob produced by [`Chunk::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::Codec`] if decompression or parsing fails.
    pub fn decode(bytes: &[u8]) -> FlatResult<Self> {
        let json = decompress_size_prepended(bytes).map_err(|e| FlatError::Codec(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| FlatError::Codec(e.to_string()))
    }
}
