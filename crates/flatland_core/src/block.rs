//! # Blocks
//!
//! A block is one cube in a chunk. Its look is described by a [`BlockDef`],
//! which round-trips through a compact string form:
//!
//! ```text
//! typeId[@s:status][@r:rx,ry][@l:level][@f:faceVisibility]
//! ```
//!
//! Several definitions can be joined with `|`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FlatError, FlatResult};

/// Face visibility bits.
pub mod face {
    /// Top face (+Y).
    pub const TOP: u8 = 1;
    /// Bottom face (-Y).
    pub const BOTTOM: u8 = 2;
    /// West face (-X).
    pub const WEST: u8 = 4;
    /// East face (+X).
    pub const EAST: u8 = 8;
    /// North face (-Z).
    pub const NORTH: u8 = 16;
    /// South face (+Z).
    pub const SOUTH: u8 = 32;
    /// All four side faces.
    pub const SIDES: u8 = WEST | EAST | NORTH | SOUTH;
    /// All six faces.
    pub const ALL: u8 = TOP | BOTTOM | SIDES;
    /// Visibility was set deliberately and must not be recomputed.
    pub const FIXED: u8 = 128;
}

/// Template describing which block to place and how.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockDef {
    /// Block type reference.
    pub type_id: String,
    /// Optional status (animation / variant slot).
    pub status: Option<u8>,
    /// Optional rotation around X and Y.
    pub rotation: Option<(i16, i16)>,
    /// Optional fluid/fill level.
    pub level: Option<u8>,
    /// Optional face visibility mask, see [`face`].
    pub face_visibility: Option<u8>,
}

impl BlockDef {
    /// Creates a plain definition for a block type.
    #[must_use]
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            status: None,
            rotation: None,
            level: None,
            face_visibility: None,
        }
    }

    /// Returns a copy with the face visibility set.
    #[must_use]
    pub fn with_faces(mut self, mask: u8) -> Self {
        self.face_visibility = Some(mask);
        self
    }

    /// True if nothing beyond the type id is set.
    #[must_use]
    pub fn is_plain(&self) -> bool {
        self.status.is_none() && self.rotation.is_none() && self.level.is_none()
    }

    /// True if the face mask carries the fixed flag.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.face_visibility.is_some_and(|f| f & face::FIXED != 0)
    }

    /// Parses a `|` separated list of definitions. Empty entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::InvalidArgument`] if any entry is malformed.
    pub fn parse_list(text: &str) -> FlatResult<Vec<Self>> {
        text.split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

fn parse_field<T: FromStr>(value: &str, field: &str, source: &str) -> FlatResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FlatError::invalid(format!("bad {field} '{value}' in block definition '{source}'")))
}

impl FromStr for BlockDef {
    type Err = FlatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('@');
        let type_id = parts.next().unwrap_or_default().trim();
        if type_id.is_empty() {
            return Err(FlatError::invalid(format!("block definition '{s}' has no type id")));
        }
        let mut def = Self::new(type_id);
        for part in parts {
            let (tag, value) = part
                .split_once(':')
                .ok_or_else(|| FlatError::invalid(format!("bad attribute '{part}' in '{s}'")))?;
            match tag.trim() {
                "s" => def.status = Some(parse_field(value, "status", s)?),
                "r" => {
                    let (rx, ry) = value
                        .split_once(',')
                        .ok_or_else(|| FlatError::invalid(format!("rotation needs rx,ry in '{s}'")))?;
                    def.rotation = Some((parse_field(rx, "rotation", s)?, parse_field(ry, "rotation", s)?));
                }
                "l" => def.level = Some(parse_field(value, "level", s)?),
                "f" => def.face_visibility = Some(parse_field(value, "face visibility", s)?),
                other => {
                    return Err(FlatError::invalid(format!("unknown attribute '{other}' in '{s}'")));
                }
            }
        }
        Ok(def)
    }
}

impl fmt::Display for BlockDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_id)?;
        if let Some(status) = self.status {
            write!(f, "@s:{status}")?;
        }
        if let Some((rx, ry)) = self.rotation {
            write!(f, "@r:{rx},{ry}")?;
        }
        if let Some(level) = self.level {
            write!(f, "@l:{level}")?;
        }
        if let Some(faces) = self.face_visibility {
            write!(f, "@f:{faces}")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for BlockDef {
    type Error = FlatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BlockDef> for String {
    fn from(value: BlockDef) -> Self {
        value.to_string()
    }
}

/// A placed block in world coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// World X.
    pub x: i32,
    /// World Y.
    pub y: i32,
    /// World Z.
    pub z: i32,
    /// What is placed here.
    pub def: BlockDef,
    /// Vertical nudges of the four top corners (NW, NE, SW, SE).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_offsets: Option<[f32; 4]>,
}

impl Block {
    /// Creates a block at world coordinates.
    #[must_use]
    pub fn new(x: i32, y: i32, z: i32, def: BlockDef) -> Self {
        Self {
            x,
            y,
            z,
            def,
            corner_offsets: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_definition() {
        let def: BlockDef = "grass@s:2@r:90,-45@l:3@f:129".parse().unwrap();
        assert_eq!(def.type_id, "grass");
        assert_eq!(def.status, Some(2));
        assert_eq!(def.rotation, Some((90, -45)));
        assert_eq!(def.level, Some(3));
        assert!(def.is_fixed());
        assert_eq!(def.to_string(), "grass@s:2@r:90,-45@l:3@f:129");
    }

    #[test]
    fn test_plain_definition_formats_bare() {
        let def = BlockDef::new("stone");
        assert!(def.is_plain());
        assert_eq!(def.to_string(), "stone");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("".parse::<BlockDef>().is_err());
        assert!("sand@x:1".parse::<BlockDef>().is_err());
        assert!("sand@r:1".parse::<BlockDef>().is_err());
        assert!("sand@s:abc".parse::<BlockDef>().is_err());
    }

    #[test]
    fn test_parse_list_skips_empty() {
        let defs = BlockDef::parse_list("flower| |leaves@s:1|").unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[1].status, Some(1));
    }
}
