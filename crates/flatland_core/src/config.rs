//! # World Configuration
//!
//! Per-world settings the raster engine needs, loaded once from TOML:
//!
//! ```toml
//! world_id = "main"
//! ocean_level = 62
//! ocean_block = "water@l:8"
//! hex_grid_diameter = 400
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::block::BlockDef;
use crate::error::{FlatError, FlatResult};
use crate::hex::HexGrid;

/// World-level settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World identifier.
    pub world_id: String,
    /// Ocean surface height copied into new flats.
    pub ocean_level: u8,
    /// Block used for ocean fill.
    pub ocean_block: BlockDef,
    /// Block substituted whenever a material resolves to water.
    pub water_block: BlockDef,
    /// Block synthesized when a column has no ground at all.
    pub bedrock_block: BlockDef,
    /// Block used when a material cannot be resolved.
    pub fallback_block: BlockDef,
    /// Edge length of a chunk in blocks.
    pub chunk_size: u32,
    /// Corner-to-corner diameter of hex grid cells.
    pub hex_grid_diameter: u32,
    /// Width of the protected skirt kept inside each hex cell.
    pub hex_skirt: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_id: "main".to_string(),
            ocean_level: 62,
            ocean_block: BlockDef::new("water"),
            water_block: BlockDef::new("water"),
            bedrock_block: BlockDef::new("bedrock"),
            fallback_block: BlockDef::new("stone"),
            chunk_size: 16,
            hex_grid_diameter: 100,
            hex_skirt: 10,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::Config`] on malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> FlatResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| FlatError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> FlatResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| FlatError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::Config`] describing the first bad value.
    pub fn validate(&self) -> FlatResult<()> {
        if self.world_id.trim().is_empty() {
            return Err(FlatError::Config("world_id must not be blank".into()));
        }
        if self.chunk_size == 0 {
            return Err(FlatError::Config("chunk_size must be positive".into()));
        }
        if self.hex_grid_diameter <= self.hex_skirt * 2 {
            return Err(FlatError::Config(format!(
                "hex_grid_diameter {} must exceed twice the skirt {}",
                self.hex_grid_diameter, self.hex_skirt
            )));
        }
        Ok(())
    }

    /// Chunk edge length as a signed world distance.
    #[must_use]
    pub fn chunk_size_i32(&self) -> i32 {
        i32::try_from(self.chunk_size).unwrap_or(i32::MAX)
    }

    /// Hex grid geometry.
    #[must_use]
    pub fn hex_grid(&self) -> HexGrid {
        HexGrid::new(f64::from(self.hex_grid_diameter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = WorldConfig::from_toml_str(
            r#"
            world_id = "alpha"
            ocean_level = 40
            ocean_block = "water@l:8"
            "#,
        )
        .unwrap();
        assert_eq!(config.world_id, "alpha");
        assert_eq!(config.ocean_level, 40);
        assert_eq!(config.ocean_block.level, Some(8));
        assert_eq!(config.chunk_size, 16);
        assert_eq!(config.hex_skirt, 10);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(WorldConfig::from_toml_str("chunk_size = 0").is_err());
        assert!(WorldConfig::from_toml_str("hex_grid_diameter = 20").is_err());
        assert!(WorldConfig::from_toml_str("ocean_block = \"\"").is_err());
        assert!(WorldConfig::from_toml_str("ocean_level = 300").is_err());
    }
}
