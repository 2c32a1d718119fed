//! Tile definitions: name, texture reference, height band, and atlas sub-region.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogError;
use crate::render::TextureLoader;

/// Opaque key identifying a texture for the host's asset system.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureRef(pub String);

impl TextureRef {
    /// Create a texture reference from any string-like key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Display for TextureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sub-region of a texture sheet, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtlasSelector {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasSelector {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Closed interval of normalized heights, `0 <= lo <= hi <= 1`.
///
/// Both bounds are inclusive. Where two tiles share a boundary the earlier
/// one in catalog order wins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightRange {
    lo: f64,
    hi: f64,
}

impl HeightRange {
    /// Create a range.
    ///
    /// # Errors
    ///
    /// [`CatalogError::InvalidRange`] unless `0 <= lo <= hi <= 1`.
    pub fn new(lo: f64, hi: f64) -> Result<Self, CatalogError> {
        if !(0.0 <= lo && lo <= hi && hi <= 1.0) {
            return Err(CatalogError::InvalidRange { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    /// The whole `[0, 1]` interval.
    pub fn full() -> Self {
        Self { lo: 0.0, hi: 1.0 }
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    /// Returns `true` if `height` lies in `[lo, hi]`.
    pub fn contains(&self, height: f64) -> bool {
        self.lo <= height && height <= self.hi
    }
}

/// Immutable definition of one kind of tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TileSpec {
    name: String,
    texture: TextureRef,
    height_range: HeightRange,
    atlas: AtlasSelector,
}

impl TileSpec {
    pub fn new(
        name: impl Into<String>,
        texture: TextureRef,
        height_range: HeightRange,
        atlas: AtlasSelector,
    ) -> Self {
        Self {
            name: name.into(),
            texture,
            height_range,
            atlas,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn texture(&self) -> &TextureRef {
        &self.texture
    }

    pub fn height_range(&self) -> HeightRange {
        self.height_range
    }

    pub fn atlas(&self) -> AtlasSelector {
        self.atlas
    }

    /// Ask the host to load this tile's texture.
    pub fn load(&self, loader: &mut dyn TextureLoader) -> Result<(), CatalogError> {
        loader.load_texture(&self.texture)
    }

    /// Ask the host to release this tile's texture.
    pub fn unload(&self, loader: &mut dyn TextureLoader) {
        loader.unload_texture(&self.texture);
    }
}

/// First tile, in slice order, whose height range contains `height`.
pub fn select_by_height(height: f64, tiles: &[Arc<TileSpec>]) -> Option<&Arc<TileSpec>> {
    tiles.iter().find(|tile| tile.height_range.contains(height))
}
