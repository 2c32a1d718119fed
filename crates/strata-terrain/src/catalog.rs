//! Tile catalog: ordered tile definitions with name lookup and RON manifests.
//!
//! Catalog order is significant. Height lookup scans in registration order
//! and the first matching tile wins.

use std::path::Path;
use std::sync::Arc;

use hashbrown::HashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::render::TextureLoader;
use crate::tile::{AtlasSelector, HeightRange, TextureRef, TileSpec, select_by_height};

/// Errors returned while building or loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A tile with this name is already registered.
    #[error("duplicate tile name: {0}")]
    DuplicateName(String),

    /// A height range is not ordered inside `[0, 1]`.
    #[error("invalid height range [{lo}, {hi}]")]
    InvalidRange {
        /// Lower bound as given.
        lo: f64,
        /// Upper bound as given.
        hi: f64,
    },

    /// I/O error reading a manifest file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// RON deserialization error.
    #[error("ron parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// The host failed to load a texture.
    #[error("failed to load texture {texture}: {reason}")]
    TextureLoad {
        /// Texture that failed.
        texture: TextureRef,
        /// Host-supplied description.
        reason: String,
    },
}

/// Top-level RON manifest for a tile catalog.
#[derive(Debug, Deserialize)]
pub struct TileManifest {
    /// Tile entries in lookup order.
    pub tiles: Vec<TileEntry>,
}

/// A single tile entry in the RON manifest.
#[derive(Debug, Deserialize)]
pub struct TileEntry {
    /// Unique tile name.
    pub name: String,
    /// Texture key passed to the host.
    pub texture: String,
    /// Inclusive normalized height band `(lo, hi)`.
    pub range: (f64, f64),
    /// Atlas sub-region `(x, y, width, height)`.
    #[serde(default)]
    pub atlas: (u32, u32, u32, u32),
}

/// Ordered, name-indexed set of [`TileSpec`]s.
///
/// Catalogs are immutable once shared; layers hold them as `Arc<TileCatalog>`.
#[derive(Debug, Default)]
pub struct TileCatalog {
    tiles: Vec<Arc<TileSpec>>,
    name_to_index: HashMap<String, usize>,
}

impl TileCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from tiles in lookup order.
    pub fn from_tiles(tiles: impl IntoIterator<Item = TileSpec>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for tile in tiles {
            catalog.register(tile)?;
        }
        Ok(catalog)
    }

    /// Parse a catalog from RON manifest text.
    pub fn from_ron_str(source: &str) -> Result<Self, CatalogError> {
        let manifest: TileManifest = ron::from_str(source)?;
        let mut catalog = Self::new();
        for entry in manifest.tiles {
            let (lo, hi) = entry.range;
            let (x, y, w, h) = entry.atlas;
            catalog.register(TileSpec::new(
                entry.name,
                TextureRef::new(entry.texture),
                HeightRange::new(lo, hi)?,
                AtlasSelector::new(x, y, w, h),
            ))?;
        }
        Ok(catalog)
    }

    /// Read and parse a RON manifest file.
    pub fn load_manifest(path: &Path) -> Result<Self, CatalogError> {
        let source = std::fs::read_to_string(path)?;
        let catalog = Self::from_ron_str(&source)?;
        tracing::debug!(path = %path.display(), tiles = catalog.len(), "loaded tile manifest");
        Ok(catalog)
    }

    /// Append a tile, returning the shared definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateName`] if a tile with the same name exists.
    pub fn register(&mut self, tile: TileSpec) -> Result<Arc<TileSpec>, CatalogError> {
        if self.name_to_index.contains_key(tile.name()) {
            return Err(CatalogError::DuplicateName(tile.name().to_string()));
        }
        let tile = Arc::new(tile);
        self.name_to_index
            .insert(tile.name().to_string(), self.tiles.len());
        self.tiles.push(Arc::clone(&tile));
        Ok(tile)
    }

    /// Looks up a tile by name.
    pub fn get(&self, name: &str) -> Option<&Arc<TileSpec>> {
        self.name_to_index.get(name).map(|&index| &self.tiles[index])
    }

    /// First tile, in catalog order, whose range contains `height`.
    pub fn select_by_height(&self, height: f64) -> Option<&Arc<TileSpec>> {
        select_by_height(height, &self.tiles)
    }

    /// All tiles in lookup order.
    pub fn tiles(&self) -> &[Arc<TileSpec>] {
        &self.tiles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TileSpec>> {
        self.tiles.iter()
    }

    /// Returns the number of registered tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Returns `true` if no tiles are registered.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Load every tile's texture, stopping at the first failure.
    pub fn load_all(&self, loader: &mut dyn TextureLoader) -> Result<(), CatalogError> {
        for tile in &self.tiles {
            tile.load(loader)?;
        }
        Ok(())
    }

    /// Release every tile's texture.
    pub fn unload_all(&self, loader: &mut dyn TextureLoader) {
        for tile in &self.tiles {
            tile.unload(loader);
        }
    }
}
