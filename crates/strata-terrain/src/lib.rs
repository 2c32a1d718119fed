//! Layered 2D tile terrain: coherent noise, height-banded tile catalogs,
//! predicate-gated layers, and a pan/zoom layer stack.

mod catalog;
mod cell;
mod error;
mod layer;
mod noise_field;
mod predicate;
mod render;
mod settings;
mod terrain;
mod tile;

pub mod debug_viz;

pub use catalog::{CatalogError, TileCatalog, TileEntry, TileManifest};
pub use cell::CellKey;
pub use error::TerrainError;
pub use layer::{Layer, PlacedTile};
pub use noise_field::{NoiseField, PERMUTATION_SEED};
pub use predicate::{
    And, NoiseAbove, Not, OccupiedIn, Or, PlacementPredicate, PredicateExt, VacantIn,
    predicate_fn,
};
pub use render::{
    Camera2D, DrawCommand, Quad, QuadBatch, RenderRequest, RenderableHandle, TextureLoader,
    TileRenderer,
};
pub use settings::{SharedSettings, TerrainSettings};
pub use terrain::{Terrain, ZoomDirection};
pub use tile::{AtlasSelector, HeightRange, TextureRef, TileSpec, select_by_height};
