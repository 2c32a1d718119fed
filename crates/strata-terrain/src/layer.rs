//! A single generated tile layer over a rectangular grid.
//!
//! Generation rebuilds the whole placement map: each cell is first checked
//! against the layer's predicates, then assigned the first catalog tile whose
//! height band contains the cell's noise height. Manual edits made between
//! generations are lost on the next pass.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use glam::DVec2;
use hashbrown::HashMap;

use crate::catalog::TileCatalog;
use crate::cell::{CellKey, GRID_EPSILON};
use crate::error::TerrainError;
use crate::noise_field::NoiseField;
use crate::predicate::PlacementPredicate;
use crate::render::{Camera2D, RenderRequest, RenderableHandle, TileRenderer};
use crate::settings::{SharedSettings, TerrainSettings};


/// A tile recorded in a layer's placement map.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedTile {
    pub tile_name: String,
    /// World-space center the renderable was produced for.
    pub center: DVec2,
    /// `None` for manual entries whose name is not in the layer's catalog.
    pub renderable: Option<RenderableHandle>,
}

/// One independently generated pass of tile placement.
pub struct Layer {
    name: String,
    catalog: Arc<TileCatalog>,
    world_size: DVec2,
    cell_scale: DVec2,
    predicates: Vec<Rc<dyn PlacementPredicate>>,
    settings: SharedSettings,
    offset: DVec2,
    placed: HashMap<CellKey, PlacedTile>,
}

impl Layer {
    /// Create an empty (ungenerated) layer with no predicates and zero offset.
    pub fn new(
        name: impl Into<String>,
        catalog: Arc<TileCatalog>,
        world_size: DVec2,
        cell_scale: DVec2,
        settings: SharedSettings,
    ) -> Self {
        Self {
            name: name.into(),
            catalog,
            world_size,
            cell_scale,
            predicates: Vec::new(),
            settings,
            offset: DVec2::ZERO,
            placed: HashMap::new(),
        }
    }

    /// Builder form of [`add_predicate`](Self::add_predicate).
    pub fn with_predicate(mut self, predicate: impl PlacementPredicate + 'static) -> Self {
        self.add_predicate(predicate);
        self
    }

    /// Append a predicate. Predicates run in insertion order.
    pub fn add_predicate(&mut self, predicate: impl PlacementPredicate + 'static) {
        self.predicates.push(Rc::new(predicate));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn catalog(&self) -> &Arc<TileCatalog> {
        &self.catalog
    }

    pub fn world_size(&self) -> DVec2 {
        self.world_size
    }

    pub fn cell_scale(&self) -> DVec2 {
        self.cell_scale
    }

    /// Change the cell step. Takes effect on the next generation.
    pub fn set_cell_scale(&mut self, cell_scale: DVec2) {
        self.cell_scale = cell_scale;
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Current pan offset.
    pub fn offset(&self) -> DVec2 {
        self.offset
    }

    /// Set the pan offset. Takes effect on the next generation.
    pub fn set_offset(&mut self, offset: DVec2) {
        self.offset = offset;
    }

    /// Key of the cell containing the world-space `position`, relative to
    /// the current offset.
    pub fn cell_key(&self, position: DVec2) -> CellKey {
        CellKey::from_position(position - self.offset, self.cell_scale)
    }

    /// World-space center of the cell `key` under the current offset.
    pub fn cell_center(&self, key: CellKey) -> DVec2 {
        self.offset + key.center(self.cell_scale)
    }

    /// Tile placed in the cell containing `position`, if any.
    pub fn tile_at(&self, position: DVec2) -> Option<&PlacedTile> {
        self.placed.get(&self.cell_key(position))
    }

    /// Name of the tile in the cell containing `position`, if any.
    pub fn tile_name_at(&self, position: DVec2) -> Option<&str> {
        self.tile_at(position).map(|tile| tile.tile_name.as_str())
    }

    /// All placed tiles, in no particular order.
    pub fn placed(&self) -> impl Iterator<Item = (&CellKey, &PlacedTile)> {
        self.placed.iter()
    }

    /// Number of placed tiles.
    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    /// Cells per axis covered by a generation pass.
    pub fn grid_dimensions(&self) -> (u64, u64) {
        (
            axis_cells(self.world_size.x, self.cell_scale.x),
            axis_cells(self.world_size.y, self.cell_scale.y),
        )
    }

    /// Rebuild the placement map.
    ///
    /// `others` is the read-only view predicates evaluate against. It must
    /// already be generated for any layer a predicate reads.
    ///
    /// Returns the number of tiles placed.
    ///
    /// # Errors
    ///
    /// [`TerrainError::InvalidConfig`] for a non-positive cell scale or invalid
    /// settings. The placement map is left untouched in that case.
    pub fn generate(
        &mut self,
        noise: &NoiseField,
        others: &[Layer],
        renderer: &mut dyn TileRenderer,
    ) -> Result<usize, TerrainError> {
        let settings = self.prepare()?;
        let placed = self.scan(noise, &settings, others, renderer)?;
        self.clear(renderer);
        let count = placed.len();
        self.placed = placed;
        Ok(count)
    }

    /// Forward every renderable to `renderer`, row by row.
    pub fn draw(&self, renderer: &mut dyn TileRenderer, camera: &Camera2D) {
        let mut entries: Vec<(&CellKey, RenderableHandle)> = self
            .placed
            .iter()
            .filter_map(|(key, tile)| tile.renderable.map(|handle| (key, handle)))
            .collect();
        entries.sort_unstable_by_key(|(key, _)| (key.y, key.x));
        for (_, handle) in entries {
            renderer.draw(handle, camera);
        }
    }

    /// Validate the grid and return the settings snapshot to generate with.
    pub(crate) fn prepare(&self) -> Result<TerrainSettings, TerrainError> {
        if !(self.cell_scale.x > 0.0 && self.cell_scale.y > 0.0) {
            return Err(TerrainError::InvalidConfig(format!(
                "layer `{}`: cell scale must be positive on both axes, got {}",
                self.name, self.cell_scale
            )));
        }
        let settings = self.settings.get();
        settings.validate()?;
        Ok(settings)
    }

    /// Empty the placement map, discarding renderables.
    pub(crate) fn clear(&mut self, renderer: &mut dyn TileRenderer) {
        for (_, tile) in self.placed.drain() {
            if let Some(handle) = tile.renderable {
                renderer.discard(handle);
            }
        }
    }

    /// Compute a fresh placement map without touching the current one.
    pub(crate) fn scan(
        &self,
        noise: &NoiseField,
        settings: &TerrainSettings,
        layers: &[Layer],
        renderer: &mut dyn TileRenderer,
    ) -> Result<HashMap<CellKey, PlacedTile>, TerrainError> {
        let (cols, rows) = self.grid_dimensions();
        let half_cell = self.cell_scale * 0.5;
        let mut placed = HashMap::new();
        let mut rejected = 0usize;

        for j in 0..rows {
            for i in 0..cols {
                let local = DVec2::new(i as f64, j as f64) * self.cell_scale;
                let center = local + self.offset + half_cell;

                if !self
                    .predicates
                    .iter()
                    .all(|predicate| predicate.evaluate(layers, noise, center))
                {
                    rejected += 1;
                    continue;
                }

                let height = noise.normalized_octave(local + self.offset, settings)?;
                let Some(tile) = self.catalog.select_by_height(height) else {
                    continue;
                };

                let renderable = renderer.produce_renderable(&RenderRequest::for_tile(
                    tile,
                    center,
                    self.cell_scale,
                ));
                placed.insert(
                    CellKey::new(i as i64, j as i64),
                    PlacedTile {
                        tile_name: tile.name().to_string(),
                        center,
                        renderable: Some(renderable),
                    },
                );
            }
        }

        tracing::debug!(
            layer = %self.name,
            cells = cols * rows,
            placed = placed.len(),
            rejected,
            "generated layer"
        );
        Ok(placed)
    }

    pub(crate) fn replace_placed(&mut self, placed: HashMap<CellKey, PlacedTile>) {
        self.placed = placed;
    }

    pub(crate) fn insert_placed(&mut self, key: CellKey, tile: PlacedTile) -> Option<PlacedTile> {
        self.placed.insert(key, tile)
    }

    pub(crate) fn remove_placed(&mut self, key: CellKey) -> Option<PlacedTile> {
        self.placed.remove(&key)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("tiles", &self.catalog.len())
            .field("world_size", &self.world_size)
            .field("cell_scale", &self.cell_scale)
            .field("predicates", &self.predicates.len())
            .field("settings", &self.settings.get())
            .field("offset", &self.offset)
            .field("placed", &self.placed.len())
            .finish()
    }
}

/// Number of cells of size `step` starting at 0 and lying below `extent`.
///
/// The epsilon keeps `1.1 / 0.1 = 11.000000000000002` at 11 cells.
fn axis_cells(extent: f64, step: f64) -> u64 {
    if !(extent > 0.0 && step > 0.0) {
        return 0;
    }
    ((extent / step) - GRID_EPSILON).ceil().max(0.0) as u64
}
