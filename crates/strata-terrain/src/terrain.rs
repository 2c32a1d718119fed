//! An ordered stack of layers sharing pan and zoom.
//!
//! Stack order is draw order and query order. Layers are generated bottom to
//! top, so a layer's predicates may read any layer below it.

use glam::DVec2;

use crate::error::TerrainError;
use crate::layer::{Layer, PlacedTile};
use crate::noise_field::NoiseField;
use crate::render::{Camera2D, QuadBatch, RenderRequest, TileRenderer};
use crate::settings::SharedSettings;

/// Direction of a zoom step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Signed step added to the zoom level: `+1` in, `-1` out.
    pub fn step(self) -> i32 {
        match self {
            ZoomDirection::In => 1,
            ZoomDirection::Out => -1,
        }
    }
}

/// Layer stack plus the renderer its tiles are produced by.
#[derive(Debug)]
pub struct Terrain<R: TileRenderer = QuadBatch> {
    layers: Vec<Layer>,
    zoom_level: i32,
    renderer: R,
}

impl<R: TileRenderer> Terrain<R> {
    /// A terrain with no layers.
    pub fn new(renderer: R) -> Self {
        Self {
            layers: Vec::new(),
            zoom_level: 0,
            renderer,
        }
    }

    /// Replace the layer stack. Renderables of the old layers are discarded.
    pub fn set_layers(&mut self, layers: Vec<Layer>) {
        for layer in &mut self.layers {
            layer.clear(&mut self.renderer);
        }
        self.layers = layers;
    }

    /// Push a layer on top of the stack, returning its index.
    pub fn push_layer(&mut self, layer: Layer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layer at `index`.
    ///
    /// # Errors
    ///
    /// [`TerrainError::IndexOutOfRange`] if there is no such layer.
    pub fn layer(&self, index: usize) -> Result<&Layer, TerrainError> {
        let len = self.layers.len();
        self.layers
            .get(index)
            .ok_or(TerrainError::IndexOutOfRange { index, len })
    }

    /// Mutable layer at `index`.
    ///
    /// # Errors
    ///
    /// [`TerrainError::IndexOutOfRange`] if there is no such layer.
    pub fn layer_mut(&mut self, index: usize) -> Result<&mut Layer, TerrainError> {
        let len = self.layers.len();
        self.layers
            .get_mut(index)
            .ok_or(TerrainError::IndexOutOfRange { index, len })
    }

    /// Accumulated zoom steps (`+1` per zoom in, `-1` per zoom out).
    pub fn zoom_level(&self) -> i32 {
        self.zoom_level
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Pan every layer to `position` and regenerate the whole stack.
    pub fn set_position(
        &mut self,
        position: DVec2,
        noise: &NoiseField,
    ) -> Result<(), TerrainError> {
        for layer in &mut self.layers {
            layer.set_offset(position);
        }
        self.regenerate_layers(noise)
    }

    /// Regenerate every layer, bottom to top, with its current offset and settings.
    ///
    /// Stops at the first layer that fails validation; layers above it keep
    /// their previous placements.
    pub fn regenerate_layers(&mut self, noise: &NoiseField) -> Result<(), TerrainError> {
        for index in 0..self.layers.len() {
            let settings = self.layers[index].prepare()?;
            self.layers[index].clear(&mut self.renderer);
            let placed =
                self.layers[index].scan(noise, &settings, &self.layers, &mut self.renderer)?;
            self.layers[index].replace_placed(placed);
        }
        tracing::debug!(
            layers = self.layers.len(),
            tiles = self.layers.iter().map(Layer::len).sum::<usize>(),
            "regenerated terrain"
        );
        Ok(())
    }

    /// Place `tile_name` in the cell containing `position` on layer
    /// `layer_index`, bypassing noise and predicates.
    ///
    /// A renderable is produced if the name is in the layer's catalog. The
    /// edit lasts until the layer is next generated.
    ///
    /// # Errors
    ///
    /// [`TerrainError::IndexOutOfRange`] if there is no such layer.
    pub fn set_tile_at_location(
        &mut self,
        position: DVec2,
        tile_name: &str,
        layer_index: usize,
    ) -> Result<(), TerrainError> {
        let len = self.layers.len();
        let layer = self
            .layers
            .get_mut(layer_index)
            .ok_or(TerrainError::IndexOutOfRange {
                index: layer_index,
                len,
            })?;

        let key = layer.cell_key(position);
        let cell_scale = layer.cell_scale();
        let center = layer.cell_center(key);
        let renderable = match layer.catalog().get(tile_name) {
            Some(tile) => Some(
                self.renderer
                    .produce_renderable(&RenderRequest::for_tile(tile, center, cell_scale)),
            ),
            None => {
                tracing::warn!(
                    layer = layer.name(),
                    tile = tile_name,
                    "manual tile is not in the layer catalog; placing without renderable"
                );
                None
            }
        };

        let replaced = layer.insert_placed(
            key,
            PlacedTile {
                tile_name: tile_name.to_string(),
                center,
                renderable,
            },
        );
        if let Some(handle) = replaced.and_then(|tile| tile.renderable) {
            self.renderer.discard(handle);
        }
        Ok(())
    }

    /// Remove the tile at `position` from every layer where it is named `name`.
    ///
    /// Returns the number of layers that lost a tile.
    pub fn delete_tile_at_location(&mut self, position: DVec2, name: &str) -> usize {
        let mut removed = 0;
        for layer in &mut self.layers {
            if layer.tile_name_at(position) != Some(name) {
                continue;
            }
            let key = layer.cell_key(position);
            if let Some(tile) = layer.remove_placed(key) {
                if let Some(handle) = tile.renderable {
                    self.renderer.discard(handle);
                }
                removed += 1;
            }
        }
        removed
    }

    /// Tile name at `position` for each layer in stack order; `None` where a
    /// layer has no tile. Always one entry per layer.
    pub fn tile_names_at_location(&self, position: DVec2) -> Vec<Option<&str>> {
        self.layers
            .iter()
            .map(|layer| layer.tile_name_at(position))
            .collect()
    }

    /// Zoom every layer about `center` by `factor`.
    ///
    /// Zooming in divides each settings instance's scale by `factor`, zooming
    /// out multiplies it. Each instance's offset is recomputed from the new
    /// zoom level as `center * factor^level - center`, replacing whatever
    /// offset it held. Settings shared between layers are updated once.
    /// Layers are not regenerated; call
    /// [`regenerate_layers`](Self::regenerate_layers) afterwards.
    ///
    /// # Errors
    ///
    /// [`TerrainError::InvalidConfig`] unless `factor` is finite and positive.
    pub fn zoom(
        &mut self,
        center: DVec2,
        factor: f64,
        direction: ZoomDirection,
    ) -> Result<(), TerrainError> {
        if !(factor > 0.0 && factor.is_finite()) {
            return Err(TerrainError::InvalidConfig(format!(
                "zoom factor must be finite and positive, got {factor}"
            )));
        }

        self.zoom_level += direction.step();
        let zoom_value = match direction {
            ZoomDirection::In => 1.0 / factor,
            ZoomDirection::Out => factor,
        };
        let offset = center * factor.powi(self.zoom_level) - center;

        let mut updated: Vec<&SharedSettings> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let settings = layer.settings();
            if updated.iter().any(|seen| seen.ptr_eq(settings)) {
                continue;
            }
            settings.update(|s| {
                s.scale *= zoom_value;
                s.offset = offset;
            });
            updated.push(settings);
        }

        tracing::debug!(
            level = self.zoom_level,
            zoom_value,
            settings = updated.len(),
            "zoomed terrain"
        );
        Ok(())
    }

    /// Draw every layer, bottom to top.
    pub fn draw(&mut self, camera: &Camera2D) {
        for layer in &self.layers {
            layer.draw(&mut self.renderer, camera);
        }
    }
}

impl Default for Terrain<QuadBatch> {
    fn default() -> Self {
        Self::new(QuadBatch::new())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::TileCatalog;
    use crate::predicate::{OccupiedIn, VacantIn};
    use crate::settings::TerrainSettings;
    use crate::tile::{AtlasSelector, HeightRange, TextureRef, TileSpec};

    fn catalog(bands: &[(&str, f64, f64)]) -> Arc<TileCatalog> {
        let tiles = bands.iter().map(|&(name, lo, hi)| {
            TileSpec::new(
                name,
                TextureRef::new("terrain.png"),
                HeightRange::new(lo, hi).unwrap(),
                AtlasSelector::default(),
            )
        });
        Arc::new(TileCatalog::from_tiles(tiles).unwrap())
    }

    fn layer(name: &str, catalog: Arc<TileCatalog>, settings: SharedSettings) -> Layer {
        Layer::new(name, catalog, DVec2::new(16.0, 16.0), DVec2::ONE, settings)
    }

    fn settings() -> SharedSettings {
        SharedSettings::new(TerrainSettings::new(0.12, 3, 0.5))
    }

    /// Ground covers every cell; water sits on a second layer.
    fn ground_and_water() -> Terrain {
        let mut terrain: Terrain = Terrain::default();
        terrain.set_layers(vec![
            layer("ground", catalog(&[("Ground", 0.0, 1.0)]), settings()),
            layer("water", catalog(&[("Water", 0.0, 0.5), ("Ice", 0.5, 0.5)]), settings()),
        ]);
        terrain
    }

    #[test]
    fn test_single_layer_end_to_end() {
        let mut terrain: Terrain = Terrain::default();
        terrain.set_layers(vec![Layer::new(
            "ground",
            catalog(&[("Ground", 0.0, 1.0)]),
            DVec2::new(2.0, 2.0),
            DVec2::ONE,
            SharedSettings::default(),
        )]);
        terrain
            .set_position(DVec2::ZERO, &NoiseField::new(0))
            .unwrap();

        let ground = terrain.layer(0).unwrap();
        assert_eq!(ground.len(), 4);
        for (x, y) in [(0.5, 0.5), (1.5, 0.5), (0.5, 1.5), (1.5, 1.5)] {
            assert_eq!(
                terrain.tile_names_at_location(DVec2::new(x, y)),
                [Some("Ground")]
            );
            assert_eq!(ground.tile_at(DVec2::new(x, y)).unwrap().center, DVec2::new(x, y));
        }
    }

    #[test]
    fn test_queries_before_generation_are_empty() {
        let mut terrain = ground_and_water();
        assert_eq!(terrain.tile_names_at_location(DVec2::ONE), [None, None]);
        assert_eq!(terrain.delete_tile_at_location(DVec2::ONE, "Ground"), 0);
        terrain.draw(&Camera2D::default());
        assert!(terrain.renderer().frame().is_empty());
        assert!(Terrain::<QuadBatch>::default().tile_names_at_location(DVec2::ONE).is_empty());
    }

    #[test]
    fn test_set_position_pans_all_layers() {
        let mut terrain = ground_and_water();
        let noise = NoiseField::new(8);
        terrain.set_position(DVec2::new(100.0, 50.0), &noise).unwrap();

        for layer in terrain.layers() {
            assert_eq!(layer.offset(), DVec2::new(100.0, 50.0));
        }
        assert_eq!(
            terrain.tile_names_at_location(DVec2::new(100.5, 50.5))[0],
            Some("Ground")
        );
        assert_eq!(terrain.tile_names_at_location(DVec2::new(0.5, 0.5)), [None, None]);
    }

    #[test]
    fn test_manual_override_lasts_until_regeneration() {
        let mut terrain = ground_and_water();
        let noise = NoiseField::new(8);
        terrain.set_position(DVec2::ZERO, &noise).unwrap();

        let pos = DVec2::new(3.5, 4.5);
        terrain.set_tile_at_location(pos, "Ice", 0).unwrap();
        assert_eq!(terrain.tile_names_at_location(pos)[0], Some("Ice"));
        let ice = terrain.layer(0).unwrap().tile_at(pos).unwrap();
        assert!(ice.renderable.is_none(), "Ice is not in the ground catalog");

        terrain.regenerate_layers(&noise).unwrap();
        assert_eq!(terrain.tile_names_at_location(pos)[0], Some("Ground"));
    }

    #[test]
    fn test_manual_override_produces_renderable_for_known_tile() {
        let mut terrain = ground_and_water();
        let noise = NoiseField::new(8);
        terrain.set_position(DVec2::ZERO, &noise).unwrap();
        let live_before = terrain.renderer().live_count();

        let pos = DVec2::new(2.2, 2.7);
        terrain.set_tile_at_location(pos, "Ice", 1).unwrap();
        let tile = terrain.layer(1).unwrap().tile_at(pos).unwrap();
        let handle = tile.renderable.expect("Ice is in the water catalog");
        let quad = terrain.renderer().quad(handle).unwrap();
        assert_eq!(quad.tile_name, "Ice");
        assert_eq!(quad.position, DVec2::new(2.5, 2.5));

        let replaced_water = live_before == terrain.renderer().live_count();
        let was_empty = live_before + 1 == terrain.renderer().live_count();
        assert!(replaced_water || was_empty);
    }

    #[test]
    fn test_set_tile_out_of_range_fails() {
        let mut terrain = ground_and_water();
        let err = terrain
            .set_tile_at_location(DVec2::ZERO, "Ice", 2)
            .unwrap_err();
        assert_eq!(err, TerrainError::IndexOutOfRange { index: 2, len: 2 });
        assert!(terrain.layer(5).is_err());
        assert!(terrain.layer_mut(1).is_ok());
    }

    #[test]
    fn test_delete_only_touches_matching_layers() {
        let mut terrain = ground_and_water();
        terrain.set_position(DVec2::ZERO, &NoiseField::new(8)).unwrap();

        let pos = DVec2::new(6.5, 6.5);
        terrain.set_tile_at_location(pos, "Water", 1).unwrap();
        assert_eq!(terrain.tile_names_at_location(pos), [Some("Ground"), Some("Water")]);

        assert_eq!(terrain.delete_tile_at_location(pos, "Water"), 1);
        assert_eq!(terrain.tile_names_at_location(pos), [Some("Ground"), None]);
        assert_eq!(terrain.delete_tile_at_location(pos, "Water"), 0);
    }

    #[test]
    fn test_delete_removes_from_every_matching_layer() {
        let mut terrain = ground_and_water();
        terrain.set_position(DVec2::ZERO, &NoiseField::new(8)).unwrap();

        let pos = DVec2::new(9.5, 1.5);
        terrain.set_tile_at_location(pos, "Water", 0).unwrap();
        terrain.set_tile_at_location(pos, "Water", 1).unwrap();
        let live = terrain.renderer().live_count();

        assert_eq!(terrain.delete_tile_at_location(pos, "Water"), 2);
        assert_eq!(terrain.tile_names_at_location(pos), [None, None]);
        assert_eq!(terrain.renderer().live_count(), live - 1);
    }

    #[test]
    fn test_cross_layer_predicate_never_overlaps() {
        let noise = NoiseField::new(21);
        let mut terrain: Terrain = Terrain::default();
        terrain.set_layers(vec![
            layer("water", catalog(&[("Water", 0.0, 0.5)]), settings()),
            layer("land", catalog(&[("Land", 0.0, 1.0)]), settings())
                .with_predicate(VacantIn { layer: 0 }),
        ]);
        terrain.set_position(DVec2::new(-4.0, 3.0), &noise).unwrap();

        let water = terrain.layer(0).unwrap();
        let land = terrain.layer(1).unwrap();
        assert!(!water.is_empty() && !land.is_empty());
        for (key, tile) in land.placed() {
            assert!(
                water.tile_at(tile.center).is_none(),
                "land placed over water at {key:?}"
            );
        }
        assert_eq!(water.len() + land.len(), 256);
    }

    #[test]
    fn test_half_cell_pan_keeps_every_cell_across_layers() {
        let noise = NoiseField::new(21);
        let cell = DVec2::splat(0.1);
        let size = DVec2::new(10.0, 1.0);
        let mut terrain: Terrain = Terrain::default();
        terrain.set_layers(vec![
            Layer::new("water", catalog(&[("Water", 0.0, 0.5)]), size, cell, settings()),
            Layer::new("land", catalog(&[("Land", 0.0, 1.0)]), size, cell, settings())
                .with_predicate(VacantIn { layer: 0 }),
        ]);
        terrain.set_position(DVec2::new(0.05, 0.05), &noise).unwrap();

        let (cols, rows) = terrain.layer(0).unwrap().grid_dimensions();
        let water = terrain.layer(0).unwrap();
        let land = terrain.layer(1).unwrap();
        assert_eq!((water.len() + land.len()) as u64, cols * rows);
        for (_, tile) in land.placed() {
            assert!(water.tile_at(tile.center).is_none(), "overlap at {}", tile.center);
            assert_eq!(
                terrain.tile_names_at_location(tile.center),
                [None, Some("Land")]
            );
        }
    }

    #[test]
    fn test_layer_sees_own_map_cleared_during_generation() {
        let noise = NoiseField::new(2);
        let mut terrain: Terrain = Terrain::default();
        terrain.set_layers(vec![
            layer("ground", catalog(&[("Ground", 0.0, 1.0)]), settings())
                .with_predicate(VacantIn { layer: 0 }),
        ]);
        terrain.regenerate_layers(&noise).unwrap();
        assert_eq!(terrain.layer(0).unwrap().len(), 256);
        terrain.regenerate_layers(&noise).unwrap();
        assert_eq!(terrain.layer(0).unwrap().len(), 256);
    }

    #[test]
    fn test_occupied_predicate_restricts_to_named_tile() {
        let noise = NoiseField::new(5);
        let mut terrain: Terrain = Terrain::default();
        terrain.set_layers(vec![
            layer(
                "ground",
                catalog(&[("Water", 0.0, 0.5), ("Grass", 0.5, 1.0)]),
                settings(),
            ),
            layer("trees", catalog(&[("Tree", 0.0, 1.0)]), settings())
                .with_predicate(OccupiedIn::named(0, "Grass")),
        ]);
        terrain.regenerate_layers(&noise).unwrap();

        let ground = terrain.layer(0).unwrap();
        let trees = terrain.layer(1).unwrap();
        let grass = ground.placed().filter(|(_, t)| t.tile_name == "Grass").count();
        assert_eq!(trees.len(), grass);
        for (_, tree) in trees.placed() {
            assert_eq!(ground.tile_name_at(tree.center), Some("Grass"));
        }
    }

    #[test]
    fn test_zoom_updates_scale_and_offset() {
        let mut terrain = ground_and_water();
        let center = DVec2::new(8.0, 4.0);

        terrain.zoom(center, 2.0, ZoomDirection::In).unwrap();
        assert_eq!(terrain.zoom_level(), 1);
        for layer in terrain.layers() {
            let s = layer.settings().get();
            assert!((s.scale - 0.06).abs() < 1e-12);
            assert_eq!(s.offset, center * 2.0 - center);
        }

        terrain.zoom(center, 2.0, ZoomDirection::Out).unwrap();
        terrain.zoom(center, 2.0, ZoomDirection::Out).unwrap();
        assert_eq!(terrain.zoom_level(), -1);
        let s = terrain.layer(0).unwrap().settings().get();
        assert!((s.scale - 0.24).abs() < 1e-12);
        assert_eq!(s.offset, center * 0.5 - center);
    }

    #[test]
    fn test_zoom_applies_once_to_shared_settings() {
        let shared = settings();
        let mut terrain: Terrain = Terrain::default();
        terrain.set_layers(vec![
            layer("a", catalog(&[("A", 0.0, 1.0)]), shared.clone()),
            layer("b", catalog(&[("B", 0.0, 1.0)]), shared.clone()),
        ]);
        terrain.zoom(DVec2::ZERO, 4.0, ZoomDirection::In).unwrap();
        assert!((shared.get().scale - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_replaces_previous_offset_and_does_not_regenerate() {
        let mut terrain = ground_and_water();
        let noise = NoiseField::new(8);
        terrain.set_position(DVec2::new(5.0, 5.0), &noise).unwrap();
        terrain
            .layer(0)
            .unwrap()
            .settings()
            .update(|s| s.offset = DVec2::new(99.0, 99.0));
        let before: Vec<usize> = terrain.layers().iter().map(Layer::len).collect();

        terrain.zoom(DVec2::ZERO, 1.5, ZoomDirection::In).unwrap();

        let s = terrain.layer(0).unwrap().settings().get();
        assert_eq!(s.offset, DVec2::ZERO);
        assert_eq!(terrain.layer(0).unwrap().offset(), DVec2::new(5.0, 5.0));
        let after: Vec<usize> = terrain.layers().iter().map(Layer::len).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_zoom_rejects_bad_factor() {
        let mut terrain = ground_and_water();
        assert!(terrain.zoom(DVec2::ZERO, 0.0, ZoomDirection::In).is_err());
        assert!(terrain.zoom(DVec2::ZERO, f64::NAN, ZoomDirection::Out).is_err());
        assert_eq!(terrain.zoom_level(), 0);
    }

    #[test]
    fn test_regeneration_error_propagates() {
        let mut terrain = ground_and_water();
        terrain.layer(1).unwrap().settings().update(|s| s.scale = 0.0);
        let err = terrain.regenerate_layers(&NoiseField::new(0)).unwrap_err();
        assert!(matches!(err, TerrainError::InvalidConfig(_)));
        assert!(!terrain.layer(0).unwrap().is_empty());
    }

    #[test]
    fn test_draw_walks_layers_in_stack_order() {
        let mut terrain: Terrain = Terrain::default();
        terrain.set_layers(vec![
            Layer::new(
                "bottom",
                catalog(&[("Bottom", 0.0, 1.0)]),
                DVec2::new(1.0, 1.0),
                DVec2::ONE,
                SharedSettings::default(),
            ),
            Layer::new(
                "top",
                catalog(&[("Top", 0.0, 1.0)]),
                DVec2::new(1.0, 1.0),
                DVec2::ONE,
                SharedSettings::default(),
            ),
        ]);
        terrain.regenerate_layers(&NoiseField::new(0)).unwrap();
        terrain.draw(&Camera2D::default());

        let names: Vec<String> = terrain
            .renderer()
            .frame()
            .iter()
            .map(|c| terrain.renderer().quad(c.handle).unwrap().tile_name.clone())
            .collect();
        assert_eq!(names, ["Bottom", "Top"]);
    }

    #[test]
    fn test_set_layers_discards_old_renderables() {
        let mut terrain = ground_and_water();
        terrain.regenerate_layers(&NoiseField::new(1)).unwrap();
        assert!(terrain.renderer().live_count() > 0);
        terrain.set_layers(Vec::new());
        assert_eq!(terrain.renderer().live_count(), 0);
    }
}
