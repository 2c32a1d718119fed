//! Interfaces to the host's rendering and asset systems.
//!
//! Generation asks a [`TileRenderer`] for one renderable per placed tile and
//! hands it back for disposal when the tile is replaced or removed. The core
//! never looks inside a [`RenderableHandle`].

use glam::DVec2;

use crate::catalog::CatalogError;
use crate::tile::{AtlasSelector, TextureRef, TileSpec};

/// Opaque identity of a renderable produced by a [`TileRenderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderableHandle(pub u64);

/// Everything a renderer needs to build a textured quad for a tile.
#[derive(Clone, Copy, Debug)]
pub struct RenderRequest<'a> {
    pub tile_name: &'a str,
    pub texture: &'a TextureRef,
    pub atlas: AtlasSelector,
    /// World-space center of the quad.
    pub position: DVec2,
    /// World-space extent of the quad.
    pub size: DVec2,
}

impl<'a> RenderRequest<'a> {
    /// Request a quad for `tile` centered at `position`.
    pub fn for_tile(tile: &'a TileSpec, position: DVec2, size: DVec2) -> Self {
        Self {
            tile_name: tile.name(),
            texture: tile.texture(),
            atlas: tile.atlas(),
            position,
            size,
        }
    }
}

/// View parameters forwarded to [`TileRenderer::draw`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera2D {
    pub center: DVec2,
    pub zoom: f64,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            center: DVec2::ZERO,
            zoom: 1.0,
        }
    }
}

/// Host-side producer and drawer of tile renderables.
pub trait TileRenderer {
    /// Build a renderable for one placed tile.
    fn produce_renderable(&mut self, request: &RenderRequest<'_>) -> RenderableHandle;

    /// Release a renderable that is no longer placed.
    fn discard(&mut self, _handle: RenderableHandle) {}

    /// Draw a previously produced renderable.
    fn draw(&mut self, handle: RenderableHandle, camera: &Camera2D);
}

/// Host-side texture lifecycle hooks used by tile definitions.
pub trait TextureLoader {
    fn load_texture(&mut self, texture: &TextureRef) -> Result<(), CatalogError>;
    fn unload_texture(&mut self, texture: &TextureRef);
}

/// A textured quad recorded by [`QuadBatch`].
#[derive(Clone, Debug, PartialEq)]
pub struct Quad {
    pub tile_name: String,
    pub texture: TextureRef,
    pub atlas: AtlasSelector,
    pub position: DVec2,
    pub size: DVec2,
}

/// A draw recorded during the current frame, in camera space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    pub handle: RenderableHandle,
    /// Quad center relative to the camera, scaled by its zoom.
    pub view_position: DVec2,
    pub view_size: DVec2,
}

/// In-memory [`TileRenderer`] that stores quads in reusable slots.
///
/// Serves headless hosts and tests: live quads can be inspected, and draws
/// are recorded as [`DrawCommand`]s until [`QuadBatch::begin_frame`].
#[derive(Debug, Default)]
pub struct QuadBatch {
    slots: Vec<Option<Quad>>,
    free: Vec<usize>,
    frame: Vec<DrawCommand>,
}

impl QuadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quad behind a live handle.
    pub fn quad(&self, handle: RenderableHandle) -> Option<&Quad> {
        self.slots.get(handle.0 as usize).and_then(Option::as_ref)
    }

    /// Number of quads that have been produced and not discarded.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Draws recorded since the last [`begin_frame`](Self::begin_frame).
    pub fn frame(&self) -> &[DrawCommand] {
        &self.frame
    }

    /// Forget the draws of the previous frame.
    pub fn begin_frame(&mut self) {
        self.frame.clear();
    }
}

impl TileRenderer for QuadBatch {
    fn produce_renderable(&mut self, request: &RenderRequest<'_>) -> RenderableHandle {
        let quad = Quad {
            tile_name: request.tile_name.to_string(),
            texture: request.texture.clone(),
            atlas: request.atlas,
            position: request.position,
            size: request.size,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(quad);
                slot
            }
            None => {
                self.slots.push(Some(quad));
                self.slots.len() - 1
            }
        };
        RenderableHandle(slot as u64)
    }

    fn discard(&mut self, handle: RenderableHandle) {
        let slot = handle.0 as usize;
        if let Some(entry) = self.slots.get_mut(slot)
            && entry.take().is_some()
        {
            self.free.push(slot);
        }
    }

    fn draw(&mut self, handle: RenderableHandle, camera: &Camera2D) {
        let Some(quad) = self.quad(handle) else {
            return;
        };
        let command = DrawCommand {
            handle,
            view_position: (quad.position - camera.center) * camera.zoom,
            view_size: quad.size * camera.zoom,
        };
        self.frame.push(command);
    }
}
