//! Integer cell keys for placement maps.

use glam::DVec2;

/// Tolerance added before flooring so a point that should sit exactly on a
/// cell edge is not pushed into the previous cell by rounding.
pub(crate) const GRID_EPSILON: f64 = 1e-9;

/// Index of a grid cell relative to its layer's origin.
///
/// Keys are `floor(local / cell_scale)` per axis, where `local` is measured
/// from the layer's pan offset. Every point inside a cell maps to the same key
/// and placement maps never hash raw floats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
}

impl CellKey {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Key of the cell containing the layer-local `position` on a grid of
    /// `cell_scale` cells.
    pub fn from_position(position: DVec2, cell_scale: DVec2) -> Self {
        let index = (position / cell_scale + GRID_EPSILON).floor();
        Self {
            x: index.x as i64,
            y: index.y as i64,
        }
    }

    /// Layer-local lower corner of the cell.
    pub fn origin(self, cell_scale: DVec2) -> DVec2 {
        DVec2::new(self.x as f64, self.y as f64) * cell_scale
    }

    /// Layer-local center of the cell.
    pub fn center(self, cell_scale: DVec2) -> DVec2 {
        self.origin(cell_scale) + cell_scale * 0.5
    }
}
