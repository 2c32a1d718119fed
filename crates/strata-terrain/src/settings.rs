//! Per-layer noise sampling parameters and the shared handle layers hold them through.

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec2;

use crate::error::TerrainError;

/// Sampling parameters consumed by [`NoiseField`](crate::NoiseField) queries.
///
/// Values are freely mutable; they are validated when generation uses them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainSettings {
    /// World-space translation applied before scaling. Rewritten by zoom.
    pub offset: DVec2,
    /// Multiplier applied to translated coordinates. Must not be zero.
    pub scale: f64,
    /// Number of fractal octaves. Must be at least 1.
    pub octave_count: u32,
    /// Weight ratio between successive octaves, in `(0, 1]`.
    pub octave_blend: f64,
}

impl TerrainSettings {
    /// Settings with a zero offset.
    pub fn new(scale: f64, octave_count: u32, octave_blend: f64) -> Self {
        Self {
            offset: DVec2::ZERO,
            scale,
            octave_count,
            octave_blend,
        }
    }

    /// Check the values the coordinate transform depends on.
    pub fn validate_transform(&self) -> Result<(), TerrainError> {
        if self.scale == 0.0 || !self.scale.is_finite() {
            return Err(TerrainError::InvalidConfig(format!(
                "scale must be finite and non-zero, got {}",
                self.scale
            )));
        }
        if !self.offset.is_finite() {
            return Err(TerrainError::InvalidConfig(format!(
                "offset must be finite, got {}",
                self.offset
            )));
        }
        Ok(())
    }

    /// Check every value the normalized octave query depends on.
    pub fn validate(&self) -> Result<(), TerrainError> {
        self.validate_transform()?;
        if self.octave_count < 1 {
            return Err(TerrainError::InvalidConfig(
                "octave_count must be at least 1".to_string(),
            ));
        }
        if !(self.octave_blend > 0.0 && self.octave_blend <= 1.0) {
            return Err(TerrainError::InvalidConfig(format!(
                "octave_blend must lie in (0, 1], got {}",
                self.octave_blend
            )));
        }
        Ok(())
    }
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self::new(1.0, 1, 0.5)
    }
}

/// Reference-counted handle to a [`TerrainSettings`] instance.
///
/// Cloning the handle shares the instance: a mutation through any clone is
/// seen by every layer holding it. Use [`SharedSettings::detach`] or
/// [`SharedSettings::new`] for an independent copy. Not thread-safe.
#[derive(Clone, Debug, Default)]
pub struct SharedSettings(Rc<RefCell<TerrainSettings>>);

impl SharedSettings {
    /// Wrap settings in a new, unshared handle.
    pub fn new(settings: TerrainSettings) -> Self {
        Self(Rc::new(RefCell::new(settings)))
    }

    /// Copy of the current values.
    pub fn get(&self) -> TerrainSettings {
        *self.0.borrow()
    }

    /// Replace the current values.
    pub fn set(&self, settings: TerrainSettings) {
        *self.0.borrow_mut() = settings;
    }

    /// Mutate the settings in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut TerrainSettings) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// New handle holding a copy of the current values.
    pub fn detach(&self) -> Self {
        Self::new(self.get())
    }

    /// Returns `true` if both handles point at the same instance.
    pub fn ptr_eq(&self, other: &SharedSettings) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<TerrainSettings> for SharedSettings {
    fn from(settings: TerrainSettings) -> Self {
        Self::new(settings)
    }
}
