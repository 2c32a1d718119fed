//! Debug renderers: layer occupancy maps and raw noise heightmaps.

use glam::DVec2;
use hashbrown::HashMap;

use super::image::DebugImage;
use crate::error::TerrainError;
use crate::layer::Layer;
use crate::noise_field::NoiseField;
use crate::settings::TerrainSettings;

/// Axis-aligned world-space window sampled one point per pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DebugRegion {
    /// Lower corner in world units.
    pub min: DVec2,
    /// Upper corner in world units.
    pub max: DVec2,
    /// World units covered by one pixel edge.
    pub pixel_size: f64,
}

impl DebugRegion {
    /// Image size in pixels, rounding partial pixels up.
    pub fn dimensions(&self) -> (u32, u32) {
        if !(self.pixel_size > 0.0) {
            return (0, 0);
        }
        let extent = ((self.max - self.min) / self.pixel_size).ceil().max(DVec2::ZERO);
        (extent.x as u32, extent.y as u32)
    }

    /// World position sampled for pixel `(px, py)`: the pixel's center.
    pub fn sample_point(&self, px: u32, py: u32) -> DVec2 {
        self.min + (DVec2::new(px as f64, py as f64) + 0.5) * self.pixel_size
    }
}

/// Tile name to color mapping with a deterministic fallback.
#[derive(Clone, Debug, Default)]
pub struct TilePalette {
    colors: HashMap<String, [u8; 3]>,
}

impl TilePalette {
    /// Palette with the usual ground and vegetation tiles pre-assigned.
    pub fn standard() -> Self {
        let mut palette = Self::default();
        for (name, rgb) in [
            ("Water", [30, 80, 200]),
            ("Ice", [200, 225, 240]),
            ("Sand", [220, 200, 130]),
            ("Grass", [90, 170, 60]),
            ("Forest", [30, 110, 40]),
            ("Rock", [130, 120, 110]),
            ("Snow", [240, 240, 245]),
            ("Tree", [20, 80, 25]),
            ("Bush", [70, 130, 50]),
        ] {
            palette.insert(name, rgb);
        }
        palette
    }

    pub fn insert(&mut self, name: impl Into<String>, rgb: [u8; 3]) {
        self.colors.insert(name.into(), rgb);
    }

    /// Color for `name`; unknown names hash to a stable mid-tone color.
    pub fn color(&self, name: &str) -> [u8; 3] {
        if let Some(&rgb) = self.colors.get(name) {
            return rgb;
        }
        // FNV-1a keeps the fallback stable across runs and platforms.
        let hash = name.bytes().fold(0x811c_9dc5_u32, |h, b| {
            (h ^ b as u32).wrapping_mul(0x0100_0193)
        });
        [
            64 + (hash & 0x7f) as u8,
            64 + ((hash >> 8) & 0x7f) as u8,
            64 + ((hash >> 16) & 0x7f) as u8,
        ]
    }
}

/// Paint the top-most tile of each sampled point across `layers`.
///
/// Layers later in the slice cover earlier ones. Empty points stay
/// transparent black.
pub fn render_layers_debug(
    layers: &[Layer],
    region: &DebugRegion,
    palette: &TilePalette,
) -> DebugImage {
    let (width, height) = region.dimensions();
    let mut image = DebugImage::new(width, height);

    for py in 0..height {
        for px in 0..width {
            let point = region.sample_point(px, py);
            let top = layers
                .iter()
                .rev()
                .find_map(|layer| layer.tile_name_at(point));
            if let Some(name) = top {
                let [r, g, b] = palette.color(name);
                image.set_pixel(px, py, [r, g, b, 255]);
            }
        }
    }

    image
}

/// Grayscale heightmap of [`NoiseField::normalized_octave`] over `region`.
///
/// # Errors
///
/// [`TerrainError::InvalidConfig`] if `settings` are invalid.
pub fn render_noise_debug(
    noise: &NoiseField,
    settings: &TerrainSettings,
    region: &DebugRegion,
) -> Result<DebugImage, TerrainError> {
    let (width, height) = region.dimensions();
    let mut image = DebugImage::new(width, height);

    for py in 0..height {
        for px in 0..width {
            let value = noise.normalized_octave(region.sample_point(px, py), settings)?;
            let v = (value * 255.0).round() as u8;
            image.set_pixel(px, py, [v, v, v, 255]);
        }
    }

    Ok(image)
}
