//! Debug visualization: 2D images of generated layers and raw noise.
//!
//! Provides [`DebugImage`] and renderers that sample a world-space
//! [`DebugRegion`] once per pixel. Images can be written out as PNG to
//! diagnose placement rules and height bands without a real renderer.

mod image;
mod renderers;

pub use self::image::{DebugImage, DebugImageError};
pub use renderers::{DebugRegion, TilePalette, render_layers_debug, render_noise_debug};
