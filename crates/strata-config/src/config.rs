//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level generator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Noise sampling settings shared by every layer at startup.
    pub noise: NoiseConfig,
    /// Grid extent and cell size.
    pub world: WorldConfig,
    /// Pan and zoom defaults.
    pub view: ViewConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Noise sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    /// Seed added to every sampled coordinate.
    pub seed: u32,
    /// Multiplier applied to coordinates before sampling. Must not be zero.
    pub scale: f64,
    /// Number of fractal octaves. Must be at least 1.
    pub octave_count: u32,
    /// Weight ratio between successive octaves, in `(0, 1]`.
    pub octave_blend: f64,
}

/// World grid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Layer extent in world units (width, height).
    pub size: (f64, f64),
    /// Cell step in world units (width, height). Both axes must be positive.
    pub cell_size: (f64, f64),
    /// Optional RON tile manifest. The built-in catalog is used when unset.
    pub tile_manifest: Option<PathBuf>,
}

/// Pan and zoom configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    /// Initial pan offset in world units.
    pub start_position: (f64, f64),
    /// Multiplicative zoom step.
    pub zoom_factor: f64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Write a PNG of the generated layers to this path.
    pub debug_image: Option<PathBuf>,
    /// Pixels per cell in the debug image.
    pub pixels_per_cell: u32,
}

// --- Default implementations ---

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 0.05,
            octave_count: 4,
            octave_blend: 0.5,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: (64.0, 64.0),
            cell_size: (1.0, 1.0),
            tile_manifest: None,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            start_position: (0.0, 0.0),
            zoom_factor: 1.25,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_image: None,
            pixels_per_cell: 4,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Per-user config directory (`<config_dir>/strata`), if the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("strata"))
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(false)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Reject values the generator cannot work with.
    ///
    /// Terrain settings stay freely mutable at runtime and are checked again at
    /// generation time; this only catches bad files and flags early.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (cw, ch) = self.world.cell_size;
        if !(cw > 0.0 && ch > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "world.cell_size",
                reason: format!("both axes must be positive, got ({cw}, {ch})"),
            });
        }
        if self.noise.octave_count < 1 {
            return Err(ConfigError::InvalidValue {
                field: "noise.octave_count",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.noise.scale == 0.0 || !self.noise.scale.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "noise.scale",
                reason: format!("must be finite and non-zero, got {}", self.noise.scale),
            });
        }
        if !(self.noise.octave_blend > 0.0 && self.noise.octave_blend <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "noise.octave_blend",
                reason: format!("must lie in (0, 1], got {}", self.noise.octave_blend),
            });
        }
        if !(self.view.zoom_factor > 0.0 && self.view.zoom_factor.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "view.zoom_factor",
                reason: format!("must be finite and positive, got {}", self.view.zoom_factor),
            });
        }
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
