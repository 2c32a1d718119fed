//! Command-line argument parsing for the Strata generator.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Strata command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Layered tile-terrain generator")]
pub struct CliArgs {
    /// Noise seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// World width in world units.
    #[arg(long)]
    pub width: Option<f64>,

    /// World height in world units.
    #[arg(long)]
    pub height: Option<f64>,

    /// Cell edge length (applied to both axes).
    #[arg(long)]
    pub cell_size: Option<f64>,

    /// Number of noise octaves.
    #[arg(long)]
    pub octaves: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// RON tile manifest to load instead of the built-in catalog.
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Write a PNG of the generated layers to this path.
    #[arg(long)]
    pub debug_image: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.noise.seed = seed;
        }
        if let Some(w) = args.width {
            self.world.size.0 = w;
        }
        if let Some(h) = args.height {
            self.world.size.1 = h;
        }
        if let Some(cell) = args.cell_size {
            self.world.cell_size = (cell, cell);
        }
        if let Some(octaves) = args.octaves {
            self.noise.octave_count = octaves;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(ref manifest) = args.manifest {
            self.world.tile_manifest = Some(manifest.clone());
        }
        if let Some(ref path) = args.debug_image {
            self.debug.debug_image = Some(path.clone());
        }
    }
}
