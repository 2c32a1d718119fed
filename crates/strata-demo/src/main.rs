use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use glam::DVec2;
use hashbrown::HashSet;
use strata_config::{CliArgs, Config, NoiseConfig};
use strata_terrain::debug_viz::{DebugRegion, TilePalette, render_layers_debug};
use strata_terrain::{
    Camera2D, CatalogError, Layer, NoiseAbove, NoiseField, OccupiedIn, PredicateExt, SharedSettings,
    Terrain, TerrainSettings, TextureLoader, TextureRef, TileCatalog, ZoomDirection,
};

const GROUND_MANIFEST: &str = include_str!("../assets/ground.ron");
const VEGETATION_MANIFEST: &str = include_str!("../assets/vegetation.ron");

/// Density threshold a vegetation cell must reach on its own noise channel.
const VEGETATION_DENSITY: f64 = 0.45;

/// Stands in for a GPU texture cache: remembers which keys are resident.
#[derive(Debug, Default)]
struct ResidentTextures {
    loaded: HashSet<TextureRef>,
}

impl TextureLoader for ResidentTextures {
    fn load_texture(&mut self, texture: &TextureRef) -> Result<(), CatalogError> {
        if self.loaded.insert(texture.clone()) {
            tracing::debug!(%texture, "texture resident");
        }
        Ok(())
    }

    fn unload_texture(&mut self, texture: &TextureRef) {
        self.loaded.remove(texture);
    }
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(Config::default_dir)
        .unwrap_or_else(|| PathBuf::from(".strata"));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = run(&config) {
        tracing::error!("terrain generation failed: {e}");
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    config.validate()?;

    let noise = NoiseField::new(config.noise.seed);
    let mut textures = ResidentTextures::default();
    let mut terrain = build_terrain(config)?;
    for layer in terrain.layers() {
        layer.catalog().load_all(&mut textures)?;
    }
    tracing::info!(textures = textures.loaded.len(), "textures loaded");

    let start = DVec2::from(config.view.start_position);
    terrain.set_position(start, &noise)?;
    log_layer_counts(&terrain, "initial pass");

    let center = start + DVec2::from(config.world.size) * 0.5;
    terrain.zoom(center, config.view.zoom_factor, ZoomDirection::In)?;
    terrain.regenerate_layers(&noise)?;
    log_layer_counts(&terrain, "zoomed in");

    terrain.zoom(center, config.view.zoom_factor, ZoomDirection::Out)?;
    terrain.regenerate_layers(&noise)?;
    log_layer_counts(&terrain, "zoomed back out");

    terrain.renderer_mut().begin_frame();
    terrain.draw(&Camera2D::default());
    tracing::info!(
        draw_calls = terrain.renderer().frame().len(),
        live = terrain.renderer().live_count(),
        "drew frame"
    );

    if let Some(path) = &config.debug.debug_image {
        write_debug_image(&terrain, config, path)?;
    }

    for layer in terrain.layers() {
        layer.catalog().unload_all(&mut textures);
    }
    Ok(())
}

/// Noise settings from config, with no offset applied yet.
fn terrain_settings(noise: &NoiseConfig) -> TerrainSettings {
    TerrainSettings::new(noise.scale, noise.octave_count, noise.octave_blend)
}

/// Ground layer from the configured manifest (or the built-in one) and a
/// vegetation layer that only grows on grass or rock where density allows.
fn build_terrain(config: &Config) -> Result<Terrain, Box<dyn Error>> {
    let ground_catalog = match &config.world.tile_manifest {
        Some(path) => TileCatalog::load_manifest(path)?,
        None => TileCatalog::from_ron_str(GROUND_MANIFEST)?,
    };
    let vegetation_catalog = TileCatalog::from_ron_str(VEGETATION_MANIFEST)?;

    let world_size = DVec2::from(config.world.size);
    let cell_size = DVec2::from(config.world.cell_size);
    let base = terrain_settings(&config.noise);

    let ground = Layer::new(
        "ground",
        Arc::new(ground_catalog),
        world_size,
        cell_size,
        SharedSettings::new(base),
    );

    let density = TerrainSettings {
        scale: base.scale * 3.0,
        ..base
    };
    let vegetation = Layer::new(
        "vegetation",
        Arc::new(vegetation_catalog),
        world_size,
        cell_size,
        SharedSettings::new(base),
    )
    .with_predicate(
        OccupiedIn::named(0, "Grass")
            .or(OccupiedIn::named(0, "Rock"))
            .and(NoiseAbove {
                threshold: VEGETATION_DENSITY,
                settings: density,
            }),
    );

    let mut terrain = Terrain::default();
    terrain.set_layers(vec![ground, vegetation]);
    Ok(terrain)
}

fn log_layer_counts(terrain: &Terrain, stage: &str) {
    for layer in terrain.layers() {
        let (cols, rows) = layer.grid_dimensions();
        tracing::info!(
            stage,
            layer = layer.name(),
            tiles = layer.len(),
            cells = cols * rows,
            "layer generated"
        );
    }
}

fn write_debug_image(
    terrain: &Terrain,
    config: &Config,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let min = DVec2::from(config.view.start_position);
    let region = DebugRegion {
        min,
        max: min + DVec2::from(config.world.size),
        pixel_size: config.world.cell_size.0 / f64::from(config.debug.pixels_per_cell.max(1)),
    };
    let image = render_layers_debug(terrain.layers(), &region, &TilePalette::standard());
    image.write_png(path)?;
    tracing::info!(
        path = %path.display(),
        width = image.width,
        height = image.height,
        "wrote debug image"
    );
    Ok(())
}
