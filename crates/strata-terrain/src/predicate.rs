//! Placement predicates: pure per-cell rules consulted before height sampling.
//!
//! A predicate sees the whole layer stack (read-only), the noise field, and
//! the world-space center of the candidate cell. Returning `false` leaves the
//! cell empty. Any `Fn(&[Layer], &NoiseField, DVec2) -> bool` is a predicate;
//! the structs below cover the common cross-layer rules and compose with
//! [`PredicateExt`].

use glam::DVec2;

use crate::layer::Layer;
use crate::noise_field::NoiseField;
use crate::settings::TerrainSettings;

/// A side-effect-free placement rule.
pub trait PlacementPredicate {
    /// Returns `true` if a tile may be placed at `position`.
    fn evaluate(&self, layers: &[Layer], noise: &NoiseField, position: DVec2) -> bool;
}

impl<F> PlacementPredicate for F
where
    F: Fn(&[Layer], &NoiseField, DVec2) -> bool,
{
    fn evaluate(&self, layers: &[Layer], noise: &NoiseField, position: DVec2) -> bool {
        self(layers, noise, position)
    }
}

/// Pins a closure to the predicate signature so its argument lifetimes are
/// inferred correctly.
pub fn predicate_fn<F>(f: F) -> F
where
    F: Fn(&[Layer], &NoiseField, DVec2) -> bool,
{
    f
}

/// Passes where layer `layer` has no tile. A missing layer counts as empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VacantIn {
    pub layer: usize,
}

impl PlacementPredicate for VacantIn {
    fn evaluate(&self, layers: &[Layer], _noise: &NoiseField, position: DVec2) -> bool {
        layers
            .get(self.layer)
            .is_none_or(|layer| layer.tile_name_at(position).is_none())
    }
}

/// Passes where layer `layer` has a tile, optionally of a specific name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupiedIn {
    pub layer: usize,
    pub tile: Option<String>,
}

impl OccupiedIn {
    /// Any tile in `layer`.
    pub fn any(layer: usize) -> Self {
        Self { layer, tile: None }
    }

    /// A tile named `tile` in `layer`.
    pub fn named(layer: usize, tile: impl Into<String>) -> Self {
        Self {
            layer,
            tile: Some(tile.into()),
        }
    }
}

impl PlacementPredicate for OccupiedIn {
    fn evaluate(&self, layers: &[Layer], _noise: &NoiseField, position: DVec2) -> bool {
        let Some(found) = layers
            .get(self.layer)
            .and_then(|layer| layer.tile_name_at(position))
        else {
            return false;
        };
        self.tile.as_deref().is_none_or(|wanted| wanted == found)
    }
}

/// Passes where a second noise channel reaches `threshold`.
///
/// Useful for scattering (trees only where a density field is high). Invalid
/// settings make the predicate reject every cell and log a warning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseAbove {
    pub threshold: f64,
    pub settings: TerrainSettings,
}

impl PlacementPredicate for NoiseAbove {
    fn evaluate(&self, _layers: &[Layer], noise: &NoiseField, position: DVec2) -> bool {
        match noise.normalized_octave(position, &self.settings) {
            Ok(value) => value >= self.threshold,
            Err(err) => {
                tracing::warn!(%err, "noise predicate settings are invalid; rejecting cell");
                false
            }
        }
    }
}

/// Passes where both inner predicates pass. Short-circuits.
#[derive(Clone, Debug)]
pub struct And<A, B>(pub A, pub B);

impl<A: PlacementPredicate, B: PlacementPredicate> PlacementPredicate for And<A, B> {
    fn evaluate(&self, layers: &[Layer], noise: &NoiseField, position: DVec2) -> bool {
        self.0.evaluate(layers, noise, position) && self.1.evaluate(layers, noise, position)
    }
}

/// Passes where either inner predicate passes. Short-circuits.
#[derive(Clone, Debug)]
pub struct Or<A, B>(pub A, pub B);

impl<A: PlacementPredicate, B: PlacementPredicate> PlacementPredicate for Or<A, B> {
    fn evaluate(&self, layers: &[Layer], noise: &NoiseField, position: DVec2) -> bool {
        self.0.evaluate(layers, noise, position) || self.1.evaluate(layers, noise, position)
    }
}

/// Inverts the inner predicate.
#[derive(Clone, Debug)]
pub struct Not<P>(pub P);

impl<P: PlacementPredicate> PlacementPredicate for Not<P> {
    fn evaluate(&self, layers: &[Layer], noise: &NoiseField, position: DVec2) -> bool {
        !self.0.evaluate(layers, noise, position)
    }
}

/// Combinators available on every predicate.
pub trait PredicateExt: PlacementPredicate + Sized {
    fn and<P: PlacementPredicate>(self, other: P) -> And<Self, P> {
        And(self, other)
    }

    fn or<P: PlacementPredicate>(self, other: P) -> Or<Self, P> {
        Or(self, other)
    }

    fn not(self) -> Not<Self> {
        Not(self)
    }
}

impl<T: PlacementPredicate> PredicateExt for T {}
