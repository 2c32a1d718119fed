//! Seeded 2D gradient noise with fractal octave summation.
//!
//! The permutation table is built once from a fixed constant; the world seed
//! enters as a translation of the sampled coordinates. Because the table
//! repeats every 256 lattice units, seeds that differ by a multiple of 256
//! sample the same field.

use glam::DVec2;
use noise::{NoiseFn, Perlin};

use crate::error::TerrainError;
use crate::settings::TerrainSettings;

/// Seed of the fixed permutation table shared by every [`NoiseField`].
pub const PERMUTATION_SEED: u32 = 0;

/// Deterministic coherent-noise generator.
///
/// Sampling is a pure function of the input position, the seed, and the
/// settings passed in. A field can be shared by reference across layers.
#[derive(Clone, Debug)]
pub struct NoiseField {
    seed: u32,
    perlin: Perlin,
}

impl NoiseField {
    /// Create a field for `seed`.
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            perlin: Perlin::new(PERMUTATION_SEED),
        }
    }

    /// The seed added to every transformed coordinate.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Single-octave gradient noise at `(x, y)`, in `[-1, 1]`.
    ///
    /// Continuous everywhere, zero on integer lattice points.
    pub fn sample_2d(&self, x: f64, y: f64) -> f64 {
        self.perlin.get([x, y]).clamp(-1.0, 1.0)
    }

    /// Weighted fractal sum of `octave_count` octaves.
    ///
    /// Octave `i` samples at frequency `2^i` with weight `blend^i`; the sum is
    /// divided by the total weight. An `octave_count` of zero is treated as one
    /// octave, so the result equals [`sample_2d`](Self::sample_2d).
    pub fn octave_sample(&self, x: f64, y: f64, octave_count: u32, blend: f64) -> f64 {
        let mut total = 0.0;
        let mut total_weight = 0.0;
        let mut frequency = 1.0;
        let mut weight = 1.0;

        for _ in 0..octave_count.max(1) {
            total += self.sample_2d(x * frequency, y * frequency) * weight;
            total_weight += weight;

            frequency *= 2.0;
            weight *= blend;
        }

        total / total_weight
    }

    /// Fractal noise at `position` remapped to `[0, 1]`.
    ///
    /// The position is transformed by `(position + offset) * scale + seed`
    /// before sampling.
    ///
    /// # Errors
    ///
    /// [`TerrainError::InvalidConfig`] if the settings have a zero scale, fewer
    /// than one octave, or a blend outside `(0, 1]`.
    pub fn normalized_octave(
        &self,
        position: DVec2,
        settings: &TerrainSettings,
    ) -> Result<f64, TerrainError> {
        settings.validate()?;
        let p = self.transform(position, settings);
        let v = self.octave_sample(p.x, p.y, settings.octave_count, settings.octave_blend);
        Ok(((v + 1.0) * 0.5).clamp(0.0, 1.0))
    }

    /// Single-octave noise at `position` using the same transform as
    /// [`normalized_octave`](Self::normalized_octave), left in `[-1, 1]`.
    ///
    /// # Errors
    ///
    /// [`TerrainError::InvalidConfig`] if the settings have a zero scale.
    pub fn normalized_value(
        &self,
        position: DVec2,
        settings: &TerrainSettings,
    ) -> Result<f64, TerrainError> {
        settings.validate_transform()?;
        let p = self.transform(position, settings);
        Ok(self.sample_2d(p.x, p.y))
    }

    fn transform(&self, position: DVec2, settings: &TerrainSettings) -> DVec2 {
        (position + settings.offset) * settings.scale + DVec2::splat(self.seed as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> TerrainSettings {
        TerrainSettings::new(0.13, 4, 0.5)
    }

    #[test]
    fn test_sample_is_bit_identical_across_calls() {
        let field = NoiseField::new(42);
        let a = field.sample_2d(12.34, -5.67);
        let b = field.sample_2d(12.34, -5.67);
        assert_eq!(a.to_bits(), b.to_bits());

        let other = NoiseField::new(42);
        assert_eq!(a.to_bits(), other.sample_2d(12.34, -5.67).to_bits());
    }

    #[test]
    fn test_sample_within_unit_range() {
        let field = NoiseField::new(7);
        for i in 0..200 {
            for j in 0..200 {
                let v = field.sample_2d(i as f64 * 0.173 - 17.0, j as f64 * 0.291 - 29.0);
                assert!((-1.0..=1.0).contains(&v), "sample {v} out of range at ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_single_octave_equals_base_noise() {
        let field = NoiseField::new(3);
        for &blend in &[0.1, 0.5, 0.9] {
            for i in 0..50 {
                let x = i as f64 * 0.37;
                let y = i as f64 * -0.61;
                assert_eq!(
                    field.octave_sample(x, y, 1, blend).to_bits(),
                    field.sample_2d(x, y).to_bits(),
                    "single octave must equal base noise at ({x}, {y}) blend {blend}"
                );
            }
        }
    }

    #[test]
    fn test_zero_octaves_treated_as_one() {
        let field = NoiseField::new(3);
        assert_eq!(
            field.octave_sample(1.25, 2.75, 0, 0.5),
            field.sample_2d(1.25, 2.75)
        );
    }

    #[test]
    fn test_normalized_octave_within_unit_interval() {
        let field = NoiseField::new(11);
        let settings = settings();
        for i in 0..100 {
            for j in 0..100 {
                let h = field
                    .normalized_octave(DVec2::new(i as f64, j as f64), &settings)
                    .unwrap();
                assert!((0.0..=1.0).contains(&h), "height {h} out of range at ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_normalized_value_is_not_remapped() {
        let field = NoiseField::new(5);
        let settings = settings();
        let mut saw_negative = false;
        for i in 0..400 {
            let v = field
                .normalized_value(DVec2::new(i as f64 * 0.7, i as f64 * 0.3), &settings)
                .unwrap();
            assert!((-1.0..=1.0).contains(&v));
            saw_negative |= v < 0.0;
        }
        assert!(saw_negative, "raw value query should reach negative values");
    }

    #[test]
    fn test_zero_octaves_rejected_by_normalized_query() {
        let field = NoiseField::new(0);
        let settings = TerrainSettings::new(1.0, 0, 0.5);
        assert!(matches!(
            field.normalized_octave(DVec2::ZERO, &settings),
            Err(TerrainError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_scale_rejected_by_both_queries() {
        let field = NoiseField::new(0);
        let settings = TerrainSettings::new(0.0, 2, 0.5);
        assert!(field.normalized_octave(DVec2::ONE, &settings).is_err());
        assert!(field.normalized_value(DVec2::ONE, &settings).is_err());
    }

    #[test]
    fn test_offset_matches_translated_position() {
        let field = NoiseField::new(9);
        let base = settings();
        let shifted = TerrainSettings {
            offset: DVec2::new(3.0, -2.0),
            ..base
        };
        let a = field
            .normalized_octave(DVec2::new(4.0, 5.0), &shifted)
            .unwrap();
        let b = field.normalized_octave(DVec2::new(7.0, 3.0), &base).unwrap();
        assert!((a - b).abs() < 1e-12, "offset must act as a translation: {a} vs {b}");
    }

    #[test]
    fn test_different_seeds_produce_different_fields() {
        let a = NoiseField::new(1);
        let b = NoiseField::new(2);
        let settings = settings();
        let differs = (0..20).any(|i| {
            let p = DVec2::new(i as f64 * 1.7, i as f64 * 2.3);
            a.normalized_octave(p, &settings).unwrap() != b.normalized_octave(p, &settings).unwrap()
        });
        assert!(differs, "different seeds should sample different values");
    }

    #[test]
    fn test_smooth_gradient_no_discontinuities() {
        let field = NoiseField::new(42);
        let step = 0.001;
        for i in 0..10_000 {
            let x = i as f64 * step;
            let delta = (field.sample_2d(x + step, 0.3) - field.sample_2d(x, 0.3)).abs();
            assert!(delta < 0.05, "discontinuity at x={x}: delta={delta}");
        }
    }
}
