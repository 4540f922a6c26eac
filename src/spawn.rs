//! Spawn context for particle initialization.
//!
//! Wraps a small RNG with the handful of distributions the field needs.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Random source and helpers used while populating a field.
///
/// ```ignore
/// let mut ctx = SpawnContext::seeded(42);
/// let position = ctx.random_on_shell(8.0, 20.0);
/// ```
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    /// Reproducible context: the same seed yields the same field.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Context seeded from the system clock, different on each run.
    pub fn from_clock() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::seeded(seed)
    }

    /// Seeded when `seed` is given, clock-seeded otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_clock, Self::seeded)
    }

    // ========== Random primitives ==========

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        self.rng.gen_range(min..max)
    }

    /// Random index into a collection of `len` items.
    #[inline]
    pub fn random_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    // ========== Position helpers ==========

    /// Random point in the spherical shell between `inner` and `outer`.
    ///
    /// The radius is uniform in `[inner, outer]`. The inclination uses
    /// `acos(2u - 1)` so directions are uniform on the sphere rather than
    /// bunched at the poles.
    pub fn random_on_shell(&mut self, inner: f32, outer: f32) -> Vec3 {
        let radius = inner + self.random() * (outer - inner);
        let theta = self.random() * TAU;
        let phi = (2.0 * self.random() - 1.0).clamp(-1.0, 1.0).acos();

        Vec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
        )
    }

    /// Velocity with each axis independently uniform in `[-max, max)`.
    pub fn random_velocity(&mut self, max: f32) -> Vec3 {
        Vec3::new(
            (self.random() - 0.5) * 2.0 * max,
            (self.random() - 0.5) * 2.0 * max,
            (self.random() - 0.5) * 2.0 * max,
        )
    }
}
