//! The particle field and its per-frame update rule.
//!
//! Every particle advances independently, so the update is a plain map over
//! the population. One step, per particle:
//!
//! 1. **Wave drift**: a small time- and position-dependent oscillation plus
//!    the particle's own velocity.
//! 2. **Pointer attraction**: within [`ATTRACTION_RADIUS`] of the pointer's
//!    world target, pull toward it with linear falloff.
//! 3. **Boundary reflection**: past [`BOUNDARY`] on an axis, that axis's
//!    velocity flips. Positions are never clamped.
//!
//! The whole-field rotation ([`field_rotation`]) depends on time only and is
//! applied by the renderer as a model transform.

use glam::{Vec2, Vec3};

use crate::spawn::SpawnContext;
use crate::visuals::Palette;

/// Inner radius of the spawn shell.
pub const SHELL_INNER_RADIUS: f32 = 8.0;
/// Outer radius of the spawn shell.
pub const SHELL_OUTER_RADIUS: f32 = 20.0;
/// Smallest spawned point size.
pub const MIN_SIZE: f32 = 0.5;
/// Largest spawned point size.
pub const MAX_SIZE: f32 = 2.5;
/// Per-axis bound on spawned velocity.
pub const MAX_DRIFT_SPEED: f32 = 0.01;

/// Normalized pointer coordinates are scaled by this to reach world space.
pub const POINTER_WORLD_SCALE: f32 = 30.0;
/// Particles closer than this to the pointer target are attracted.
pub const ATTRACTION_RADIUS: f32 = 15.0;
/// Pull applied at zero distance.
pub const ATTRACTION_STRENGTH: f32 = 0.1;
/// Per-axis extent past which velocity reverses.
pub const BOUNDARY: f32 = 25.0;
/// Whole-field rotation rate in radians per second about X and Y.
pub const ROTATION_RATE: Vec2 = Vec2::new(0.05, 0.03);

/// A single point in the cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Linear RGB, fixed at spawn.
    pub color: Vec3,
    /// Point size multiplier, fixed at spawn.
    pub size: f32,
}

impl Particle {
    /// A particle at `position` with the given velocity, white and unit-sized.
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            color: Vec3::ONE,
            size: 1.0,
        }
    }
}

/// Fixed-size population of particles.
///
/// The population cannot grow or shrink after construction; only
/// [`step`](Self::step) and [`advance`](Self::advance) change particle state.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    particles: Vec<Particle>,
}

impl ParticleField {
    /// Populate `count` particles on the spawn shell.
    ///
    /// Each particle gets a uniformly chosen palette colour, a size in
    /// `[MIN_SIZE, MAX_SIZE)` and a velocity in `[-MAX_DRIFT_SPEED, MAX_DRIFT_SPEED)`
    /// per axis.
    pub fn initialize(count: usize, palette: &Palette, ctx: &mut SpawnContext) -> Self {
        let colors = palette.colors();
        let particles = (0..count)
            .map(|_| {
                let position = ctx.random_on_shell(SHELL_INNER_RADIUS, SHELL_OUTER_RADIUS);
                let color = if colors.is_empty() {
                    Vec3::ONE
                } else {
                    colors[ctx.random_index(colors.len())]
                };
                let size = ctx.random_range(MIN_SIZE, MAX_SIZE);
                let velocity = ctx.random_velocity(MAX_DRIFT_SPEED);
                Particle {
                    position,
                    velocity,
                    color,
                    size,
                }
            })
            .collect();

        Self { particles }
    }

    /// Wrap an explicit population, e.g. fixed seed positions.
    pub fn from_particles(particles: Vec<Particle>) -> Self {
        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Advance a copy of the field by one frame. Does not touch `self`.
    ///
    /// `pointer` is in normalized coordinates (-1 to 1 on each axis);
    /// `elapsed` is seconds since the field started.
    pub fn step(&self, pointer: Vec2, elapsed: f32) -> Self {
        let mut next = self.clone();
        next.advance(pointer, elapsed);
        next
    }

    /// Advance the field in place by one frame. Same rule as [`step`](Self::step).
    pub fn advance(&mut self, pointer: Vec2, elapsed: f32) {
        let target = pointer_target(pointer);
        for p in &mut self.particles {
            *p = step_particle(*p, target, elapsed);
        }
    }
}

/// Oscillatory drift for a particle at `position` at time `t`.
pub fn wave_drift(position: Vec3, t: f32) -> Vec3 {
    Vec3::new(
        (0.3 * t + 0.1 * position.x).sin() * 0.01,
        (0.5 * t + 0.1 * position.y).cos() * 0.01,
        (0.7 * t + 0.1 * position.z).sin() * 0.005,
    )
}

/// World-space attraction target for a normalized pointer. Z is always 0.
pub fn pointer_target(pointer: Vec2) -> Vec3 {
    (pointer * POINTER_WORLD_SCALE).extend(0.0)
}

/// Pull strength at `distance` from the target: linear from
/// [`ATTRACTION_STRENGTH`] at 0 down to 0 at [`ATTRACTION_RADIUS`].
pub fn attraction_magnitude(distance: f32) -> f32 {
    if distance >= ATTRACTION_RADIUS {
        0.0
    } else {
        (ATTRACTION_RADIUS - distance) / ATTRACTION_RADIUS * ATTRACTION_STRENGTH
    }
}

/// Displacement toward `target` for a particle at `position`.
///
/// A particle sitting exactly on the target has no direction to move in, so
/// its pull is zero even though the magnitude is at its maximum.
pub fn pointer_pull(position: Vec3, target: Vec3) -> Vec3 {
    let offset = target - position;
    let distance = offset.length();
    let magnitude = attraction_magnitude(distance);
    if magnitude == 0.0 {
        return Vec3::ZERO;
    }
    offset.normalize_or_zero() * magnitude
}

/// Reverse each velocity component whose position axis is past [`BOUNDARY`].
pub fn reflect_at_boundary(position: Vec3, velocity: Vec3) -> Vec3 {
    let flip = |p: f32, v: f32| if p.abs() > BOUNDARY { -v } else { v };
    Vec3::new(
        flip(position.x, velocity.x),
        flip(position.y, velocity.y),
        flip(position.z, velocity.z),
    )
}

/// Rigid rotation of the whole field (about X, about Y) at time `t`.
pub fn field_rotation(t: f32) -> Vec2 {
    ROTATION_RATE * t
}

/// One frame of the update rule for a single particle.
pub fn step_particle(mut p: Particle, target: Vec3, t: f32) -> Particle {
    p.position += p.velocity + wave_drift(p.position, t);
    p.position += pointer_pull(p.position, target);
    p.velocity = reflect_at_boundary(p.position, p.velocity);
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_initialize_count_and_ranges() {
        let palette = Palette::default();
        let mut ctx = SpawnContext::seeded(1);
        let field = ParticleField::initialize(2000, &palette, &mut ctx);

        assert_eq!(field.len(), 2000);
        for p in field.particles() {
            let r = p.position.length();
            assert!(r >= SHELL_INNER_RADIUS - 1e-3 && r <= SHELL_OUTER_RADIUS + 1e-3);
            assert!(palette.contains(p.color));
            assert!(p.size >= MIN_SIZE && p.size <= MAX_SIZE);
            assert!(p.velocity.abs().max_element() <= MAX_DRIFT_SPEED);
        }
    }

    #[test]
    fn test_every_palette_entry_is_used() {
        let palette = Palette::default();
        let mut ctx = SpawnContext::seeded(2);
        let field = ParticleField::initialize(600, &palette, &mut ctx);
        for c in palette.colors() {
            assert!(field.particles().iter().any(|p| p.color == *c));
        }
    }

    #[test]
    fn test_wave_drift_at_origin() {
        let w = wave_drift(Vec3::ZERO, 0.0);
        assert!(approx(w.x, 0.0));
        assert!(approx(w.y, 0.01));
        assert!(approx(w.z, 0.0));
    }

    #[test]
    fn test_wave_drift_coefficients() {
        // sin(0.3t + 0.1x) * 0.01, cos(0.5t + 0.1y) * 0.01, sin(0.7t + 0.1z) * 0.005
        let w = wave_drift(Vec3::new(3.0, -4.0, 5.0), 2.0);
        assert!((w.x - 0.007_833_269).abs() < 1e-7);
        assert!((w.y - 0.008_253_356).abs() < 1e-7);
        assert!((w.z - 0.004_731_500).abs() < 1e-7);

        let w = wave_drift(Vec3::new(30.0, 0.0, -6.0), 1.5);
        assert!((w.x + 0.003_035_415).abs() < 1e-7);
        assert!((w.y - 0.007_316_889).abs() < 1e-7);
        assert!((w.z - 0.002_174_828).abs() < 1e-7);
    }

    #[test]
    fn test_step_particle_drift_with_velocity() {
        // Far from the pointer, so only velocity and drift apply
        let p = Particle::new(Vec3::new(3.0, -4.0, 5.0), Vec3::new(0.002, -0.001, 0.003));
        let next = step_particle(p, Vec3::new(30.0, 30.0, 0.0), 2.0);
        assert!((next.position.x - (3.0 + 0.002 + 0.007_833_269)).abs() < 1e-5);
        assert!((next.position.y - (-4.0 - 0.001 + 0.008_253_356)).abs() < 1e-5);
        assert!((next.position.z - (5.0 + 0.003 + 0.004_731_500)).abs() < 1e-5);
        assert_eq!(next.velocity, p.velocity);
    }

    #[test]
    fn test_pointer_target_scaling() {
        assert_eq!(pointer_target(Vec2::new(1.0, -0.5)), Vec3::new(30.0, -15.0, 0.0));
        assert_eq!(pointer_target(Vec2::ZERO), Vec3::ZERO);
    }

    #[test]
    fn test_attraction_magnitude_falloff() {
        assert!(approx(attraction_magnitude(0.0), 0.1));
        assert!(approx(attraction_magnitude(7.5), 0.05));
        assert!(approx(attraction_magnitude(10.0), 0.1 / 3.0));
        assert_eq!(attraction_magnitude(15.0), 0.0);
        assert_eq!(attraction_magnitude(40.0), 0.0);
    }

    #[test]
    fn test_pointer_pull_direction() {
        let pull = pointer_pull(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO);
        assert!(approx(pull.x, -(5.0 / 15.0) * 0.1));
        assert!(approx(pull.y, 0.0));
        assert!(approx(pull.z, 0.0));
    }

    #[test]
    fn test_pointer_pull_at_target_is_zero() {
        let target = Vec3::new(3.0, -2.0, 0.0);
        assert_eq!(pointer_pull(target, target), Vec3::ZERO);
    }

    #[test]
    fn test_pointer_pull_outside_radius() {
        assert_eq!(pointer_pull(Vec3::new(0.0, 15.0, 0.0), Vec3::ZERO), Vec3::ZERO);
        assert_eq!(pointer_pull(Vec3::new(30.0, 0.0, 0.0), Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn test_reflect_at_boundary() {
        let v = Vec3::new(0.01, -0.01, 0.005);
        assert_eq!(reflect_at_boundary(Vec3::new(26.0, 0.0, -30.0), v), Vec3::new(-0.01, -0.01, -0.005));
        assert_eq!(reflect_at_boundary(Vec3::new(25.0, 24.0, 0.0), v), v);
    }

    #[test]
    fn test_boundary_flip_after_step() {
        let field = ParticleField::from_particles(vec![Particle::new(
            Vec3::new(26.0, 0.0, 0.0),
            Vec3::new(0.01, 0.0, 0.0),
        )]);
        let next = field.step(Vec2::ZERO, 0.0);
        assert!(next.particles()[0].velocity.x < 0.0);
        assert!(approx(next.particles()[0].velocity.x, -0.01));
    }

    #[test]
    fn test_field_rotation() {
        let r = field_rotation(10.0);
        assert!(approx(r.x, 0.5));
        assert!(approx(r.y, 0.3));
        assert_eq!(field_rotation(0.0), Vec2::ZERO);
    }

    #[test]
    fn test_step_is_pure() {
        let mut ctx = SpawnContext::seeded(8);
        let field = ParticleField::initialize(50, &Palette::default(), &mut ctx);
        let before = field.clone();
        let _ = field.step(Vec2::new(0.2, 0.1), 1.5);
        assert_eq!(field, before);
    }

    #[test]
    fn test_step_matches_advance() {
        let mut ctx = SpawnContext::seeded(8);
        let mut field = ParticleField::initialize(50, &Palette::default(), &mut ctx);
        let stepped = field.step(Vec2::new(-0.3, 0.4), 2.0);
        field.advance(Vec2::new(-0.3, 0.4), 2.0);
        assert_eq!(field, stepped);
    }

    #[test]
    fn test_color_and_size_never_change() {
        let mut ctx = SpawnContext::seeded(4);
        let mut field = ParticleField::initialize(100, &Palette::default(), &mut ctx);
        let original = field.clone();
        for frame in 0..200 {
            field.advance(Vec2::new(0.1, -0.2), frame as f32 / 60.0);
        }
        assert_eq!(field.len(), original.len());
        for (a, b) in field.particles().iter().zip(original.particles()) {
            assert_eq!(a.color, b.color);
            assert_eq!(a.size, b.size);
        }
    }
}
