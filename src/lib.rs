//! # Particle Backdrop
//!
//! A mouse-reactive 3D point cloud rendered behind other content.
//!
//! A fixed population of particles is spawned on a spherical shell. Every
//! display refresh the field drifts on a few slow waves, particles near the
//! pointer are pulled toward it, particles past the boundary turn around,
//! and the whole cloud slowly rotates. Points are drawn with additive
//! blending onto a transparent surface.
//!
//! ## Quick Start
//!
//! ```ignore
//! use particle_backdrop::prelude::*;
//!
//! fn main() -> Result<(), BackdropError> {
//!     particle_backdrop::window::run(BackdropConfig::default())
//! }
//! ```
//!
//! ## Embedding
//!
//! The backdrop talks to its environment only through the [`Host`] trait:
//! viewport size, one attached [`RenderSurface`], listener registration and
//! frame scheduling. [`window::WindowHost`] implements it for a winit
//! window; [`headless::HeadlessHost`] implements it without a GPU.
//!
//! ```ignore
//! let mut host = HeadlessHost::new(800, 600);
//! let mut backdrop = ParticleBackdrop::new(BackdropConfig::default());
//! backdrop.mount(Some(&mut host));
//!
//! while let Some(id) = host.take_due_frame() {
//!     backdrop.on_frame(&mut host, id);
//! #   break;
//! }
//!
//! backdrop.unmount(&mut host);
//! ```
//!
//! ## The update rule
//!
//! [`ParticleField::step`] is a pure function of the field, the normalized
//! pointer and elapsed seconds. See [`field`] for the individual terms.

mod backdrop;
pub mod config;
mod error;
pub mod field;
pub mod gpu;
pub mod headless;
mod host;
pub mod input;
pub mod scheduler;
pub mod spawn;
pub mod time;
pub mod visuals;
pub mod window;

pub use backdrop::{ParticleBackdrop, Phase};
pub use config::{BackdropConfig, RenderConfig};
pub use error::{BackdropError, ConfigError, GpuError, RenderError};
pub use field::{Particle, ParticleField};
pub use glam::{UVec2, Vec2, Vec3};
pub use host::{Host, RenderSurface};
pub use spawn::SpawnContext;
pub use visuals::{BlendMode, Palette};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use particle_backdrop::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backdrop::{ParticleBackdrop, Phase};
    pub use crate::config::{BackdropConfig, RenderConfig};
    pub use crate::error::{BackdropError, RenderError};
    pub use crate::field::{Particle, ParticleField};
    pub use crate::headless::HeadlessHost;
    pub use crate::host::{Host, RenderSurface};
    pub use crate::input::HostEvent;
    pub use crate::spawn::SpawnContext;
    pub use crate::visuals::{BlendMode, Palette};
    pub use crate::{UVec2, Vec2, Vec3};
}
