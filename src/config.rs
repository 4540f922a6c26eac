//! Backdrop configuration.
//!
//! Everything has a default matching the stock backdrop, so an empty TOML
//! file (or no file at all) is valid:
//!
//! ```toml
//! particle_count = 8000
//! seed = 7
//! palette = [0x3b82f6, 0x8b5cf6]
//!
//! [render]
//! opacity = 0.6
//! antialias = false
//! ```

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::visuals::{BlendMode, Palette, BLUE_VIOLET_HEX};

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration for one backdrop instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    /// Number of particles, fixed for the mounted lifetime.
    pub particle_count: usize,
    /// Seed for spawning. `None` seeds from the OS clock.
    pub seed: Option<u64>,
    /// Palette as `0xRRGGBB` sRGB values.
    pub palette: Vec<u32>,
    pub render: RenderConfig,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            particle_count: 5000,
            seed: None,
            palette: BLUE_VIOLET_HEX.to_vec(),
            render: RenderConfig::default(),
        }
    }
}

impl BackdropConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Override values from `BACKDROP_PARTICLE_COUNT` and `BACKDROP_SEED`.
    ///
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("BACKDROP_PARTICLE_COUNT") {
            if let Ok(count) = val.parse() {
                self.particle_count = count;
            }
        }
        if let Ok(val) = env::var("BACKDROP_SEED") {
            if let Ok(seed) = val.parse() {
                self.seed = Some(seed);
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.palette()?;
        if u32::try_from(self.particle_count).is_err() {
            return Err(ConfigError::Validation(format!(
                "particle_count {} does not fit a GPU draw call",
                self.particle_count
            )));
        }
        self.render.validate()
    }

    /// Build the palette described by `palette`.
    pub fn palette(&self) -> ConfigResult<Palette> {
        Palette::from_hex(&self.palette)
    }
}

/// Camera and point-material settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Camera distance from the origin along +Z.
    pub camera_distance: f32,
    /// Base point size. World-scaled when `size_attenuation` is on,
    /// pixels otherwise.
    pub point_size: f32,
    pub opacity: f32,
    pub size_attenuation: bool,
    pub blend: BlendMode,
    /// Request 4x multisampling when the surface format supports it.
    pub antialias: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            camera_distance: 25.0,
            point_size: 0.05,
            opacity: 0.8,
            size_attenuation: true,
            blend: BlendMode::Additive,
            antialias: true,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(ConfigError::Validation(format!(
                "fov_y_degrees must be in (0, 180), got {}",
                self.fov_y_degrees
            )));
        }
        if !(self.near > 0.0 && self.near < self.far) {
            return Err(ConfigError::Validation(format!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        if !(self.camera_distance > 0.0) {
            return Err(ConfigError::Validation(
                "camera_distance must be positive".into(),
            ));
        }
        if !(self.point_size > 0.0) {
            return Err(ConfigError::Validation("point_size must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::Validation(format!(
                "opacity must be in [0, 1], got {}",
                self.opacity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BackdropConfig::default();
        assert_eq!(config.particle_count, 5000);
        assert_eq!(config.palette.len(), 6);
        assert_eq!(config.render.fov_y_degrees, 75.0);
        assert_eq!(config.render.camera_distance, 25.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = BackdropConfig::from_toml_str("").unwrap();
        assert_eq!(config, BackdropConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = BackdropConfig::from_toml_str(
            r#"
            particle_count = 120
            seed = 9
            palette = [0xff0000, 0x00ff00]

            [render]
            opacity = 0.5
            blend = "alpha"
            "#,
        )
        .unwrap();

        assert_eq!(config.particle_count, 120);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.palette, vec![0xff0000, 0x00ff00]);
        assert_eq!(config.render.opacity, 0.5);
        assert_eq!(config.render.blend, BlendMode::Alpha);
        // Untouched fields keep their defaults
        assert_eq!(config.render.near, 0.1);
        assert!(config.render.antialias);
    }

    #[test]
    fn test_parse_error() {
        let err = BackdropConfig::from_toml_str("particle_count = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = BackdropConfig::default();
        config.render.opacity = 1.5;
        assert!(config.validate().is_err());

        let mut config = BackdropConfig::default();
        config.render.near = 2000.0;
        assert!(config.validate().is_err());

        let mut config = BackdropConfig::default();
        config.palette.clear();
        assert!(config.validate().is_err());

        let mut config = BackdropConfig::default();
        config.render.fov_y_degrees = 180.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_particles_is_allowed() {
        let config = BackdropConfig {
            particle_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
