//! Colour palette and blending for the particle cloud.
//!
//! Colours are authored as sRGB hex values and stored as linear RGB. The
//! renderer draws into an sRGB surface, so the colours that reach the screen
//! match the hex values.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Cool blue and violet families, three shades each.
pub const BLUE_VIOLET_HEX: [u32; 6] = [
    0x3b82f6, // blue-500
    0x60a5fa, // blue-400
    0x93c5fd, // blue-300
    0x8b5cf6, // violet-500
    0xa855f7, // violet-400
    0xc084fc, // violet-300
];

/// A fixed set of colours particles draw from at spawn time.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Vec3>,
}

impl Palette {
    /// The default bicolour palette.
    pub fn blue_violet() -> Self {
        Self {
            colors: BLUE_VIOLET_HEX.iter().map(|&hex| hex_to_linear(hex)).collect(),
        }
    }

    /// Build a palette from `0xRRGGBB` values.
    pub fn from_hex(hex: &[u32]) -> Result<Self, ConfigError> {
        if hex.is_empty() {
            return Err(ConfigError::Validation("palette must not be empty".into()));
        }
        if let Some(bad) = hex.iter().find(|&&h| h > 0xff_ffff) {
            return Err(ConfigError::Validation(format!(
                "palette entry {bad:#x} is not a 24-bit colour"
            )));
        }
        Ok(Self {
            colors: hex.iter().map(|&h| hex_to_linear(h)).collect(),
        })
    }

    /// Linear RGB colours in palette order.
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Whether `color` is exactly one of the palette entries.
    pub fn contains(&self, color: Vec3) -> bool {
        self.colors.contains(&color)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::blue_violet()
    }
}

/// Convert a `0xRRGGBB` sRGB value to linear RGB in 0.0-1.0.
pub fn hex_to_linear(hex: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

/// How overlapping particles combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Colours add up, so dense regions glow brighter.
    #[default]
    Additive,

    /// Standard alpha blending.
    Alpha,
}

impl BlendMode {
    pub fn to_blend_state(self) -> wgpu::BlendState {
        match self {
            BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
            BlendMode::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette_has_six_entries() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 6);
        for c in palette.colors() {
            assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0);
        }
    }

    #[test]
    fn test_hex_to_linear_extremes() {
        assert_eq!(hex_to_linear(0x000000), Vec3::ZERO);
        let white = hex_to_linear(0xffffff);
        assert!((white - Vec3::ONE).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_palette_hues() {
        let palette = Palette::blue_violet();
        // Blue shades: blue dominates red. Violet shades: red exceeds green.
        for c in &palette.colors()[..3] {
            assert!(c.z > c.x);
        }
        for c in &palette.colors()[3..] {
            assert!(c.x > c.y);
        }
    }

    #[test]
    fn test_from_hex_rejects_empty_and_wide() {
        assert!(Palette::from_hex(&[]).is_err());
        assert!(Palette::from_hex(&[0x1_000000]).is_err());
        assert_eq!(Palette::from_hex(&[0xff0000]).unwrap().len(), 1);
    }
}
