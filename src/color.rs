//! Color parsing and palettes for particle tinting.
//!
//! Colors are plain `Vec3` RGB triples in `0.0..=1.0`, the same convention the
//! rest of the engine uses for anything that ends up on the canvas.
//!
//! # Usage
//!
//! ```ignore
//! let palette = Palette::from_hex(&["#3b82f6", "#8b5cf6", "#06b6d4"])?;
//!
//! // Gradient across the text, left to right
//! let c = palette.sample(x / width);
//!
//! // Random pick (seeded)
//! let c = palette.pick(&mut rng);
//! ```

use crate::error::ConfigError;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Pure white, used for highlights and the accent color mode.
pub const WHITE: Vec3 = Vec3::ONE;

/// Parse `#rgb` or `#rrggbb` (the leading `#` is optional).
pub fn parse_hex(s: &str) -> Result<Vec3, ConfigError> {
    let hex = s.trim().trim_start_matches('#');
    let bad = || ConfigError::InvalidColor(s.to_string());

    let channel = |range: std::ops::Range<usize>| -> Result<u8, ConfigError> {
        let digits = hex.get(range).ok_or_else(bad)?;
        u8::from_str_radix(digits, 16).map_err(|_| bad())
    };

    let (r, g, b) = match hex.len() {
        3 => {
            // #abc expands to #aabbcc
            let r = channel(0..1)?;
            let g = channel(1..2)?;
            let b = channel(2..3)?;
            (r * 17, g * 17, b * 17)
        }
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        _ => return Err(bad()),
    };

    Ok(Vec3::new(r as f32, g as f32, b as f32) / 255.0)
}

/// Convert an RGB triple to 8-bit channels, clamping out-of-range values.
#[inline]
pub fn to_rgb8(c: Vec3) -> [u8; 3] {
    let c = c.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
    [c.x.round() as u8, c.y.round() as u8, c.z.round() as u8]
}

/// Convert HSV to RGB.
///
/// * `h` - 0.0 to 1.0 (wraps)
/// * `s` - 0.0 (gray) to 1.0 (vivid)
/// * `v` - 0.0 (black) to 1.0 (bright)
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    let c = v * s;
    let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h * 6.0) as u32 % 6 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Vec3::new(r + m, g + m, b + m)
}

/// How target points pick their color during rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ColorMode {
    /// Interpolate through the palette by horizontal position (default).
    #[default]
    Gradient,

    /// Seeded random pick from the palette per particle.
    Palette,

    /// Mostly white, with a seeded chance of a palette accent.
    Accent {
        /// Probability (0-1) that a particle takes a palette color.
        chance: f32,
    },

    /// Full hue sweep left to right. Ignores the palette.
    Spectrum { saturation: f32, value: f32 },
}

/// An ordered list of color stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    stops: Vec<Vec3>,
}

impl Palette {
    /// Build a palette from RGB stops. Empty input falls back to white.
    pub fn new(stops: Vec<Vec3>) -> Self {
        if stops.is_empty() {
            return Self { stops: vec![WHITE] };
        }
        Self { stops }
    }

    /// Parse a palette from hex strings.
    pub fn from_hex<S: AsRef<str>>(colors: &[S]) -> Result<Self, ConfigError> {
        if colors.is_empty() {
            return Err(ConfigError::invalid("colors.palette", "needs at least one color"));
        }
        let stops = colors
            .iter()
            .map(|c| parse_hex(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { stops })
    }

    /// The blue set used by the text-reveal component.
    pub fn ocean() -> Self {
        Self::new(vec![
            Vec3::new(0.231, 0.510, 0.965), // #3b82f6
            Vec3::new(0.376, 0.647, 0.980), // #60a5fa
            Vec3::new(0.576, 0.773, 0.992), // #93c5fd
            Vec3::new(0.145, 0.388, 0.922), // #2563eb
            WHITE,
        ])
    }

    /// Number of stops.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Always false; a palette holds at least one stop.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Color stops in order.
    pub fn stops(&self) -> &[Vec3] {
        &self.stops
    }

    /// Sample the palette as a gradient at `t` in `0.0..=1.0`.
    pub fn sample(&self, t: f32) -> Vec3 {
        if self.stops.len() == 1 {
            return self.stops[0];
        }
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let scaled = t * (self.stops.len() - 1) as f32;
        let i = (scaled.floor() as usize).min(self.stops.len() - 2);
        let frac = scaled - i as f32;
        self.stops[i].lerp(self.stops[i + 1], frac)
    }

    /// Pick a stop uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        self.stops[rng.gen_range(0..self.stops.len())]
    }

    /// Resolve a color for a point at horizontal fraction `x_frac`.
    pub fn color_for<R: Rng + ?Sized>(&self, mode: ColorMode, x_frac: f32, rng: &mut R) -> Vec3 {
        match mode {
            ColorMode::Gradient => self.sample(x_frac),
            ColorMode::Palette => self.pick(rng),
            ColorMode::Accent { chance } => {
                if rng.gen::<f32>() < chance {
                    self.pick(rng)
                } else {
                    WHITE
                }
            }
            ColorMode::Spectrum { saturation, value } => {
                let t = if x_frac.is_finite() { x_frac.clamp(0.0, 1.0) } else { 0.0 };
                // Stop short of a full turn so both ends don't read as red
                hsv_to_rgb(t * 0.85, saturation, value)
            }
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::ocean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_hex_long_and_short() {
        let c = parse_hex("#3b82f6").unwrap();
        assert_eq!(to_rgb8(c), [0x3b, 0x82, 0xf6]);

        let short = parse_hex("fff").unwrap();
        assert_eq!(to_rgb8(short), [255, 255, 255]);
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#gggggg").is_err());
        assert!(parse_hex("").is_err());
    }

    #[test]
    fn test_hsv_to_rgb() {
        // Red
        let red = hsv_to_rgb(0.0, 1.0, 1.0);
        assert!((red.x - 1.0).abs() < 0.001);
        assert!(red.y < 0.001);
        assert!(red.z < 0.001);
    }

    #[test]
    fn test_gradient_endpoints() {
        let palette = Palette::from_hex(&["#000000", "#ffffff"]).unwrap();
        assert_eq!(palette.sample(0.0), Vec3::ZERO);
        assert_eq!(palette.sample(1.0), Vec3::ONE);
        let mid = palette.sample(0.5);
        assert!((mid.x - 0.5).abs() < 0.001);
        // Out of range clamps
        assert_eq!(palette.sample(7.0), Vec3::ONE);
    }

    #[test]
    fn test_seeded_picks_repeat() {
        let palette = Palette::ocean();
        let mut a = SmallRng::seed_from_u64(9);
        let mut b = SmallRng::seed_from_u64(9);
        for _ in 0..32 {
            assert_eq!(
                palette.color_for(ColorMode::Palette, 0.0, &mut a),
                palette.color_for(ColorMode::Palette, 0.0, &mut b)
            );
        }
    }

    #[test]
    fn test_accent_zero_chance_is_white() {
        let palette = Palette::ocean();
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..16 {
            let c = palette.color_for(ColorMode::Accent { chance: 0.0 }, 0.3, &mut rng);
            assert_eq!(c, WHITE);
        }
    }

    #[test]
    fn test_spectrum_sweeps_hue_by_position() {
        let palette = Palette::ocean();
        let mut rng = SmallRng::seed_from_u64(1);
        let mode = ColorMode::Spectrum {
            saturation: 1.0,
            value: 1.0,
        };

        let left = palette.color_for(mode, 0.0, &mut rng);
        assert_eq!(to_rgb8(left), [255, 0, 0]);
        let right = palette.color_for(mode, 1.0, &mut rng);
        assert_ne!(to_rgb8(right), to_rgb8(left));
        // Zero saturation is gray at the given value
        let gray = ColorMode::Spectrum {
            saturation: 0.0,
            value: 0.5,
        };
        assert_eq!(palette.color_for(gray, 0.4, &mut rng), Vec3::splat(0.5));
    }

    #[test]
    fn test_empty_palette_rejected() {
        let empty: [&str; 0] = [];
        assert!(Palette::from_hex(&empty).is_err());
    }
}
