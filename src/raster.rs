//! Text rasterization into target points.
//!
//! A string is drawn centered into an offscreen [`GrayAlphaImage`] the size of
//! the surface, then the image is scanned on a grid of `stride` pixels. Every
//! grid pixel that is more than half covered becomes a candidate, and a seeded
//! coin flip with `keep_probability` thins the candidates so the formed text
//! looks organic rather than like a lattice.
//!
//! ```text
//!   "HI" ──> draw centered ──> scan every `stride` px ──> alpha > threshold?
//!                                                            │
//!                                            rng < keep_probability?
//!                                                            │
//!                                                 TargetPoint { position, color }
//! ```
//!
//! All randomness comes from the caller's `SmallRng`, so a fixed seed always
//! produces the same point set for the same text and surface size.

use crate::color::{ColorMode, Palette};
use crate::font::GlyphSource;
use glam::{Vec2, Vec3};
use image::{GrayAlphaImage, LumaA};
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest surface edge the rasterizer will allocate a buffer for.
pub const MAX_SURFACE_EDGE: u32 = 16_384;

/// How the sampling grid spacing is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum StridePolicy {
    /// Always sample every `step` pixels.
    Fixed { step: u32 },

    /// `max(min, width / divisor)`, so wide surfaces don't explode the
    /// particle count.
    Responsive { min: u32, divisor: u32 },
}

impl Default for StridePolicy {
    fn default() -> Self {
        StridePolicy::Fixed { step: 4 }
    }
}

impl StridePolicy {
    /// Grid spacing for a surface of `width` pixels. Never less than 1.
    pub fn stride_for(&self, width: u32) -> u32 {
        match *self {
            StridePolicy::Fixed { step } => step.max(1),
            StridePolicy::Responsive { min, divisor } => {
                let scaled = if divisor == 0 { 0 } else { width / divisor };
                scaled.max(min).max(1)
            }
        }
    }
}

/// Rasterizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Text to form. `\n` starts a new line.
    pub text: String,
    pub stride: StridePolicy,
    /// Upper bound on the font size in pixels.
    pub max_font_size: f32,
    /// Font size is `width / (chars * width_factor)` before the cap.
    pub width_factor: f32,
    /// Minimum coverage (0-255, exclusive) for a pixel to count as ink.
    pub alpha_threshold: u8,
    /// Chance that an inked grid pixel becomes a particle.
    pub keep_probability: f32,
    /// Seed for every random draw in rasterization and pool construction.
    pub seed: u64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            text: "HELLO".to_string(),
            stride: StridePolicy::default(),
            max_font_size: 120.0,
            width_factor: 0.7,
            alpha_threshold: 128,
            keep_probability: 0.75,
            seed: 0x7e57_5a12,
        }
    }
}

/// A point sampled from the rasterized text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPoint {
    pub position: Vec2,
    pub color: Vec3,
}

/// Result of one rasterization pass.
#[derive(Debug, Clone, Default)]
pub struct Rasterization {
    pub points: Vec<TargetPoint>,
    pub font_size: f32,
    pub stride: u32,
}

impl Rasterization {
    /// Center of the sampled points' bounding box, if there are any.
    pub fn center(&self) -> Option<Vec2> {
        let first = self.points.first()?.position;
        let (min, max) = self
            .points
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(p.position), hi.max(p.position)));
        Some((min + max) * 0.5)
    }
}

/// Font size that fits `text` across `width`, capped at `max_font_size`.
///
/// The longest line decides; an empty string gets the cap.
pub fn font_size_for(text: &str, width: u32, config: &RasterConfig) -> f32 {
    let chars = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    if chars == 0 || config.width_factor <= 0.0 {
        return config.max_font_size;
    }
    let fit = width as f32 / (chars as f32 * config.width_factor);
    fit.min(config.max_font_size).max(1.0)
}

/// Whether a surface of this size can be rendered into.
pub fn surface_available(width: u32, height: u32) -> bool {
    width > 0 && height > 0 && width <= MAX_SURFACE_EDGE && height <= MAX_SURFACE_EDGE
}

/// Draw `text` centered (middle baseline) into a new coverage buffer.
///
/// Returns `None` when the surface is unavailable.
pub fn render_text(
    glyphs: &dyn GlyphSource,
    text: &str,
    width: u32,
    height: u32,
    px: f32,
) -> Option<GrayAlphaImage> {
    if !surface_available(width, height) {
        return None;
    }

    let mut image = GrayAlphaImage::new(width, height);
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return Some(image);
    }

    let metrics = glyphs.line_metrics(px);
    let line_height = metrics.height();
    let block_height = line_height * lines.len() as f32;
    let mut line_top = (height as f32 - block_height) * 0.5;

    for line in lines {
        let line_width = glyphs.measure(line, px);
        let mut pen_x = (width as f32 - line_width) * 0.5;

        for ch in line.chars() {
            let glyph = glyphs.glyph(ch, px);
            let gx = (pen_x + glyph.left).round() as i64;
            let gy = (line_top + glyph.top).round() as i64;

            for y in 0..glyph.height {
                let py = gy + y as i64;
                if py < 0 || py >= height as i64 {
                    continue;
                }
                for x in 0..glyph.width {
                    let px_x = gx + x as i64;
                    if px_x < 0 || px_x >= width as i64 {
                        continue;
                    }
                    let c = glyph.coverage_at(x, y);
                    if c == 0 {
                        continue;
                    }
                    let pixel = image.get_pixel_mut(px_x as u32, py as u32);
                    // Overlapping glyphs keep the stronger coverage
                    if c > pixel.0[1] {
                        *pixel = LumaA([255, c]);
                    }
                }
            }

            pen_x += glyph.advance;
        }

        line_top += line_height;
    }

    Some(image)
}

/// Scan `image` every `stride` pixels and emit thinned, colored points.
pub fn sample_points(
    image: &GrayAlphaImage,
    stride: u32,
    config: &RasterConfig,
    palette: &Palette,
    mode: ColorMode,
    rng: &mut SmallRng,
) -> Vec<TargetPoint> {
    let stride = stride.max(1) as usize;
    let (w, h) = image.dimensions();
    let mut points = Vec::new();

    for y in (0..h).step_by(stride) {
        for x in (0..w).step_by(stride) {
            if image.get_pixel(x, y).0[1] <= config.alpha_threshold {
                continue;
            }
            if rng.gen::<f32>() >= config.keep_probability {
                continue;
            }
            let x_frac = x as f32 / w as f32;
            points.push(TargetPoint {
                position: Vec2::new(x as f32, y as f32),
                color: palette.color_for(mode, x_frac, rng),
            });
        }
    }

    points
}

/// Rasterize `config.text` for a `width` x `height` surface.
///
/// An unavailable surface yields an empty point set and a warning; it never
/// fails.
pub fn rasterize(
    config: &RasterConfig,
    glyphs: &dyn GlyphSource,
    palette: &Palette,
    mode: ColorMode,
    width: u32,
    height: u32,
    rng: &mut SmallRng,
) -> Rasterization {
    let font_size = font_size_for(&config.text, width, config);
    let stride = config.stride.stride_for(width);

    let Some(image) = render_text(glyphs, &config.text, width, height, font_size) else {
        log::warn!(
            "Rendering surface {}x{} unavailable, formation will be empty",
            width,
            height
        );
        return Rasterization {
            points: Vec::new(),
            font_size,
            stride,
        };
    };

    let points = sample_points(&image, stride, config, palette, mode, rng);
    log::debug!(
        "Rasterized {:?} at {:.1}px, stride {}: {} points",
        config.text,
        font_size,
        stride,
        points.len()
    );

    Rasterization {
        points,
        font_size,
        stride,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BitmapFont;
    use rand::SeedableRng;

    fn run(config: &RasterConfig, w: u32, h: u32) -> Rasterization {
        let mut rng = SmallRng::seed_from_u64(config.seed);
        rasterize(
            config,
            &BitmapFont,
            &Palette::ocean(),
            ColorMode::Gradient,
            w,
            h,
            &mut rng,
        )
    }

    #[test]
    fn test_stride_policies() {
        assert_eq!(StridePolicy::Fixed { step: 0 }.stride_for(800), 1);
        assert_eq!(StridePolicy::Fixed { step: 5 }.stride_for(800), 5);
        let responsive = StridePolicy::Responsive { min: 3, divisor: 200 };
        assert_eq!(responsive.stride_for(400), 3);
        assert_eq!(responsive.stride_for(1600), 8);
        assert_eq!(StridePolicy::Responsive { min: 0, divisor: 0 }.stride_for(10), 1);
    }

    #[test]
    fn test_font_size_policy() {
        let config = RasterConfig::default();
        // 5 chars across 350px: 350 / 3.5 = 100
        assert!((font_size_for("HELLO", 350, &config) - 100.0).abs() < 1e-4);
        // Wide surface hits the cap
        assert_eq!(font_size_for("HI", 4000, &config), 120.0);
        // Longest line decides
        assert!((font_size_for("A\nHELLO", 350, &config) - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_render_is_centered() {
        let image = render_text(&BitmapFont, "I", 100, 100, 100.0).unwrap();
        // 'I' is 50x70 at 100px, pen starts at 20; the stem covers x 40..50
        assert!(image.get_pixel(45, 50).0[1] > 0);
        assert_eq!(image.get_pixel(55, 50).0[1], 0);
        assert_eq!(image.get_pixel(2, 2).0[1], 0);
    }

    #[test]
    fn test_same_seed_same_points() {
        let config = RasterConfig::default();
        let a = run(&config, 400, 200);
        let b = run(&config, 400, 200);
        assert!(!a.points.is_empty());
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn test_different_seed_thins_differently() {
        let a = run(&RasterConfig::default(), 400, 200);
        let b = run(
            &RasterConfig {
                seed: 12345,
                ..Default::default()
            },
            400,
            200,
        );
        assert_ne!(a.points, b.points);
    }

    #[test]
    fn test_keep_probability_bounds() {
        let all = run(
            &RasterConfig {
                keep_probability: 1.0,
                ..Default::default()
            },
            400,
            200,
        );
        let none = run(
            &RasterConfig {
                keep_probability: 0.0,
                ..Default::default()
            },
            400,
            200,
        );
        assert!(!all.points.is_empty());
        assert!(none.points.is_empty());

        let thinned = run(&RasterConfig::default(), 400, 200);
        assert!(thinned.points.len() < all.points.len());
    }

    #[test]
    fn test_points_lie_on_grid() {
        let config = RasterConfig {
            stride: StridePolicy::Fixed { step: 6 },
            ..Default::default()
        };
        let r = run(&config, 300, 150);
        assert_eq!(r.stride, 6);
        for p in &r.points {
            assert_eq!(p.position.x as u32 % 6, 0);
            assert_eq!(p.position.y as u32 % 6, 0);
        }
    }

    #[test]
    fn test_unavailable_surface_is_empty() {
        let config = RasterConfig::default();
        assert!(run(&config, 0, 200).points.is_empty());
        assert!(run(&config, 400, 0).points.is_empty());
        assert!(run(&config, MAX_SURFACE_EDGE + 1, 10).points.is_empty());
    }

    #[test]
    fn test_blank_text_is_empty() {
        let config = RasterConfig {
            text: "   ".to_string(),
            ..Default::default()
        };
        assert!(run(&config, 400, 200).points.is_empty());
        let empty = RasterConfig {
            text: String::new(),
            ..Default::default()
        };
        assert!(run(&empty, 400, 200).points.is_empty());
    }

    #[test]
    fn test_center_near_surface_center() {
        let r = run(&RasterConfig::default(), 400, 200);
        let c = r.center().unwrap();
        assert!((c.x - 200.0).abs() < 20.0);
        assert!((c.y - 100.0).abs() < 20.0);
    }
}
