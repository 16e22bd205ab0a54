//! Software renderer for the formation.
//!
//! Every frame is drawn from scratch into a [`Canvas`] (an `image::RgbaImage`
//! with a few blending primitives). The renderer holds no animation state of
//! its own: what it draws is fully determined by the particles' current
//! positions and sizes, the active ripples and the phase value.
//!
//! # Draw Order
//!
//! 1. Clear to the background color
//! 2. Central glow (once the phase value passes `central_glow_threshold`)
//! 3. Connection lines between nearby particles
//! 4. Per particle: additive radial glow, core disc, off-center highlight
//! 5. Ripple rings: inner gradient plus a stroked edge
//!
//! Connection lines only look at a sampled subset of pairs: every
//! `connection_stride`-th particle against the next `connection_lookahead`
//! particles in scan order. Rasterization emits points row by row, so scan
//! order neighbours are mostly spatial neighbours too.

use crate::color::{to_rgb8, WHITE};
use crate::particle::Particle;
use crate::progress::Progress;
use crate::ripple::Ripple;
use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

// ========== Canvas ==========

/// How a drawn color combines with what is already on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Source-over alpha blending.
    Alpha,
    /// `dst += src * alpha`, saturating. The "lighter" composite.
    Additive,
}

#[inline]
fn blend_channel(dst: u8, src: f32, alpha: f32, mode: BlendMode) -> u8 {
    let d = dst as f32 / 255.0;
    let out = match mode {
        BlendMode::Alpha => d + (src - d) * alpha,
        BlendMode::Additive => d + src * alpha,
    };
    (out.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// An opaque RGBA pixel buffer with the primitives the renderer needs.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Reallocate for a new size. Contents are cleared to black.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width() != width || self.height() != height {
            self.image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        }
    }

    /// Fill with a solid color.
    pub fn clear(&mut self, color: Vec3) {
        let [r, g, b] = to_rgb8(color);
        for p in self.image.pixels_mut() {
            *p = Rgba([r, g, b, 255]);
        }
    }

    /// Blend one pixel. Out-of-bounds coordinates are ignored.
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Vec3, alpha: f32, mode: BlendMode) {
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return;
        }
        if alpha <= 0.0 {
            return;
        }
        let alpha = alpha.min(1.0);
        let p = self.image.get_pixel_mut(x as u32, y as u32);
        p.0[0] = blend_channel(p.0[0], color.x, alpha, mode);
        p.0[1] = blend_channel(p.0[1], color.y, alpha, mode);
        p.0[2] = blend_channel(p.0[2], color.z, alpha, mode);
    }

    /// Visit every pixel center within `radius` of `center`, passing its
    /// distance from the center.
    fn for_each_in_radius(
        &mut self,
        center: Vec2,
        radius: f32,
        mut f: impl FnMut(&mut Self, i32, i32, f32),
    ) {
        if radius <= 0.0 {
            return;
        }
        let x0 = (center.x - radius).floor().max(0.0) as i32;
        let y0 = (center.y - radius).floor().max(0.0) as i32;
        let x1 = ((center.x + radius).ceil() as i32).min(self.width() as i32 - 1);
        let y1 = ((center.y + radius).ceil() as i32).min(self.height() as i32 - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
                if d <= radius {
                    f(self, x, y, d);
                }
            }
        }
    }

    /// Antialiased solid disc.
    pub fn fill_disc(&mut self, center: Vec2, radius: f32, color: Vec3, alpha: f32, mode: BlendMode) {
        // Pad so the half-pixel antialias ramp on the edge is visited
        let reach = radius + 0.5;
        self.for_each_in_radius(center, reach, |c, x, y, d| {
            let coverage = (radius - d + 0.5).clamp(0.0, 1.0);
            c.blend_pixel(x, y, color, alpha * coverage, mode);
        });
    }

    /// Radial gradient from `alpha` at the center to 0 at `radius`.
    pub fn radial_glow(&mut self, center: Vec2, radius: f32, color: Vec3, alpha: f32, mode: BlendMode) {
        self.for_each_in_radius(center, radius, |c, x, y, d| {
            let t = 1.0 - d / radius;
            c.blend_pixel(x, y, color, alpha * t * t, mode);
        });
    }

    /// Ring of `width` pixels centered on `radius`.
    pub fn stroke_ring(
        &mut self,
        center: Vec2,
        radius: f32,
        width: f32,
        color: Vec3,
        alpha: f32,
        mode: BlendMode,
    ) {
        let half = width.max(0.5) * 0.5;
        self.for_each_in_radius(center, radius + half + 0.5, |c, x, y, d| {
            let coverage = (half - (d - radius).abs() + 0.5).clamp(0.0, 1.0);
            c.blend_pixel(x, y, color, alpha * coverage, mode);
        });
    }

    /// Gradient band inside a ring: `alpha` at `radius`, fading to 0 at
    /// `radius - depth`.
    pub fn inner_ring_glow(
        &mut self,
        center: Vec2,
        radius: f32,
        depth: f32,
        color: Vec3,
        alpha: f32,
        mode: BlendMode,
    ) {
        if depth <= 0.0 {
            return;
        }
        let inner = radius - depth;
        self.for_each_in_radius(center, radius, |c, x, y, d| {
            if d < inner {
                return;
            }
            let t = (d - inner) / depth;
            c.blend_pixel(x, y, color, alpha * t, mode);
        });
    }

    /// One-pixel line with linear stepping.
    pub fn line(&mut self, a: Vec2, b: Vec2, color: Vec3, alpha: f32, mode: BlendMode) {
        let delta = b - a;
        let steps = delta.abs().max_element().ceil().max(1.0) as i32;
        let inc = delta / steps as f32;
        let mut p = a;
        for _ in 0..=steps {
            self.blend_pixel(p.x.floor() as i32, p.y.floor() as i32, color, alpha, mode);
            p += inc;
        }
    }
}

// ========== Renderer ==========

/// What and how to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub background: Vec3,
    /// Glow radius as a multiple of particle size.
    pub glow_scale: f32,
    pub glow_alpha: f32,
    pub core_alpha: f32,
    /// Draw the off-center white highlight.
    pub highlight: bool,
    /// Highlight radius as a fraction of particle size.
    pub highlight_scale: f32,
    pub connections: bool,
    /// Longest connection line in pixels.
    pub connection_distance: f32,
    pub connection_stride: usize,
    pub connection_lookahead: usize,
    pub connection_alpha: f32,
    pub ripple_rings: bool,
    pub ring_width: f32,
    /// Depth of the gradient inside each ring in pixels.
    pub ring_glow_depth: f32,
    pub central_glow: bool,
    /// Central glow radius as a fraction of the smaller surface edge.
    pub central_glow_radius: f32,
    /// Phase value at which the central glow starts.
    pub central_glow_threshold: f32,
    pub central_glow_alpha: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: Vec3::new(0.02, 0.03, 0.07),
            glow_scale: 4.0,
            glow_alpha: 0.35,
            core_alpha: 0.9,
            highlight: true,
            highlight_scale: 0.3,
            connections: true,
            connection_distance: 30.0,
            connection_stride: 3,
            connection_lookahead: 7,
            connection_alpha: 0.25,
            ripple_rings: true,
            ring_width: 2.0,
            ring_glow_depth: 24.0,
            central_glow: true,
            central_glow_radius: 0.45,
            central_glow_threshold: 0.4,
            central_glow_alpha: 0.25,
        }
    }
}

impl RenderConfig {
    pub fn with_background(mut self, color: Vec3) -> Self {
        self.background = color;
        self
    }

    pub fn with_connections(mut self, enabled: bool) -> Self {
        self.connections = enabled;
        self
    }

    pub fn with_ripple_rings(mut self, enabled: bool) -> Self {
        self.ripple_rings = enabled;
        self
    }

    pub fn with_central_glow(mut self, enabled: bool) -> Self {
        self.central_glow = enabled;
        self
    }
}

/// Everything one frame is drawn from.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub particles: &'a [Particle],
    pub ripples: &'a [Ripple],
    pub progress: Progress,
    /// Center of the formation, for the central glow.
    pub center: Vec2,
    /// Tint for the central glow and ripple rings.
    pub accent: Vec3,
}

/// Draws scenes. Stateless; one instance can serve any number of engines.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Draw `scene` onto `canvas`, replacing its previous contents.
    pub fn draw(&self, canvas: &mut Canvas, scene: &Scene<'_>) {
        canvas.clear(self.config.background);

        if self.config.central_glow {
            self.draw_central_glow(canvas, scene);
        }
        if self.config.connections {
            self.draw_connections(canvas, scene);
        }
        for p in scene.particles {
            self.draw_particle(canvas, p);
        }
        if self.config.ripple_rings {
            for r in scene.ripples {
                self.draw_ripple(canvas, r, scene.accent);
            }
        }
    }

    fn draw_central_glow(&self, canvas: &mut Canvas, scene: &Scene<'_>) {
        let threshold = self.config.central_glow_threshold;
        let phase = scene.progress.value;
        if phase <= threshold || threshold >= 1.0 {
            return;
        }
        let intensity = (phase - threshold) / (1.0 - threshold);
        let radius = canvas.width().min(canvas.height()) as f32 * self.config.central_glow_radius;
        canvas.radial_glow(
            scene.center,
            radius,
            scene.accent,
            intensity * self.config.central_glow_alpha,
            BlendMode::Additive,
        );
    }

    fn draw_connections(&self, canvas: &mut Canvas, scene: &Scene<'_>) {
        let phase = scene.progress.value;
        if phase <= 0.5 {
            return;
        }
        let strength = (phase - 0.5) * 2.0 * self.config.connection_alpha;
        let max_d = self.config.connection_distance;
        let max_d_sq = max_d * max_d;
        let particles = scene.particles;

        for i in (0..particles.len()).step_by(self.config.connection_stride.max(1)) {
            let a = &particles[i];
            let end = (i + 1 + self.config.connection_lookahead).min(particles.len());
            for b in &particles[i + 1..end] {
                let d_sq = a.position.distance_squared(b.position);
                if d_sq >= max_d_sq {
                    continue;
                }
                let alpha = (1.0 - d_sq.sqrt() / max_d) * strength;
                canvas.line(a.position, b.position, a.color, alpha, BlendMode::Additive);
            }
        }
    }

    fn draw_particle(&self, canvas: &mut Canvas, p: &Particle) {
        let size = p.size.max(0.1);
        canvas.radial_glow(
            p.position,
            size * self.config.glow_scale,
            p.color,
            self.config.glow_alpha,
            BlendMode::Additive,
        );
        canvas.fill_disc(p.position, size, p.color, self.config.core_alpha, BlendMode::Alpha);
        if self.config.highlight {
            let offset = Vec2::splat(-size * self.config.highlight_scale);
            canvas.fill_disc(
                p.position + offset,
                size * self.config.highlight_scale,
                WHITE,
                0.8,
                BlendMode::Alpha,
            );
        }
    }

    fn draw_ripple(&self, canvas: &mut Canvas, r: &Ripple, accent: Vec3) {
        let alpha = r.strength.clamp(0.0, 1.0);
        canvas.inner_ring_glow(
            r.origin,
            r.radius,
            self.config.ring_glow_depth.min(r.radius),
            accent,
            alpha * 0.15,
            BlendMode::Additive,
        );
        canvas.stroke_ring(
            r.origin,
            r.radius,
            self.config.ring_width,
            accent.lerp(WHITE, 0.5),
            alpha * 0.6,
            BlendMode::Additive,
        );
    }
}
