//! Particle records and the pool that owns them.
//!
//! Particles are plain data in one contiguous `Vec`. Nothing points at
//! anything else: a particle's position is recomputed every tick from its own
//! fields plus the shared phase, pointer and ripple inputs.
//!
//! The pool is only ever replaced wholesale. When the text or the surface size
//! changes, [`ParticlePool::rebuild`] throws every particle away (including
//! in-flight disturbance and damage) and creates a fresh set from the new
//! target points.
//!
//! # Particle State
//!
//! | Field | Changes | Purpose |
//! |-------|---------|---------|
//! | `origin` | never | Assembled position from rasterization |
//! | `orbit` | never | Idle motion around the surface center |
//! | `disturbance` | every tick | Spring offset from pointer and ripple impulses |
//! | `loose` | on ripple hits | Detached float state, escalates with hit count |
//! | `position`, `size` | every tick | Output for the renderer |

use crate::color::Palette;
use crate::raster::TargetPoint;
use glam::{Vec2, Vec3};
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Most ripples that can be alive at once. Each particle keeps one contact
/// slot per ripple so a ripple band only counts as a hit once.
pub const MAX_RIPPLES: usize = 8;

/// Whether a particle belongs to the text or is background decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Text,
    Ambient,
}

/// Idle rotation around the pool center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orbit {
    /// Starting angle in radians.
    pub angle: f32,
    /// Distance from the pool center in pixels.
    pub radius: f32,
    /// Angular speed in radians per second (sign gives direction).
    pub speed: f32,
}

impl Orbit {
    /// Angle on the orbit at `time` seconds, folded into `[0, TAU)`.
    ///
    /// Folded in f64 so the angle keeps full precision however long the
    /// engine has been running.
    #[inline]
    pub fn angle_at(&self, time: f64) -> f32 {
        (self.angle as f64 + self.speed as f64 * time).rem_euclid(std::f64::consts::TAU) as f32
    }

    /// Position on the orbit at `time` seconds.
    #[inline]
    pub fn position(&self, center: Vec2, time: f64) -> Vec2 {
        center + Vec2::from_angle(self.angle_at(time)) * self.radius
    }
}

/// Spring offset from the assembled position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Disturbance {
    pub offset: Vec2,
    pub velocity: Vec2,
}

impl Disturbance {
    /// True once both offset and velocity are below `eps`.
    pub fn is_settled(&self, eps: f32) -> bool {
        self.offset.length_squared() < eps * eps && self.velocity.length_squared() < eps * eps
    }
}

/// Detachment state built up by ripple hits.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LooseState {
    /// Seconds of detachment left. Only active while positive.
    pub timer: f32,
    /// Angle of the float position around the assembled spot.
    pub angle: f32,
    /// Distance of the float position from the assembled spot.
    pub radius: f32,
    /// Drift fed by ripple kicks, decays every tick.
    pub velocity: Vec2,
    /// Ripple hits taken since the text last fell apart.
    pub hit_count: u32,
}

impl LooseState {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.timer > 0.0
    }
}

/// One sampled point of the text, or an ambient decoration.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub origin: Vec2,
    pub position: Vec2,
    pub orbit: Orbit,
    /// Parallax depth in pixels at full pointer offset.
    pub depth: f32,
    pub disturbance: Disturbance,
    pub loose: LooseState,
    /// Size before breathing.
    pub base_size: f32,
    /// Size after breathing, for the renderer.
    pub size: f32,
    pub color: Vec3,
    /// Per-particle offset of the breathing sine.
    pub pulse_phase: f32,
    pub kind: ParticleKind,
    /// Id of the last ripple in each slot (`id % MAX_RIPPLES`) that hit this
    /// particle. Ripple ids start at 1, so 0 means "none".
    pub contacts: [u64; MAX_RIPPLES],
}

impl Particle {
    /// A particle sitting on its orbit with no disturbance or damage.
    pub fn new(origin: Vec2, orbit: Orbit, center: Vec2) -> Self {
        Self {
            origin,
            position: orbit.position(center, 0.0),
            orbit,
            depth: 0.0,
            disturbance: Disturbance::default(),
            loose: LooseState::default(),
            base_size: 1.0,
            size: 1.0,
            color: Vec3::ONE,
            pulse_phase: 0.0,
            kind: ParticleKind::Text,
            contacts: [0; MAX_RIPPLES],
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.base_size = size;
        self.size = size;
        self
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_pulse_phase(mut self, phase: f32) -> Self {
        self.pulse_phase = phase;
        self
    }

    pub fn with_kind(mut self, kind: ParticleKind) -> Self {
        self.kind = kind;
        self
    }

    /// Record a ripple contact. Returns `true` the first time `ripple_id`
    /// touches this particle.
    #[inline]
    pub fn touch(&mut self, ripple_id: u64) -> bool {
        let slot = &mut self.contacts[(ripple_id % MAX_RIPPLES as u64) as usize];
        if *slot == ripple_id {
            return false;
        }
        *slot = ripple_id;
        true
    }

    /// Clear damage and detachment. Contacts are kept so a ripple that is
    /// still expanding cannot count twice.
    pub fn heal(&mut self) {
        self.loose = LooseState::default();
    }
}

/// Ranges used when scattering a new pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Decorative particles placed anywhere on the surface.
    pub ambient_count: usize,
    /// Text particle size range in pixels.
    pub size: (f32, f32),
    /// Ambient particles are this fraction of text particle size.
    pub ambient_size_scale: f32,
    /// Orbit radius range as a fraction of half the larger surface edge.
    pub orbit_radius: (f32, f32),
    /// Orbit angular speed range in radians per second.
    pub orbit_speed: (f32, f32),
    /// Parallax depth range in pixels.
    pub depth: (f32, f32),
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            ambient_count: 0,
            size: (1.2, 2.6),
            ambient_size_scale: 0.6,
            orbit_radius: (0.15, 0.9),
            orbit_speed: (0.05, 0.3),
            depth: (2.0, 12.0),
        }
    }
}

impl PoolConfig {
    pub fn with_ambient(mut self, count: usize) -> Self {
        self.ambient_count = count;
        self
    }
}

/// Uniform draw from `(lo, hi)`, tolerating `lo >= hi`.
fn range(rng: &mut SmallRng, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Owns every particle of one engine instance.
#[derive(Debug, Clone, Default)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    center: Vec2,
    surface: Vec2,
    text_count: usize,
}

impl ParticlePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole pool with particles for `points`, followed by
    /// `config.ambient_count` ambient particles.
    pub fn rebuild(
        &mut self,
        points: &[TargetPoint],
        surface: Vec2,
        config: &PoolConfig,
        palette: &Palette,
        rng: &mut SmallRng,
    ) {
        let center = surface * 0.5;
        let reach = surface.max_element() * 0.5;

        let scatter = |rng: &mut SmallRng, origin: Vec2, color: Vec3, size: f32| {
            let direction = if rng.gen::<bool>() { 1.0 } else { -1.0 };
            let orbit = Orbit {
                angle: rng.gen_range(0.0..TAU),
                radius: range(rng, config.orbit_radius) * reach,
                speed: range(rng, config.orbit_speed) * direction,
            };
            Particle::new(origin, orbit, center)
                .with_size(size)
                .with_color(color)
                .with_depth(range(rng, config.depth))
                .with_pulse_phase(rng.gen_range(0.0..TAU))
        };

        let mut particles = Vec::with_capacity(points.len() + config.ambient_count);

        for point in points {
            let size = range(rng, config.size);
            particles.push(scatter(&mut *rng, point.position, point.color, size));
        }

        for _ in 0..config.ambient_count {
            let origin = Vec2::new(
                rng.gen::<f32>() * surface.x,
                rng.gen::<f32>() * surface.y,
            );
            let color = palette.pick(rng);
            let size = range(rng, config.size) * config.ambient_size_scale;
            particles.push(scatter(&mut *rng, origin, color, size).with_kind(ParticleKind::Ambient));
        }

        log::debug!(
            "Rebuilt particle pool: {} text + {} ambient for {}x{}",
            points.len(),
            config.ambient_count,
            surface.x,
            surface.y
        );

        self.particles = particles;
        self.center = center;
        self.surface = surface;
        self.text_count = points.len();
    }

    /// Drop every particle.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.text_count = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Particles that came from the text.
    #[inline]
    pub fn text_count(&self) -> usize {
        self.text_count
    }

    /// Center the orbits rotate around.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    #[inline]
    pub fn surface(&self) -> Vec2 {
        self.surface
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn points(n: usize) -> Vec<TargetPoint> {
        (0..n)
            .map(|i| TargetPoint {
                position: Vec2::new(i as f32 * 4.0, 50.0),
                color: Vec3::new(0.2, 0.4, 1.0),
            })
            .collect()
    }

    #[test]
    fn test_orbit_position() {
        let orbit = Orbit {
            angle: 0.0,
            radius: 10.0,
            speed: std::f32::consts::PI,
        };
        let center = Vec2::new(100.0, 100.0);
        assert!((orbit.position(center, 0.0) - Vec2::new(110.0, 100.0)).length() < 1e-4);
        assert!((orbit.position(center, 1.0) - Vec2::new(90.0, 100.0)).length() < 1e-3);
    }

    #[test]
    fn test_orbit_angle_precise_at_large_time() {
        let orbit = Orbit {
            angle: 0.5,
            radius: 100.0,
            speed: 0.3,
        };
        let late = 7.0 * 24.0 * 3600.0;
        let a = orbit.angle_at(late);
        let b = orbit.angle_at(late + 1.0 / 60.0);
        assert!((0.0..std::f32::consts::TAU).contains(&a));
        let step = (b - a).rem_euclid(std::f32::consts::TAU);
        assert!((step - 0.3 / 60.0).abs() < 1e-4, "step was {}", step);
    }

    #[test]
    fn test_rebuild_sizes_pool() {
        let mut pool = ParticlePool::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let config = PoolConfig::default().with_ambient(10);
        pool.rebuild(&points(50), Vec2::new(400.0, 200.0), &config, &Palette::ocean(), &mut rng);

        assert_eq!(pool.len(), 60);
        assert_eq!(pool.text_count(), 50);
        assert_eq!(pool.center(), Vec2::new(200.0, 100.0));
        let ambient = pool.iter().filter(|p| p.kind == ParticleKind::Ambient).count();
        assert_eq!(ambient, 10);
    }

    #[test]
    fn test_rebuild_replaces_everything() {
        let mut pool = ParticlePool::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let config = PoolConfig::default();
        pool.rebuild(&points(30), Vec2::new(400.0, 200.0), &config, &Palette::ocean(), &mut rng);
        pool.particles_mut()[0].loose.hit_count = 4;
        pool.particles_mut()[0].disturbance.offset = Vec2::new(5.0, 5.0);

        pool.rebuild(&points(12), Vec2::new(200.0, 200.0), &config, &Palette::ocean(), &mut rng);
        assert_eq!(pool.len(), 12);
        for p in pool.iter() {
            assert_eq!(p.loose, LooseState::default());
            assert_eq!(p.disturbance, Disturbance::default());
            assert_eq!(p.contacts, [0; MAX_RIPPLES]);
        }
    }

    #[test]
    fn test_origins_and_colors_come_from_points() {
        let mut pool = ParticlePool::new();
        let mut rng = SmallRng::seed_from_u64(7);
        let pts = points(20);
        pool.rebuild(&pts, Vec2::new(400.0, 200.0), &PoolConfig::default(), &Palette::ocean(), &mut rng);
        for (p, t) in pool.iter().zip(&pts) {
            assert_eq!(p.origin, t.position);
            assert_eq!(p.color, t.color);
            assert!(p.base_size >= 1.2 && p.base_size < 2.6);
        }
    }

    #[test]
    fn test_rebuild_is_seeded() {
        let build = || {
            let mut pool = ParticlePool::new();
            let mut rng = SmallRng::seed_from_u64(99);
            pool.rebuild(
                &points(25),
                Vec2::new(300.0, 300.0),
                &PoolConfig::default().with_ambient(5),
                &Palette::ocean(),
                &mut rng,
            );
            pool
        };
        assert_eq!(build().particles(), build().particles());
    }

    #[test]
    fn test_touch_counts_once() {
        let mut p = Particle::new(Vec2::ZERO, Orbit::default(), Vec2::ZERO);
        assert!(p.touch(3));
        assert!(!p.touch(3));
        // A later ripple reusing the slot is a new contact
        assert!(p.touch(3 + MAX_RIPPLES as u64));
        assert!(p.touch(4));
    }

    #[test]
    fn test_degenerate_ranges() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(range(&mut rng, (2.0, 2.0)), 2.0);
        assert_eq!(range(&mut rng, (3.0, 1.0)), 3.0);
    }
}
