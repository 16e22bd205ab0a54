//! Per-tick particle update.
//!
//! Each tick, every particle's position is rebuilt from scratch out of its
//! own carried state plus four shared inputs (phase, time, pointer, ripples):
//!
//! ```text
//! orbit ──lerp(ease(phase))──> base ──+ parallax──+ disturbance──> spring position
//!                                                                     │
//!                                     loose float ──mix(timer, hits)──┘──> position
//! ```
//!
//! # Hit-Count Ladder
//!
//! A ripple band passing over a particle during the hold counts as one hit.
//! Hits escalate: the first few barely wobble the particle, later ones tear
//! it loose for seconds at a time.
//!
//! | Hits | Timer | Mix | Kick | Max float radius |
//! |------|-------|-----|------|------------------|
//! | 1 | 0.25 s | 0.12 | 0.10 | 4 px |
//! | 2 | 0.5 s | 0.2 | 0.15 | 6 px |
//! | 3 | 1.0 s | 0.4 | 0.25 | 10 px |
//! | 4 | 2.0 s | 0.6 | 0.4 | 16 px |
//! | 5 | 3.5 s | 0.8 | 0.6 | 24 px |
//! | 6+ | 6.0 s | 1.0 | 0.8 | 36 px |
//!
//! The loose timer only runs down outside the hold, so damage persists while
//! the text is in focus. Dropping below the heal threshold (text fully
//! scattered) clears hit count and loose state.

use crate::easing::Easing;
use crate::input::normalized_offset;
use crate::particle::{Particle, ParticlePool};
use crate::progress::Progress;
use crate::ripple::{Ripple, RippleConfig};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One rung of the hit-count ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitTier {
    /// Fewest hits that reach this tier.
    pub min_hits: u32,
    /// Loose timer in seconds set on a hit.
    pub timer: f32,
    /// Blend weight of the loose float position (0-1).
    pub mix: f32,
    /// Fraction of the ripple impulse fed into the loose drift.
    pub kick: f32,
    /// Furthest the float position drifts from the assembled spot.
    pub max_radius: f32,
}

impl HitTier {
    pub const fn new(min_hits: u32, timer: f32, mix: f32, kick: f32, max_radius: f32) -> Self {
        Self {
            min_hits,
            timer,
            mix,
            kick,
            max_radius,
        }
    }
}

/// The default escalation ladder.
pub fn default_ladder() -> Vec<HitTier> {
    vec![
        HitTier::new(1, 0.25, 0.12, 0.10, 4.0),
        HitTier::new(2, 0.5, 0.2, 0.15, 6.0),
        HitTier::new(3, 1.0, 0.4, 0.25, 10.0),
        HitTier::new(4, 2.0, 0.6, 0.4, 16.0),
        HitTier::new(5, 3.5, 0.8, 0.6, 24.0),
        HitTier::new(6, 6.0, 1.0, 0.8, 36.0),
    ]
}

/// Tuning for the physics step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Curve applied to the phase value when blending orbit into origin.
    pub blend_easing: Easing,
    /// Phase value above which the pointer pushes particles.
    pub engage_threshold: f32,
    /// Pointer repulsion radius in pixels.
    pub repel_radius: f32,
    /// Pointer repulsion impulse at zero distance.
    pub repel_strength: f32,
    /// Spring constant, applied once per tick.
    pub spring_k: f32,
    /// Velocity multiplier, applied once per tick.
    pub damping: f32,
    /// Below this phase value all damage heals.
    pub heal_threshold: f32,
    /// Seconds over which the loose mix fades out as the timer runs down.
    pub loose_fade: f32,
    /// Loose drift multiplier per tick.
    pub loose_drag: f32,
    /// Spin of the loose float position in radians per second.
    pub loose_spin: f32,
    /// Breathing frequency in radians per second.
    pub breath_rate: f32,
    /// Breathing amplitude as a fraction of size.
    pub breath_amount: f32,
    /// Escalation ladder, sorted by `min_hits`.
    pub ladder: Vec<HitTier>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            blend_easing: Easing::CubicInOut,
            engage_threshold: 0.3,
            repel_radius: 80.0,
            repel_strength: 4.0,
            spring_k: 0.08,
            damping: 0.85,
            heal_threshold: 0.05,
            loose_fade: 0.5,
            loose_drag: 0.92,
            loose_spin: 0.8,
            breath_rate: 2.0,
            breath_amount: 0.2,
            ladder: default_ladder(),
        }
    }
}

impl PhysicsConfig {
    /// Highest tier reached with `hits` hits, `None` for zero hits.
    pub fn tier_for(&self, hits: u32) -> Option<&HitTier> {
        self.ladder.iter().rev().find(|t| t.min_hits <= hits)
    }

    /// The tier with the most hits.
    pub fn top_tier(&self) -> Option<&HitTier> {
        self.ladder.last()
    }

    pub fn with_spring(mut self, k: f32, damping: f32) -> Self {
        self.spring_k = k;
        self.damping = damping;
        self
    }

    pub fn with_repulsion(mut self, radius: f32, strength: f32) -> Self {
        self.repel_radius = radius;
        self.repel_strength = strength;
        self
    }

    pub fn with_ladder(mut self, ladder: Vec<HitTier>) -> Self {
        self.ladder = ladder;
        self
    }
}

/// Shared inputs for one tick.
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    pub progress: Progress,
    /// Seconds since the engine started.
    pub time: f64,
    /// Seconds since the last tick.
    pub dt: f32,
    /// Surface-relative pointer position, `None` when absent.
    pub pointer: Option<Vec2>,
    pub ripples: &'a [Ripple],
    pub ripple_config: &'a RippleConfig,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepStats {
    /// Ripple hits counted this tick.
    pub hits: usize,
    /// Particles currently loose.
    pub loose: usize,
}

/// `d` normalized by its length `dist`, or `fallback` when `d` is degenerate.
#[inline]
fn direction(d: Vec2, dist: f32, fallback: Vec2) -> Vec2 {
    if dist > 1e-4 {
        d / dist
    } else {
        fallback
    }
}

/// Advance one particle. Returns `true` if a ripple hit was counted.
///
/// Only reads the shared inputs; the particle's own fields are the only
/// state carried between ticks.
pub fn step_particle(
    p: &mut Particle,
    center: Vec2,
    surface: Vec2,
    config: &PhysicsConfig,
    input: &StepInput<'_>,
) -> bool {
    let phase = input.progress.value;
    let holding = input.progress.is_holding();

    if phase < config.heal_threshold {
        p.heal();
    }

    // Base: orbit blended into origin
    let orbit = p.orbit.position(center, input.time);
    let weight = config.blend_easing.apply(phase);
    let base = orbit.lerp(p.origin, weight);

    let parallax = match input.pointer {
        Some(ptr) => normalized_offset(ptr, surface) * p.depth * phase,
        None => Vec2::ZERO,
    };

    let provisional = base + parallax + p.disturbance.offset;

    // Pointer repulsion
    if let Some(ptr) = input.pointer {
        if phase > config.engage_threshold && config.repel_radius > 0.0 {
            let d = provisional - ptr;
            let dist_sq = d.length_squared();
            if dist_sq < config.repel_radius * config.repel_radius {
                let dist = dist_sq.sqrt();
                let dir = direction(d, dist, Vec2::Y);
                let falloff = 1.0 - dist / config.repel_radius;
                p.disturbance.velocity += dir * falloff * config.repel_strength;
            }
        }
    }

    // Ripple impulses
    let band = input.ripple_config.band_width;
    let mut hit = false;
    for ripple in input.ripples {
        let d = provisional - ripple.origin;
        let dist = d.length();
        let band_distance = (dist - ripple.radius).abs();
        if band <= 0.0 || band_distance >= band {
            continue;
        }

        let dir = direction(d, dist, Vec2::X);
        let falloff = (1.0 - band_distance / band) * ripple.strength;
        let impulse = dir * falloff * input.ripple_config.force;
        p.disturbance.velocity += impulse;

        let first_contact = p.touch(ripple.id);
        if !(first_contact && holding) {
            continue;
        }

        p.loose.hit_count += 1;
        hit = true;
        if let Some(tier) = config.tier_for(p.loose.hit_count) {
            if !p.loose.is_active() {
                // Float away in the direction the ripple pushed
                p.loose.angle = dir.y.atan2(dir.x);
                p.loose.radius = 0.0;
            }
            p.loose.timer = tier.timer;
            p.loose.velocity += impulse * tier.kick;
        }
    }

    // Damped spring back to zero offset
    let spring = &mut p.disturbance;
    spring.velocity += -config.spring_k * spring.offset;
    spring.velocity *= config.damping;
    spring.offset += spring.velocity;

    let spring_position = base + parallax + p.disturbance.offset;

    // Loose float
    let mut position = spring_position;
    if p.loose.is_active() {
        if let Some(tier) = config.tier_for(p.loose.hit_count) {
            let loose = &mut p.loose;
            loose.angle += config.loose_spin * input.dt;
            loose.radius = (loose.radius + loose.velocity.length()).min(tier.max_radius);
            loose.velocity *= config.loose_drag;
            if !holding {
                loose.timer = (loose.timer - input.dt).max(0.0);
            }

            let fade = if config.loose_fade > 0.0 {
                (loose.timer / config.loose_fade).min(1.0)
            } else {
                1.0
            };
            let mix = tier.mix * fade;
            let float_position = base + parallax + Vec2::from_angle(loose.angle) * loose.radius;
            position = spring_position.lerp(float_position, mix);
        }
    }

    p.position = position;
    let breath = (input.time * config.breath_rate as f64 + p.pulse_phase as f64)
        .rem_euclid(std::f64::consts::TAU) as f32;
    p.size = p.base_size * (1.0 + breath.sin() * config.breath_amount);

    hit
}

/// Advance every particle in the pool.
pub fn step(pool: &mut ParticlePool, config: &PhysicsConfig, input: &StepInput<'_>) -> StepStats {
    let center = pool.center();
    let surface = pool.surface();
    let mut stats = StepStats::default();

    for p in pool.particles_mut() {
        if step_particle(p, center, surface, config, input) {
            stats.hits += 1;
        }
        if p.loose.is_active() {
            stats.loose += 1;
        }
    }

    stats
}
