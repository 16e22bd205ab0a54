//! Click-triggered ripples.
//!
//! A ripple is an expanding ring that starts at radius 0 and strength 1,
//! grows at `expansion_rate` pixels per second and fades at `decay_rate` per
//! second. It is dropped from the active set on the tick its strength reaches
//! zero.
//!
//! Ripples only spawn while the text is held. At most `cap` are alive; what
//! happens to the click that would exceed the cap is the [`OverflowPolicy`].
//! Excess clicks are never queued.
//!
//! ```ignore
//! let mut ripples = RippleManager::new(RippleConfig::default());
//!
//! if let EmitOutcome::Spawned(id) = ripples.emit(click, progress.phase) {
//!     log::trace!("ripple {}", id);
//! }
//!
//! // Every frame
//! ripples.tick(dt);
//! ```

use crate::particle::MAX_RIPPLES;
use crate::progress::Phase;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Smallest step a tick advances ripples by. Keeps strength strictly
/// decreasing even when the clock is paused.
pub const MIN_TICK: f32 = 1.0 / 240.0;

/// What to do with a click when `cap` ripples are already alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Ignore the click.
    #[default]
    DropNew,
    /// Remove the oldest ripple to make room.
    EvictOldest,
}

/// Ripple tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleConfig {
    /// Most ripples alive at once, `1..=MAX_RIPPLES`.
    pub cap: usize,
    /// Radius growth in pixels per second.
    pub expansion_rate: f32,
    /// Strength loss per second.
    pub decay_rate: f32,
    /// Half-width of the ring that pushes particles, in pixels.
    pub band_width: f32,
    /// Impulse at the center of the band at full strength.
    pub force: f32,
    pub overflow: OverflowPolicy,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            cap: 5,
            expansion_rate: 360.0,
            decay_rate: 0.9,
            band_width: 28.0,
            force: 6.0,
            overflow: OverflowPolicy::DropNew,
        }
    }
}

impl RippleConfig {
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    /// Seconds a ripple lives.
    pub fn lifetime(&self) -> f32 {
        if self.decay_rate > 0.0 {
            1.0 / self.decay_rate
        } else {
            f32::INFINITY
        }
    }
}

/// One active ripple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    /// Unique per manager, starting at 1.
    pub id: u64,
    pub origin: Vec2,
    pub radius: f32,
    pub strength: f32,
}

impl Ripple {
    pub fn new(id: u64, origin: Vec2) -> Self {
        Self {
            id,
            origin,
            radius: 0.0,
            strength: 1.0,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }
}

/// Result of a click, from [`RippleManager::emit`] or the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// A ripple with this id was added.
    Spawned(u64),
    /// The text is not held; clicks are ignored.
    NotHolding,
    /// The cap was reached and the policy is [`OverflowPolicy::DropNew`].
    Dropped,
    /// The engine is inert or torn down and consumes no events.
    Inactive,
}

/// Owns the active ripples of one engine instance.
#[derive(Debug, Clone)]
pub struct RippleManager {
    ripples: Vec<Ripple>,
    next_id: u64,
    config: RippleConfig,
}

impl RippleManager {
    pub fn new(config: RippleConfig) -> Self {
        Self {
            ripples: Vec::with_capacity(MAX_RIPPLES),
            next_id: 1,
            config,
        }
    }

    pub fn config(&self) -> &RippleConfig {
        &self.config
    }

    /// Effective cap, never above [`MAX_RIPPLES`].
    fn cap(&self) -> usize {
        self.config.cap.clamp(1, MAX_RIPPLES)
    }

    /// Spawn a ripple at `origin` if `phase` is [`Phase::Holding`].
    pub fn emit(&mut self, origin: Vec2, phase: Phase) -> EmitOutcome {
        if phase != Phase::Holding {
            return EmitOutcome::NotHolding;
        }

        if self.ripples.len() >= self.cap() {
            match self.config.overflow {
                OverflowPolicy::DropNew => {
                    log::trace!("Ripple cap {} reached, click dropped", self.cap());
                    return EmitOutcome::Dropped;
                }
                OverflowPolicy::EvictOldest => {
                    let evicted = self.ripples.remove(0);
                    log::trace!("Evicted ripple {}", evicted.id);
                }
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.ripples.push(Ripple::new(id, origin));
        log::trace!("Spawned ripple {} at ({:.1}, {:.1})", id, origin.x, origin.y);
        EmitOutcome::Spawned(id)
    }

    /// Grow and fade every ripple, dropping the ones that are spent.
    ///
    /// Returns how many ripples expired.
    pub fn tick(&mut self, dt: f32) -> usize {
        let dt = if dt.is_finite() { dt.max(MIN_TICK) } else { MIN_TICK };
        let grow = self.config.expansion_rate * dt;
        let fade = self.config.decay_rate.max(0.0) * dt;

        for r in &mut self.ripples {
            r.radius += grow;
            r.strength -= fade.max(f32::EPSILON);
        }

        let before = self.ripples.len();
        self.ripples.retain(|r| {
            let alive = r.strength > 0.0;
            if !alive {
                log::trace!("Ripple {} expired at radius {:.1}", r.id, r.radius);
            }
            alive
        });
        before - self.ripples.len()
    }

    /// Active ripples, oldest first.
    pub fn ripples(&self) -> &[Ripple] {
        &self.ripples
    }

    pub fn len(&self) -> usize {
        self.ripples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ripples.is_empty()
    }

    /// Remove every ripple. Ids keep counting up.
    pub fn clear(&mut self) {
        self.ripples.clear();
    }
}

impl Default for RippleManager {
    fn default() -> Self {
        Self::new(RippleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_only_while_holding() {
        let mut m = RippleManager::default();
        assert_eq!(m.emit(Vec2::ZERO, Phase::Assembling), EmitOutcome::NotHolding);
        assert_eq!(m.emit(Vec2::ZERO, Phase::Dispersing), EmitOutcome::NotHolding);
        assert!(m.is_empty());

        assert_eq!(m.emit(Vec2::new(5.0, 6.0), Phase::Holding), EmitOutcome::Spawned(1));
        let r = m.ripples()[0];
        assert_eq!(r.origin, Vec2::new(5.0, 6.0));
        assert_eq!(r.radius, 0.0);
        assert_eq!(r.strength, 1.0);
    }

    #[test]
    fn test_cap_drops_new() {
        let mut m = RippleManager::new(RippleConfig::default().with_cap(2));
        m.emit(Vec2::ZERO, Phase::Holding);
        m.emit(Vec2::ZERO, Phase::Holding);
        assert_eq!(m.emit(Vec2::ZERO, Phase::Holding), EmitOutcome::Dropped);
        assert_eq!(m.len(), 2);
        assert_eq!(m.ripples()[0].id, 1);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let config = RippleConfig::default()
            .with_cap(2)
            .with_overflow(OverflowPolicy::EvictOldest);
        let mut m = RippleManager::new(config);
        m.emit(Vec2::ZERO, Phase::Holding);
        m.emit(Vec2::ZERO, Phase::Holding);
        assert_eq!(m.emit(Vec2::ZERO, Phase::Holding), EmitOutcome::Spawned(3));
        let ids: Vec<u64> = m.ripples().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_cap_never_exceeds_contact_slots() {
        let mut m = RippleManager::new(RippleConfig::default().with_cap(100));
        for _ in 0..20 {
            m.emit(Vec2::ZERO, Phase::Holding);
        }
        assert_eq!(m.len(), MAX_RIPPLES);
    }

    #[test]
    fn test_strength_strictly_decreases_until_removed() {
        let mut m = RippleManager::default();
        m.emit(Vec2::ZERO, Phase::Holding);

        let mut last_strength = 1.0;
        let mut last_radius = 0.0;
        let mut ticks = 0;
        while let Some(r) = m.ripples().first().copied() {
            assert!(r.strength > 0.0, "zero-strength ripple lingered");
            if ticks > 0 {
                assert!(r.strength < last_strength);
                assert!(r.radius > last_radius);
            }
            last_strength = r.strength;
            last_radius = r.radius;
            m.tick(1.0 / 60.0);
            ticks += 1;
            assert!(ticks < 1000);
        }
        // 0.9 per second at 60 Hz runs out in roughly 67 ticks
        assert!((60..=70).contains(&ticks));
    }

    #[test]
    fn test_zero_dt_still_fades() {
        let mut m = RippleManager::default();
        m.emit(Vec2::ZERO, Phase::Holding);
        m.tick(0.0);
        assert!(m.ripples()[0].strength < 1.0);
    }

    #[test]
    fn test_tick_reports_expired() {
        let mut m = RippleManager::default();
        m.emit(Vec2::ZERO, Phase::Holding);
        m.emit(Vec2::ONE, Phase::Holding);
        assert_eq!(m.tick(0.5), 0);
        assert_eq!(m.tick(0.7), 2);
        assert!(m.is_empty());
    }

    #[test]
    fn test_lifetime() {
        assert!((RippleConfig::default().lifetime() - 1.0 / 0.9).abs() < 1e-6);
    }
}
