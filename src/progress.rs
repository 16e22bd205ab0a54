//! Scroll progress mapping and progress sources.
//!
//! A raw scroll fraction `p` in `0..=1` becomes a phase value and a phase
//! label through three bands:
//!
//! | Band | Range | Phase value |
//! |------|-------|-------------|
//! | Assembling | `p < assemble_end` | `ease(p / assemble_end)` |
//! | Holding | `assemble_end <= p <= disperse_start` | `1` |
//! | Dispersing | `p > disperse_start` | `1 - ease((p - disperse_start) / (1 - disperse_start))` |
//!
//! The label is recomputed from `p` on every update; nothing about previous
//! updates is remembered.
//!
//! # Progress Sources
//!
//! The engine does not know where `p` comes from. Anything implementing
//! [`ProgressSource`] can drive it:
//!
//! | Source | Use |
//! |--------|-----|
//! | [`ScrollTrigger`] | Element scrolling through a viewport |
//! | [`TimedProgress`] | Self-playing intro over a fixed duration |
//! | [`ScriptedProgress`] | Fixed sequence of values, for tests and exports |
//! | [`SharedProgress`] | Atomic cell written from elsewhere |
//!
//! ```ignore
//! let mut trigger = ScrollTrigger::new(element_top, element_height, viewport_height)
//!     .with_start(Anchor::parse("top 85%")?)
//!     .with_end(Anchor::parse("bottom top")?);
//!
//! trigger.scroll_to(window_scroll_y);
//! engine.pull_progress(&mut trigger, dt);
//! ```

use crate::easing::Easing;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Which part of the scroll range the engine is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Particles are flying in from their ambient orbits.
    Assembling,
    /// The text is formed and interactive (clicks spawn ripples).
    Holding,
    /// Particles are leaving the text again.
    Dispersing,
}

/// Band thresholds for the progress mapper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressBands {
    /// End of the assembling band (exclusive).
    pub assemble_end: f32,
    /// Start of the dispersing band (exclusive).
    pub disperse_start: f32,
    /// Curve applied inside the assembling and dispersing bands.
    pub easing: Easing,
}

impl Default for ProgressBands {
    fn default() -> Self {
        Self {
            assemble_end: 0.45,
            disperse_start: 0.75,
            easing: Easing::CubicInOut,
        }
    }
}

impl ProgressBands {
    /// Whether the thresholds describe three non-empty bands.
    pub fn is_valid(&self) -> bool {
        self.assemble_end > 0.0
            && self.assemble_end <= self.disperse_start
            && self.disperse_start < 1.0
    }

    /// Map a raw scroll fraction to a [`Progress`] snapshot.
    ///
    /// Non-finite input is treated as `0`.
    pub fn map(&self, raw: f32) -> Progress {
        let p = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };

        let (phase, value) = if p < self.assemble_end {
            (Phase::Assembling, self.easing.apply(p / self.assemble_end))
        } else if p <= self.disperse_start {
            (Phase::Holding, 1.0)
        } else {
            let span = 1.0 - self.disperse_start;
            let t = (p - self.disperse_start) / span;
            (Phase::Dispersing, 1.0 - self.easing.apply(t))
        };

        Progress {
            raw: p,
            value: value.clamp(0.0, 1.0),
            phase,
        }
    }
}

/// One engine instance's current progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Clamped raw scroll fraction.
    pub raw: f32,
    /// Phase value in `0..=1`; 1 means fully assembled.
    pub value: f32,
    /// Phase label derived from `raw`.
    pub phase: Phase,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            raw: 0.0,
            value: 0.0,
            phase: Phase::Assembling,
        }
    }
}

impl Progress {
    /// True while the formed text accepts clicks.
    #[inline]
    pub fn is_holding(&self) -> bool {
        self.phase == Phase::Holding
    }
}

/// Anything that can emit scroll-style progress changes.
pub trait ProgressSource {
    /// Advance by `dt` seconds and return the new progress if it changed.
    fn poll(&mut self, dt: f32) -> Option<f32>;
}

// ========== Scroll trigger ==========

/// Edge of an element or viewport used by an [`Anchor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Top,
    Center,
    Bottom,
    /// Fraction of the height from the top (0.85 = "85%").
    Fraction(f32),
}

impl Edge {
    fn fraction(self) -> f32 {
        match self {
            Edge::Top => 0.0,
            Edge::Center => 0.5,
            Edge::Bottom => 1.0,
            Edge::Fraction(f) => f,
        }
    }

    fn parse(word: &str) -> Option<Self> {
        match word {
            "top" => Some(Edge::Top),
            "center" => Some(Edge::Center),
            "bottom" => Some(Edge::Bottom),
            w => {
                let pct = w.strip_suffix('%')?;
                let v: f32 = pct.parse().ok()?;
                Some(Edge::Fraction(v / 100.0))
            }
        }
    }
}

/// "When `element` edge meets `viewport` edge", e.g. `"top 85%"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub element: Edge,
    pub viewport: Edge,
}

impl Anchor {
    pub const fn new(element: Edge, viewport: Edge) -> Self {
        Self { element, viewport }
    }

    /// Parse `"<element-edge> <viewport-edge>"`, each `top`, `center`,
    /// `bottom` or a percentage.
    pub fn parse(s: &str) -> Option<Self> {
        let mut words = s.split_whitespace();
        let element = Edge::parse(words.next()?)?;
        let viewport = Edge::parse(words.next()?)?;
        if words.next().is_some() {
            return None;
        }
        Some(Self { element, viewport })
    }

    /// Scroll offset at which this anchor is met.
    fn scroll_offset(&self, element_top: f32, element_height: f32, viewport_height: f32) -> f32 {
        let element_y = element_top + element_height * self.element.fraction();
        element_y - viewport_height * self.viewport.fraction()
    }
}

/// Maps a document scroll offset to progress for one trigger element.
#[derive(Debug, Clone)]
pub struct ScrollTrigger {
    element_top: f32,
    element_height: f32,
    viewport_height: f32,
    start: Anchor,
    end: Anchor,
    scroll_y: f32,
    last_emitted: Option<f32>,
}

impl ScrollTrigger {
    /// Trigger element at `element_top` (document coordinates) of height
    /// `element_height`, observed through a viewport of `viewport_height`.
    ///
    /// Defaults to start `"top 85%"`, end `"bottom top"`.
    pub fn new(element_top: f32, element_height: f32, viewport_height: f32) -> Self {
        Self {
            element_top,
            element_height,
            viewport_height,
            start: Anchor::new(Edge::Top, Edge::Fraction(0.85)),
            end: Anchor::new(Edge::Bottom, Edge::Top),
            scroll_y: 0.0,
            last_emitted: None,
        }
    }

    pub fn with_start(mut self, anchor: Anchor) -> Self {
        self.start = anchor;
        self
    }

    pub fn with_end(mut self, anchor: Anchor) -> Self {
        self.end = anchor;
        self
    }

    /// Set the document scroll offset.
    pub fn scroll_to(&mut self, scroll_y: f32) {
        self.scroll_y = scroll_y;
    }

    /// Scroll by a delta (positive = down).
    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll_y += delta;
    }

    /// Update the viewport height after a resize.
    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height;
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// Scroll range `(start, end)` over which progress runs 0 -> 1.
    pub fn range(&self) -> (f32, f32) {
        let s = self
            .start
            .scroll_offset(self.element_top, self.element_height, self.viewport_height);
        let e = self
            .end
            .scroll_offset(self.element_top, self.element_height, self.viewport_height);
        (s, e)
    }

    /// Progress for the current scroll offset.
    pub fn progress(&self) -> f32 {
        let (start, end) = self.range();
        if end <= start {
            return if self.scroll_y >= end { 1.0 } else { 0.0 };
        }
        ((self.scroll_y - start) / (end - start)).clamp(0.0, 1.0)
    }
}

impl ProgressSource for ScrollTrigger {
    fn poll(&mut self, _dt: f32) -> Option<f32> {
        let p = self.progress();
        if self.last_emitted == Some(p) {
            return None;
        }
        self.last_emitted = Some(p);
        Some(p)
    }
}

// ========== Timed intro ==========

/// Plays progress from 0 to `target` over `duration` seconds.
///
/// With the default target of 0.6 and default bands, the text assembles and
/// then stays in the hold band, which is how a loading intro behaves.
#[derive(Debug, Clone)]
pub struct TimedProgress {
    duration: f32,
    elapsed: f32,
    target: f32,
    easing: Easing,
    finished: bool,
}

impl TimedProgress {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(f32::EPSILON),
            elapsed: 0.0,
            target: 0.6,
            easing: Easing::QuadOut,
            finished: false,
        }
    }

    pub fn with_target(mut self, target: f32) -> Self {
        self.target = target.clamp(0.0, 1.0);
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl ProgressSource for TimedProgress {
    fn poll(&mut self, dt: f32) -> Option<f32> {
        if self.finished {
            return None;
        }
        self.elapsed += dt.max(0.0);
        let t = (self.elapsed / self.duration).min(1.0);
        if t >= 1.0 {
            self.finished = true;
        }
        Some(self.easing.apply(t) * self.target)
    }
}

// ========== Scripted ==========

/// Emits a fixed sequence of values, one per poll.
#[derive(Debug, Clone)]
pub struct ScriptedProgress {
    values: Vec<f32>,
    cursor: usize,
}

impl ScriptedProgress {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }

    /// `samples` evenly spaced values from `from` to `to` inclusive.
    pub fn sweep(from: f32, to: f32, samples: usize) -> Self {
        let values = match samples {
            0 => Vec::new(),
            1 => vec![to],
            n => (0..n)
                .map(|i| from + (to - from) * i as f32 / (n - 1) as f32)
                .collect(),
        };
        Self::new(values)
    }

    pub fn remaining(&self) -> usize {
        self.values.len() - self.cursor
    }
}

impl ProgressSource for ScriptedProgress {
    fn poll(&mut self, _dt: f32) -> Option<f32> {
        let v = self.values.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(v)
    }
}

// ========== Shared cell ==========

/// Progress cell that can be written from another thread or callback.
///
/// Stores the `f32` bit pattern in an atomic so readers never observe a torn
/// value.
#[derive(Debug, Clone, Default)]
pub struct SharedProgress {
    bits: Arc<AtomicU32>,
    seen: Option<u32>,
}

impl SharedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new progress value.
    pub fn publish(&self, p: f32) {
        self.bits.store(p.to_bits(), Ordering::Release);
    }

    /// Read the latest published value.
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl ProgressSource for SharedProgress {
    fn poll(&mut self, _dt: f32) -> Option<f32> {
        let bits = self.bits.load(Ordering::Acquire);
        if self.seen == Some(bits) {
            return None;
        }
        self.seen = Some(bits);
        Some(f32::from_bits(bits))
    }
}
