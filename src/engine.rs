//! The mountable formation engine.
//!
//! An [`Engine`] owns every piece of state for one visual: the particle pool,
//! the ripples, the current progress, the pointer and the canvas it renders
//! into. Nothing is global, so any number of engines can run side by side.
//!
//! # Two Cadences
//!
//! The host drives the engine from two directions:
//!
//! - **Events** ([`set_progress`](Engine::set_progress),
//!   [`pointer_moved`](Engine::pointer_moved), [`click`](Engine::click),
//!   [`resize`](Engine::resize)) update state immediately and never render.
//! - **Frames** ([`tick`](Engine::tick)) run physics and render, every display
//!   frame, whether or not anything happened. Ambient motion and breathing
//!   never stop.
//!
//! Every event leaves the engine in a state that is valid to tick at once.
//!
//! # Lifecycle
//!
//! ```text
//!  mount ──reduced motion──> None (never started)
//!    │
//!    ├── surface available ──> Running <──resize(ok)── Inert
//!    │                          │    └──resize(unavailable)──┘
//!    └── surface unavailable ──> Inert
//!
//!  Running / Inert ──teardown──> TornDown (final)
//! ```
//!
//! ```ignore
//! let motion = MotionPreference::from_env();
//! let Some(mut engine) = Engine::mount(config, 1280, 720, &motion)? else {
//!     return Ok(()); // user prefers reduced motion
//! };
//!
//! engine.set_progress(0.5);
//! engine.click(Vec2::new(640.0, 360.0));
//! if let Some(stats) = engine.tick(1.0 / 60.0) {
//!     present(engine.frame());
//! }
//! engine.teardown();
//! ```

use crate::color::Palette;
use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::font::{BitmapFont, GlyphSource};
use crate::particle::ParticlePool;
use crate::physics::{self, StepInput};
use crate::progress::{Progress, ProgressSource};
use crate::raster::{self, surface_available};
use crate::render::{Canvas, Renderer, Scene};
use crate::ripple::{EmitOutcome, RippleManager};
use glam::Vec2;
use image::RgbaImage;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Environment variable that, when set to a truthy value, requests reduced
/// motion.
pub const REDUCED_MOTION_ENV: &str = "TEXTSWARM_REDUCED_MOTION";

/// The user's motion preference. Reduced motion means the engine never
/// starts, not that it runs gently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionPreference {
    reduced: bool,
}

impl MotionPreference {
    /// Full motion.
    pub const fn full() -> Self {
        Self { reduced: false }
    }

    pub const fn reduced() -> Self {
        Self { reduced: true }
    }

    /// Read [`REDUCED_MOTION_ENV`]. `1`, `true`, `yes` and `on` count as set.
    pub fn from_env() -> Self {
        let reduced = std::env::var(REDUCED_MOTION_ENV)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        Self { reduced }
    }

    #[inline]
    pub fn is_reduced(&self) -> bool {
        self.reduced
    }
}

/// Where an engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Simulating and rendering.
    Running,
    /// No usable surface. Renders nothing and ignores every event except
    /// [`Engine::resize`], which is the one way back to `Running` once the
    /// host has a real surface again.
    Inert,
    /// Torn down. Ignores everything.
    TornDown,
}

/// Summary of one [`Engine::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Frames rendered so far, including this one.
    pub frame: u64,
    pub particles: usize,
    /// Ripples still alive after this tick.
    pub ripples: usize,
    /// Ripples that expired this tick.
    pub expired: usize,
    /// Ripple hits counted this tick.
    pub hits: usize,
    /// Particles currently loose.
    pub loose: usize,
    pub progress: Progress,
}

/// One mounted formation.
pub struct Engine {
    config: EngineConfig,
    palette: Palette,
    glyphs: Box<dyn GlyphSource>,
    pool: ParticlePool,
    ripples: RippleManager,
    renderer: Renderer,
    canvas: Canvas,
    progress: Progress,
    pointer: Option<Vec2>,
    text_center: Option<Vec2>,
    time: f64,
    frame: u64,
    width: u32,
    height: u32,
    rebuilds: u64,
    state: EngineState,
}

impl Engine {
    /// Mount an engine with the built-in bitmap font.
    ///
    /// Returns `Ok(None)` when reduced motion is preferred.
    pub fn mount(
        config: EngineConfig,
        width: u32,
        height: u32,
        motion: &MotionPreference,
    ) -> Result<Option<Self>, ConfigError> {
        Self::mount_with_glyphs(config, Box::new(BitmapFont::new()), width, height, motion)
    }

    /// Mount an engine that draws its text with `glyphs`.
    pub fn mount_with_glyphs(
        config: EngineConfig,
        glyphs: Box<dyn GlyphSource>,
        width: u32,
        height: u32,
        motion: &MotionPreference,
    ) -> Result<Option<Self>, ConfigError> {
        if motion.is_reduced() {
            log::info!("Reduced motion preferred, formation engine not started");
            return Ok(None);
        }

        config.validate()?;
        let palette = config.colors.palette()?;

        let mut engine = Self {
            ripples: RippleManager::new(config.ripples.clone()),
            renderer: Renderer::new(config.render.clone()),
            progress: config.bands.map(0.0),
            config,
            palette,
            glyphs,
            pool: ParticlePool::new(),
            canvas: Canvas::new(0, 0),
            pointer: None,
            text_center: None,
            time: 0.0,
            frame: 0,
            width: 0,
            height: 0,
            rebuilds: 0,
            state: EngineState::Inert,
        };
        engine.apply_size(width, height);

        log::info!(
            "Mounted formation {:?} at {}x{} ({} particles)",
            engine.config.raster.text,
            width,
            height,
            engine.pool.len()
        );
        Ok(Some(engine))
    }

    // ========== Events ==========

    /// Feed a raw scroll fraction.
    pub fn set_progress(&mut self, raw: f32) {
        if self.state != EngineState::Running {
            return;
        }
        self.progress = self.config.bands.map(raw);
    }

    /// Poll a progress source and apply its value if it changed.
    pub fn pull_progress(&mut self, source: &mut dyn ProgressSource, dt: f32) {
        if self.state != EngineState::Running {
            return;
        }
        if let Some(p) = source.poll(dt) {
            self.set_progress(p);
        }
    }

    /// Pointer moved to a surface-relative position.
    pub fn pointer_moved(&mut self, position: Vec2) {
        if self.state == EngineState::Running {
            self.pointer = Some(position);
        }
    }

    /// Pointer left the surface. Repulsion and parallax stop.
    pub fn pointer_left(&mut self) {
        self.pointer = None;
    }

    /// Click at a surface-relative position. Spawns a ripple while the text
    /// is held.
    pub fn click(&mut self, position: Vec2) -> EmitOutcome {
        if self.state != EngineState::Running {
            return EmitOutcome::Inactive;
        }
        self.ripples.emit(position, self.progress.phase)
    }

    /// The surface changed size. Rebuilds the whole pool synchronously;
    /// hosts should debounce.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.state == EngineState::TornDown {
            return;
        }
        self.apply_size(width, height);
    }

    fn apply_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;

        if !surface_available(width, height) {
            if self.state != EngineState::Inert || self.rebuilds == 0 {
                log::warn!(
                    "Rendering surface {}x{} unavailable, formation is inert",
                    width,
                    height
                );
            }
            self.pool.clear();
            self.ripples.clear();
            self.pointer = None;
            self.text_center = None;
            self.canvas = Canvas::new(0, 0);
            self.state = EngineState::Inert;
            return;
        }

        self.canvas.resize(width, height);
        self.rebuild();
        self.state = EngineState::Running;
    }

    /// Re-rasterize and replace the pool. In-flight disturbance, damage and
    /// ripples are discarded.
    fn rebuild(&mut self) {
        let mut rng = SmallRng::seed_from_u64(self.config.raster.seed);
        let raster = raster::rasterize(
            &self.config.raster,
            self.glyphs.as_ref(),
            &self.palette,
            self.config.colors.mode,
            self.width,
            self.height,
            &mut rng,
        );
        let surface = Vec2::new(self.width as f32, self.height as f32);
        self.pool
            .rebuild(&raster.points, surface, &self.config.pool, &self.palette, &mut rng);
        self.ripples.clear();
        self.text_center = raster.center();
        self.rebuilds += 1;
    }

    /// Stop for good: drop the pool, ripples, pointer and canvas. Safe to
    /// call more than once.
    pub fn teardown(&mut self) {
        if self.state == EngineState::TornDown {
            return;
        }
        self.pool.clear();
        self.ripples.clear();
        self.pointer = None;
        self.text_center = None;
        self.canvas = Canvas::new(0, 0);
        self.state = EngineState::TornDown;
        log::info!("Formation engine torn down after {} frames", self.frame);
    }

    // ========== Frames ==========

    /// Run physics for `dt` seconds and render. `None` unless running.
    pub fn tick(&mut self, dt: f32) -> Option<FrameStats> {
        if self.state != EngineState::Running {
            return None;
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.time += dt as f64;

        let step = {
            let input = StepInput {
                progress: self.progress,
                time: self.time,
                dt,
                pointer: self.pointer,
                ripples: self.ripples.ripples(),
                ripple_config: self.ripples.config(),
            };
            physics::step(&mut self.pool, &self.config.physics, &input)
        };

        let expired = self.ripples.tick(dt);

        let scene = Scene {
            particles: self.pool.particles(),
            ripples: self.ripples.ripples(),
            progress: self.progress,
            center: self.text_center.unwrap_or(self.pool.center()),
            accent: self.palette.sample(0.0),
        };
        self.renderer.draw(&mut self.canvas, &scene);
        self.frame += 1;

        Some(FrameStats {
            frame: self.frame,
            particles: self.pool.len(),
            ripples: self.ripples.len(),
            expired,
            hits: step.hits,
            loose: step.loose,
            progress: self.progress,
        })
    }

    // ========== Queries ==========

    /// The last rendered frame. Empty (0x0) unless running.
    pub fn frame(&self) -> &RgbaImage {
        self.canvas.image()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn ripples(&self) -> &RippleManager {
        &self.ripples
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Center of the rasterized text, `None` when there is no text.
    pub fn text_center(&self) -> Option<Vec2> {
        self.text_center
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Seconds of simulated time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// How many times the pool has been rebuilt.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("size", &(self.width, self.height))
            .field("particles", &self.pool.len())
            .field("ripples", &self.ripples.len())
            .field("progress", &self.progress)
            .field("frame", &self.frame)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{Phase, ScriptedProgress};

    fn mount(w: u32, h: u32) -> Engine {
        Engine::mount(EngineConfig::new("HI"), w, h, &MotionPreference::full())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_reduced_motion_never_starts() {
        let engine = Engine::mount(
            EngineConfig::default(),
            400,
            200,
            &MotionPreference::reduced(),
        )
        .unwrap();
        assert!(engine.is_none());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let config = EngineConfig::default().with_ripple_cap(0);
        assert!(Engine::mount(config, 400, 200, &MotionPreference::full()).is_err());
    }

    #[test]
    fn test_mount_builds_pool() {
        let engine = mount(400, 200);
        assert!(engine.is_running());
        assert!(!engine.pool().is_empty());
        assert_eq!(engine.rebuild_count(), 1);
        assert_eq!(engine.progress().phase, Phase::Assembling);
    }

    #[test]
    fn test_tick_renders_frame() {
        let mut engine = mount(400, 200);
        let stats = engine.tick(1.0 / 60.0).unwrap();
        assert_eq!(stats.frame, 1);
        assert_eq!(stats.particles, engine.pool().len());
        assert_eq!(engine.frame().dimensions(), (400, 200));
    }

    #[test]
    fn test_click_requires_hold() {
        let mut engine = mount(400, 200);
        assert_eq!(engine.click(Vec2::new(200.0, 100.0)), EmitOutcome::NotHolding);
        engine.set_progress(0.6);
        assert_eq!(engine.click(Vec2::new(200.0, 100.0)), EmitOutcome::Spawned(1));
    }

    #[test]
    fn test_pull_progress_from_source() {
        let mut engine = mount(400, 200);
        let mut source = ScriptedProgress::new(vec![0.5]);
        engine.pull_progress(&mut source, 0.0);
        assert_eq!(engine.progress().phase, Phase::Holding);
        // Exhausted source leaves progress alone
        engine.pull_progress(&mut source, 0.0);
        assert_eq!(engine.progress().phase, Phase::Holding);
    }

    #[test]
    fn test_inert_on_unavailable_surface() {
        let mut engine = mount(0, 0);
        assert_eq!(engine.state(), EngineState::Inert);
        assert!(engine.pool().is_empty());
        assert!(engine.tick(0.016).is_none());
        engine.set_progress(0.6);
        assert_eq!(engine.progress().value, 0.0);
        assert_eq!(engine.click(Vec2::ZERO), EmitOutcome::Inactive);

        // A real surface brings it back
        engine.resize(400, 200);
        assert!(engine.is_running());
        assert!(!engine.pool().is_empty());
    }

    #[test]
    fn test_teardown_is_final_and_idempotent() {
        let mut engine = mount(400, 200);
        engine.set_progress(0.6);
        engine.click(Vec2::new(10.0, 10.0));
        engine.teardown();
        engine.teardown();

        assert_eq!(engine.state(), EngineState::TornDown);
        assert!(engine.pool().is_empty());
        assert!(engine.ripples().is_empty());
        assert!(engine.tick(0.016).is_none());

        engine.resize(800, 400);
        assert_eq!(engine.state(), EngineState::TornDown);
        assert!(engine.pool().is_empty());
    }

    #[test]
    fn test_parallax_surface_follows_resize() {
        let mut engine = mount(400, 200);
        assert_eq!(engine.pool().surface(), Vec2::new(400.0, 200.0));
        engine.resize(800, 300);
        assert_eq!(engine.pool().surface(), Vec2::new(800.0, 300.0));
    }

    #[test]
    fn test_pointer_left_clears_pointer() {
        let mut engine = mount(400, 200);
        engine.pointer_moved(Vec2::new(5.0, 5.0));
        assert_eq!(engine.pointer(), Some(Vec2::new(5.0, 5.0)));
        engine.pointer_left();
        assert!(engine.pointer().is_none());
    }

    #[test]
    fn test_orbits_keep_moving_after_days_of_runtime() {
        let mut engine = mount(400, 200);
        engine.tick(600_000.0);
        let before: Vec<Vec2> = engine.pool().iter().map(|p| p.position).collect();

        for _ in 0..60 {
            engine.tick(1.0 / 60.0);
        }

        assert!((engine.time() - 600_001.0).abs() < 1e-3);
        let moved = engine
            .pool()
            .iter()
            .zip(&before)
            .map(|(p, b)| p.position.distance(*b))
            .fold(0.0_f32, f32::max);
        assert!(moved > 1.0, "orbits froze, max movement {}", moved);
    }

    #[test]
    fn test_motion_preference_values() {
        assert!(MotionPreference::reduced().is_reduced());
        assert!(!MotionPreference::full().is_reduced());
        assert!(!MotionPreference::default().is_reduced());
    }
}
