//! Frame timing for the render loop.
//!
//! The engine itself only ever sees `dt` values; where they come from is the
//! host's business. [`FrameClock`] is what the hosts use. The window measures
//! real frame time with `std::time`; the exporter advances a fixed-step clock
//! by hand. Pause, time scale and the delta clamp live here for both.
//!
//! # Example
//!
//! ```ignore
//! use textswarm::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // In the frame callback:
//! let dt = clock.update();
//! engine.tick(dt);
//!
//! // Headless, deterministic:
//! let mut clock = FrameClock::new().with_fixed_delta(1.0 / 60.0);
//! let dt = clock.advance(0.0); // always 1/60
//! ```

use std::time::Instant;

/// Largest delta handed to the simulation. A stalled frame (window dragged,
/// laptop lid closed) otherwise shows up as one huge step.
pub const MAX_DELTA: f32 = 0.1;

/// Frame timing state for one host loop.
#[derive(Debug)]
pub struct FrameClock {
    /// Instant of the last real-time update.
    last_frame: Instant,
    /// Scaled simulation time in seconds.
    elapsed_secs: f32,
    /// Frames since start.
    frame_count: u64,
    /// Smoothed frames per second.
    fps: f32,
    fps_frame_count: u64,
    fps_window: f32,
    fps_update_interval: f32,
    paused: bool,
    /// Use this delta instead of measured time.
    fixed_delta: Option<f32>,
    /// Multiplier on every delta (1.0 = normal speed).
    time_scale: f32,
    max_delta: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            elapsed_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_window: 0.0,
            fps_update_interval: 0.5,
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
            max_delta: MAX_DELTA,
        }
    }

    /// Always hand out `delta` seconds regardless of measured time.
    pub fn with_fixed_delta(mut self, delta: f32) -> Self {
        self.fixed_delta = Some(delta.max(0.0));
        self
    }

    /// Override the delta clamp.
    pub fn with_max_delta(mut self, max: f32) -> Self {
        self.max_delta = max.max(0.0);
        self
    }

    /// Measure real time since the last call and advance. Call once per frame.
    ///
    /// Returns the delta to pass to the simulation.
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.advance(raw)
    }

    /// Advance by a caller-supplied raw delta.
    ///
    /// Pause, fixed delta, time scale and clamping are applied here, so the
    /// headless exporter and the windowed host behave the same way.
    pub fn advance(&mut self, raw_delta: f32) -> f32 {
        if self.paused {
            return 0.0;
        }

        let raw = if raw_delta.is_finite() { raw_delta.max(0.0) } else { 0.0 };
        let dt = (self.fixed_delta.unwrap_or(raw) * self.time_scale).min(self.max_delta);

        self.elapsed_secs += dt;
        self.frame_count += 1;

        // FPS is measured against unscaled time
        self.fps_window += raw;
        if self.fps_window >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / self.fps_window;
            self.fps_frame_count = self.frame_count;
            self.fps_window = 0.0;
        }

        dt
    }

    /// Scaled simulation time in seconds.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Stop handing out time. `update()` returns 0 until resumed.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after [`pause`](Self::pause). Time spent paused is skipped.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Set time scale multiplier.
    ///
    /// - `1.0` = normal speed
    /// - `0.5` = half speed
    /// - `2.0` = double speed (still subject to the delta clamp)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
