//! # textswarm - Scroll-Synchronized Particle Text
//!
//! Particles that drift in orbits, swarm into a line of text as the page
//! scrolls, hold the text while the reader lingers and scatter again on the
//! way out. Clicks on the held text send out ripples that knock particles
//! loose, and particles hit often enough float free for a while.
//!
//! textswarm owns the simulation and a CPU renderer. The host owns the clock,
//! the scroll position and the screen: it feeds events and asks for frames.
//!
//! ## Quick Start
//!
//! ```ignore
//! use textswarm::prelude::*;
//!
//! let config = EngineConfig::new("HELLO")
//!     .with_colors(&["#f97316", "#facc15", "#ffffff"])
//!     .with_ripple_cap(3);
//!
//! let Some(mut engine) = Engine::mount(config, 800, 400, &MotionPreference::from_env())? else {
//!     return Ok(()); // reduced motion: never start
//! };
//!
//! loop {
//!     engine.set_progress(scroll_fraction());
//!     engine.pointer_moved(Vec2::new(mx, my));
//!     engine.tick(1.0 / 60.0);
//!     show(engine.frame());
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Progress
//!
//! A raw scroll fraction in `0..=1` is split into three bands by
//! [`ProgressBands`]:
//!
//! | Raw progress | Phase | Phase value |
//! |--------------|-------|-------------|
//! | `< 0.45` | Assembling | eases 0 -> 1 |
//! | `0.45..=0.75` | Holding | 1 |
//! | `> 0.75` | Dispersing | eases 1 -> 0 |
//!
//! The phase value blends every particle between its orbit and its place in
//! the text. Anything implementing [`ProgressSource`] can drive it:
//! [`ScrollTrigger`] for page scrolling, [`TimedProgress`] for an intro that
//! forms on its own, [`SharedProgress`] for another thread.
//!
//! ### Particles
//!
//! Each text particle has an origin sampled from the rasterized text
//! ([`raster`]), an orbit, a parallax depth and a transient disturbance that
//! a spring pulls back to zero. Ambient particles orbit without a place in
//! the text.
//!
//! ### Ripples and the hit ladder
//!
//! Clicks while holding spawn [`Ripple`]s. Every time a ripple band sweeps
//! over a particle its hit count goes up once, and the [`HitTier`] for that
//! count decides how long and how far the particle floats loose. Dropping
//! back below the heal threshold repairs everything.
//!
//! ## Feature Overview
//!
//! | Feature | Default | Adds |
//! |---------|---------|------|
//! | `window` | yes | [`window::run`], a winit + wgpu host |
//! | `cli` | yes | the `textswarm` binary |
//! | `fontdue` | no | `OutlineFont` for TTF/OTF text |

pub mod color;
pub mod config;
pub mod easing;
pub mod engine;
pub mod error;
pub mod export;
pub mod font;
#[cfg(feature = "window")]
pub mod gpu;
pub mod input;
pub mod particle;
pub mod physics;
pub mod progress;
pub mod raster;
pub mod render;
pub mod ripple;
pub mod time;
#[cfg(feature = "window")]
pub mod window;

pub use color::{ColorMode, Palette};
pub use config::{ColorConfig, EngineConfig};
pub use easing::Easing;
pub use engine::{Engine, EngineState, FrameStats, MotionPreference};
#[cfg(feature = "window")]
pub use error::GpuError;
pub use error::{ConfigError, HostError};
pub use font::{BitmapFont, GlyphSource};
#[cfg(feature = "fontdue")]
pub use font::OutlineFont;
pub use glam::{Vec2, Vec3};
pub use input::PointerInput;
pub use particle::{Particle, ParticleKind, ParticlePool, PoolConfig, MAX_RIPPLES};
pub use physics::{HitTier, PhysicsConfig};
pub use progress::{
    Anchor, Edge, Phase, Progress, ProgressBands, ProgressSource, ScriptedProgress, ScrollTrigger,
    SharedProgress, TimedProgress,
};
pub use raster::{RasterConfig, Rasterization, StridePolicy, TargetPoint};
pub use render::{BlendMode, Canvas, RenderConfig, Renderer};
pub use ripple::{EmitOutcome, OverflowPolicy, Ripple, RippleConfig, RippleManager};
pub use time::FrameClock;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use textswarm::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::{ColorMode, Palette};
    pub use crate::config::EngineConfig;
    pub use crate::easing::Easing;
    pub use crate::engine::{Engine, EngineState, MotionPreference};
    pub use crate::error::{ConfigError, HostError};
    pub use crate::font::{BitmapFont, GlyphSource};
    pub use crate::input::PointerInput;
    pub use crate::progress::{
        Phase, ProgressBands, ProgressSource, ScrollTrigger, SharedProgress, TimedProgress,
    };
    pub use crate::raster::StridePolicy;
    pub use crate::render::RenderConfig;
    pub use crate::ripple::{EmitOutcome, OverflowPolicy};
    pub use crate::time::FrameClock;
    pub use crate::{Vec2, Vec3};
}
