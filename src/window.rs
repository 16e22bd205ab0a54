//! Windowed host: a winit event loop around one [`Engine`].
//!
//! The window stands in for a web page. The mouse wheel scrolls a virtual
//! page with a trigger element one viewport below the fold, and a
//! [`ScrollTrigger`] turns that scroll offset into progress. Cursor moves,
//! leaves and left clicks go to the engine, every redraw ticks it and blits
//! the frame. Resizes are debounced before the engine rebuilds its pool.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::config::EngineConfig;
use crate::engine::{Engine, MotionPreference};
use crate::error::HostError;
use crate::font::load_glyphs;
use crate::gpu::{PresentOutcome, Presenter};
use crate::input::PointerInput;
use crate::progress::ScrollTrigger;
use crate::time::FrameClock;

/// How long the window size must stay put before the engine rebuilds.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

/// Page pixels scrolled per wheel line.
pub const PIXELS_PER_LINE: f32 = 40.0;

/// Frames between window title refreshes.
const TITLE_INTERVAL: u64 = 30;

/// Window setup for [`run`].
#[derive(Debug, Clone)]
pub struct HostOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// TTF/OTF file for the text. Needs the `fontdue` feature.
    pub font: Option<PathBuf>,
    /// Simulation speed multiplier (1.0 = real time).
    pub time_scale: f32,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            title: "textswarm".to_string(),
            width: 1280,
            height: 720,
            font: None,
            time_scale: 1.0,
        }
    }
}

/// Virtual page: the trigger element sits one viewport down and is one
/// viewport tall.
fn page_for(viewport_height: f32) -> ScrollTrigger {
    ScrollTrigger::new(viewport_height, viewport_height, viewport_height)
}

/// Tick `engine` unless `clock` is paused. Returns whether there is a frame
/// to present.
///
/// A paused host skips the tick entirely and keeps showing the last frame,
/// so ripples freeze along with the particles.
fn advance_engine(engine: &mut Engine, clock: &FrameClock, dt: f32) -> bool {
    if clock.is_paused() {
        return engine.is_running();
    }
    engine.tick(dt).is_some()
}

fn title_for(base: &str, clock: &FrameClock) -> String {
    if clock.is_paused() {
        format!("{} (paused)", base)
    } else if clock.time_scale() != 1.0 {
        format!("{} | {:.0} fps | x{}", base, clock.fps(), clock.time_scale())
    } else {
        format!("{} | {:.0} fps", base, clock.fps())
    }
}

struct App {
    config: EngineConfig,
    options: HostOptions,
    motion: MotionPreference,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    engine: Option<Engine>,
    input: PointerInput,
    page: ScrollTrigger,
    clock: FrameClock,
    pending_resize: Option<(PhysicalSize<u32>, Instant)>,
    error: Option<HostError>,
}

impl App {
    fn new(config: EngineConfig, options: HostOptions, motion: MotionPreference) -> Self {
        let mut clock = FrameClock::new();
        clock.set_time_scale(options.time_scale);
        Self {
            input: PointerInput::new(),
            page: page_for(options.height as f32),
            config,
            options,
            motion,
            window: None,
            presenter: None,
            engine: None,
            clock,
            pending_resize: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: HostError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<bool, HostError> {
        let attrs = Window::default_attributes()
            .with_title(self.options.title.clone())
            .with_inner_size(PhysicalSize::new(self.options.width, self.options.height));
        let window = Arc::new(event_loop.create_window(attrs)?);
        let size = window.inner_size();

        let background = self.config.render.background;
        let presenter = pollster::block_on(Presenter::new(window.clone(), background))?;

        let glyphs = load_glyphs(self.options.font.as_deref());
        let engine = Engine::mount_with_glyphs(
            self.config.clone(),
            glyphs,
            size.width,
            size.height,
            &self.motion,
        )?;
        let Some(engine) = engine else {
            return Ok(false);
        };

        self.page = page_for(size.height as f32);
        self.engine = Some(engine);
        self.presenter = Some(presenter);
        window.request_redraw();
        self.window = Some(window);
        Ok(true)
    }

    fn apply_pending_resize(&mut self) {
        let Some((size, at)) = self.pending_resize else {
            return;
        };
        if at.elapsed() < RESIZE_DEBOUNCE {
            return;
        }
        self.pending_resize = None;
        if let Some(engine) = &mut self.engine {
            log::debug!("Rebuilding formation at {}x{}", size.width, size.height);
            engine.resize(size.width, size.height);
        }
    }

    /// One display frame: feed pending input, tick, present.
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.update();
        self.apply_pending_resize();

        let Some(engine) = &mut self.engine else {
            return;
        };

        let lines = self.input.take_wheel();
        if lines != 0.0 {
            self.page.scroll_by(lines * PIXELS_PER_LINE);
            let (_, end) = self.page.range();
            self.page.scroll_to(self.page.scroll_y().clamp(0.0, end.max(0.0)));
        }
        engine.pull_progress(&mut self.page, dt);

        match self.input.pointer() {
            Some(p) => engine.pointer_moved(p),
            None => engine.pointer_left(),
        }
        for click in self.input.drain_clicks() {
            let outcome = engine.click(click);
            log::trace!("Click at ({:.0}, {:.0}): {:?}", click.x, click.y, outcome);
        }

        if !advance_engine(engine, &self.clock, dt) {
            return;
        }

        if let Some(window) = &self.window {
            if self.clock.frame() % TITLE_INTERVAL == 0 {
                window.set_title(&title_for(&self.options.title, &self.clock));
            }
        }

        if let Some(presenter) = &mut self.presenter {
            match presenter.present(engine.frame()) {
                PresentOutcome::OutOfMemory => {
                    log::error!("GPU out of memory, shutting down");
                    engine.teardown();
                    event_loop.exit();
                }
                PresentOutcome::Reconfigured => log::warn!("GPU surface lost, reconfigured"),
                PresentOutcome::Presented | PresentOutcome::Skipped => {}
            }
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(engine) = &mut self.engine {
            engine.teardown();
        }
        self.input.clear();
        self.pending_resize = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(true) => {}
            Ok(false) => event_loop.exit(),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(size.width, size.height);
                }
                // Keep the same relative position on the resized page
                let progress = self.page.progress();
                self.page = page_for(size.height as f32);
                let (start, end) = self.page.range();
                self.page.scroll_to(start + (end - start) * progress);
                self.pending_resize = Some((size, Instant::now()));
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                use winit::keyboard::{Key, NamedKey};
                match event.logical_key {
                    Key::Named(NamedKey::Escape) => self.shutdown(event_loop),
                    Key::Named(NamedKey::Space) => {
                        self.clock.toggle_pause();
                        if let Some(window) = &self.window {
                            window.set_title(&title_for(&self.options.title, &self.clock));
                        }
                    }
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Open a window and run `config` until it is closed.
///
/// Returns immediately when reduced motion is preferred.
pub fn run(
    config: EngineConfig,
    options: HostOptions,
    motion: MotionPreference,
) -> Result<(), HostError> {
    config.validate()?;
    if motion.is_reduced() {
        log::info!("Reduced motion preferred, not opening a window");
        return Ok(());
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, options, motion);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressSource;

    #[test]
    fn test_virtual_page_starts_at_zero() {
        let mut page = page_for(800.0);
        assert_eq!(page.poll(0.0), Some(0.0));

        let (start, end) = page.range();
        assert!((start - 120.0).abs() < 1e-3);
        assert!((end - 1600.0).abs() < 1e-3);

        page.scroll_to(end);
        assert_eq!(page.poll(0.0), Some(1.0));
    }

    #[test]
    fn test_wheel_reaches_hold() {
        let mut page = page_for(800.0);
        // 30 lines down lands between the assemble and disperse bands
        page.scroll_by(30.0 * PIXELS_PER_LINE);
        let p = page.progress();
        assert!(p > 0.45 && p < 0.75, "progress {}", p);
    }

    #[test]
    fn test_default_options() {
        let options = HostOptions::default();
        assert_eq!((options.width, options.height), (1280, 720));
        assert!(options.font.is_none());
        assert_eq!(options.time_scale, 1.0);
    }

    #[test]
    fn test_paused_clock_freezes_ripples() {
        use crate::ripple::EmitOutcome;
        use glam::Vec2;

        let mut engine = Engine::mount(
            EngineConfig::new("HI"),
            400,
            200,
            &MotionPreference::full(),
        )
        .unwrap()
        .unwrap();
        engine.set_progress(0.6);
        assert!(matches!(engine.click(Vec2::new(200.0, 100.0)), EmitOutcome::Spawned(_)));

        let mut clock = FrameClock::new();
        assert!(advance_engine(&mut engine, &clock, 1.0 / 60.0));
        let ripple = engine.ripples().ripples()[0];
        let time = engine.time();

        clock.pause();
        for _ in 0..300 {
            let dt = clock.advance(1.0 / 60.0);
            assert!(advance_engine(&mut engine, &clock, dt));
        }

        assert_eq!(engine.ripples().ripples(), &[ripple]);
        assert_eq!(engine.time(), time);

        clock.resume();
        let dt = clock.advance(1.0 / 60.0);
        assert!(advance_engine(&mut engine, &clock, dt));
        assert!(engine.ripples().ripples()[0].strength < ripple.strength);
    }

    #[test]
    fn test_title_shows_state() {
        let mut clock = FrameClock::new();
        assert!(title_for("textswarm", &clock).starts_with("textswarm | "));
        clock.set_time_scale(0.5);
        assert!(title_for("textswarm", &clock).ends_with("x0.5"));
        clock.pause();
        assert_eq!(title_for("textswarm", &clock), "textswarm (paused)");
    }

    #[test]
    fn test_debounce_value() {
        assert_eq!(RESIZE_DEBOUNCE, Duration::from_millis(150));
    }
}
