//! Pointer input tracking for the formation surface.
//!
//! [`PointerInput`] turns raw pointer events into what the engine reads:
//! where the pointer is (or that it is absent) and which clicks happened since
//! the host last drained them. Parallax is measured against the engine's own
//! surface with [`normalized_offset`], so the tracker never needs the size.
//!
//! # Usage
//!
//! ```ignore
//! // Host side, per window event:
//! input.handle_event(&event);
//!
//! // Per frame:
//! for click in input.drain_clicks() {
//!     engine.click(click);
//! }
//! match input.pointer() {
//!     Some(p) => engine.pointer_moved(p),
//!     None => engine.pointer_left(),
//! }
//! let lines = input.take_wheel();
//! ```

use glam::Vec2;

/// Pointer state relative to the rendering surface.
#[derive(Debug, Default, Clone)]
pub struct PointerInput {
    /// Surface-relative position, `None` when the pointer is outside.
    position: Option<Vec2>,
    /// Click positions not yet handed to the engine.
    clicks: Vec<Vec2>,
    /// Accumulated wheel movement in lines (positive = scroll down the page).
    wheel_lines: f32,
}

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Queries ==========

    /// Current pointer position, if the pointer is over the surface.
    pub fn pointer(&self) -> Option<Vec2> {
        self.position
    }

    /// Number of clicks queued since the last drain.
    pub fn pending_clicks(&self) -> usize {
        self.clicks.len()
    }

    // ========== Updates ==========

    pub fn move_to(&mut self, position: Vec2) {
        self.position = Some(position);
    }

    pub fn leave(&mut self) {
        self.position = None;
    }

    /// Queue a click at the current pointer position, if there is one.
    pub fn click(&mut self) {
        if let Some(p) = self.position {
            self.clicks.push(p);
        }
    }

    pub fn scroll_lines(&mut self, lines: f32) {
        self.wheel_lines += lines;
    }

    /// Take all queued clicks, oldest first.
    pub fn drain_clicks(&mut self) -> std::vec::Drain<'_, Vec2> {
        self.clicks.drain(..)
    }

    /// Take accumulated wheel movement and reset it.
    pub fn take_wheel(&mut self) -> f32 {
        std::mem::take(&mut self.wheel_lines)
    }

    /// Forget everything. Used on teardown.
    pub fn clear(&mut self) {
        self.position = None;
        self.clicks.clear();
        self.wheel_lines = 0.0;
    }

    /// Process a winit window event.
    #[cfg(feature = "window")]
    pub fn handle_event(&mut self, event: &winit::event::WindowEvent) {
        use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.move_to(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::CursorLeft { .. } => self.leave(),

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.click(),

            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports "up" as positive; page scrolling goes the other way
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -*y,
                    MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32) / 40.0,
                };
                self.scroll_lines(lines);
            }

            _ => {}
        }
    }
}

/// Offset of `p` from the center of a `surface`-sized area, in `-1..=1` at
/// the edges. Degenerate surfaces give zero.
pub fn normalized_offset(p: Vec2, surface: Vec2) -> Vec2 {
    if surface.x <= 0.0 || surface.y <= 0.0 {
        return Vec2::ZERO;
    }
    let half = surface * 0.5;
    (p - half) / half
}
