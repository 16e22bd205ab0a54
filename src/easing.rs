//! Easing curves shared by the progress mapper, the physics step and the
//! timed progress source.

use serde::{Deserialize, Serialize};

/// An easing curve mapping `0.0..=1.0` onto `0.0..=1.0`.
///
/// All curves satisfy `apply(0) == 0` and `apply(1) == 1`, and inputs outside
/// the unit range are clamped first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// No easing.
    Linear,

    /// Symmetric cubic ease-in-out (default).
    #[default]
    CubicInOut,

    /// Symmetric quartic ease-in-out. Snappier hold entry than cubic.
    QuartInOut,

    /// Quadratic ease-out, fast start and soft landing.
    QuadOut,

    /// Exponential ease-out.
    ExpoOut,
}

impl Easing {
    /// Evaluate the curve at `t`.
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::QuartInOut => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::ExpoOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
        }
    }
}
