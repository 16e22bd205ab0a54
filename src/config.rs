//! Engine configuration.
//!
//! [`EngineConfig`] collects everything a mounted engine needs: the text and
//! how it is sampled, colors, pool scatter ranges, progress bands, physics
//! tuning, ripple behavior and render options. Every section has defaults, so
//! a JSON file only needs the fields it changes:
//!
//! ```json
//! {
//!   "raster": { "text": "SHIP IT", "stride": { "policy": "fixed", "step": 5 } },
//!   "colors": { "colors": ["#f97316", "#facc15"], "mode": { "mode": "gradient" } },
//!   "ripples": { "cap": 3, "overflow": "evict_oldest" }
//! }
//! ```
//!
//! Programmatic setup uses the `with_*` builders:
//!
//! ```ignore
//! let config = EngineConfig::new("HELLO")
//!     .with_stride(StridePolicy::Responsive { min: 3, divisor: 200 })
//!     .with_colors(&["#3b82f6", "#ffffff"])
//!     .with_ripple_cap(3);
//! config.validate()?;
//! ```

use crate::color::{ColorMode, Palette};
use crate::error::ConfigError;
use crate::particle::{PoolConfig, MAX_RIPPLES};
use crate::physics::PhysicsConfig;
use crate::progress::ProgressBands;
use crate::raster::{RasterConfig, StridePolicy};
use crate::render::RenderConfig;
use crate::ripple::{OverflowPolicy, RippleConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Palette and how it is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Hex color stops (`#rgb` or `#rrggbb`).
    pub colors: Vec<String>,
    pub mode: ColorMode,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            colors: ["#3b82f6", "#60a5fa", "#93c5fd", "#2563eb", "#ffffff"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mode: ColorMode::Gradient,
        }
    }
}

impl ColorConfig {
    /// Parse the color stops.
    pub fn palette(&self) -> Result<Palette, ConfigError> {
        Palette::from_hex(&self.colors)
    }
}

/// Complete configuration for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub raster: RasterConfig,
    pub colors: ColorConfig,
    pub pool: PoolConfig,
    pub bands: ProgressBands,
    pub physics: PhysicsConfig,
    pub ripples: RippleConfig,
    pub render: RenderConfig,
}

impl EngineConfig {
    /// Default configuration forming `text`.
    pub fn new(text: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.raster.text = text.into();
        config
    }

    // ========== Builders ==========

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.raster.text = text.into();
        self
    }

    pub fn with_stride(mut self, stride: StridePolicy) -> Self {
        self.raster.stride = stride;
        self
    }

    pub fn with_max_font_size(mut self, px: f32) -> Self {
        self.raster.max_font_size = px;
        self
    }

    pub fn with_keep_probability(mut self, p: f32) -> Self {
        self.raster.keep_probability = p;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.raster.seed = seed;
        self
    }

    pub fn with_colors<S: AsRef<str>>(mut self, colors: &[S]) -> Self {
        self.colors.colors = colors.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.colors.mode = mode;
        self
    }

    pub fn with_ambient_particles(mut self, count: usize) -> Self {
        self.pool.ambient_count = count;
        self
    }

    pub fn with_bands(mut self, bands: ProgressBands) -> Self {
        self.bands = bands;
        self
    }

    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    pub fn with_ripple_cap(mut self, cap: usize) -> Self {
        self.ripples.cap = cap;
        self
    }

    pub fn with_overflow(mut self, policy: OverflowPolicy) -> Self {
        self.ripples.overflow = policy;
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    // ========== Files ==========

    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.raster;
        match r.stride {
            StridePolicy::Fixed { step: 0 } => {
                return Err(ConfigError::invalid("raster.stride", "step must be at least 1"));
            }
            StridePolicy::Responsive { divisor: 0, .. } => {
                return Err(ConfigError::invalid("raster.stride", "divisor must be at least 1"));
            }
            _ => {}
        }
        if !(r.max_font_size > 0.0) {
            return Err(ConfigError::invalid("raster.max_font_size", "must be positive"));
        }
        if !(r.width_factor > 0.0) {
            return Err(ConfigError::invalid("raster.width_factor", "must be positive"));
        }
        if !(0.0..=1.0).contains(&r.keep_probability) {
            return Err(ConfigError::invalid(
                "raster.keep_probability",
                format!("{} is outside 0..=1", r.keep_probability),
            ));
        }

        self.colors.palette()?;
        match self.colors.mode {
            ColorMode::Accent { chance } if !(0.0..=1.0).contains(&chance) => {
                return Err(ConfigError::invalid("colors.mode.chance", "must be within 0..=1"));
            }
            ColorMode::Spectrum { saturation, value }
                if !(0.0..=1.0).contains(&saturation) || !(0.0..=1.0).contains(&value) =>
            {
                return Err(ConfigError::invalid(
                    "colors.mode",
                    "saturation and value must be within 0..=1",
                ));
            }
            _ => {}
        }

        if self.pool.size.0 <= 0.0 || self.pool.size.1 < self.pool.size.0 {
            return Err(ConfigError::invalid("pool.size", "expected 0 < min <= max"));
        }

        if !self.bands.is_valid() {
            return Err(ConfigError::invalid(
                "bands",
                "expected 0 < assemble_end <= disperse_start < 1",
            ));
        }

        let p = &self.physics;
        if !(0.0..1.0).contains(&p.damping) {
            return Err(ConfigError::invalid("physics.damping", "must be within 0..1"));
        }
        if p.spring_k < 0.0 {
            return Err(ConfigError::invalid("physics.spring_k", "must not be negative"));
        }
        if p.ladder.is_empty() {
            return Err(ConfigError::invalid("physics.ladder", "needs at least one tier"));
        }
        if p.ladder[0].min_hits == 0 {
            return Err(ConfigError::invalid("physics.ladder", "tiers start at one hit"));
        }
        if p.ladder.windows(2).any(|w| w[1].min_hits <= w[0].min_hits) {
            return Err(ConfigError::invalid(
                "physics.ladder",
                "tiers must be sorted by strictly increasing min_hits",
            ));
        }

        let rp = &self.ripples;
        if rp.cap == 0 || rp.cap > MAX_RIPPLES {
            return Err(ConfigError::invalid(
                "ripples.cap",
                format!("{} is outside 1..={}", rp.cap, MAX_RIPPLES),
            ));
        }
        if !(rp.decay_rate > 0.0) {
            return Err(ConfigError::invalid("ripples.decay_rate", "must be positive"));
        }
        if rp.expansion_rate < 0.0 {
            return Err(ConfigError::invalid("ripples.expansion_rate", "must not be negative"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::HitTier;

    #[test]
    fn test_default_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "raster": { "text": "SHIP IT" }, "ripples": { "cap": 3, "overflow": "evict_oldest" } }"#,
        )
        .unwrap();
        assert_eq!(config.raster.text, "SHIP IT");
        assert_eq!(config.raster.max_font_size, 120.0);
        assert_eq!(config.ripples.cap, 3);
        assert_eq!(config.ripples.overflow, OverflowPolicy::EvictOldest);
        assert_eq!(config.bands, ProgressBands::default());
    }

    #[test]
    fn test_tagged_enums_from_json() {
        let config = EngineConfig::from_json_str(
            r##"{
                "raster": { "stride": { "policy": "responsive", "min": 3, "divisor": 200 } },
                "colors": { "colors": ["#fff"], "mode": { "mode": "accent", "chance": 0.2 } }
            }"##,
        )
        .unwrap();
        assert_eq!(
            config.raster.stride,
            StridePolicy::Responsive { min: 3, divisor: 200 }
        );
        assert_eq!(config.colors.mode, ColorMode::Accent { chance: 0.2 });

        let spectrum = EngineConfig::from_json_str(
            r#"{ "colors": { "mode": { "mode": "spectrum", "saturation": 0.8, "value": 1.0 } } }"#,
        )
        .unwrap();
        assert_eq!(
            spectrum.colors.mode,
            ColorMode::Spectrum {
                saturation: 0.8,
                value: 1.0
            }
        );
        spectrum.validate().unwrap();
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig::new("ROUND").with_ripple_cap(2).with_seed(5);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            EngineConfig::default().with_stride(StridePolicy::Fixed { step: 0 }),
            EngineConfig::default().with_ripple_cap(0),
            EngineConfig::default().with_ripple_cap(MAX_RIPPLES + 1),
            EngineConfig::default().with_keep_probability(1.5),
            EngineConfig::default().with_colors(&["not-a-color"]),
            EngineConfig::default().with_colors::<&str>(&[]),
            EngineConfig::default().with_color_mode(ColorMode::Spectrum {
                saturation: 1.2,
                value: 1.0,
            }),
            EngineConfig::default().with_bands(ProgressBands {
                assemble_end: 0.8,
                disperse_start: 0.5,
                ..Default::default()
            }),
            EngineConfig::default().with_physics(PhysicsConfig::default().with_ladder(vec![])),
            EngineConfig::default().with_physics(PhysicsConfig::default().with_ladder(vec![
                HitTier::new(2, 1.0, 0.5, 0.5, 10.0),
                HitTier::new(1, 0.5, 0.2, 0.2, 5.0),
            ])),
        ];
        for config in bad {
            assert!(config.validate().is_err(), "accepted {:?}", config);
        }

        let mut zero_decay = EngineConfig::default();
        zero_decay.ripples.decay_rate = 0.0;
        assert!(zero_decay.validate().is_err());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(
            EngineConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(
            EngineConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
