//! Headless frame export.
//!
//! Runs an engine without a window: progress sweeps from 0 to 1 over the
//! requested number of frames, one ripple is emitted at the text center the
//! first time the text is held, and every frame is written as a PNG.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::engine::{Engine, MotionPreference};
use crate::error::HostError;
use crate::font::GlyphSource;
use crate::progress::ScriptedProgress;
use crate::ripple::EmitOutcome;
use crate::time::FrameClock;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub width: u32,
    pub height: u32,
    pub frames: usize,
    /// Simulated frames per second; sets the tick length.
    pub fps: f32,
    /// Simulation speed multiplier (1.0 = real time).
    pub time_scale: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            frames: 120,
            fps: 60.0,
            time_scale: 1.0,
        }
    }
}

/// What an export produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    /// Id of the ripple emitted during the hold, if the sweep reached it.
    pub ripple: Option<u64>,
    /// Seconds of simulated time covered by the frames.
    pub simulated: f32,
}

/// File name for frame `index`.
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{:05}.png", index)
}

/// Render the sweep into `out_dir`, creating it if needed.
///
/// Writes nothing when reduced motion is preferred or the surface is
/// unavailable.
pub fn export_frames(
    config: EngineConfig,
    glyphs: Box<dyn GlyphSource>,
    options: &ExportOptions,
    motion: &MotionPreference,
    out_dir: &Path,
) -> Result<ExportSummary, HostError> {
    let mut summary = ExportSummary::default();

    let Some(mut engine) =
        Engine::mount_with_glyphs(config, glyphs, options.width, options.height, motion)?
    else {
        return Ok(summary);
    };
    if !engine.is_running() {
        log::warn!("Nothing to export at {}x{}", options.width, options.height);
        return Ok(summary);
    }

    fs::create_dir_all(out_dir)?;

    let step = if options.fps > 0.0 { 1.0 / options.fps } else { 1.0 / 60.0 };
    // Offline frames never stall, so every frame gets the full step
    let mut clock = FrameClock::new()
        .with_fixed_delta(step)
        .with_max_delta(f32::INFINITY);
    clock.set_time_scale(options.time_scale);
    let mut sweep = ScriptedProgress::sweep(0.0, 1.0, options.frames);

    for index in 0..options.frames {
        let dt = clock.advance(0.0);
        engine.pull_progress(&mut sweep, dt);

        if summary.ripple.is_none() && engine.progress().is_holding() {
            if let Some(center) = engine.text_center() {
                if let EmitOutcome::Spawned(id) = engine.click(center) {
                    summary.ripple = Some(id);
                }
            }
        }

        if engine.tick(dt).is_none() {
            break;
        }

        let path = out_dir.join(frame_file_name(index));
        engine.frame().save(&path)?;
        log::debug!("Wrote {}", path.display());
        summary.files.push(path);
    }

    summary.simulated = clock.elapsed();
    engine.teardown();
    log::info!(
        "Exported {} frames to {}",
        summary.files.len(),
        out_dir.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BitmapFont;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("textswarm-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn small() -> ExportOptions {
        ExportOptions {
            width: 160,
            height: 80,
            frames: 12,
            fps: 30.0,
            time_scale: 1.0,
        }
    }

    #[test]
    fn test_frame_file_name() {
        assert_eq!(frame_file_name(7), "frame_00007.png");
    }

    #[test]
    fn test_export_writes_every_frame() {
        let dir = temp_dir("export");
        let summary = export_frames(
            EngineConfig::new("HI"),
            Box::new(BitmapFont::new()),
            &small(),
            &MotionPreference::full(),
            &dir,
        )
        .unwrap();

        assert_eq!(summary.files.len(), 12);
        assert_eq!(summary.ripple, Some(1));
        assert!((summary.simulated - 12.0 / 30.0).abs() < 1e-4);
        let img = image::open(&summary.files[0]).unwrap();
        assert_eq!((img.width(), img.height()), (160, 80));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_time_scale_stretches_simulated_time() {
        let dir = temp_dir("scaled");
        let options = ExportOptions {
            frames: 6,
            fps: 2.0,
            time_scale: 3.0,
            ..small()
        };
        let summary = export_frames(
            EngineConfig::new("HI"),
            Box::new(BitmapFont::new()),
            &options,
            &MotionPreference::full(),
            &dir,
        )
        .unwrap();

        // 6 frames of 0.5 s at triple speed, with no stall clamp
        assert_eq!(summary.files.len(), 6);
        assert!((summary.simulated - 9.0).abs() < 1e-4);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_reduced_motion_exports_nothing() {
        let dir = temp_dir("reduced");
        let summary = export_frames(
            EngineConfig::new("HI"),
            Box::new(BitmapFont::new()),
            &small(),
            &MotionPreference::reduced(),
            &dir,
        )
        .unwrap();
        assert!(summary.files.is_empty());
        assert!(!dir.exists());
    }
}
