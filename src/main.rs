//! Command-line entry point for textswarm

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use textswarm::engine::REDUCED_MOTION_ENV;
use textswarm::export::{export_frames, ExportOptions};
use textswarm::font::load_glyphs;
use textswarm::{EngineConfig, HostError, MotionPreference};

#[derive(Parser)]
#[command(name = "textswarm")]
#[command(about = "Scroll-synchronized particle text formation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Options shared by every command that mounts an engine.
#[derive(Args)]
struct EngineArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text to form, overrides the configuration
    #[arg(short, long)]
    text: Option<String>,

    /// Seed for rasterization and scatter, overrides the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// TTF/OTF font file (requires the `fontdue` feature)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Simulation speed multiplier
    #[arg(long, default_value_t = 1.0)]
    time_scale: f32,

    /// Do not start the engine at all
    #[arg(long, env = REDUCED_MOTION_ENV, value_parser = clap::builder::BoolishValueParser::new())]
    reduced_motion: bool,
}

impl EngineArgs {
    fn engine_config(&self) -> Result<EngineConfig, HostError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(text) = &self.text {
            config = config.with_text(text.clone());
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config.validate()?;
        Ok(config)
    }

    fn motion(&self) -> MotionPreference {
        if self.reduced_motion {
            MotionPreference::reduced()
        } else {
            MotionPreference::full()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Open a window; scroll with the mouse wheel, click while the text holds
    #[cfg(feature = "window")]
    Run {
        #[command(flatten)]
        engine: EngineArgs,

        /// Window width in pixels
        #[arg(long, default_value_t = 1280)]
        width: u32,

        /// Window height in pixels
        #[arg(long, default_value_t = 720)]
        height: u32,
    },

    /// Render a full progress sweep to PNG frames
    Export {
        #[command(flatten)]
        engine: EngineArgs,

        /// Output directory
        #[arg(short, long, default_value = "frames")]
        out: PathBuf,

        /// Number of frames across the sweep
        #[arg(short = 'n', long, default_value_t = 120)]
        frames: usize,

        /// Frame width in pixels
        #[arg(long, default_value_t = 800)]
        width: u32,

        /// Frame height in pixels
        #[arg(long, default_value_t = 400)]
        height: u32,

        /// Simulated frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f32,
    },

    /// Write the default configuration as JSON
    InitConfig {
        /// Destination file
        #[arg(default_value = "textswarm.json")]
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG still wins over the verbosity flags
    let default_filter = match (cli.verbose, cli.quiet) {
        (0, true) => "error",
        (0, false) => "info",
        (1, _) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> Result<(), HostError> {
    match command {
        #[cfg(feature = "window")]
        Commands::Run {
            engine,
            width,
            height,
        } => {
            let options = textswarm::window::HostOptions {
                width,
                height,
                font: engine.font.clone(),
                time_scale: engine.time_scale,
                ..Default::default()
            };
            textswarm::window::run(engine.engine_config()?, options, engine.motion())
        }

        Commands::Export {
            engine,
            out,
            frames,
            width,
            height,
            fps,
        } => {
            let options = ExportOptions {
                width,
                height,
                frames,
                fps,
                time_scale: engine.time_scale,
            };
            let summary = export_frames(
                engine.engine_config()?,
                load_glyphs(engine.font.as_deref()),
                &options,
                &engine.motion(),
                &out,
            )?;
            println!(
                "{} frames ({:.2}s simulated) written to {}",
                summary.files.len(),
                summary.simulated,
                out.display()
            );
            Ok(())
        }

        Commands::InitConfig { path } => {
            EngineConfig::default().save(&path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}
